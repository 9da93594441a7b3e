use anyhow::Context;
use serde_json::json;
use tally_db::error::DatabaseError;
use tally_db::retry::with_backoff;
use tally_db::store::DecisionStore;

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

pub async fn run(id: &str, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let user = ctx.require_user()?;
    let decision = ctx.fetch_owned(id, user).await?;
    with_backoff(&ctx.retry, DatabaseError::is_transient, || {
        ctx.db.delete_decision_cascading(&decision.id)
    })
    .await
    .with_context(|| format!("failed to delete decision {id}"))?;
    tracing::info!(id, title = %decision.title, "decision deleted");
    output(&json!({ "deleted": decision.id }), flags.format)
}
