use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tally_core::entities::Decision;
use tally_core::enums::Recommendation;
use tally_db::error::DatabaseError;
use tally_db::retry::with_backoff;
use tally_db::store::DecisionStore;

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct DecisionSummary {
    id: String,
    title: String,
    version: i64,
    arguments: usize,
    recommendation: Recommendation,
    updated_at: DateTime<Utc>,
}

impl From<Decision> for DecisionSummary {
    fn from(d: Decision) -> Self {
        Self {
            arguments: d.arguments.len(),
            recommendation: d.score.recommendation,
            id: d.id,
            title: d.title,
            version: d.version,
            updated_at: d.updated_at,
        }
    }
}

pub async fn run(limit: u32, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let user = ctx.require_user()?;
    let decisions = with_backoff(&ctx.retry, DatabaseError::is_transient, || {
        ctx.db.list_decisions(&user.user_id, limit)
    })
    .await
    .context("failed to list decisions")?;
    let summaries: Vec<DecisionSummary> = decisions.into_iter().map(Into::into).collect();
    output(&summaries, flags.format)
}
