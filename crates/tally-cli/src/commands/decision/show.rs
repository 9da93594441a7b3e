use serde::Serialize;
use tally_core::entities::Decision;
use tally_core::scoring::{ScoreResult, score};

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct ShowResponse {
    #[serde(flatten)]
    decision: Decision,
    /// Recomputed from the arguments, including the ratio.
    live_score: ScoreResult,
}

pub async fn run(id: &str, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let user = ctx.require_user()?;
    let decision = ctx.fetch_owned(id, user).await?;
    let live_score = score(&decision.arguments);
    output(&ShowResponse { decision, live_score }, flags.format)
}
