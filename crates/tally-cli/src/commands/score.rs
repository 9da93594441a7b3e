use serde::Serialize;
use tally_core::draft::ArgumentInput;
use tally_core::scoring::{ScoreResult, score};

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ScoreArgs;
use crate::commands::shared::parse::parse_scored_argument;
use crate::output::output;

#[derive(Debug, Serialize)]
struct ScoreResponse {
    arguments: Vec<ArgumentInput>,
    #[serde(flatten)]
    score: ScoreResult,
}

/// Handle `tally score`.
pub fn handle(args: &ScoreArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    let arguments = args
        .arguments
        .iter()
        .enumerate()
        .map(|(i, raw)| parse_scored_argument(raw, i))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let score = score(&arguments);
    output(&ScoreResponse { arguments, score }, flags.format)
}
