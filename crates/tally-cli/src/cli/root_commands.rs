use clap::{Args, Subcommand};

use crate::cli::subcommands::DecisionCommands;

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Score an argument list without saving anything.
    Score(ScoreArgs),
    /// Stored decisions.
    Decision {
        #[command(subcommand)]
        action: DecisionCommands,
    },
}

#[derive(Clone, Debug, Args)]
pub struct ScoreArgs {
    /// Arguments as `WEIGHT:TEXT`. Text may be omitted (`-3`).
    #[arg(required = true, allow_hyphen_values = true, value_name = "WEIGHT[:TEXT]")]
    pub arguments: Vec<String>,
}
