use clap::Subcommand;

/// Decision commands.
#[derive(Clone, Debug, Subcommand)]
pub enum DecisionCommands {
    /// Create a decision.
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// Argument as `WEIGHT:TEXT`, e.g. `+8:Better salary`. Repeatable.
        #[arg(long = "arg", value_name = "WEIGHT:TEXT", allow_hyphen_values = true)]
        arguments: Vec<String>,
    },
    /// Update a decision. Given arguments replace the whole list.
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long = "arg", value_name = "WEIGHT:TEXT", allow_hyphen_values = true)]
        arguments: Vec<String>,
        /// Remove all arguments.
        #[arg(long, conflicts_with = "arguments")]
        clear_args: bool,
        /// Version the edit is based on. Defaults to the stored one.
        #[arg(long)]
        expected_version: Option<i64>,
    },
    /// Show a decision with its live score.
    Show { id: String },
    /// List decisions, most recently updated first.
    List {
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Delete a decision and its arguments.
    Delete { id: String },
}
