pub mod create;
pub mod delete;
pub mod list;
pub mod show;
pub mod update;

use serde::Serialize;
use tally_core::entities::Decision;
use tally_sync::Persisted;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::DecisionCommands;
use crate::context::AppContext;

/// Handle `tally decision`.
pub async fn handle(
    action: &DecisionCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        DecisionCommands::Create {
            title,
            description,
            arguments,
        } => create::run(title, description.as_deref(), arguments, ctx, flags).await,
        DecisionCommands::Update {
            id,
            title,
            description,
            arguments,
            clear_args,
            expected_version,
        } => {
            let edit = update::Edit {
                title: title.as_deref(),
                description: description.as_deref(),
                arguments,
                clear_args: *clear_args,
                expected_version: *expected_version,
            };
            update::run(id, &edit, ctx, flags).await
        }
        DecisionCommands::Show { id } => show::run(id, ctx, flags).await,
        DecisionCommands::List { limit } => list::run(*limit, ctx, flags).await,
        DecisionCommands::Delete { id } => delete::run(id, ctx, flags).await,
    }
}

/// Output of create and update.
#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub created: bool,
    /// Title asked for, when the stored one differs after a rename.
    pub renamed_from: Option<String>,
    pub decision: Decision,
}

impl From<Persisted> for SaveResponse {
    fn from(persisted: Persisted) -> Self {
        let renamed_from = persisted
            .was_renamed()
            .then(|| persisted.drafted_title.clone());
        Self {
            created: persisted.upserted.is_new,
            renamed_from,
            decision: persisted.upserted.decision,
        }
    }
}
