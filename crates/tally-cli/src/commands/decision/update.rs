use tally_core::draft::{DraftSnapshot, has_changed};
use tally_db::upsert::ExistingRecord;

use super::SaveResponse;
use crate::cli::GlobalFlags;
use crate::commands::shared::parse::parse_arguments;
use crate::context::AppContext;
use crate::output::output;

/// Requested changes to a stored decision.
pub struct Edit<'a> {
    pub title: Option<&'a str>,
    pub description: Option<&'a str>,
    pub arguments: &'a [String],
    pub clear_args: bool,
    pub expected_version: Option<i64>,
}

impl Edit<'_> {
    fn apply(&self, mut draft: DraftSnapshot) -> anyhow::Result<DraftSnapshot> {
        if let Some(title) = self.title {
            draft.data.title = title.to_string();
        }
        if let Some(description) = self.description {
            draft.data.description = Some(description.to_string());
        }
        if self.clear_args {
            draft.arguments.clear();
        } else if !self.arguments.is_empty() {
            draft.arguments = parse_arguments(self.arguments)?;
        }
        Ok(draft)
    }
}

pub async fn run(
    id: &str,
    edit: &Edit<'_>,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let user = ctx.require_user()?;
    let current = ctx.fetch_owned(id, user).await?;
    let stored = current.snapshot();
    let draft = edit.apply(stored.clone())?;

    if !has_changed(Some(&stored), &draft) {
        tracing::info!(id, "nothing to update");
        return output(
            &SaveResponse {
                created: false,
                renamed_from: None,
                decision: current,
            },
            flags.format,
        );
    }

    let existing = ExistingRecord::new(
        current.id.clone(),
        edit.expected_version.unwrap_or(current.version),
    );
    let persisted = ctx.save(user, draft, Some(existing)).await?;
    output(&SaveResponse::from(persisted), flags.format)
}
