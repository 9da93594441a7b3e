use tally_core::draft::{DecisionData, DraftSnapshot};

use super::SaveResponse;
use crate::cli::GlobalFlags;
use crate::commands::shared::parse::parse_arguments;
use crate::context::AppContext;
use crate::output::output;

pub async fn run(
    title: &str,
    description: Option<&str>,
    arguments: &[String],
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let user = ctx.require_user()?;
    let draft = DraftSnapshot::new(
        DecisionData::new(title, description.map(String::from)),
        parse_arguments(arguments)?,
    );
    let persisted = ctx.save(user, draft, None).await?;
    output(&SaveResponse::from(persisted), flags.format)
}
