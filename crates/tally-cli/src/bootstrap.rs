use anyhow::Context;
use tally_config::TallyConfig;
use tally_core::identity::UserIdentity;

use crate::cli::GlobalFlags;

/// Load layered config (with `.env`), then apply command-line overrides.
pub fn load_config(flags: &GlobalFlags) -> anyhow::Result<TallyConfig> {
    let mut config = TallyConfig::load_with_dotenv().context("failed to load tally config")?;
    if let Some(path) = &flags.database {
        config.database.path.clone_from(path);
    }
    Ok(config)
}

/// Acting user: `--user`, then `TALLY_USER`, then the login name in `USER`.
pub fn resolve_user(flags: &GlobalFlags) -> Option<UserIdentity> {
    flags
        .user
        .clone()
        .or_else(|| std::env::var("TALLY_USER").ok())
        .or_else(|| std::env::var("USER").ok())
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .map(UserIdentity::new)
}
