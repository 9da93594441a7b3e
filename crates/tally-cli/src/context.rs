use anyhow::{Context, bail};
use tally_config::TallyConfig;
use tally_core::draft::DraftSnapshot;
use tally_core::entities::Decision;
use tally_core::identity::UserIdentity;
use tally_db::TallyDb;
use tally_db::error::DatabaseError;
use tally_db::retry::{RetryConfig, with_backoff};
use tally_db::store::DecisionStore;
use tally_db::upsert::ExistingRecord;
use tally_sync::{InteractivePolicy, Persisted, persist_with_policy};

use crate::bootstrap;
use crate::cli::GlobalFlags;
use crate::prompt::TerminalPrompt;

/// Everything a decision command needs.
pub struct AppContext {
    pub db: TallyDb,
    pub config: TallyConfig,
    pub retry: RetryConfig,
    pub user: Option<UserIdentity>,
}

impl AppContext {
    pub async fn init(config: TallyConfig, flags: &GlobalFlags) -> anyhow::Result<Self> {
        let db = TallyDb::open_local(&config.database.path)
            .await
            .with_context(|| format!("failed to open database at {}", config.database.path))?;
        Ok(Self {
            db,
            retry: RetryConfig::from(&config.retry),
            user: bootstrap::resolve_user(flags),
            config,
        })
    }

    pub fn require_user(&self) -> anyhow::Result<&UserIdentity> {
        self.user
            .as_ref()
            .context("no user: pass --user or set TALLY_USER")
    }

    /// Load a decision owned by `user`. Someone else's decision is reported
    /// as missing.
    pub async fn fetch_owned(&self, id: &str, user: &UserIdentity) -> anyhow::Result<Decision> {
        let result = with_backoff(&self.retry, DatabaseError::is_transient, || {
            self.db.get_decision(id)
        })
        .await;
        match result {
            Ok(decision) if decision.user_id == user.user_id => Ok(decision),
            Ok(_) | Err(DatabaseError::NoResult) => bail!("decision {id} not found"),
            Err(e) => Err(e).with_context(|| format!("failed to load decision {id}")),
        }
    }

    /// Explicit save: conflicts are put to the user on the terminal.
    pub async fn save(
        &self,
        user: &UserIdentity,
        draft: DraftSnapshot,
        existing: Option<ExistingRecord>,
    ) -> anyhow::Result<Persisted> {
        let policy = InteractivePolicy::new(TerminalPrompt::stdin(), &self.config.conflicts);
        let persisted = persist_with_policy(
            &self.db,
            &policy,
            &self.retry,
            user,
            existing,
            || draft.clone(),
            |phase| tracing::debug!(%phase, "save phase"),
        )
        .await?;
        Ok(persisted)
    }
}
