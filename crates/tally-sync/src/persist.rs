//! The resolution loop shared by background and explicit saves.

use tally_core::draft::DraftSnapshot;
use tally_core::enums::SavePhase;
use tally_core::identity::UserIdentity;
use tally_db::conflict::{Conflict, SaveError};
use tally_db::retry::RetryConfig;
use tally_db::store::DecisionStore;
use tally_db::upsert::{ExistingRecord, Upserted, upsert};

use crate::policy::ConflictPolicy;

/// A save that went through.
#[derive(Debug, Clone, PartialEq)]
pub struct Persisted {
    pub upserted: Upserted,
    /// Title the draft had when the save that succeeded was attempted.
    /// Differs from the stored title when the policy renamed it.
    pub drafted_title: String,
}

impl Persisted {
    #[must_use]
    pub fn was_renamed(&self) -> bool {
        self.upserted.decision.title != self.drafted_title
    }
}

/// Upsert the draft, handing conflicts to `policy` and retrying transient
/// store failures per `retry`.
///
/// `draft` is read before every attempt so a retry carries the latest edits.
/// A retry that reads an invalid draft sends the last valid one instead.
/// A replacement title from the policy applies only while the draft title
/// still equals the one that conflicted. Lock retries use the store's
/// actual version. `on_phase` sees `Saving`, `ConflictResolving`, and
/// `Retrying` as the loop moves through them.
///
/// # Errors
///
/// Returns the last `SaveError` once the policy gives up, the retry budget is
/// spent, or the error is neither a conflict nor transient.
pub async fn persist_with_policy<S, P>(
    store: &S,
    policy: &P,
    retry: &RetryConfig,
    user: &UserIdentity,
    existing: Option<ExistingRecord>,
    draft: impl Fn() -> DraftSnapshot + Send,
    mut on_phase: impl FnMut(SavePhase) + Send,
) -> Result<Persisted, SaveError>
where
    S: DecisionStore,
    P: ConflictPolicy,
{
    let mut existing = existing;
    // (title as drafted, title to store instead)
    let mut rename: Option<(String, String)> = None;
    let mut lock_conflicts = 0u32;
    let mut title_conflicts = 0u32;
    let mut transport_attempts = 1u32;
    let mut last_valid: Option<DraftSnapshot> = None;

    loop {
        let mut snapshot = draft();
        if snapshot.validate().is_ok() {
            last_valid = Some(snapshot.clone());
        } else if let Some(previous) = &last_valid {
            tracing::debug!("draft became invalid during the save, retrying the last valid one");
            snapshot = previous.clone();
        }
        let drafted_title = snapshot.data.title.clone();
        if let Some((from, to)) = &rename {
            if *from == drafted_title {
                snapshot.data.title.clone_from(to);
            } else {
                rename = None;
            }
        }

        on_phase(SavePhase::Saving);
        let error = match upsert(
            store,
            user,
            &snapshot.data,
            &snapshot.arguments,
            existing.as_ref(),
        )
        .await
        {
            Ok(upserted) => {
                return Ok(Persisted {
                    upserted,
                    drafted_title,
                });
            }
            Err(e) => e,
        };

        match error {
            SaveError::Conflict(conflict) => {
                on_phase(SavePhase::ConflictResolving);
                let attempt = match &conflict {
                    Conflict::OptimisticLock(_) => {
                        lock_conflicts += 1;
                        lock_conflicts
                    }
                    Conflict::DuplicateTitle(_) => {
                        title_conflicts += 1;
                        title_conflicts
                    }
                };
                let resolution = policy.resolve(&conflict, attempt);
                if !resolution.should_retry {
                    tracing::warn!(attempt, %conflict, "conflict not resolved");
                    return Err(conflict.into());
                }
                if let (Conflict::OptimisticLock(lock), Some(record)) = (&conflict, existing.as_mut()) {
                    record.version = lock.actual_version;
                }
                if let Some(title) = resolution.replacement_title {
                    tracing::debug!(from = %drafted_title, to = %title, "retrying under a new title");
                    rename = Some((drafted_title, title));
                }
                on_phase(SavePhase::Retrying);
            }
            e if e.is_transient() && retry.allows_another(transport_attempts) => {
                let delay = retry.delay_for(transport_attempts);
                tracing::warn!(
                    attempt = transport_attempts,
                    max_attempts = retry.max_attempts,
                    ?delay,
                    error = %e,
                    "transient store error, retrying"
                );
                on_phase(SavePhase::Retrying);
                tokio::time::sleep(delay).await;
                transport_attempts += 1;
            }
            e => return Err(e),
        }
    }
}
