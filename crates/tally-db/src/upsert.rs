//! Create-or-update with version checks.
//!
//! The single entry point every save path goes through. Validates first, then
//! either inserts a new decision or issues a version-guarded update, and maps
//! store failures through [`crate::conflict::classify`].

use serde::{Deserialize, Serialize};
use tally_core::draft::{ArgumentInput, DecisionData};
use tally_core::entities::Decision;
use tally_core::identity::UserIdentity;

use crate::conflict::{ClassifyContext, Conflict, SaveError, classify};
use crate::store::DecisionStore;

/// Identity of an already-persisted decision as the caller last saw it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingRecord {
    pub id: String,
    pub version: i64,
}

impl ExistingRecord {
    #[must_use]
    pub fn new(id: impl Into<String>, version: i64) -> Self {
        Self {
            id: id.into(),
            version,
        }
    }
}

impl From<&Decision> for ExistingRecord {
    fn from(decision: &Decision) -> Self {
        Self::new(decision.id.clone(), decision.version)
    }
}

/// A successful upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct Upserted {
    pub decision: Decision,
    /// `true` when the decision was inserted rather than updated.
    pub is_new: bool,
}

impl Upserted {
    #[must_use]
    pub fn record(&self) -> ExistingRecord {
        ExistingRecord::from(&self.decision)
    }
}

/// Persist `data` and `arguments` for `user`.
///
/// Without `existing`, inserts a new decision at version 1. With it, updates
/// only if the stored version still equals `existing.version`, bumping it.
/// Decision fields and the argument set are written atomically.
///
/// # Errors
///
/// - `SaveError::Validation` before any store call when inputs are out of bounds
/// - `SaveError::Conflict` with `OptimisticLock` or `DuplicateTitle`
/// - `SaveError::Store` for anything else
pub async fn upsert<S: DecisionStore>(
    store: &S,
    user: &UserIdentity,
    data: &DecisionData,
    arguments: &[ArgumentInput],
    existing: Option<&ExistingRecord>,
) -> Result<Upserted, SaveError> {
    data.validate()?;
    for argument in arguments {
        argument.validate()?;
    }

    let result = match existing {
        None => store
            .create_decision(&user.user_id, data, arguments)
            .await
            .map(|decision| Upserted {
                decision,
                is_new: true,
            }),
        Some(record) => store
            .update_decision_with_version(
                &user.user_id,
                &record.id,
                record.version,
                data,
                arguments,
            )
            .await
            .map(|decision| Upserted {
                decision,
                is_new: false,
            }),
    };

    match result {
        Ok(upserted) => {
            tracing::info!(
                id = %upserted.decision.id,
                version = upserted.decision.version,
                is_new = upserted.is_new,
                "decision saved"
            );
            Ok(upserted)
        }
        Err(e) => {
            let mut error = classify(e, &ClassifyContext { title: &data.title });
            if let SaveError::Conflict(Conflict::DuplicateTitle(dup)) = &mut error {
                // Best effort: the conflict stands even if the lookup fails.
                match store.find_by_user_and_title(&user.user_id, &data.title).await {
                    Ok(found) => dup.existing_id = found.map(|d| d.id),
                    Err(lookup) => {
                        tracing::debug!(error = %lookup, "could not resolve duplicate title holder");
                    }
                }
            }
            tracing::debug!(kind = %error.kind(), error = %error, "upsert failed");
            Err(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::{DuplicateTitleError, OptimisticLockError, SaveErrorKind};
    use crate::memory::MemoryStore;
    use crate::test_support::helpers::{args, data, test_db};
    use pretty_assertions::assert_eq;
    use tally_core::errors::ValidationError;

    fn alice() -> UserIdentity {
        UserIdentity::new("alice")
    }

    #[tokio::test]
    async fn create_then_update() {
        let store = MemoryStore::new();
        let created = upsert(&store, &alice(), &data("Move"), &args(&[5, -2]), None)
            .await
            .unwrap();
        assert!(created.is_new);
        assert_eq!(created.decision.version, 1);

        let updated = upsert(
            &store,
            &alice(),
            &data("Move abroad"),
            &args(&[5]),
            Some(&created.record()),
        )
        .await
        .unwrap();
        assert!(!updated.is_new);
        assert_eq!(updated.decision.id, created.decision.id);
        assert_eq!(updated.decision.version, 2);
        assert_eq!(updated.decision.title, "Move abroad");
    }

    #[tokio::test]
    async fn validation_fails_before_the_store_is_touched() {
        let store = MemoryStore::new();
        let err = upsert(&store, &alice(), &data("   "), &args(&[1]), None)
            .await
            .unwrap_err();
        assert!(matches!(err, SaveError::Validation(ValidationError::EmptyTitle)));
        assert!(store.is_empty().unwrap());
    }

    #[tokio::test]
    async fn stale_version_is_an_optimistic_lock_conflict() {
        let store = MemoryStore::new();
        let created = upsert(&store, &alice(), &data("Move"), &args(&[]), None)
            .await
            .unwrap();
        upsert(&store, &alice(), &data("Move"), &args(&[1]), Some(&created.record()))
            .await
            .unwrap();

        let err = upsert(&store, &alice(), &data("Move"), &args(&[2]), Some(&created.record()))
            .await
            .unwrap_err();
        assert_eq!(
            err.conflict(),
            Some(&Conflict::OptimisticLock(OptimisticLockError {
                decision_id: created.decision.id.clone(),
                expected_version: 1,
                actual_version: 2,
            }))
        );
    }

    #[tokio::test]
    async fn duplicate_title_reports_the_holder() {
        let db = test_db().await;
        let first = upsert(&db, &alice(), &data("Move"), &args(&[]), None)
            .await
            .unwrap();
        let err = upsert(&db, &alice(), &data("Move"), &args(&[3]), None)
            .await
            .unwrap_err();
        assert_eq!(
            err.conflict(),
            Some(&Conflict::DuplicateTitle(DuplicateTitleError {
                existing_id: Some(first.decision.id),
                conflicting_title: "Move".into(),
            }))
        );
    }

    #[tokio::test]
    async fn same_title_for_another_user_is_fine() {
        let store = MemoryStore::new();
        upsert(&store, &alice(), &data("Move"), &args(&[]), None)
            .await
            .unwrap();
        let bob = upsert(&store, &UserIdentity::new("bob"), &data("Move"), &args(&[]), None)
            .await
            .unwrap();
        assert!(bob.is_new);
    }

    #[tokio::test]
    async fn missing_record_is_a_store_error() {
        let store = MemoryStore::new();
        let err = upsert(
            &store,
            &alice(),
            &data("Move"),
            &args(&[]),
            Some(&ExistingRecord::new("dec-missing", 1)),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), SaveErrorKind::Store);
    }
}
