//! Conflict taxonomy and the classifier that maps store errors onto it.
//!
//! Downstream code branches on the *kind* of failure, so [`classify`] is
//! total: every `DatabaseError` maps to exactly one `SaveError` variant.

use std::fmt;

use serde::{Deserialize, Serialize};
use tally_core::errors::ValidationError;
use thiserror::Error;

use crate::error::DatabaseError;
use crate::store::DUPLICATE_TITLE_CONSTRAINT;

/// The stored version moved on since the caller last read it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "Decision {decision_id} was modified elsewhere (expected version {expected_version}, found {actual_version})"
)]
pub struct OptimisticLockError {
    pub decision_id: String,
    pub expected_version: i64,
    pub actual_version: i64,
}

/// The owner already has a decision with this title.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("A decision titled '{conflicting_title}' already exists")]
pub struct DuplicateTitleError {
    /// ID of the decision holding the title, when it could be looked up.
    pub existing_id: Option<String>,
    pub conflicting_title: String,
}

/// Recoverable conflicts, handed to a resolution policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Conflict {
    #[error(transparent)]
    OptimisticLock(#[from] OptimisticLockError),
    #[error(transparent)]
    DuplicateTitle(#[from] DuplicateTitleError),
}

/// Outcome of a failed save, as seen by callers.
#[derive(Debug, Error)]
pub enum SaveError {
    /// Input was out of bounds. Never reaches the store.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Conflict(#[from] Conflict),

    /// Anything else the store reported (including transport failures).
    #[error("Store error: {0}")]
    Store(#[source] DatabaseError),
}

/// Cloneable discriminant of [`SaveError`], for status reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveErrorKind {
    Validation,
    OptimisticLock,
    DuplicateTitle,
    Store,
}

impl SaveErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::OptimisticLock => "optimistic_lock",
            Self::DuplicateTitle => "duplicate_title",
            Self::Store => "store",
        }
    }
}

impl fmt::Display for SaveErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SaveError {
    #[must_use]
    pub const fn kind(&self) -> SaveErrorKind {
        match self {
            Self::Validation(_) => SaveErrorKind::Validation,
            Self::Conflict(Conflict::OptimisticLock(_)) => SaveErrorKind::OptimisticLock,
            Self::Conflict(Conflict::DuplicateTitle(_)) => SaveErrorKind::DuplicateTitle,
            Self::Store(_) => SaveErrorKind::Store,
        }
    }

    #[must_use]
    pub const fn conflict(&self) -> Option<&Conflict> {
        match self {
            Self::Conflict(c) => Some(c),
            _ => None,
        }
    }

    /// Only transport-level store failures are retried with backoff.
    /// Conflicts go to a resolution policy instead.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_transient())
    }
}

/// What the classifier knows about the write that failed.
#[derive(Debug, Clone, Copy)]
pub struct ClassifyContext<'a> {
    /// Title the write tried to store.
    pub title: &'a str,
}

/// Map a store error onto the conflict taxonomy.
///
/// - unique violation on `(user_id, title)` → `DuplicateTitle`
/// - `VersionMismatch` from the compare-and-swap update → `OptimisticLock`
/// - everything else → `Store`
///
/// Never returns `SaveError::Validation`.
#[must_use]
pub fn classify(error: DatabaseError, ctx: &ClassifyContext<'_>) -> SaveError {
    match error {
        DatabaseError::VersionMismatch {
            id,
            expected,
            actual,
        } => Conflict::OptimisticLock(OptimisticLockError {
            decision_id: id,
            expected_version: expected,
            actual_version: actual,
        })
        .into(),
        e if is_duplicate_title_violation(&e) => Conflict::DuplicateTitle(DuplicateTitleError {
            existing_id: None,
            conflicting_title: ctx.title.to_string(),
        })
        .into(),
        e => SaveError::Store(e),
    }
}

/// Recognize the `(user_id, title)` unique violation in any error shape
/// that carries `SQLite`'s message.
#[must_use]
pub fn is_duplicate_title_violation(error: &DatabaseError) -> bool {
    let msg = match error {
        DatabaseError::Constraint(msg) | DatabaseError::Query(msg) => msg.clone(),
        DatabaseError::LibSql(e) => e.to_string(),
        _ => return false,
    };
    msg.contains("UNIQUE constraint failed") && msg.contains(DUPLICATE_TITLE_CONSTRAINT)
}
