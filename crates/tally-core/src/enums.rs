//! Enums shared across Tally crates.
//!
//! All enums use `snake_case` serialization and expose `as_str()` for the
//! string stored in SQL columns.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Recommendation
// ---------------------------------------------------------------------------

/// Outcome of the 2:1 score-ratio rule.
///
/// ```text
/// ratio >= 2    → favorable
/// ratio <= 0.5  → defavorable
/// otherwise     → incertain
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Favorable,
    Defavorable,
    Incertain,
}

impl Recommendation {
    /// Return the string representation used in SQL storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Favorable => "favorable",
            Self::Defavorable => "defavorable",
            Self::Incertain => "incertain",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SavePhase
// ---------------------------------------------------------------------------

/// Phase of the auto-save state machine for one attached draft.
///
/// ```text
/// idle → pending_change → saving → idle
///                               → conflict_resolving → retrying → saving
///                                                    → idle (surfaced)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SavePhase {
    #[default]
    Idle,
    PendingChange,
    Saving,
    ConflictResolving,
    Retrying,
}

impl SavePhase {
    /// Whether a store round trip is in flight or about to be.
    #[must_use]
    pub const fn is_saving(self) -> bool {
        matches!(self, Self::Saving | Self::ConflictResolving | Self::Retrying)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::PendingChange => "pending_change",
            Self::Saving => "saving",
            Self::ConflictResolving => "conflict_resolving",
            Self::Retrying => "retrying",
        }
    }
}

impl fmt::Display for SavePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recommendation_serializes_snake_case() {
        let json = serde_json::to_string(&Recommendation::Defavorable).unwrap();
        assert_eq!(json, "\"defavorable\"");
        let back: Recommendation = serde_json::from_str("\"incertain\"").unwrap();
        assert_eq!(back, Recommendation::Incertain);
    }

    #[test]
    fn save_phase_saving_flags() {
        assert!(!SavePhase::Idle.is_saving());
        assert!(!SavePhase::PendingChange.is_saving());
        assert!(SavePhase::Saving.is_saving());
        assert!(SavePhase::ConflictResolving.is_saving());
        assert!(SavePhase::Retrying.is_saving());
        assert_eq!(SavePhase::ConflictResolving.to_string(), "conflict_resolving");
    }
}
