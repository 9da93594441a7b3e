use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::draft::{DecisionData, DraftSnapshot};
use crate::entities::Argument;
use crate::enums::Recommendation;

/// Score columns persisted alongside a decision.
///
/// Always computed by [`crate::scoring::score`] at write time, never edited
/// directly. Kept so list views can show a recommendation without loading
/// every argument.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ScoreSnapshot {
    pub positive_score: u32,
    pub negative_score: u32,
    pub recommendation: Recommendation,
}

/// A persisted decision with its ordered argument list.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Decision {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub arguments: Vec<Argument>,
    /// Optimistic concurrency token. Starts at 1 and grows by one per write.
    pub version: i64,
    pub score: ScoreSnapshot,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Decision {
    #[must_use]
    pub fn data(&self) -> DecisionData {
        DecisionData {
            title: self.title.clone(),
            description: self.description.clone(),
        }
    }

    /// The observable fields as a draft snapshot, for change detection.
    #[must_use]
    pub fn snapshot(&self) -> DraftSnapshot {
        DraftSnapshot {
            data: self.data(),
            arguments: self.arguments.iter().map(Argument::to_input).collect(),
        }
    }
}
