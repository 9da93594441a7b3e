use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::draft::ArgumentInput;
use crate::validation::Weight;

/// A weighted pro (positive weight) or con (negative weight), owned by one decision.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Argument {
    pub id: String,
    pub text: String,
    pub weight: Weight,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Argument {
    /// The editable part of this argument, as held in drafts.
    #[must_use]
    pub fn to_input(&self) -> ArgumentInput {
        ArgumentInput {
            text: self.text.clone(),
            weight: self.weight,
        }
    }
}
