//! Draft values and the change detector.
//!
//! A draft is whatever the user is currently editing. It carries no IDs and
//! no version: those belong to the persisted record and are tracked by the
//! auto-save orchestrator, not by the editing surface.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;
use crate::validation::{validate_argument_text, validate_description, validate_title, Weight};

/// The editable part of an argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct ArgumentInput {
    pub text: String,
    pub weight: Weight,
}

impl ArgumentInput {
    /// Build a validated argument from raw text and an integer weight.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the text or weight is out of bounds.
    pub fn new(text: impl Into<String>, weight: i64) -> Result<Self, ValidationError> {
        let text = text.into();
        validate_argument_text(&text)?;
        Ok(Self {
            text,
            weight: Weight::new(weight)?,
        })
    }

    /// Re-check bounds (inputs can be constructed field by field).
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the text is out of bounds.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_argument_text(&self.text)
    }
}

/// Title and description of a decision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DecisionData {
    pub title: String,
    pub description: Option<String>,
}

impl DecisionData {
    #[must_use]
    pub fn new(title: impl Into<String>, description: Option<String>) -> Self {
        Self {
            title: title.into(),
            description,
        }
    }

    /// # Errors
    ///
    /// Returns `ValidationError` if the title or description is out of bounds.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_title(&self.title)?;
        validate_description(self.description.as_deref())
    }

    /// Description with `Some("")` folded into `None`.
    #[must_use]
    pub fn normalized_description(&self) -> Option<&str> {
        self.description.as_deref().filter(|d| !d.is_empty())
    }
}

/// Observable state of a draft at one instant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DraftSnapshot {
    pub data: DecisionData,
    pub arguments: Vec<ArgumentInput>,
}

impl DraftSnapshot {
    #[must_use]
    pub fn new(data: DecisionData, arguments: Vec<ArgumentInput>) -> Self {
        Self { data, arguments }
    }

    /// Auto-save only starts once the draft has a non-blank title.
    #[must_use]
    pub fn has_title(&self) -> bool {
        !self.data.title.trim().is_empty()
    }

    /// # Errors
    ///
    /// Returns the first `ValidationError` found in the data or arguments.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.data.validate()?;
        self.arguments.iter().try_for_each(ArgumentInput::validate)
    }
}

/// Whether `current` differs from the last persisted snapshot.
///
/// Compares title, description (empty and absent are equal), and the ordered
/// argument list by value. A draft that was never persisted always counts as
/// changed.
#[must_use]
pub fn has_changed(last_persisted: Option<&DraftSnapshot>, current: &DraftSnapshot) -> bool {
    let Some(last) = last_persisted else {
        return true;
    };
    last.data.title != current.data.title
        || last.data.normalized_description() != current.data.normalized_description()
        || last.arguments != current.arguments
}
