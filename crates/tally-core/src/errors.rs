//! Cross-cutting error types for Tally.
//!
//! Domain-specific errors (e.g., `DatabaseError`, `SaveError`) are defined in
//! their respective crates. `ValidationError` lives here because every layer
//! that accepts user input has to produce it before anything reaches a store.

use thiserror::Error;

use crate::validation::{
    MAX_ARGUMENT_TEXT_CHARS, MAX_DESCRIPTION_CHARS, MAX_TITLE_CHARS, MAX_WEIGHT, MIN_WEIGHT,
};

/// A bounded field was rejected at the editing boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Title is required")]
    EmptyTitle,

    #[error("Title is {len} characters long (max {MAX_TITLE_CHARS})")]
    TitleTooLong { len: usize },

    #[error("Description is {len} characters long (max {MAX_DESCRIPTION_CHARS})")]
    DescriptionTooLong { len: usize },

    #[error("Argument text is required")]
    EmptyArgument,

    #[error("Argument text is {len} characters long (max {MAX_ARGUMENT_TEXT_CHARS})")]
    ArgumentTooLong { len: usize },

    #[error("Weight {0} is outside [{MIN_WEIGHT}, {MAX_WEIGHT}]")]
    WeightOutOfRange(i64),

    #[error("Weight '{0}' is not an integer")]
    WeightNotInteger(String),
}

/// Errors that can be raised by any Tally crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Entity lookup returned no result.
    #[error("Entity not found: {entity_type} {id}")]
    NotFound { entity_type: String, id: String },

    /// Data failed validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
