//! Bounds for user-editable fields and the `Weight` value type.
//!
//! Everything here runs at the editing boundary: out-of-range values are
//! rejected before they enter a draft, so stores never see them.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

pub const MAX_TITLE_CHARS: usize = 100;
pub const MAX_DESCRIPTION_CHARS: usize = 1000;
pub const MAX_ARGUMENT_TEXT_CHARS: usize = 500;
pub const MIN_WEIGHT: i8 = -10;
pub const MAX_WEIGHT: i8 = 10;

/// Integer weight of an argument, always within `[-10, 10]`.
///
/// Positive weights argue for the decision, negative weights against it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(try_from = "i64", into = "i64")]
pub struct Weight(i8);

impl Weight {
    /// Build a weight, rejecting anything outside `[-10, 10]`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::WeightOutOfRange` for out-of-range values.
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if (i64::from(MIN_WEIGHT)..=i64::from(MAX_WEIGHT)).contains(&value) {
            // Range check above guarantees the cast is lossless.
            #[allow(clippy::cast_possible_truncation)]
            Ok(Self(value as i8))
        } else {
            Err(ValidationError::WeightOutOfRange(value))
        }
    }

    /// Parse user input such as `"+8"`, `"-3"` or `"0"`.
    ///
    /// # Errors
    ///
    /// Returns `WeightNotInteger` for non-integer text (including `"2.5"`)
    /// and `WeightOutOfRange` for integers outside the bounds.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        let value = trimmed
            .parse::<i64>()
            .map_err(|_| ValidationError::WeightNotInteger(trimmed.to_string()))?;
        Self::new(value)
    }

    #[must_use]
    pub const fn get(self) -> i8 {
        self.0
    }
}

impl TryFrom<i64> for Weight {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Weight> for i64 {
    fn from(weight: Weight) -> Self {
        Self::from(weight.0)
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+}", self.0)
    }
}

/// Validate a decision title: required after trimming, at most 100 characters.
///
/// # Errors
///
/// Returns `EmptyTitle` or `TitleTooLong`.
pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    let len = title.chars().count();
    if len > MAX_TITLE_CHARS {
        return Err(ValidationError::TitleTooLong { len });
    }
    Ok(())
}

/// Validate an optional description (0..=1000 characters).
///
/// # Errors
///
/// Returns `DescriptionTooLong`.
pub fn validate_description(description: Option<&str>) -> Result<(), ValidationError> {
    let len = description.map_or(0, |d| d.chars().count());
    if len > MAX_DESCRIPTION_CHARS {
        return Err(ValidationError::DescriptionTooLong { len });
    }
    Ok(())
}

/// Validate argument text (1..=500 characters, not blank).
///
/// # Errors
///
/// Returns `EmptyArgument` or `ArgumentTooLong`.
pub fn validate_argument_text(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::EmptyArgument);
    }
    let len = text.chars().count();
    if len > MAX_ARGUMENT_TEXT_CHARS {
        return Err(ValidationError::ArgumentTooLong { len });
    }
    Ok(())
}
