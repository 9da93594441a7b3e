//! Entity structs for persisted Tally objects.
//!
//! Each entity maps to a table in the libSQL database (`decisions`, `arguments`).
//! All structs derive `Serialize`, `Deserialize`, and `JsonSchema` for JSON
//! output and schema validation.

mod argument;
mod decision;

pub use argument::Argument;
pub use decision::{Decision, ScoreSnapshot};
