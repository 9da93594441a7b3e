//! ID prefix constants.
//!
//! Store-assigned IDs have the form `"{prefix}-{8 hex chars}"`, e.g. `"dec-a3f8b2c1"`.

pub const PREFIX_DECISION: &str = "dec";
pub const PREFIX_ARGUMENT: &str = "arg";

pub const ALL_PREFIXES: &[&str] = &[PREFIX_DECISION, PREFIX_ARGUMENT];

/// Format an ID from a prefix and a 32-bit value (used by in-process stores).
#[must_use]
pub fn format_id(prefix: &str, value: u32) -> String {
    format!("{prefix}-{value:08x}")
}
