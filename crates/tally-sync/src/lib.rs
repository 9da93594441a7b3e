//! # tally-sync
//!
//! Continuous persistence of an open decision draft.
//!
//! - [`debounce::Debouncer`]: trailing-edge debounce on the tokio timer
//! - [`policy`]: silent and interactive conflict resolution
//! - [`persist::persist_with_policy`]: the save loop both policies run through
//! - [`autosave::AutoSaver`]: debounced, single-flight background saving
//! - [`titles`]: replacement titles for duplicate-title conflicts

pub mod autosave;
pub mod debounce;
pub mod draft_cell;
pub mod persist;
pub mod policy;
pub mod titles;

#[cfg(test)]
mod test_support;

pub use autosave::{AutoSaveHandle, AutoSaveSettings, AutoSaveStatus, AutoSaver, ChangeOutcome};
pub use draft_cell::DraftCell;
pub use persist::{Persisted, persist_with_policy};
pub use policy::{ConflictPolicy, ConflictPrompt, InteractivePolicy, Resolution, SilentPolicy};
