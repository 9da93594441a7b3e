//! Background auto-save configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Quiet period after the last edit before a save fires.
const fn default_debounce_ms() -> u64 {
    1000
}

const fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AutoSaveConfig {
    /// Whether edits are persisted in the background at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Debounce window in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for AutoSaveConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl AutoSaveConfig {
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
