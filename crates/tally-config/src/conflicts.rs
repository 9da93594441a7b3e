//! Conflict resolution limits.

use serde::{Deserialize, Serialize};

const fn default_max_lock_retries() -> u32 {
    1
}

const fn default_max_title_attempts() -> u32 {
    10
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConflictConfig {
    /// Automatic retries after a version mismatch before the conflict is surfaced.
    #[serde(default = "default_max_lock_retries")]
    pub max_lock_retries: u32,

    /// Alternative titles tried after a duplicate-title rejection before giving up.
    #[serde(default = "default_max_title_attempts")]
    pub max_title_attempts: u32,
}

impl Default for ConflictConfig {
    fn default() -> Self {
        Self {
            max_lock_retries: default_max_lock_retries(),
            max_title_attempts: default_max_title_attempts(),
        }
    }
}
