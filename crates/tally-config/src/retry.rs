//! Transport retry configuration.

use serde::{Deserialize, Serialize};

/// Initial attempt plus one retry.
const fn default_transport_max_attempts() -> u32 {
    2
}

const fn default_base_delay_ms() -> u64 {
    100
}

const fn default_max_delay_ms() -> u64 {
    2000
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrySettings {
    /// Maximum attempts for a store call failing with a non-conflict error
    /// (including the initial one).
    #[serde(default = "default_transport_max_attempts")]
    pub transport_max_attempts: u32,

    /// Delay before the first retry; doubles on every further retry.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Upper bound for the backoff delay.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            transport_max_attempts: default_transport_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}
