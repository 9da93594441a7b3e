//! Conflict resolution policies.
//!
//! A policy looks at one classified [`Conflict`] and says whether to try
//! again and with which title. The loop that acts on the answer is shared:
//! see [`crate::persist::persist_with_policy`].

use chrono::Local;
use tally_config::ConflictConfig;
use tally_db::conflict::{Conflict, DuplicateTitleError, OptimisticLockError};

use crate::titles::{numbered_title, suggest_titles};

/// What to do about a conflict.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub should_retry: bool,
    /// Title to use on the retry instead of the conflicting one.
    pub replacement_title: Option<String>,
}

impl Resolution {
    /// Surface the conflict.
    #[must_use]
    pub const fn give_up() -> Self {
        Self {
            should_retry: false,
            replacement_title: None,
        }
    }

    /// Retry unchanged (the loop picks up the store's current version).
    #[must_use]
    pub const fn retry() -> Self {
        Self {
            should_retry: true,
            replacement_title: None,
        }
    }

    #[must_use]
    pub fn rename(title: impl Into<String>) -> Self {
        Self {
            should_retry: true,
            replacement_title: Some(title.into()),
        }
    }
}

pub trait ConflictPolicy: Send + Sync {
    /// Decide on `conflict`. `attempt` counts conflicts of the same kind seen
    /// during one save, starting at 1.
    fn resolve(&self, conflict: &Conflict, attempt: u32) -> Resolution;
}

/// Background policy: never asks, never blocks.
///
/// - optimistic lock: retry up to `max_lock_retries` times
/// - duplicate title: retry as `"Title (n)"`, `n = attempt + 1`, up to
///   `max_title_attempts` times. When that is the conflicting title itself
///   (`"Version (2)"` on the first attempt), `n` moves one further.
#[derive(Debug, Clone)]
pub struct SilentPolicy {
    pub max_lock_retries: u32,
    pub max_title_attempts: u32,
}

impl Default for SilentPolicy {
    fn default() -> Self {
        Self::from(&ConflictConfig::default())
    }
}

impl From<&ConflictConfig> for SilentPolicy {
    fn from(config: &ConflictConfig) -> Self {
        Self {
            max_lock_retries: config.max_lock_retries,
            max_title_attempts: config.max_title_attempts,
        }
    }
}

impl ConflictPolicy for SilentPolicy {
    fn resolve(&self, conflict: &Conflict, attempt: u32) -> Resolution {
        match conflict {
            Conflict::OptimisticLock(_) if attempt <= self.max_lock_retries => Resolution::retry(),
            Conflict::DuplicateTitle(dup) if attempt <= self.max_title_attempts => {
                let title = &dup.conflicting_title;
                let candidate = numbered_title(title, attempt + 1);
                if candidate == *title {
                    Resolution::rename(numbered_title(title, attempt + 2))
                } else {
                    Resolution::rename(candidate)
                }
            }
            _ => Resolution::give_up(),
        }
    }
}

/// User-facing side of [`InteractivePolicy`].
pub trait ConflictPrompt: Send + Sync {
    /// Show a notification about a conflict.
    fn notify(&self, message: &str);

    /// Ask whether to overwrite the newer stored version.
    fn confirm_retry(&self, conflict: &OptimisticLockError) -> bool;

    /// Let the user pick one of `suggestions` (or type another title).
    /// `None` abandons the save.
    fn choose_title(&self, conflict: &DuplicateTitleError, suggestions: &[String]) -> Option<String>;
}

/// Policy for explicit saves: every conflict is shown to the user, who
/// confirms lock retries and picks replacement titles.
#[derive(Debug, Clone)]
pub struct InteractivePolicy<P> {
    prompt: P,
    max_lock_retries: u32,
    max_title_attempts: u32,
}

impl<P: ConflictPrompt> InteractivePolicy<P> {
    pub fn new(prompt: P, config: &ConflictConfig) -> Self {
        Self {
            prompt,
            max_lock_retries: config.max_lock_retries,
            max_title_attempts: config.max_title_attempts,
        }
    }

    pub const fn prompt(&self) -> &P {
        &self.prompt
    }
}

impl<P: ConflictPrompt> ConflictPolicy for InteractivePolicy<P> {
    fn resolve(&self, conflict: &Conflict, attempt: u32) -> Resolution {
        self.prompt.notify(&conflict.to_string());
        match conflict {
            Conflict::OptimisticLock(lock) => {
                if attempt <= self.max_lock_retries && self.prompt.confirm_retry(lock) {
                    Resolution::retry()
                } else {
                    Resolution::give_up()
                }
            }
            Conflict::DuplicateTitle(dup) => {
                if attempt > self.max_title_attempts {
                    return Resolution::give_up();
                }
                let suggestions = suggest_titles(&dup.conflicting_title, Local::now().naive_local());
                self.prompt
                    .choose_title(dup, &suggestions)
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .map_or_else(Resolution::give_up, Resolution::rename)
            }
        }
    }
}
