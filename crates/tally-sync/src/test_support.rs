//! Shared fixtures for tally-sync unit tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use tally_core::draft::{ArgumentInput, DecisionData, DraftSnapshot};
use tally_core::entities::{Argument, Decision};
use tally_db::conflict::{DuplicateTitleError, OptimisticLockError};
use tally_db::error::DatabaseError;
use tally_db::memory::MemoryStore;
use tally_db::store::DecisionStore;
use tokio::sync::Semaphore;

use crate::policy::ConflictPrompt;

/// Draft titled `title` with one argument per weight.
pub fn snapshot(title: &str, weights: &[i64]) -> DraftSnapshot {
    DraftSnapshot::new(
        DecisionData::new(title, None),
        weights
            .iter()
            .enumerate()
            .map(|(i, w)| ArgumentInput::new(format!("argument {i}"), *w).unwrap())
            .collect(),
    )
}

/// Prompt with canned answers that records what it was shown.
#[derive(Default)]
pub struct ScriptedPrompt {
    confirm: bool,
    pick: Option<usize>,
    notifications: Mutex<Vec<String>>,
    offered: Mutex<Vec<String>>,
}

impl ScriptedPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn confirm(mut self, answer: bool) -> Self {
        self.confirm = answer;
        self
    }

    pub fn pick(mut self, index: usize) -> Self {
        self.pick = Some(index);
        self
    }

    pub fn notifications(&self) -> Vec<String> {
        self.notifications.lock().unwrap().clone()
    }

    pub fn offered(&self) -> Vec<String> {
        self.offered.lock().unwrap().clone()
    }
}

impl ConflictPrompt for ScriptedPrompt {
    fn notify(&self, message: &str) {
        self.notifications.lock().unwrap().push(message.to_string());
    }

    fn confirm_retry(&self, _conflict: &OptimisticLockError) -> bool {
        self.confirm
    }

    fn choose_title(&self, _conflict: &DuplicateTitleError, suggestions: &[String]) -> Option<String> {
        self.offered.lock().unwrap().extend_from_slice(suggestions);
        self.pick.and_then(|i| suggestions.get(i).cloned())
    }
}

/// [`MemoryStore`] wrapper that can fail or hold back writes.
///
/// Writes are `create_decision` and `update_decision_with_version`.
pub struct FlakyStore {
    inner: MemoryStore,
    failures_left: AtomicU32,
    write_calls: AtomicU32,
    gate: Option<Semaphore>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            failures_left: AtomicU32::new(0),
            write_calls: AtomicU32::new(0),
            gate: None,
        }
    }

    /// The first `n` writes fail with a transport error.
    pub fn failing_writes(n: u32) -> Self {
        let store = Self::new();
        store.failures_left.store(n, Ordering::SeqCst);
        store
    }

    /// Every write waits for a permit from [`Self::release`].
    pub fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::new()
        }
    }

    pub fn release(&self, writes: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(writes);
        }
    }

    pub fn write_calls(&self) -> u32 {
        self.write_calls.load(Ordering::SeqCst)
    }

    pub const fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    async fn before_write(&self) -> Result<(), DatabaseError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        let failed = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            Err(DatabaseError::Query("connection reset by peer".into()))
        } else {
            Ok(())
        }
    }
}

impl DecisionStore for FlakyStore {
    async fn create_decision(
        &self,
        user_id: &str,
        data: &DecisionData,
        arguments: &[ArgumentInput],
    ) -> Result<Decision, DatabaseError> {
        self.before_write().await?;
        self.inner.create_decision(user_id, data, arguments).await
    }

    async fn update_decision_with_version(
        &self,
        user_id: &str,
        id: &str,
        expected_version: i64,
        data: &DecisionData,
        arguments: &[ArgumentInput],
    ) -> Result<Decision, DatabaseError> {
        self.before_write().await?;
        self.inner
            .update_decision_with_version(user_id, id, expected_version, data, arguments)
            .await
    }

    async fn replace_arguments(
        &self,
        decision_id: &str,
        arguments: &[ArgumentInput],
    ) -> Result<Vec<Argument>, DatabaseError> {
        self.inner.replace_arguments(decision_id, arguments).await
    }

    async fn delete_decision_cascading(&self, id: &str) -> Result<(), DatabaseError> {
        self.inner.delete_decision_cascading(id).await
    }

    async fn find_by_user_and_title(
        &self,
        user_id: &str,
        title: &str,
    ) -> Result<Option<Decision>, DatabaseError> {
        self.inner.find_by_user_and_title(user_id, title).await
    }

    async fn get_decision(&self, id: &str) -> Result<Decision, DatabaseError> {
        self.inner.get_decision(id).await
    }

    async fn list_decisions(&self, user_id: &str, limit: u32) -> Result<Vec<Decision>, DatabaseError> {
        self.inner.list_decisions(user_id, limit).await
    }
}
