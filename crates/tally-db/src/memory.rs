//! In-process decision store.
//!
//! Same observable semantics as [`crate::TallyDb`]: per-user unique titles,
//! version-guarded updates, atomic argument replacement, cascading delete,
//! and the same error shapes so the conflict classifier treats both alike.
//! Used by previews that must not touch disk and by tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use tally_core::draft::{ArgumentInput, DecisionData};
use tally_core::entities::{Argument, Decision};
use tally_core::ids::{PREFIX_ARGUMENT, PREFIX_DECISION, format_id};
use tally_core::scoring::score;

use crate::error::DatabaseError;
use crate::store::{DecisionStore, duplicate_title_message};

#[derive(Debug, Default)]
struct Tables {
    decisions: BTreeMap<String, Decision>,
    next_id: u32,
}

impl Tables {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id = self.next_id.wrapping_add(1);
        format_id(prefix, self.next_id)
    }

    fn title_taken(&self, user_id: &str, title: &str, except_id: Option<&str>) -> bool {
        self.decisions
            .values()
            .any(|d| d.user_id == user_id && d.title == title && Some(d.id.as_str()) != except_id)
    }

    fn build_arguments(
        &mut self,
        arguments: &[ArgumentInput],
        previous: &[Argument],
        now: DateTime<Utc>,
    ) -> Vec<Argument> {
        let created: HashMap<&str, DateTime<Utc>> = previous
            .iter()
            .map(|a| (a.text.as_str(), a.created_at))
            .collect();
        arguments
            .iter()
            .map(|input| Argument {
                id: self.next_id(PREFIX_ARGUMENT),
                text: input.text.clone(),
                weight: input.weight,
                created_at: created.get(input.text.as_str()).copied().unwrap_or(now),
                updated_at: now,
            })
            .collect()
    }
}

/// Thread-safe in-memory [`DecisionStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Tables>, DatabaseError> {
        self.tables
            .lock()
            .map_err(|_| DatabaseError::InvalidState("memory store lock poisoned".into()))
    }

    /// Number of stored decisions (all users).
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::InvalidState` if the lock is poisoned.
    pub fn len(&self) -> Result<usize, DatabaseError> {
        Ok(self.lock()?.decisions.len())
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::InvalidState` if the lock is poisoned.
    pub fn is_empty(&self) -> Result<bool, DatabaseError> {
        Ok(self.len()? == 0)
    }
}

impl DecisionStore for MemoryStore {
    async fn create_decision(
        &self,
        user_id: &str,
        data: &DecisionData,
        arguments: &[ArgumentInput],
    ) -> Result<Decision, DatabaseError> {
        let mut tables = self.lock()?;
        if tables.title_taken(user_id, &data.title, None) {
            return Err(DatabaseError::Constraint(duplicate_title_message()));
        }
        let now = Utc::now();
        let id = tables.next_id(PREFIX_DECISION);
        let decision = Decision {
            id: id.clone(),
            user_id: user_id.to_string(),
            title: data.title.clone(),
            description: data.normalized_description().map(String::from),
            arguments: tables.build_arguments(arguments, &[], now),
            version: 1,
            score: score(arguments).snapshot(),
            created_at: now,
            updated_at: now,
        };
        tables.decisions.insert(id, decision.clone());
        Ok(decision)
    }

    async fn update_decision_with_version(
        &self,
        user_id: &str,
        id: &str,
        expected_version: i64,
        data: &DecisionData,
        arguments: &[ArgumentInput],
    ) -> Result<Decision, DatabaseError> {
        let mut tables = self.lock()?;
        let current = tables
            .decisions
            .get(id)
            .filter(|d| d.user_id == user_id)
            .ok_or(DatabaseError::NoResult)?;
        if current.version != expected_version {
            return Err(DatabaseError::VersionMismatch {
                id: id.to_string(),
                expected: expected_version,
                actual: current.version,
            });
        }
        if tables.title_taken(user_id, &data.title, Some(id)) {
            return Err(DatabaseError::Constraint(duplicate_title_message()));
        }

        let previous = current.arguments.clone();
        let now = Utc::now();
        let new_arguments = tables.build_arguments(arguments, &previous, now);
        let decision = tables
            .decisions
            .get_mut(id)
            .ok_or(DatabaseError::NoResult)?;
        decision.title.clone_from(&data.title);
        decision.description = data.normalized_description().map(String::from);
        decision.arguments = new_arguments;
        decision.version += 1;
        decision.score = score(arguments).snapshot();
        decision.updated_at = now;
        Ok(decision.clone())
    }

    async fn replace_arguments(
        &self,
        decision_id: &str,
        arguments: &[ArgumentInput],
    ) -> Result<Vec<Argument>, DatabaseError> {
        let mut tables = self.lock()?;
        let previous = tables
            .decisions
            .get(decision_id)
            .ok_or(DatabaseError::NoResult)?
            .arguments
            .clone();
        let now = Utc::now();
        let new_arguments = tables.build_arguments(arguments, &previous, now);
        let decision = tables
            .decisions
            .get_mut(decision_id)
            .ok_or(DatabaseError::NoResult)?;
        decision.arguments.clone_from(&new_arguments);
        decision.version += 1;
        decision.score = score(arguments).snapshot();
        decision.updated_at = now;
        Ok(new_arguments)
    }

    async fn delete_decision_cascading(&self, id: &str) -> Result<(), DatabaseError> {
        self.lock()?
            .decisions
            .remove(id)
            .map(|_| ())
            .ok_or(DatabaseError::NoResult)
    }

    async fn find_by_user_and_title(
        &self,
        user_id: &str,
        title: &str,
    ) -> Result<Option<Decision>, DatabaseError> {
        Ok(self
            .lock()?
            .decisions
            .values()
            .find(|d| d.user_id == user_id && d.title == title)
            .cloned())
    }

    async fn get_decision(&self, id: &str) -> Result<Decision, DatabaseError> {
        self.lock()?
            .decisions
            .get(id)
            .cloned()
            .ok_or(DatabaseError::NoResult)
    }

    async fn list_decisions(&self, user_id: &str, limit: u32) -> Result<Vec<Decision>, DatabaseError> {
        let tables = self.lock()?;
        let mut decisions: Vec<Decision> = tables
            .decisions
            .values()
            .filter(|d| d.user_id == user_id)
            .cloned()
            .collect();
        decisions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
        decisions.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(decisions)
    }
}
