//! The store interface the persistence core is written against.
//!
//! Implemented by [`crate::TallyDb`] (libSQL) and [`crate::memory::MemoryStore`].
//! Every write that touches both a decision and its arguments is atomic: a
//! failed write leaves neither the decision fields nor the argument set
//! partially applied.

use std::future::Future;

use tally_core::draft::{ArgumentInput, DecisionData};
use tally_core::entities::{Argument, Decision};

use crate::error::DatabaseError;

/// Unique constraint name reported when a user already has a decision with
/// the same title, in `SQLite`'s message format.
pub const DUPLICATE_TITLE_CONSTRAINT: &str = "decisions.user_id, decisions.title";

pub trait DecisionStore: Send + Sync {
    /// Insert a decision (version 1) together with its arguments.
    fn create_decision(
        &self,
        user_id: &str,
        data: &DecisionData,
        arguments: &[ArgumentInput],
    ) -> impl Future<Output = Result<Decision, DatabaseError>> + Send;

    /// Overwrite title, description, and the full argument set, but only if
    /// the stored version equals `expected_version`. Bumps the version.
    ///
    /// Fails with [`DatabaseError::VersionMismatch`] without writing anything
    /// when the versions differ.
    fn update_decision_with_version(
        &self,
        user_id: &str,
        id: &str,
        expected_version: i64,
        data: &DecisionData,
        arguments: &[ArgumentInput],
    ) -> impl Future<Output = Result<Decision, DatabaseError>> + Send;

    /// Replace the argument set of a decision, refreshing its score snapshot
    /// and bumping its version.
    fn replace_arguments(
        &self,
        decision_id: &str,
        arguments: &[ArgumentInput],
    ) -> impl Future<Output = Result<Vec<Argument>, DatabaseError>> + Send;

    /// Delete a decision and all of its arguments in one step.
    fn delete_decision_cascading(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<(), DatabaseError>> + Send;

    fn find_by_user_and_title(
        &self,
        user_id: &str,
        title: &str,
    ) -> impl Future<Output = Result<Option<Decision>, DatabaseError>> + Send;

    fn get_decision(&self, id: &str) -> impl Future<Output = Result<Decision, DatabaseError>> + Send;

    /// Most recently updated first.
    fn list_decisions(
        &self,
        user_id: &str,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<Decision>, DatabaseError>> + Send;
}

/// Message used for duplicate-title rejections, identical to `SQLite`'s.
#[must_use]
pub fn duplicate_title_message() -> String {
    format!("UNIQUE constraint failed: {DUPLICATE_TITLE_CONSTRAINT}")
}
