//! Decision repository: CRUD with version-guarded updates.
//!
//! Every write that touches arguments runs in one transaction together with
//! the decision row, and refreshes the persisted score snapshot from the
//! same scoring function previews use.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use tally_core::draft::{ArgumentInput, DecisionData};
use tally_core::entities::{Argument, Decision, ScoreSnapshot};
use tally_core::ids::{PREFIX_ARGUMENT, PREFIX_DECISION};
use tally_core::scoring::score;
use tally_core::validation::Weight;

use crate::TallyDb;
use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, get_u32, parse_datetime, parse_enum};
use crate::store::DecisionStore;

const SELECT_COLS: &str = "id, user_id, title, description, version, positive_score, \
     negative_score, recommendation, created_at, updated_at";

const ARGUMENT_COLS: &str = "id, text, weight, created_at, updated_at";

/// Decision row without its arguments.
fn row_to_decision(row: &libsql::Row) -> Result<Decision, DatabaseError> {
    Ok(Decision {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        description: get_opt_string(row, 3)?,
        version: row.get(4)?,
        score: ScoreSnapshot {
            positive_score: get_u32(row, 5)?,
            negative_score: get_u32(row, 6)?,
            recommendation: parse_enum(&row.get::<String>(7)?)?,
        },
        arguments: Vec::new(),
        created_at: parse_datetime(&row.get::<String>(8)?)?,
        updated_at: parse_datetime(&row.get::<String>(9)?)?,
    })
}

fn row_to_argument(row: &libsql::Row) -> Result<Argument, DatabaseError> {
    Ok(Argument {
        id: row.get(0)?,
        text: row.get(1)?,
        weight: Weight::new(row.get::<i64>(2)?)
            .map_err(|e| DatabaseError::InvalidState(e.to_string()))?,
        created_at: parse_datetime(&row.get::<String>(3)?)?,
        updated_at: parse_datetime(&row.get::<String>(4)?)?,
    })
}

/// Creation times of the current arguments, keyed by text, so rewording an
/// argument resets its `created_at` but a pure reorder or reweight keeps it.
async fn existing_created_at(
    conn: &libsql::Connection,
    decision_id: &str,
) -> Result<HashMap<String, DateTime<Utc>>, DatabaseError> {
    let mut rows = conn
        .query(
            "SELECT text, created_at FROM arguments WHERE decision_id = ?1",
            [decision_id],
        )
        .await?;
    let mut created = HashMap::new();
    while let Some(row) = rows.next().await? {
        created.insert(row.get::<String>(0)?, parse_datetime(&row.get::<String>(1)?)?);
    }
    Ok(created)
}

async fn insert_arguments(
    conn: &libsql::Connection,
    decision_id: &str,
    arguments: &[ArgumentInput],
    ids: Vec<String>,
    created: &HashMap<String, DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<Vec<Argument>, DatabaseError> {
    let mut written = Vec::with_capacity(arguments.len());
    for (position, (input, id)) in arguments.iter().zip(ids).enumerate() {
        let created_at = created.get(&input.text).copied().unwrap_or(now);
        let position = i64::try_from(position)
            .map_err(|_| DatabaseError::InvalidState(format!("argument position {position}")))?;
        conn.execute(
            "INSERT INTO arguments (id, decision_id, position, text, weight, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            libsql::params![
                id.as_str(),
                decision_id,
                position,
                input.text.as_str(),
                i64::from(input.weight),
                created_at.to_rfc3339(),
                now.to_rfc3339()
            ],
        )
        .await?;
        written.push(Argument {
            id,
            text: input.text.clone(),
            weight: input.weight,
            created_at,
            updated_at: now,
        });
    }
    Ok(written)
}

/// Explain why a version-guarded statement touched no row.
async fn mismatch_or_missing(
    conn: &libsql::Connection,
    user_id: &str,
    id: &str,
    expected: i64,
) -> DatabaseError {
    let lookup = async {
        let mut rows = conn
            .query(
                "SELECT version FROM decisions WHERE id = ?1 AND user_id = ?2",
                [id, user_id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok::<_, DatabaseError>(Some(row.get::<i64>(0)?)),
            None => Ok(None),
        }
    };
    match lookup.await {
        Ok(Some(actual)) => DatabaseError::VersionMismatch {
            id: id.to_string(),
            expected,
            actual,
        },
        Ok(None) => DatabaseError::NoResult,
        Err(e) => e,
    }
}

impl TallyDb {
    async fn generate_ids(&self, prefix: &str, count: usize) -> Result<Vec<String>, DatabaseError> {
        let mut ids = Vec::with_capacity(count);
        for _ in 0..count {
            ids.push(self.generate_id(prefix).await?);
        }
        Ok(ids)
    }

    async fn load_arguments(&self, decision_id: &str) -> Result<Vec<Argument>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {ARGUMENT_COLS} FROM arguments WHERE decision_id = ?1 ORDER BY position"
                ),
                [decision_id],
            )
            .await?;
        let mut arguments = Vec::new();
        while let Some(row) = rows.next().await? {
            arguments.push(row_to_argument(&row)?);
        }
        Ok(arguments)
    }

    async fn with_arguments(&self, mut decision: Decision) -> Result<Decision, DatabaseError> {
        decision.arguments = self.load_arguments(&decision.id).await?;
        Ok(decision)
    }

    /// Insert a decision at version 1 with its arguments.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` on constraint violations (including the
    /// per-user unique title) or query failures. Nothing is written then.
    pub async fn create_decision(
        &self,
        user_id: &str,
        data: &DecisionData,
        arguments: &[ArgumentInput],
    ) -> Result<Decision, DatabaseError> {
        let now = Utc::now();
        let id = self.generate_id(PREFIX_DECISION).await?;
        let argument_ids = self.generate_ids(PREFIX_ARGUMENT, arguments.len()).await?;
        let snapshot = score(arguments).snapshot();

        let _guard = self.begin().await?;
        let conn = self.conn();
        let result = async {
            conn.execute(
                &format!(
                    "INSERT INTO decisions ({SELECT_COLS})
                     VALUES (?1, ?2, ?3, ?4, 1, ?5, ?6, ?7, ?8, ?9)"
                ),
                libsql::params![
                    id.as_str(),
                    user_id,
                    data.title.as_str(),
                    data.normalized_description(),
                    i64::from(snapshot.positive_score),
                    i64::from(snapshot.negative_score),
                    snapshot.recommendation.as_str(),
                    now.to_rfc3339(),
                    now.to_rfc3339()
                ],
            )
            .await?;
            insert_arguments(conn, &id, arguments, argument_ids, &HashMap::new(), now).await
        }
        .await;
        let written = self.finish(result).await?;

        tracing::debug!(id = %id, user_id, arguments = written.len(), "created decision");
        Ok(Decision {
            id,
            user_id: user_id.to_string(),
            title: data.title.clone(),
            description: data.normalized_description().map(String::from),
            arguments: written,
            version: 1,
            score: snapshot,
            created_at: now,
            updated_at: now,
        })
    }

    /// Compare-and-swap update of a decision and its full argument set.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::VersionMismatch` if the stored version is not
    /// `expected_version`, `DatabaseError::NoResult` if the decision does not
    /// exist for this user, or the underlying error for constraint and query
    /// failures. Nothing is written in any error case.
    pub async fn update_decision_with_version(
        &self,
        user_id: &str,
        id: &str,
        expected_version: i64,
        data: &DecisionData,
        arguments: &[ArgumentInput],
    ) -> Result<Decision, DatabaseError> {
        let now = Utc::now();
        let argument_ids = self.generate_ids(PREFIX_ARGUMENT, arguments.len()).await?;
        let snapshot = score(arguments).snapshot();

        let _guard = self.begin().await?;
        let conn = self.conn();
        let result = async {
            let affected = conn
                .execute(
                    "UPDATE decisions SET title = ?1, description = ?2, version = version + 1,
                         positive_score = ?3, negative_score = ?4, recommendation = ?5,
                         updated_at = ?6
                     WHERE id = ?7 AND user_id = ?8 AND version = ?9",
                    libsql::params![
                        data.title.as_str(),
                        data.normalized_description(),
                        i64::from(snapshot.positive_score),
                        i64::from(snapshot.negative_score),
                        snapshot.recommendation.as_str(),
                        now.to_rfc3339(),
                        id,
                        user_id,
                        expected_version
                    ],
                )
                .await?;
            if affected == 0 {
                return Err(mismatch_or_missing(conn, user_id, id, expected_version).await);
            }

            let created = existing_created_at(conn, id).await?;
            conn.execute("DELETE FROM arguments WHERE decision_id = ?1", [id])
                .await?;
            let written = insert_arguments(conn, id, arguments, argument_ids, &created, now).await?;

            // Read back inside the transaction so a later writer can't leak in.
            let mut rows = conn
                .query(
                    &format!("SELECT {SELECT_COLS} FROM decisions WHERE id = ?1"),
                    [id],
                )
                .await?;
            let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
            let mut decision = row_to_decision(&row)?;
            decision.arguments = written;
            Ok(decision)
        }
        .await;
        let decision = self.finish(result).await?;

        tracing::debug!(id, version = decision.version, "updated decision");
        Ok(decision)
    }

    /// Replace only the argument set, refreshing score snapshot and version.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the decision does not exist.
    pub async fn replace_arguments(
        &self,
        decision_id: &str,
        arguments: &[ArgumentInput],
    ) -> Result<Vec<Argument>, DatabaseError> {
        let now = Utc::now();
        let argument_ids = self.generate_ids(PREFIX_ARGUMENT, arguments.len()).await?;
        let snapshot = score(arguments).snapshot();

        let _guard = self.begin().await?;
        let conn = self.conn();
        let result = async {
            let affected = conn
                .execute(
                    "UPDATE decisions SET version = version + 1, positive_score = ?1,
                         negative_score = ?2, recommendation = ?3, updated_at = ?4
                     WHERE id = ?5",
                    libsql::params![
                        i64::from(snapshot.positive_score),
                        i64::from(snapshot.negative_score),
                        snapshot.recommendation.as_str(),
                        now.to_rfc3339(),
                        decision_id
                    ],
                )
                .await?;
            if affected == 0 {
                return Err(DatabaseError::NoResult);
            }
            let created = existing_created_at(conn, decision_id).await?;
            conn.execute("DELETE FROM arguments WHERE decision_id = ?1", [decision_id])
                .await?;
            insert_arguments(conn, decision_id, arguments, argument_ids, &created, now).await
        }
        .await;
        self.finish(result).await
    }

    /// Delete a decision and its arguments atomically.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the decision does not exist.
    pub async fn delete_decision_cascading(&self, id: &str) -> Result<(), DatabaseError> {
        let _guard = self.begin().await?;
        let conn = self.conn();
        let result = async {
            conn.execute("DELETE FROM arguments WHERE decision_id = ?1", [id])
                .await?;
            let affected = conn
                .execute("DELETE FROM decisions WHERE id = ?1", [id])
                .await?;
            if affected == 0 {
                return Err(DatabaseError::NoResult);
            }
            Ok(())
        }
        .await;
        self.finish(result).await?;
        tracing::debug!(id, "deleted decision");
        Ok(())
    }

    pub async fn get_decision(&self, id: &str) -> Result<Decision, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM decisions WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        let decision = row_to_decision(&row)?;
        self.with_arguments(decision).await
    }

    pub async fn find_by_user_and_title(
        &self,
        user_id: &str,
        title: &str,
    ) -> Result<Option<Decision>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM decisions WHERE user_id = ?1 AND title = ?2"),
                [user_id, title],
            )
            .await?;
        match rows.next().await? {
            Some(row) => {
                let decision = row_to_decision(&row)?;
                Ok(Some(self.with_arguments(decision).await?))
            }
            None => Ok(None),
        }
    }

    pub async fn list_decisions(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<Decision>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM decisions WHERE user_id = ?1
                     ORDER BY updated_at DESC, id LIMIT {limit}"
                ),
                [user_id],
            )
            .await?;

        let mut headers = Vec::new();
        while let Some(row) = rows.next().await? {
            headers.push(row_to_decision(&row)?);
        }
        let mut decisions = Vec::with_capacity(headers.len());
        for decision in headers {
            decisions.push(self.with_arguments(decision).await?);
        }
        Ok(decisions)
    }
}

impl DecisionStore for TallyDb {
    async fn create_decision(
        &self,
        user_id: &str,
        data: &DecisionData,
        arguments: &[ArgumentInput],
    ) -> Result<Decision, DatabaseError> {
        Self::create_decision(self, user_id, data, arguments).await
    }

    async fn update_decision_with_version(
        &self,
        user_id: &str,
        id: &str,
        expected_version: i64,
        data: &DecisionData,
        arguments: &[ArgumentInput],
    ) -> Result<Decision, DatabaseError> {
        Self::update_decision_with_version(self, user_id, id, expected_version, data, arguments)
            .await
    }

    async fn replace_arguments(
        &self,
        decision_id: &str,
        arguments: &[ArgumentInput],
    ) -> Result<Vec<Argument>, DatabaseError> {
        Self::replace_arguments(self, decision_id, arguments).await
    }

    async fn delete_decision_cascading(&self, id: &str) -> Result<(), DatabaseError> {
        Self::delete_decision_cascading(self, id).await
    }

    async fn find_by_user_and_title(
        &self,
        user_id: &str,
        title: &str,
    ) -> Result<Option<Decision>, DatabaseError> {
        Self::find_by_user_and_title(self, user_id, title).await
    }

    async fn get_decision(&self, id: &str) -> Result<Decision, DatabaseError> {
        Self::get_decision(self, id).await
    }

    async fn list_decisions(&self, user_id: &str, limit: u32) -> Result<Vec<Decision>, DatabaseError> {
        Self::list_decisions(self, user_id, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::{args, data, test_db};
    use tally_core::enums::Recommendation;

    #[tokio::test]
    async fn create_decision_roundtrip() {
        let db = test_db().await;
        let created = db
            .create_decision("u1", &data("Move to Lyon"), &args(&[8, 6, -5, -2]))
            .await
            .unwrap();

        assert!(created.id.starts_with("dec-"));
        assert_eq!(created.version, 1);
        assert_eq!(created.score.positive_score, 14);
        assert_eq!(created.score.negative_score, 7);
        assert_eq!(created.score.recommendation, Recommendation::Favorable);

        let fetched = db.get_decision(&created.id).await.unwrap();
        assert_eq!(fetched.title, "Move to Lyon");
        assert_eq!(fetched.arguments.len(), 4);
        assert_eq!(fetched.snapshot(), created.snapshot());
        assert!(fetched.arguments.iter().all(|a| a.id.starts_with("arg-")));
    }

    #[tokio::test]
    async fn update_with_matching_version_bumps_it() {
        let db = test_db().await;
        let created = db
            .create_decision("u1", &data("Plan"), &args(&[3]))
            .await
            .unwrap();

        let updated = db
            .update_decision_with_version("u1", &created.id, 1, &data("Plan v2"), &args(&[3, -6]))
            .await
            .unwrap();
        assert_eq!(updated.version, 2);
        assert_eq!(updated.title, "Plan v2");
        assert_eq!(updated.arguments.len(), 2);
        assert_eq!(updated.score.recommendation, Recommendation::Defavorable);
        assert_eq!(updated, db.get_decision(&created.id).await.unwrap());
    }

    #[tokio::test]
    async fn racing_updates_return_exactly_what_won() {
        let db = test_db().await;
        let created = db
            .create_decision("u1", &data("Plan"), &args(&[1]))
            .await
            .unwrap();

        let (data_a, args_a) = (data("Plan A"), args(&[2]));
        let (data_b, args_b) = (data("Plan B"), args(&[3, 4]));
        let (a, b) = tokio::join!(
            db.update_decision_with_version("u1", &created.id, 1, &data_a, &args_a),
            db.update_decision_with_version("u1", &created.id, 1, &data_b, &args_b),
        );
        let (won, lost) = match (a, b) {
            (Ok(won), Err(lost)) | (Err(lost), Ok(won)) => (won, lost),
            other => panic!("expected exactly one winner, got {other:?}"),
        };
        assert!(
            matches!(lost, DatabaseError::VersionMismatch { expected: 1, actual: 2, .. }),
            "{lost}"
        );
        assert_eq!(won.version, 2);
        assert_eq!(won, db.get_decision(&created.id).await.unwrap());
    }

    #[tokio::test]
    async fn stale_version_is_rejected_without_writing() {
        let db = test_db().await;
        let created = db
            .create_decision("u1", &data("Plan"), &args(&[3]))
            .await
            .unwrap();
        db.update_decision_with_version("u1", &created.id, 1, &data("Plan"), &args(&[4]))
            .await
            .unwrap();

        let err = db
            .update_decision_with_version("u1", &created.id, 1, &data("Hijack"), &args(&[-9, -9]))
            .await
            .unwrap_err();
        assert!(
            matches!(err, DatabaseError::VersionMismatch { expected: 1, actual: 2, .. }),
            "{err}"
        );

        let stored = db.get_decision(&created.id).await.unwrap();
        assert_eq!(stored.title, "Plan");
        assert_eq!(stored.version, 2);
        assert_eq!(stored.snapshot().arguments, args(&[4]));
    }

    #[tokio::test]
    async fn duplicate_title_create_inserts_nothing() {
        let db = test_db().await;
        db.create_decision("u1", &data("Plan"), &args(&[1]))
            .await
            .unwrap();
        let err = db
            .create_decision("u1", &data("Plan"), &args(&[2, 3]))
            .await
            .unwrap_err();
        assert!(crate::conflict::is_duplicate_title_violation(&err), "{err}");

        let all = db.list_decisions("u1", 10).await.unwrap();
        assert_eq!(all.len(), 1);
        let mut rows = db
            .conn()
            .query("SELECT COUNT(*) FROM arguments", ())
            .await
            .unwrap();
        let count: i64 = rows.next().await.unwrap().unwrap().get(0).unwrap();
        assert_eq!(count, 1, "arguments of the rejected create must not survive");
    }

    #[tokio::test]
    async fn rename_into_existing_title_rolls_back_arguments() {
        let db = test_db().await;
        db.create_decision("u1", &data("Taken"), &args(&[1]))
            .await
            .unwrap();
        let mine = db
            .create_decision("u1", &data("Mine"), &args(&[2]))
            .await
            .unwrap();

        let err = db
            .update_decision_with_version("u1", &mine.id, 1, &data("Taken"), &args(&[-7]))
            .await
            .unwrap_err();
        assert!(crate::conflict::is_duplicate_title_violation(&err));

        let stored = db.get_decision(&mine.id).await.unwrap();
        assert_eq!(stored.version, 1);
        assert_eq!(stored.snapshot().arguments, args(&[2]));
    }

    #[tokio::test]
    async fn update_of_foreign_decision_is_missing() {
        let db = test_db().await;
        let theirs = db
            .create_decision("u2", &data("Plan"), &args(&[]))
            .await
            .unwrap();
        let err = db
            .update_decision_with_version("u1", &theirs.id, 1, &data("Plan"), &args(&[]))
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::NoResult), "{err}");
        assert_eq!(db.get_decision(&theirs.id).await.unwrap().user_id, "u2");
    }

    #[tokio::test]
    async fn replace_arguments_keeps_created_at_for_same_text() {
        let db = test_db().await;
        let created = db
            .create_decision("u1", &data("Plan"), &args(&[5, -1]))
            .await
            .unwrap();
        let first_created = created.arguments[0].created_at;

        let mut inputs = created.snapshot().arguments;
        inputs[0].weight = Weight::new(9).unwrap();
        inputs.push(ArgumentInput::new("brand new", -2).unwrap());
        let replaced = db.replace_arguments(&created.id, &inputs).await.unwrap();

        assert_eq!(replaced.len(), 3);
        assert_eq!(replaced[0].created_at, first_created);
        let stored = db.get_decision(&created.id).await.unwrap();
        assert_eq!(stored.version, 2);
        assert_eq!(stored.score.positive_score, 9);
        assert_eq!(stored.score.negative_score, 3);
    }

    #[tokio::test]
    async fn delete_removes_arguments_too() {
        let db = test_db().await;
        let created = db
            .create_decision("u1", &data("Plan"), &args(&[1, 2, 3]))
            .await
            .unwrap();
        db.delete_decision_cascading(&created.id).await.unwrap();

        assert!(matches!(
            db.get_decision(&created.id).await,
            Err(DatabaseError::NoResult)
        ));
        let mut rows = db
            .conn()
            .query(
                "SELECT COUNT(*) FROM arguments WHERE decision_id = ?1",
                [created.id.as_str()],
            )
            .await
            .unwrap();
        let count: i64 = rows.next().await.unwrap().unwrap().get(0).unwrap();
        assert_eq!(count, 0);

        assert!(matches!(
            db.delete_decision_cascading(&created.id).await,
            Err(DatabaseError::NoResult)
        ));
    }

    #[tokio::test]
    async fn find_and_list_are_scoped_per_user() {
        let db = test_db().await;
        db.create_decision("u1", &data("Plan"), &args(&[1]))
            .await
            .unwrap();
        db.create_decision("u2", &data("Plan"), &args(&[2]))
            .await
            .unwrap();
        db.create_decision("u1", &data("Other"), &args(&[]))
            .await
            .unwrap();

        let found = db.find_by_user_and_title("u2", "Plan").await.unwrap().unwrap();
        assert_eq!(found.user_id, "u2");
        assert_eq!(found.arguments.len(), 1);
        assert!(db.find_by_user_and_title("u3", "Plan").await.unwrap().is_none());
        assert_eq!(db.list_decisions("u1", 10).await.unwrap().len(), 2);
        assert_eq!(db.list_decisions("u1", 1).await.unwrap().len(), 1);
    }
}
