//! # tally-db
//!
//! Durable decision storage and the optimistic-concurrency save protocol.
//!
//! - [`store::DecisionStore`]: the store interface the save path is written against
//! - [`TallyDb`]: libSQL implementation (local file or `:memory:`)
//! - [`memory::MemoryStore`]: in-process implementation with the same semantics
//! - [`conflict`]: conflict taxonomy and the classifier
//! - [`upsert`]: create-or-update with version checks and tagged results
//! - [`retry`]: backoff for transient store failures

pub mod conflict;
pub mod error;
pub mod helpers;
pub mod memory;
mod migrations;
pub mod repos;
pub mod retry;
pub mod store;
pub mod upsert;

#[cfg(test)]
mod test_support;

use error::DatabaseError;
use libsql::Builder;

/// Central database handle for decision storage.
///
/// Wraps a libSQL database and connection. Repository methods live in
/// [`repos`] as `impl TallyDb` blocks.
pub struct TallyDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
    /// Serializes write transactions issued through the shared connection.
    write_lock: tokio::sync::Mutex<()>,
}

impl TallyDb {
    /// Open a local-only database at the given path.
    ///
    /// Runs migrations automatically on first open.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        // Enable foreign keys (must be per-connection in SQLite)
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| DatabaseError::Migration(format!("PRAGMA foreign_keys: {e}")))?;

        let tally_db = Self {
            db,
            conn,
            write_lock: tokio::sync::Mutex::new(()),
        };
        tally_db.run_migrations().await?;
        tracing::debug!(path, "opened decision database");
        Ok(tally_db)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Start a write transaction. The returned guard must be held until
    /// [`Self::finish`] has run.
    pub(crate) async fn begin(&self) -> Result<tokio::sync::MutexGuard<'_, ()>, DatabaseError> {
        let guard = self.write_lock.lock().await;
        self.conn.execute("BEGIN IMMEDIATE", ()).await?;
        Ok(guard)
    }

    /// Commit on success, roll back on failure. The original error wins over
    /// a failed rollback.
    pub(crate) async fn finish<T>(
        &self,
        result: Result<T, DatabaseError>,
    ) -> Result<T, DatabaseError> {
        match result {
            Ok(value) => {
                self.conn.execute("COMMIT", ()).await?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = self.conn.execute("ROLLBACK", ()).await {
                    tracing::warn!(error = %rollback, "rollback failed after: {e}");
                }
                Err(e)
            }
        }
    }

    /// Generate a prefixed ID via libSQL. Returns e.g., `"dec-a3f8b2c1"`.
    ///
    /// Uses `randomblob(4)` in SQL to produce 8-char hex, then prepends the prefix.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or returns no rows.
    pub async fn generate_id(&self, prefix: &str) -> Result<String, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT '{prefix}-' || lower(hex(randomblob(4)))"),
                (),
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get::<String>(0)?)
    }
}
