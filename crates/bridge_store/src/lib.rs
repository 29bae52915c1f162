//! SQLite persistence for the bridge.
//!
//! A single local database file holds two tables: `user_tokens` (chat user →
//! code-host credential) and `issue_thread_mapping` (issue key → chat thread
//! metadata). Both stores hand out row-level upsert/get semantics over a
//! shared connection; contention is limited to a process-local mutex, which
//! is adequate for the low write frequency of this workload.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::Connection;

mod correlation_store;
mod errors;
mod token_store;

pub use correlation_store::CorrelationStore;
pub use errors::StoreError;
pub use token_store::TokenStore;

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// Handle to the bridge database.
///
/// Cloning is cheap; all clones share one connection. Use [`BridgeDb::tokens`]
/// and [`BridgeDb::correlations`] to obtain the typed stores.
#[derive(Clone)]
pub struct BridgeDb {
    conn: Arc<Mutex<Connection>>,
}

impl BridgeDb {
    /// Open (creating if necessary) the database at `path` and ensure the
    /// schema exists.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database. Used by tests.
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS user_tokens (
                mattermost_user_id TEXT PRIMARY KEY,
                mattermost_username TEXT,
                forgejo_access_token TEXT,
                forgejo_refresh_token TEXT,
                forgejo_username TEXT,
                expires_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS issue_thread_mapping (
                issue_key TEXT PRIMARY KEY,
                channel_id TEXT,
                mattermost_username TEXT,
                channel_name TEXT,
                team_domain TEXT,
                created_at TEXT NOT NULL,
                issue_url TEXT,
                root_message_id TEXT
            );
            "#,
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Credential store over this database.
    pub fn tokens(&self) -> TokenStore {
        TokenStore::new(Arc::clone(&self.conn))
    }

    /// Thread correlation store over this database.
    pub fn correlations(&self) -> CorrelationStore {
        CorrelationStore::new(Arc::clone(&self.conn))
    }
}

/// Acquire the shared connection, surfacing a poisoned lock as a store error.
pub(crate) fn lock_conn(
    conn: &Arc<Mutex<Connection>>,
) -> Result<MutexGuard<'_, Connection>, StoreError> {
    conn.lock().map_err(|_| StoreError::LockPoisoned)
}

/// Render a timestamp for storage. All timestamps are RFC 3339 TEXT.
pub(crate) fn to_stored_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339()
}

/// Parse a stored timestamp.
pub(crate) fn parse_stored_timestamp(
    column: &'static str,
    value: &str,
) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|_| StoreError::InvalidTimestamp {
            column,
            value: value.to_string(),
        })
}
