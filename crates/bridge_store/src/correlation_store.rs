//! Durable issue-key → chat-thread correlation mapping.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use bridge_core::{
    CorrelationSource, DispatchError, IssueKey, NewThreadCorrelation, ThreadCorrelation,
};

use crate::errors::StoreError;
use crate::{lock_conn, parse_stored_timestamp, to_stored_timestamp};

#[cfg(test)]
#[path = "correlation_store_tests.rs"]
mod tests;

/// Store for issue↔thread correlations.
///
/// Rows are written once per chat-originated issue and read by every inbound
/// code-host event. There is no delete: correlations are retained
/// indefinitely, and a later write for the same issue key replaces the row.
#[derive(Clone)]
pub struct CorrelationStore {
    conn: Arc<Mutex<Connection>>,
}

impl CorrelationStore {
    pub(crate) fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// Upsert the correlation for its issue key.
    ///
    /// `created_at` is stamped with the current time on every write.
    pub fn put(&self, correlation: &NewThreadCorrelation) -> Result<(), StoreError> {
        let conn = lock_conn(&self.conn)?;
        conn.execute(
            "INSERT OR REPLACE INTO issue_thread_mapping
                 (issue_key, channel_id, mattermost_username, channel_name,
                  team_domain, created_at, issue_url, root_message_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                correlation.issue_key.to_string(),
                correlation.channel_id,
                correlation.username,
                correlation.channel_name,
                correlation.team_domain,
                to_stored_timestamp(Utc::now()),
                correlation.issue_url,
                correlation.root_message_id,
            ],
        )?;

        tracing::info!(
            issue_key = %correlation.issue_key,
            channel_id = %correlation.channel_id,
            threaded = correlation.root_message_id.is_some(),
            "stored thread correlation"
        );
        Ok(())
    }

    /// Fetch the correlation for `key`, if one was ever stored.
    pub fn get(&self, key: &IssueKey) -> Result<Option<ThreadCorrelation>, StoreError> {
        let conn = lock_conn(&self.conn)?;

        let row = conn
            .query_row(
                "SELECT issue_key, channel_id, mattermost_username, channel_name,
                        team_domain, created_at, issue_url, root_message_id
                 FROM issue_thread_mapping
                 WHERE issue_key = ?1",
                params![key.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, String>(6)?,
                        row.get::<_, Option<String>>(7)?,
                    ))
                },
            )
            .optional()?;

        let Some((
            issue_key,
            channel_id,
            username,
            channel_name,
            team_domain,
            created_at,
            issue_url,
            root_message_id,
        )) = row
        else {
            return Ok(None);
        };

        Ok(Some(ThreadCorrelation {
            issue_key: issue_key.parse()?,
            channel_id,
            username,
            channel_name,
            team_domain,
            created_at: parse_stored_timestamp("created_at", &created_at)?,
            issue_url,
            root_message_id,
        }))
    }
}

impl CorrelationSource for CorrelationStore {
    fn correlation(&self, key: &IssueKey) -> Result<Option<ThreadCorrelation>, DispatchError> {
        self.get(key)
            .map_err(|error| DispatchError::Lookup(error.to_string()))
    }
}
