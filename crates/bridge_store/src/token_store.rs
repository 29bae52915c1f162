//! Durable chat-user → code-host credential mapping.

use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use bridge_core::{TokenGrant, UserCredential};

use crate::errors::StoreError;
use crate::{lock_conn, parse_stored_timestamp, to_stored_timestamp};

#[cfg(test)]
#[path = "token_store_tests.rs"]
mod tests;

/// Store for per-user code-host credentials.
///
/// Expired rows are purged when encountered on read, so stale credentials
/// never accumulate and are never returned to callers.
#[derive(Clone)]
pub struct TokenStore {
    conn: Arc<Mutex<Connection>>,
}

impl TokenStore {
    pub(crate) fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// Fetch the credential for `chat_user_id`.
    ///
    /// Returns `None` when no row exists or the stored credential has
    /// expired; an expired row is deleted before returning. A row whose
    /// `expires_at` does not parse is treated the same way.
    pub fn get(&self, chat_user_id: &str) -> Result<Option<UserCredential>, StoreError> {
        let conn = lock_conn(&self.conn)?;

        let row = conn
            .query_row(
                "SELECT mattermost_user_id, mattermost_username, forgejo_access_token,
                        forgejo_refresh_token, forgejo_username, expires_at,
                        created_at, updated_at
                 FROM user_tokens
                 WHERE mattermost_user_id = ?1",
                params![chat_user_id],
                |row| {
                    Ok(RawCredentialRow {
                        chat_user_id: row.get(0)?,
                        chat_username: row.get(1)?,
                        access_token: row.get(2)?,
                        refresh_token: row.get(3)?,
                        remote_username: row.get(4)?,
                        expires_at: row.get(5)?,
                        created_at: row.get(6)?,
                        updated_at: row.get(7)?,
                    })
                },
            )
            .optional()?;

        let Some(raw) = row else {
            return Ok(None);
        };

        let expires_at = match raw.expires_at.as_deref() {
            Some(value) => match parse_stored_timestamp("expires_at", value) {
                Ok(parsed) => Some(parsed),
                Err(error) => {
                    tracing::warn!(chat_user_id, %error, "purging credential with unreadable expiry");
                    purge_row(&conn, chat_user_id)?;
                    return Ok(None);
                }
            },
            None => None,
        };

        if let Some(expires_at) = expires_at {
            if Utc::now() >= expires_at {
                tracing::warn!(chat_user_id, %expires_at, "purging expired credential");
                purge_row(&conn, chat_user_id)?;
                return Ok(None);
            }
        }

        Ok(Some(UserCredential {
            chat_user_id: raw.chat_user_id,
            chat_username: raw.chat_username,
            access_token: raw.access_token,
            refresh_token: raw.refresh_token,
            remote_username: raw.remote_username,
            expires_at,
            created_at: parse_stored_timestamp("created_at", &raw.created_at)?,
            updated_at: parse_stored_timestamp("updated_at", &raw.updated_at)?,
        }))
    }

    /// Upsert the credential for `chat_user_id`.
    ///
    /// `expires_at` is recomputed from the grant's lifetime (default one
    /// hour). The upsert is a single statement, so same-key races resolve to
    /// last-writer-wins.
    pub fn put(
        &self,
        chat_user_id: &str,
        chat_username: &str,
        grant: &TokenGrant,
        remote_username: &str,
    ) -> Result<(), StoreError> {
        let now = Utc::now();
        let expires_at = now + Duration::seconds(grant.lifetime_seconds());

        let conn = lock_conn(&self.conn)?;
        conn.execute(
            "INSERT INTO user_tokens
                 (mattermost_user_id, mattermost_username, forgejo_access_token,
                  forgejo_refresh_token, forgejo_username, expires_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
             ON CONFLICT(mattermost_user_id) DO UPDATE SET
                 mattermost_username = excluded.mattermost_username,
                 forgejo_access_token = excluded.forgejo_access_token,
                 forgejo_refresh_token = excluded.forgejo_refresh_token,
                 forgejo_username = excluded.forgejo_username,
                 expires_at = excluded.expires_at,
                 updated_at = excluded.updated_at",
            params![
                chat_user_id,
                chat_username,
                grant.access_token,
                grant.refresh_token,
                remote_username,
                to_stored_timestamp(expires_at),
                to_stored_timestamp(now),
            ],
        )?;

        tracing::info!(chat_user_id, remote_username, "stored credential");
        Ok(())
    }

    /// Remove the credential for `chat_user_id`.
    ///
    /// Returns whether a row was actually removed, so callers can tell the
    /// user an old session was cleared.
    pub fn delete(&self, chat_user_id: &str) -> Result<bool, StoreError> {
        let conn = lock_conn(&self.conn)?;
        let removed = conn.execute(
            "DELETE FROM user_tokens WHERE mattermost_user_id = ?1",
            params![chat_user_id],
        )?;

        if removed > 0 {
            tracing::info!(chat_user_id, "deleted credential");
        }
        Ok(removed > 0)
    }
}

struct RawCredentialRow {
    chat_user_id: String,
    chat_username: String,
    access_token: String,
    refresh_token: Option<String>,
    remote_username: String,
    expires_at: Option<String>,
    created_at: String,
    updated_at: String,
}

fn purge_row(conn: &Connection, chat_user_id: &str) -> Result<(), StoreError> {
    conn.execute(
        "DELETE FROM user_tokens WHERE mattermost_user_id = ?1",
        params![chat_user_id],
    )?;
    Ok(())
}
