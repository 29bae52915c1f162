//! Pending OAuth2 authorization sessions.
//!
//! `/auth/connect` stores who started the flow under a fresh CSRF `state`
//! token; `/auth/callback` redeems the token exactly once. Tokens expire
//! after a bounded lifetime and expired entries are pruned on every insert,
//! so an abandoned flow cannot grow the map without bound.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use uuid::Uuid;

#[cfg(test)]
#[path = "sessions_tests.rs"]
mod tests;

/// How long a started authorization flow stays redeemable.
const SESSION_TTL: Duration = Duration::from_secs(600);

/// The chat user a pending authorization belongs to.
#[derive(Debug, Clone)]
pub struct PendingAuth {
    /// Chat user id that started the flow.
    pub user_id: String,

    /// Chat username at flow start.
    pub username: String,

    started_at: Instant,
}

/// In-memory store of pending authorization flows, keyed by CSRF state.
pub struct AuthSessions {
    inner: Mutex<HashMap<String, PendingAuth>>,
    ttl: Duration,
}

impl Default for AuthSessions {
    fn default() -> Self {
        Self::with_ttl(SESSION_TTL)
    }
}

impl AuthSessions {
    /// Create a session store with a custom lifetime. Tests shorten it;
    /// production uses [`Default`].
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Start a flow for `user_id` and return the fresh `state` token.
    pub fn begin(&self, user_id: &str, username: &str) -> String {
        let state = Uuid::new_v4().to_string();
        let mut sessions = self.lock();

        let ttl = self.ttl;
        sessions.retain(|_, pending| pending.started_at.elapsed() < ttl);
        sessions.insert(
            state.clone(),
            PendingAuth {
                user_id: user_id.to_string(),
                username: username.to_string(),
                started_at: Instant::now(),
            },
        );

        state
    }

    /// Redeem `state`, removing it. Returns `None` for unknown, already
    /// redeemed, or expired tokens.
    pub fn take(&self, state: &str) -> Option<PendingAuth> {
        let pending = self.lock().remove(state)?;
        if pending.started_at.elapsed() >= self.ttl {
            tracing::warn!("authorization state expired before redemption");
            return None;
        }
        Some(pending)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, PendingAuth>> {
        // A poisoned lock only means another thread panicked mid-insert;
        // the map itself stays usable.
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
