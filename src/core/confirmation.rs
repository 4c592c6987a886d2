/// Pending confirmations for two-step destructive actions.
///
/// Each (user, chat) pair holds at most one pending confirmation. Expiry is
/// lazy: stale entries are removed when checked or swept.
use chrono::{DateTime, Duration, Utc};
use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::clock::Clock;

pub const DEFAULT_CONFIRMATION_TIMEOUT_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub user_id: String,
    pub chat_id: String,
}

impl SessionKey {
    pub fn new(user_id: &str, chat_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            chat_id: chat_id.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PendingConfirmation<P> {
    pub action: String,
    pub created_at: DateTime<Utc>,
    pub payload: P,
}

pub struct ConfirmationStore<P> {
    clock: Arc<dyn Clock>,
    timeout: Duration,
    pending: Mutex<FxHashMap<SessionKey, PendingConfirmation<P>>>,
}

impl<P> ConfirmationStore<P> {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_timeout(clock, Duration::seconds(DEFAULT_CONFIRMATION_TIMEOUT_SECS))
    }

    pub fn with_timeout(clock: Arc<dyn Clock>, timeout: Duration) -> Self {
        Self {
            clock,
            timeout,
            pending: Mutex::new(FxHashMap::default()),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn lock(&self) -> MutexGuard<'_, FxHashMap<SessionKey, PendingConfirmation<P>>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn is_expired(&self, entry: &PendingConfirmation<P>, now: DateTime<Utc>) -> bool {
        now - entry.created_at > self.timeout
    }

    /// Start (or replace) the pending confirmation for a session.
    pub fn create(&self, user_id: &str, chat_id: &str, action: &str, payload: P) {
        let entry = PendingConfirmation {
            action: action.to_string(),
            created_at: self.clock.now(),
            payload,
        };
        tracing::debug!(user_id, chat_id, action, "confirmation pending");
        self.lock().insert(SessionKey::new(user_id, chat_id), entry);
    }

    /// Consume a fresh confirmation of the given action type.
    ///
    /// Expired entries are deleted and report `None`. An entry for a
    /// different action is left in place.
    pub fn check(&self, user_id: &str, chat_id: &str, action: &str) -> Option<P> {
        let key = SessionKey::new(user_id, chat_id);
        let now = self.clock.now();
        let mut pending = self.lock();

        let entry = pending.get(&key)?;
        if self.is_expired(entry, now) {
            tracing::debug!(user_id, chat_id, action = %entry.action, "confirmation expired");
            pending.remove(&key);
            return None;
        }
        if entry.action != action {
            return None;
        }

        tracing::debug!(user_id, chat_id, action, "confirmation consumed");
        pending.remove(&key).map(|entry| entry.payload)
    }

    /// Action type of a live pending confirmation, without consuming it.
    pub fn pending_action(&self, user_id: &str, chat_id: &str) -> Option<String> {
        let now = self.clock.now();
        self.lock()
            .get(&SessionKey::new(user_id, chat_id))
            .filter(|entry| !self.is_expired(entry, now))
            .map(|entry| entry.action.clone())
    }

    /// Drop a pending confirmation. Returns whether one existed.
    pub fn cancel(&self, user_id: &str, chat_id: &str) -> bool {
        self.lock()
            .remove(&SessionKey::new(user_id, chat_id))
            .is_some()
    }

    /// Remove every expired entry, returning how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let mut pending = self.lock();
        let before = pending.len();
        pending.retain(|_, entry| now - entry.created_at <= self.timeout);
        let removed = before - pending.len();
        if removed > 0 {
            tracing::info!(removed, "swept expired confirmations");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
