/// Cooldowns for repeated use of named actions.
use chrono::{DateTime, Duration, Utc};
use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::clock::Clock;

pub const DEFAULT_COOLDOWN_MAX_AGE_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CooldownKey {
    user_id: String,
    chat_id: String,
    action: String,
}

impl CooldownKey {
    fn new(user_id: &str, chat_id: &str, action: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            chat_id: chat_id.to_string(),
            action: action.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownStatus {
    Ready,
    /// Whole seconds left, rounded up.
    Cooling { remaining_secs: i64 },
}

impl CooldownStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    pub fn remaining_secs(&self) -> Option<i64> {
        match self {
            Self::Ready => None,
            Self::Cooling { remaining_secs } => Some(*remaining_secs),
        }
    }
}

pub struct CooldownStore {
    clock: Arc<dyn Clock>,
    last_used: Mutex<FxHashMap<CooldownKey, DateTime<Utc>>>,
}

impl CooldownStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            last_used: Mutex::new(FxHashMap::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FxHashMap<CooldownKey, DateTime<Utc>>> {
        self.last_used.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Whether `action` may be used again. A non-positive cooldown is always ready.
    pub fn check(&self, user_id: &str, chat_id: &str, action: &str, cooldown_secs: i64) -> CooldownStatus {
        if cooldown_secs <= 0 {
            return CooldownStatus::Ready;
        }
        let Some(last) = self
            .lock()
            .get(&CooldownKey::new(user_id, chat_id, action))
            .copied()
        else {
            return CooldownStatus::Ready;
        };

        let elapsed_ms = (self.clock.now() - last).num_milliseconds();
        let remaining_ms = cooldown_secs.saturating_mul(1000).saturating_sub(elapsed_ms);
        if remaining_ms <= 0 {
            CooldownStatus::Ready
        } else {
            CooldownStatus::Cooling {
                remaining_secs: remaining_ms.saturating_add(999) / 1000,
            }
        }
    }

    /// Stamp the current time for an action, replacing any earlier use.
    pub fn set(&self, user_id: &str, chat_id: &str, action: &str) {
        let now = self.clock.now();
        self.lock().insert(CooldownKey::new(user_id, chat_id, action), now);
    }

    pub fn clear(&self, user_id: &str, chat_id: &str, action: &str) -> bool {
        self.lock()
            .remove(&CooldownKey::new(user_id, chat_id, action))
            .is_some()
    }

    /// Drop entries last used more than `max_age` ago.
    pub fn sweep_older_than(&self, max_age: Duration) -> usize {
        let now = self.clock.now();
        let mut last_used = self.lock();
        let before = last_used.len();
        last_used.retain(|_, at| now - *at <= max_age);
        let removed = before - last_used.len();
        if removed > 0 {
            tracing::info!(removed, "swept stale cooldowns");
        }
        removed
    }

    /// Sweep with the default one-day age limit.
    pub fn sweep(&self) -> usize {
        self.sweep_older_than(Duration::seconds(DEFAULT_COOLDOWN_MAX_AGE_SECS))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Human-readable duration: "45s", "2m 5s", "1h 3m".
pub fn format_duration(secs: i64) -> String {
    let secs = secs.max(0);
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}
