use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Window shared by the public form and login limits.
pub const WINDOW: Duration = Duration::from_secs(15 * 60);

/// In-memory sliding-window limiter keyed by `"<bucket>:<ip_hash>"`,
/// e.g. `"login:ab12…"` or `"contact:ab12…"`.
#[derive(Default)]
pub struct RateLimiter {
    entries: Mutex<HashMap<String, Vec<Instant>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Vec<Instant>>> {
        // A panic while holding the lock leaves only timestamps behind.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record an attempt; true while the key is under `max_attempts` in `window`.
    pub fn check_and_record(&self, key: &str, max_attempts: u64, window: Duration) -> bool {
        let mut map = self.entries();
        let now = Instant::now();

        let attempts = map.entry(key.to_string()).or_default();
        attempts.retain(|t| now.duration_since(*t) < window);

        if (attempts.len() as u64) < max_attempts {
            attempts.push(now);
            true
        } else {
            false
        }
    }

    /// Forget keys with no attempts inside `max_age`.
    pub fn cleanup(&self, max_age: Duration) {
        let mut map = self.entries();
        let now = Instant::now();
        map.retain(|_, attempts| {
            attempts.retain(|t| now.duration_since(*t) < max_age);
            !attempts.is_empty()
        });
    }

    pub fn tracked_keys(&self) -> usize {
        self.entries().len()
    }
}
