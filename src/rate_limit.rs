use std::sync::Mutex;
use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Fixed-window attempt counter keyed by a normalized string (an email).
///
/// `check` never increments; callers decide what counts as an attempt and
/// call `record` for it. Once more than `PRUNE_ABOVE` keys are tracked,
/// `record` sweeps out expired windows, at most once per window.
pub struct AttemptLimiter {
    /// key -> (count, window_start)
    entries: DashMap<String, (u32, Instant)>,
    max_attempts: u32,
    window: Duration,
    last_sweep: Mutex<Instant>,
}

const PRUNE_ABOVE: usize = 1024;

impl AttemptLimiter {
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            max_attempts,
            window,
            last_sweep: Mutex::new(Instant::now()),
        }
    }

    /// 5 failed logins per 15 minutes.
    pub fn for_logins() -> Self {
        Self::new(5, Duration::from_secs(15 * 60))
    }

    /// 5 reset requests per hour.
    pub fn for_password_resets() -> Self {
        Self::new(5, Duration::from_secs(60 * 60))
    }

    /// Ok when another attempt is allowed, otherwise Err with seconds until the window resets.
    pub fn check(&self, key: &str) -> Result<(), u64> {
        let now = Instant::now();

        let key = key.to_lowercase();

        let Some(entry) = self.entries.get(&key) else {
            return Ok(());
        };

        let (count, start) = entry.value();

        if now.duration_since(*start) > self.window {
            drop(entry);
            self.entries
                .remove_if(&key, |_, (_, start)| now.duration_since(*start) > self.window);
            return Ok(());
        }

        if *count >= self.max_attempts {
            let elapsed = now.duration_since(*start).as_secs();
            return Err(self.window.as_secs().saturating_sub(elapsed));
        }

        Ok(())
    }

    pub fn record(&self, key: &str) {
        let now = Instant::now();

        {
            let mut entry = self.entries.entry(key.to_lowercase()).or_insert((0, now));
            let (count, start) = entry.value_mut();

            if now.duration_since(*start) > self.window {
                *count = 1;
                *start = now;
            } else {
                *count += 1;
            }
        }

        if self.entries.len() > PRUNE_ABOVE {
            self.sweep(now);
        }
    }

    fn sweep(&self, now: Instant) {
        {
            let mut last = self
                .last_sweep
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if now.duration_since(*last) < self.window {
                return;
            }
            *last = now;
        }
        self.cleanup();
    }

    /// Drops every key whose window has passed.
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.entries
            .retain(|_, (_, start)| now.duration_since(*start) <= self.window);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn reset(&self, key: &str) {
        self.entries.remove(&key.to_lowercase());
    }
}
