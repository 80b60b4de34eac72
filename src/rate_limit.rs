use crate::ResolveError;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(2000);

/// Single-slot cooldown between dispatched resolutions.
///
/// Only dispatch attempts stamp the clock; rejections leave it untouched.
pub struct RateLimiter {
    cooldown: Duration,
    last_dispatch: Mutex<Option<Instant>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}

impl RateLimiter {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_dispatch: Mutex::new(None),
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Claims the dispatch slot, or reports how long to wait.
    pub fn try_acquire(&self) -> Result<(), ResolveError> {
        let now = Instant::now();
        let mut last = match self.last_dispatch.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(previous) = *last {
            let elapsed = now.saturating_duration_since(previous);
            if elapsed < self.cooldown {
                return Err(ResolveError::RateLimited {
                    retry_after: self.cooldown - elapsed,
                });
            }
        }

        *last = Some(now);
        Ok(())
    }
}
