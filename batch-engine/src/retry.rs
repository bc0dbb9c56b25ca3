use std::time::Duration;

use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryDelay {
    base: Duration,
    max: Duration,
    jitter: bool,
}

impl RetryDelay {
    pub fn fixed(delay: Duration) -> Self {
        Self {
            base: delay,
            max: delay,
            jitter: false,
        }
    }

    pub fn exponential(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max: max.max(base),
            jitter: false,
        }
    }

    pub fn with_jitter(mut self) -> Self {
        self.jitter = true;
        self
    }

    // attempts is 1-based
    pub fn after_attempt(&self, attempts: u32) -> Duration {
        self.after_attempt_with_rng(attempts, &mut rand::thread_rng())
    }

    pub fn after_attempt_with_rng<R: Rng + ?Sized>(&self, attempts: u32, rng: &mut R) -> Duration {
        let base_ms = u64::try_from(self.base.as_millis()).unwrap_or(u64::MAX);
        let max_ms = u64::try_from(self.max.as_millis()).unwrap_or(u64::MAX);
        let shift = attempts.saturating_sub(1).min(16);
        let capped = base_ms.saturating_mul(1u64 << shift).min(max_ms);
        let chosen = if self.jitter && capped > 0 {
            rng.gen_range(0..=capped)
        } else {
            capped
        };
        Duration::from_millis(chosen)
    }
}

// Default: requeue locked operations forever, with no pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LockRetryPolicy {
    max_attempts: Option<u32>,
    delay: Option<RetryDelay>,
}

impl LockRetryPolicy {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts.max(1));
        self
    }

    pub fn with_delay(mut self, delay: RetryDelay) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }

    pub fn allows_retry(&self, attempts: u32) -> bool {
        self.max_attempts.is_none_or(|max| attempts < max)
    }

    pub fn delay_after(&self, attempts: u32) -> Option<Duration> {
        self.delay
            .map(|delay| delay.after_attempt(attempts))
            .filter(|delay| !delay.is_zero())
    }
}
