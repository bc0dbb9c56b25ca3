use std::time::Duration;

use rand::Rng;
use rand::distributions::Alphanumeric;

use crate::executor::DEFAULT_CONCURRENCY;
use crate::retry::{LockRetryPolicy, RetryDelay};

const CLIENT_ID_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub concurrency: usize,
    // None retries forever
    pub lock_retry_max: Option<u32>,
    pub lock_retry_delay: Duration,
    pub lock_retry_max_delay: Duration,
    pub lock_retry_jitter: bool,
    pub client_id: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            lock_retry_max: None,
            lock_retry_delay: Duration::ZERO,
            lock_retry_max_delay: Duration::ZERO,
            lock_retry_jitter: false,
            client_id: generate_client_id(),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let concurrency = read_positive(&lookup, "BATCH_CONCURRENCY")
            .and_then(|value| usize::try_from(value).ok())
            .unwrap_or(DEFAULT_CONCURRENCY);
        let lock_retry_max =
            read_positive(&lookup, "BATCH_LOCK_RETRY_MAX").and_then(|value| u32::try_from(value).ok());
        let lock_retry_delay = Duration::from_millis(
            read_positive(&lookup, "BATCH_LOCK_RETRY_DELAY_MS").unwrap_or(0),
        );
        let lock_retry_max_delay = Duration::from_millis(
            read_positive(&lookup, "BATCH_LOCK_RETRY_MAX_DELAY_MS").unwrap_or(0),
        );
        let lock_retry_jitter = read_bool(&lookup, "BATCH_LOCK_RETRY_JITTER", false);
        let client_id = lookup("BATCH_CLIENT_ID")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(generate_client_id);

        Self {
            concurrency,
            lock_retry_max,
            lock_retry_delay,
            lock_retry_max_delay,
            lock_retry_jitter,
            client_id,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    pub fn lock_retry_policy(&self) -> LockRetryPolicy {
        let mut policy = LockRetryPolicy::unbounded();
        if let Some(max) = self.lock_retry_max {
            policy = policy.with_max_attempts(max);
        }
        if !self.lock_retry_delay.is_zero() {
            let mut delay = if self.lock_retry_max_delay > self.lock_retry_delay {
                RetryDelay::exponential(self.lock_retry_delay, self.lock_retry_max_delay)
            } else {
                RetryDelay::fixed(self.lock_retry_delay)
            };
            if self.lock_retry_jitter {
                delay = delay.with_jitter();
            }
            policy = policy.with_delay(delay);
        }
        policy
    }
}

pub fn generate_client_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CLIENT_ID_LEN)
        .map(char::from)
        .collect()
}

fn read_positive<F>(lookup: &F, name: &str) -> Option<u64>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
}

fn read_bool<F>(lookup: &F, name: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|value| {
            matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        })
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> EngineConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EngineConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = config_from(&[]);
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.lock_retry_max, None);
        assert_eq!(config.lock_retry_delay, Duration::ZERO);
        assert_eq!(config.client_id.len(), CLIENT_ID_LEN);
        assert_eq!(config.lock_retry_policy(), LockRetryPolicy::unbounded());
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("BATCH_CONCURRENCY", "8"),
            ("BATCH_LOCK_RETRY_MAX", "5"),
            ("BATCH_LOCK_RETRY_DELAY_MS", "250"),
            ("BATCH_CLIENT_ID", " web-7 "),
        ]);
        assert_eq!(config.concurrency, 8);
        assert_eq!(config.lock_retry_max, Some(5));
        assert_eq!(config.lock_retry_delay, Duration::from_millis(250));
        assert_eq!(config.client_id, "web-7");

        let policy = config.lock_retry_policy();
        assert_eq!(policy.max_attempts(), Some(5));
        assert_eq!(policy.delay_after(1), Some(Duration::from_millis(250)));
        assert_eq!(policy.delay_after(4), Some(Duration::from_millis(250)));
    }

    #[test]
    fn max_delay_turns_lock_retry_exponential() {
        let config = config_from(&[
            ("BATCH_LOCK_RETRY_DELAY_MS", "100"),
            ("BATCH_LOCK_RETRY_MAX_DELAY_MS", "350"),
        ]);
        assert_eq!(config.lock_retry_max_delay, Duration::from_millis(350));
        assert!(!config.lock_retry_jitter);

        let policy = config.lock_retry_policy();
        let delays: Vec<_> = (1..=4).map(|attempt| policy.delay_after(attempt)).collect();
        assert_eq!(
            delays,
            vec![
                Some(Duration::from_millis(100)),
                Some(Duration::from_millis(200)),
                Some(Duration::from_millis(350)),
                Some(Duration::from_millis(350)),
            ]
        );
    }

    #[test]
    fn jitter_keeps_lock_retry_delay_within_cap() {
        let config = config_from(&[
            ("BATCH_LOCK_RETRY_DELAY_MS", "50"),
            ("BATCH_LOCK_RETRY_MAX_DELAY_MS", "200"),
            ("BATCH_LOCK_RETRY_JITTER", "yes"),
        ]);
        assert!(config.lock_retry_jitter);

        let policy = config.lock_retry_policy();
        for attempt in 1..10 {
            let delay = policy.delay_after(attempt).unwrap_or(Duration::ZERO);
            assert!(delay <= Duration::from_millis(200));
        }
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let config = config_from(&[
            ("BATCH_CONCURRENCY", "0"),
            ("BATCH_LOCK_RETRY_MAX", "many"),
            ("BATCH_CLIENT_ID", "   "),
        ]);
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.lock_retry_max, None);
        assert!(!config.client_id.trim().is_empty());
    }

    #[test]
    fn generated_client_ids_differ() {
        assert_ne!(generate_client_id(), generate_client_id());
    }
}
