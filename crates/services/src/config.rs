use std::env;
use std::time::Duration;

/// Fixed-delay retry settings for the identity fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(2_000),
        }
    }
}

impl RetryPolicy {
    /// Read `QUIZ_IDENTITY_RETRY_ATTEMPTS` and `QUIZ_IDENTITY_RETRY_DELAY_MS`.
    ///
    /// Unset or unparsable values keep their defaults; attempts never drop below one.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let max_attempts = env::var("QUIZ_IDENTITY_RETRY_ATTEMPTS")
            .ok()
            .and_then(|raw| raw.parse::<u32>().ok())
            .unwrap_or(defaults.max_attempts)
            .max(1);
        let delay = env::var("QUIZ_IDENTITY_RETRY_DELAY_MS")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
            .map_or(defaults.delay, Duration::from_millis);
        Self {
            max_attempts,
            delay,
        }
    }

    #[must_use]
    pub fn no_delay(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay: Duration::ZERO,
        }
    }
}
