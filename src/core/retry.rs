//! Bounded retry with exponential backoff
//!
//! [`with_retry`] runs an operation until it succeeds or the policy's
//! attempt budget is spent. Waiting goes through a [`Sleeper`] so callers
//! (and tests) decide how time passes.

use std::fmt::Display;
use std::time::Duration;
use tracing::warn;

/// How many times to try and how long to wait between tries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Base of the exponential backoff, in seconds
    pub base_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_secs: 2,
        }
    }
}

impl RetryPolicy {
    /// Wait after failed attempt number `attempt` (1-based): `base^attempt` seconds
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_secs(self.base_secs.saturating_pow(attempt))
    }
}

/// Something that can wait
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Blocks the current thread
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Final result of a retried operation
#[derive(Debug, PartialEq, Eq)]
pub enum RetryOutcome<T, E> {
    Success { value: T, attempts: u32 },
    Exhausted { error: E, attempts: u32 },
}

/// Run `op` until it succeeds or `policy.max_attempts` attempts have failed
///
/// `op` receives the 1-based attempt number. There is no wait after the
/// last failed attempt.
pub fn with_retry<T, E, F>(policy: &RetryPolicy, sleeper: &dyn Sleeper, mut op: F) -> RetryOutcome<T, E>
where
    E: Display,
    F: FnMut(u32) -> Result<T, E>,
{
    let max = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op(attempt) {
            Ok(value) => {
                return RetryOutcome::Success {
                    value,
                    attempts: attempt,
                }
            }
            Err(error) if attempt >= max => {
                return RetryOutcome::Exhausted {
                    error,
                    attempts: attempt,
                }
            }
            Err(error) => {
                let wait = policy.backoff(attempt);
                warn!(attempt, max, wait_secs = wait.as_secs(), %error, "Attempt failed, retrying");
                sleeper.sleep(wait);
                attempt += 1;
            }
        }
    }
}
