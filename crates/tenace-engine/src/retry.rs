//! Bounded retries with optional exponential backoff.
//!
//! The operation is replayed sequentially; its error is returned to the caller
//! untouched once the attempt budget is spent.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Retry budget and pacing for one operation.
///
/// In configuration, `maxAttempts` counts every attempt while `retries`
/// counts the attempts after the first (`retries: 2` allows three calls).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRetryPolicy", into = "RawRetryPolicy")]
pub struct RetryPolicy {
    /// Total attempts, including the first. Values below 1 are treated as 1.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub backoff: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            backoff: true,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, backoff: bool) -> Self {
        Self {
            max_attempts,
            base_delay,
            backoff,
        }
    }

    /// Policy allowing `retries` retries after the first attempt.
    pub fn with_retries(retries: u32, base_delay: Duration, backoff: bool) -> Self {
        Self::new(retries.saturating_add(1), base_delay, backoff)
    }

    /// Fixed policy for critical operations: 3 retries, 2s base, backoff on.
    pub fn critical() -> Self {
        Self::with_retries(3, Duration::from_secs(2), true)
    }

    /// Delay after the `failure_index`-th failure (0-based).
    pub fn delay_for(&self, failure_index: u32) -> Duration {
        if !self.backoff {
            return self.base_delay;
        }
        let factor = 2u32.checked_pow(failure_index).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRetryPolicy {
    #[serde(default, alias = "max_attempts", skip_serializing_if = "Option::is_none")]
    max_attempts: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    retries: Option<u32>,
    /// Milliseconds.
    #[serde(default, alias = "delay", alias = "base_delay")]
    base_delay: Option<u64>,
    #[serde(default, alias = "backoff", alias = "backoff_enabled")]
    backoff_enabled: Option<bool>,
}

impl TryFrom<RawRetryPolicy> for RetryPolicy {
    type Error = String;

    fn try_from(raw: RawRetryPolicy) -> Result<Self, Self::Error> {
        let defaults = RetryPolicy::default();
        let max_attempts = match (raw.max_attempts, raw.retries) {
            (Some(0), _) => return Err("maxAttempts must be at least 1".into()),
            (Some(n), _) => n,
            (None, Some(r)) => r.saturating_add(1),
            (None, None) => defaults.max_attempts,
        };
        Ok(RetryPolicy {
            max_attempts,
            base_delay: raw
                .base_delay
                .map(Duration::from_millis)
                .unwrap_or(defaults.base_delay),
            backoff: raw.backoff_enabled.unwrap_or(defaults.backoff),
        })
    }
}

impl From<RetryPolicy> for RawRetryPolicy {
    fn from(policy: RetryPolicy) -> Self {
        RawRetryPolicy {
            max_attempts: Some(policy.max_attempts),
            retries: None,
            base_delay: Some(u64::try_from(policy.base_delay.as_millis()).unwrap_or(u64::MAX)),
            backoff_enabled: Some(policy.backoff),
        }
    }
}

/// Run `operation` until it succeeds or the policy's attempts are spent.
///
/// Returns the first success, or the error of the last attempt unchanged.
pub async fn execute_with_retries<T, E, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let attempts = policy.attempts();
    let mut failure_index = 0;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                let attempt = failure_index + 1;
                if attempt >= attempts {
                    warn!("All {} attempts failed; last error: {}", attempts, e);
                    return Err(e);
                }

                let delay = policy.delay_for(failure_index);
                debug!(
                    "Attempt {}/{} failed: {}; retrying in {:?}",
                    attempt, attempts, e, delay
                );
                tokio::time::sleep(delay).await;
                failure_index += 1;
            }
        }
    }
}

/// Run a named critical operation under [`RetryPolicy::critical`], logging
/// its start, success and final failure.
pub async fn execute_critical<T, E, F, Fut>(name: &str, operation: F) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    info!("Starting critical operation: {}", name);
    match execute_with_retries(&RetryPolicy::critical(), operation).await {
        Ok(value) => {
            info!("Critical operation succeeded: {}", name);
            Ok(value)
        }
        Err(e) => {
            error!("Critical operation failed: {}: {}", name, e);
            Err(e)
        }
    }
}

/// Retry wrapper bound to a configured policy.
#[derive(Debug, Clone, Default)]
pub struct TaskExecutor {
    policy: RetryPolicy,
}

impl TaskExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub async fn execute<T, E, F, Fut>(&self, operation: F) -> Result<T, E>
    where
        E: std::fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        execute_with_retries(&self.policy, operation).await
    }
}
