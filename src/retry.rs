//! Resilient execution of store operations
//!
//! Runs an async operation with bounded attempts, exponential backoff plus
//! random jitter, and a reachability probe before every attempt.
//!
//! ## Failure classes
//!
//! - 401 and 422: terminal, surfaced immediately
//! - connection failures, attempt timeouts, status >= 500, or messages
//!   mentioning `network`, `connect` or `fetch`: retryable
//! - anything else: terminal on first occurrence
//!
//! ## Pacing
//!
//! No wait precedes the first attempt. Before attempt `k >= 1` (0-indexed)
//! the executor sleeps `base_delay * 2^(k-1) + jitter`, with jitter drawn
//! uniformly from `[0, max_jitter)`. When the attempt budget runs out the
//! last failure is returned as-is.

use crate::error::{NewsError, Result};
use crate::probe::ReachabilityProbe;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Message carried by the failure recorded when the probe reports an outage
pub const UNREACHABLE_MESSAGE: &str = "unable to connect";

/// Configuration for retry pacing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first (values below 1 behave as 1)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay in milliseconds for exponential backoff
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Exclusive upper bound of the random jitter in milliseconds
    #[serde(default = "default_max_jitter_ms")]
    pub max_jitter_ms: u64,

    /// Per-attempt deadline; `None` lets an attempt run indefinitely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempt_timeout_ms: Option<u64>,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_max_jitter_ms() -> u64 {
    200
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_jitter_ms: default_max_jitter_ms(),
            attempt_timeout_ms: None,
        }
    }
}

impl RetryPolicy {
    /// Policy with a single attempt
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Policy with custom attempt count and base delay, default jitter
    pub fn new(max_attempts: u32, base_delay_ms: u64) -> Self {
        Self {
            max_attempts,
            base_delay_ms,
            ..Default::default()
        }
    }

    /// Attempts actually made
    pub fn effective_attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Backoff before `attempt` (0-indexed), without jitter
    pub fn backoff(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let factor = 1u64.checked_shl(attempt - 1).unwrap_or(u64::MAX);
        Duration::from_millis(self.base_delay_ms.saturating_mul(factor))
    }

    /// Backoff before `attempt` plus fresh random jitter
    pub fn delay_before_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let jitter = if self.max_jitter_ms > 0 {
            rand::thread_rng().gen_range(0..self.max_jitter_ms)
        } else {
            0
        };
        self.backoff(attempt) + Duration::from_millis(jitter)
    }
}

/// Whether a failure may be retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Retryable,
    Terminal,
}

/// Classify a failure for the retry loop
pub fn classify(err: &NewsError) -> FailureClass {
    let status = err.status();
    if matches!(status, Some(401) | Some(422)) {
        return FailureClass::Terminal;
    }
    if matches!(err, NewsError::Connection(_) | NewsError::Timeout(_)) {
        return FailureClass::Retryable;
    }
    if status.is_some_and(|s| s >= 500) {
        return FailureClass::Retryable;
    }

    let message = err.to_string().to_ascii_lowercase();
    if ["network", "connect", "fetch"]
        .iter()
        .any(|needle| message.contains(needle))
    {
        FailureClass::Retryable
    } else {
        FailureClass::Terminal
    }
}

/// Run one attempt, honouring the optional per-attempt deadline
async fn run_attempt<T, Fut>(policy: &RetryPolicy, attempt: Fut) -> Result<T>
where
    Fut: Future<Output = Result<T>>,
{
    match policy.attempt_timeout_ms {
        Some(ms) => tokio::time::timeout(Duration::from_millis(ms), attempt)
            .await
            .map_err(|_| NewsError::Timeout(format!("attempt exceeded {}ms", ms)))?,
        None => attempt.await,
    }
}

/// Execute `operation` under `policy`, probing reachability before each attempt
///
/// Returns the first success, or the last failure once a terminal failure
/// occurs or the attempt budget is spent.
pub async fn with_retry<T, P, F, Fut>(policy: &RetryPolicy, probe: &P, mut operation: F) -> Result<T>
where
    P: ReachabilityProbe + ?Sized,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.effective_attempts();
    let mut attempt = 0u32;

    loop {
        if attempt > 0 {
            let delay = policy.delay_before_attempt(attempt);
            tracing::debug!(attempt = attempt + 1, ?delay, "Backing off before retry");
            tokio::time::sleep(delay).await;
        }

        let outcome = if probe.is_reachable().await {
            run_attempt(policy, operation()).await
        } else {
            Err(NewsError::Connection(UNREACHABLE_MESSAGE.to_string()))
        };

        match outcome {
            Ok(value) => {
                if attempt > 0 {
                    tracing::info!(attempts = attempt + 1, "Operation succeeded after retries");
                }
                return Ok(value);
            }
            Err(err) => {
                if classify(&err) == FailureClass::Terminal {
                    return Err(err);
                }
                if attempt + 1 >= max_attempts {
                    tracing::warn!(attempts = max_attempts, error = %err, "Retry budget exhausted");
                    return Err(err);
                }
                tracing::warn!(
                    attempt = attempt + 1,
                    max_attempts,
                    error = %err,
                    "Retryable failure"
                );
                attempt += 1;
            }
        }
    }
}

/// Owns a retry policy and the probe used before every attempt
#[derive(Clone)]
pub struct ResilientExecutor {
    policy: RetryPolicy,
    probe: Arc<dyn ReachabilityProbe>,
}

impl ResilientExecutor {
    pub fn new(policy: RetryPolicy, probe: Arc<dyn ReachabilityProbe>) -> Self {
        Self { policy, probe }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run an operation under this executor's policy
    pub async fn run<T, F, Fut>(&self, operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        with_retry(&self.policy, self.probe.as_ref(), operation).await
    }
}
