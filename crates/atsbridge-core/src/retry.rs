//! Retry policy with exponential backoff.
//!
//! The transport consults [`RetryPolicy::decide`] after every failed attempt.
//! Attempt numbers are 1-based and count every request actually sent.

use std::time::Duration;

use tracing::warn;

use crate::http_client::HttpMethod;

/// Classification of a failed attempt, as seen by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptFailure {
    /// The connection could not be established; nothing reached the vendor.
    Connect,
    /// The attempt timed out; the vendor may have processed it.
    Timeout,
    /// The vendor answered with a non-success status.
    Status {
        code: u16,
        retry_after: Option<Duration>,
    },
    /// Any other failure (malformed request, undecodable payload, ...).
    Fatal,
}

/// Outcome of a retry evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry { delay: Duration },
    GiveUp,
}

/// Retry configuration applied around each transport attempt.
///
/// Backoff follows `clamp(multiplier * 2^(attempt - 1), min_wait, max_wait)`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub multiplier: Duration,
    pub min_wait: Duration,
    pub max_wait: Duration,
    /// Longest vendor retry-after hint the transport will sleep through.
    pub max_retry_after: Duration,
    /// Adds up to 25% random jitter on top of the computed backoff.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            multiplier: Duration::from_secs(1),
            min_wait: Duration::from_secs(2),
            max_wait: Duration::from_secs(10),
            max_retry_after: Duration::from_secs(60),
            jitter: false,
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_waits(mut self, multiplier: Duration, min_wait: Duration, max_wait: Duration) -> Self {
        self.multiplier = multiplier;
        self.min_wait = min_wait;
        self.max_wait = max_wait;
        self
    }

    /// Computed backoff after the given failed attempt (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(30);
        let seconds = self.multiplier.as_secs_f64() * 2_f64.powi(exponent as i32);
        let capped = seconds.min(self.max_wait.as_secs_f64());
        let delay = Duration::from_secs_f64(capped.max(self.min_wait.as_secs_f64()));

        if self.jitter && !delay.is_zero() {
            let spread = delay.as_millis() as u64 / 4;
            delay + Duration::from_millis(fastrand::u64(0..=spread))
        } else {
            delay
        }
    }

    /// Wait before the next attempt. A vendor hint is a floor on the backoff.
    pub fn delay_for(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let computed = self.backoff(attempt);
        match retry_after {
            Some(hint) => hint.max(computed),
            None => computed,
        }
    }

    /// Whether the failure class is transient.
    ///
    /// Non-idempotent requests are only replayed when the vendor provably did
    /// not process them: connection failures and explicit 429 rejections.
    pub fn is_retryable(&self, method: HttpMethod, failure: AttemptFailure) -> bool {
        match failure {
            AttemptFailure::Connect => true,
            AttemptFailure::Status { code: 429, .. } => true,
            AttemptFailure::Timeout => method.is_idempotent(),
            AttemptFailure::Status { code, .. } => {
                method.is_idempotent() && (code == 408 || (500..=599).contains(&code))
            }
            AttemptFailure::Fatal => false,
        }
    }

    pub fn decide(&self, method: HttpMethod, attempt: u32, failure: AttemptFailure) -> RetryDecision {
        if attempt >= self.max_attempts || !self.is_retryable(method, failure) {
            return RetryDecision::GiveUp;
        }

        let retry_after = match failure {
            AttemptFailure::Status { retry_after, .. } => retry_after,
            _ => None,
        };
        // Retrying sooner than the vendor asked would only be rejected again.
        if let Some(hint) = retry_after.filter(|hint| *hint > self.max_retry_after) {
            warn!(
                retry_after_secs = hint.as_secs(),
                max_retry_after_secs = self.max_retry_after.as_secs(),
                "vendor retry-after exceeds the wait limit, giving up"
            );
            return RetryDecision::GiveUp;
        }

        RetryDecision::Retry {
            delay: self.delay_for(attempt, retry_after),
        }
    }
}
