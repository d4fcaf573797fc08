//! Bounded retry for single HTTP operations
//!
//! Load-test traffic against a live multi-service backend sees bursty
//! transient failures. [`ResilientCaller`] masks them with a small fixed
//! budget:
//! - Retry on status 0 (no response), 408 and anything >= 500
//! - Fixed backoff between attempts (10s by default)
//! - Exhausted budget returns the last outcome unchanged
//!
//! Attempts run strictly one after another on the calling task.

use crate::error::LoadResult;
use crate::http::{HttpTransport, RequestOutcome, RequestSpec, ReqwestTransport};
use crate::logging::{log_debug, log_warn};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry policy for platform requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Fixed wait between attempts
    pub backoff: Duration,
    /// Timeout for point requests that carry no explicit timeout
    pub request_timeout: Duration,
    /// Timeout for list and cursor pages
    pub list_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            list_timeout: Duration::from_secs(120), // list pages over large data sets are slow
        }
    }
}

/// Whether an observed status is a transient infrastructure failure.
///
/// `0` means the transport obtained no response at all.
pub fn is_retryable_status(status: u16) -> bool {
    status == 0 || status == 408 || status >= 500
}

/// Wait between attempts.
///
/// Injected so tests can count waits instead of spending wall-clock time.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeper backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// HTTP caller with a bounded, sequential retry loop
#[derive(Debug)]
pub struct ResilientCaller<T = ReqwestTransport, S = TokioSleeper> {
    transport: T,
    sleeper: S,
    policy: RetryPolicy,
}

impl ResilientCaller {
    /// Caller over the reqwest transport with real sleeps
    pub fn new(policy: RetryPolicy) -> LoadResult<Self> {
        Ok(Self::with_parts(
            ReqwestTransport::new()?,
            TokioSleeper,
            policy,
        ))
    }
}

impl<T, S> ResilientCaller<T, S>
where
    T: HttpTransport,
    S: Sleeper,
{
    pub fn with_parts(transport: T, sleeper: S, policy: RetryPolicy) -> Self {
        Self {
            transport,
            sleeper,
            policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Perform one logical request.
    ///
    /// HTTP-level failures never become errors: the returned outcome is the
    /// first non-retryable one, or the last attempt's outcome once the budget
    /// is spent. Only an unrecoverable transport error is propagated.
    pub async fn call(&self, request: &RequestSpec) -> LoadResult<RequestOutcome> {
        let request = self.with_default_timeout(request);
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let outcome = self.transport.send(&request).await?;

            if !is_retryable_status(outcome.status) {
                log_debug!(
                    attempt = attempt,
                    status = outcome.status,
                    duration_ms = outcome.timing.as_millis(),
                    url = %request.url,
                    "Request completed"
                );
                return Ok(outcome);
            }

            if attempt >= max_attempts {
                log_warn!(
                    attempts = attempt,
                    status = outcome.status,
                    url = %request.url,
                    "Retry budget exhausted, returning last outcome"
                );
                return Ok(outcome);
            }

            log_warn!(
                attempt = attempt,
                max_attempts = max_attempts,
                status = outcome.status,
                backoff_ms = self.policy.backoff.as_millis(),
                url = %request.url,
                "Transient failure, retrying after backoff"
            );
            self.sleeper.sleep(self.policy.backoff).await;
            attempt += 1;
        }
    }

    fn with_default_timeout(&self, request: &RequestSpec) -> RequestSpec {
        let mut request = request.clone();
        if request.params.timeout.is_none() {
            request.params.timeout = Some(self.policy.request_timeout);
        }
        request
    }
}
