//! Retrying HTTP fetch layer with status-aware backoff.
//!
//! Every upstream request in the pipeline goes through [`Fetcher::get`]:
//!
//! 1. 2xx responses return immediately with the body.
//! 2. Retryable statuses (429, 502, 503, 504) and transport errors
//!    consume one attempt, sleep, and retry until the budget runs out.
//! 3. Any other status returns immediately as a non-retryable
//!    [`FetchError::Status`] without consuming the remaining budget.
//!
//! The retry schedule is pure exponential backoff with no jitter:
//! `initial_delay * backoff_factor^(k-1)` before attempt `k+1`.
//!
//! The loop itself ([`run_policy`]) is generic over the function that
//! performs one attempt, so the schedule and classification are
//! testable without a network.

pub mod gate;

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::{FetchError, FetchResult};

pub use gate::RequestGate;

/// User-Agent sent on every request. Some of the chart endpoints
/// reject requests without a browser-looking agent.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";

/// Per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(12);

// =============================================================================
// Status Classification
// =============================================================================

/// What a response status code tells the retry loop to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// 2xx - return the body.
    Success,
    /// Transient upstream condition - retry with backoff.
    Retry,
    /// Anything else - fail immediately, keep the retry budget.
    Fail,
}

/// Classify an HTTP status code.
pub fn classify(status: u16) -> Disposition {
    match status {
        200..=299 => Disposition::Success,
        429 | 502 | 503 | 504 => Disposition::Retry,
        _ => Disposition::Fail,
    }
}

// =============================================================================
// Retry Policy
// =============================================================================

/// Retry budget and backoff schedule.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Multiplier applied to the delay after each retry.
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_delay: Duration::from_secs(1),
            backoff_factor: 1.8,
        }
    }
}

impl RetryPolicy {
    /// Delay to sleep after `completed` attempts have failed.
    ///
    /// `completed = 1` yields the initial delay; each further attempt
    /// multiplies it by the backoff factor.
    pub fn delay_after(&self, completed: u32) -> Duration {
        let exponent = completed.saturating_sub(1);
        self.initial_delay
            .mul_f64(self.backoff_factor.powi(exponent as i32))
    }
}

// =============================================================================
// Retry Loop
// =============================================================================

/// Raw result of a single fetch attempt, before classification.
#[derive(Debug)]
pub enum Attempt {
    /// Got an HTTP response. The body is only populated for 2xx.
    Response { status: u16, body: String },
    /// Transport-level failure (timeout, connection error, ...).
    Transport(String),
}

/// Drive `attempt_fn` under `policy` until success, a non-retryable
/// status, or retry exhaustion.
///
/// Emits a warning per failed attempt; diagnostics only, never
/// control flow.
pub async fn run_policy<F, Fut>(
    policy: &RetryPolicy,
    url: &str,
    mut attempt_fn: F,
) -> FetchResult<String>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Attempt>,
{
    let mut last = String::from("no attempts made");

    for attempt in 1..=policy.max_attempts {
        match attempt_fn().await {
            Attempt::Response { status, body } => match classify(status) {
                Disposition::Success => return Ok(body),
                Disposition::Retry => {
                    warn!(
                        url,
                        status,
                        attempt,
                        max = policy.max_attempts,
                        "retryable HTTP status"
                    );
                    last = format!("HTTP {status}");
                }
                Disposition::Fail => {
                    warn!(url, status, attempt, "non-retryable HTTP status");
                    return Err(FetchError::Status {
                        url: url.to_string(),
                        status,
                    });
                }
            },
            Attempt::Transport(err) => {
                warn!(
                    url,
                    error = %err,
                    attempt,
                    max = policy.max_attempts,
                    "transport error"
                );
                last = err;
            }
        }

        if attempt < policy.max_attempts {
            tokio::time::sleep(policy.delay_after(attempt)).await;
        }
    }

    Err(FetchError::Exhausted {
        url: url.to_string(),
        attempts: policy.max_attempts,
        last,
    })
}

// =============================================================================
// Fetcher
// =============================================================================

/// HTTP GET with bounded retries; the foundation every other
/// component calls through.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    policy: RetryPolicy,
}

impl Fetcher {
    /// Create a fetcher with the given retry policy and the default
    /// User-Agent and timeout.
    pub fn new(policy: RetryPolicy) -> FetchResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { client, policy })
    }

    /// The policy this fetcher retries under.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// GET `url` and return the response body.
    ///
    /// Returns a [`FetchError`] instead of raising; callers treat any
    /// error as "no data".
    pub async fn get(&self, url: &str) -> FetchResult<String> {
        // Each attempt future owns its request data; the client clone
        // is a cheap handle.
        let client = self.client.clone();
        let target = url.to_string();

        run_policy(&self.policy, url, move || {
            let client = client.clone();
            let target = target.clone();
            async move {
                match client.get(&target).send().await {
                    Ok(response) => {
                        let status = response.status().as_u16();
                        if classify(status) == Disposition::Success {
                            match response.text().await {
                                Ok(body) => Attempt::Response { status, body },
                                Err(e) => Attempt::Transport(e.to_string()),
                            }
                        } else {
                            Attempt::Response {
                                status,
                                body: String::new(),
                            }
                        }
                    }
                    Err(e) => Attempt::Transport(e.to_string()),
                }
            }
        })
        .await
    }
}
