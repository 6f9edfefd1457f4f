//! Resilient fetching: status classification, exponential backoff and the
//! shared rate-limit cooldown

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tracing::{debug, instrument};

use super::http_client::{Transport, TransportResponse};
use super::rate_limit::Cooldown;
use super::urls::EndpointRequest;
use crate::constants::retry;
use crate::error::AppError;
use crate::logging::RunLog;

/// Source of time for backoff and cooldown. Injected so tests can observe
/// sleeps without waiting.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Instant;

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// Wall clock backed by the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

/// How the retry loop treats an HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    /// 429 and 5xx
    Retryable,
    /// Everything else; fail without spending retries
    Terminal,
}

pub fn classify(status: u16) -> StatusClass {
    match status {
        200..=299 => StatusClass::Success,
        429 | 500..=599 => StatusClass::Retryable,
        _ => StatusClass::Terminal,
    }
}

/// Retry budget and backoff base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: retry::MAX_RETRIES,
            base_delay: Duration::from_secs(retry::BASE_DELAY_SECONDS),
        }
    }
}

impl RetryPolicy {
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// `base_delay << attempt`, no cap and no jitter.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Executes GET requests with retry, backoff and the shared cooldown.
pub struct Fetcher<T, C = TokioClock> {
    transport: T,
    clock: C,
    policy: RetryPolicy,
    cooldown: Option<Cooldown>,
    log: Arc<dyn RunLog>,
}

impl<T: Transport, C: Clock> Fetcher<T, C> {
    pub fn new(transport: T, clock: C, log: Arc<dyn RunLog>) -> Self {
        Self {
            transport,
            clock,
            policy: RetryPolicy::default(),
            cooldown: None,
            log,
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_cooldown(mut self, cooldown: Cooldown) -> Self {
        self.cooldown = Some(cooldown);
        self
    }

    /// Fetches the full response body for `request`.
    ///
    /// # Errors
    /// * `AppError::Network` - transport failures on every attempt, or a body
    ///   that could not be read after a 2xx (never retried)
    /// * `AppError::RetryExhausted` - 429/5xx on every attempt
    /// * `AppError::Client` - any other status, on the first occurrence
    #[instrument(skip(self, request), fields(url = %request.url()))]
    pub async fn fetch(&self, request: &EndpointRequest) -> Result<Bytes, AppError> {
        let url = request.url();
        let attempts = self.policy.max_attempts();

        for attempt in 0..attempts {
            self.wait_for_cooldown().await;

            let delay = self.policy.delay_for(attempt);
            let has_retry = attempt + 1 < attempts;

            let response = match self.transport.send(request).await {
                Ok(response) => response,
                Err(e) if has_retry => {
                    self.log.write_line(&format!(
                        "HTTP client error (attempt {}/{attempts}): {e} - retrying after {delay:?}",
                        attempt + 1
                    ));
                    self.clock.sleep(delay).await;
                    continue;
                }
                Err(e) => {
                    self.log.write_line(&format!(
                        "HTTP client error on final attempt {}/{attempts}, no response received: {e}",
                        attempt + 1
                    ));
                    return Err(AppError::network(url, e.to_string()));
                }
            };

            let status = response.status();
            debug!("Response status: {status}");

            match classify(status) {
                StatusClass::Success => {
                    return response.bytes().await.map_err(|e| {
                        self.log
                            .write_line(&format!("{status} - error reading response body: {e}"));
                        AppError::network(&url, format!("failed to read body after {status}: {e}"))
                    });
                }
                StatusClass::Retryable => {
                    drop(response);
                    if status == 429 {
                        self.arm_cooldown();
                    }
                    if has_retry {
                        self.log.write_line(&format!(
                            "{status} - retryable response (attempt {}/{attempts}), retrying after {delay:?}",
                            attempt + 1
                        ));
                        self.clock.sleep(delay).await;
                        continue;
                    }
                    self.log.write_line(&format!(
                        "{status} - final retry failed (attempt {}/{attempts}) for {url}",
                        attempt + 1
                    ));
                    return Err(AppError::retry_exhausted(url, status, attempts));
                }
                StatusClass::Terminal => {
                    drop(response);
                    self.log.write_line(&format!(
                        "{status} - non-retryable HTTP error (attempt {}/{attempts}) for {url}",
                        attempt + 1
                    ));
                    return Err(AppError::client(url, status));
                }
            }
        }

        Err(AppError::network(url, "retry loop ended without a response"))
    }

    fn arm_cooldown(&self) {
        if let Some(cooldown) = &self.cooldown {
            cooldown.trigger(self.clock.now());
            self.log.write_line(&format!(
                "429 - rate limited, holding new requests for {:?}",
                cooldown.duration()
            ));
        }
    }

    async fn wait_for_cooldown(&self) {
        let Some(cooldown) = &self.cooldown else {
            return;
        };
        while let Some(wait) = cooldown.remaining(self.clock.now()) {
            debug!("Rate-limit cooldown active, waiting {wait:?}");
            self.clock.sleep(wait).await;
        }
    }
}
