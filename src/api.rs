//! LLM calls with exponential backoff.
//!
//! [`AskAsync`] is the seam: [`AskFnWrapper`] talks to the OpenAI-compatible
//! endpoint through `awful_aj`, and [`RetryAsk`] decorates any implementation
//! with retries.
//!
//! Delay before retry `n` (1-based):
//! ```text
//! min(base_delay * 2^(n-1), max_delay) + jitter(0..=250ms)
//! ```

use awful_aj::api::ask;
use awful_aj::{config::AwfulJadeConfig, template::ChatTemplate};
use rand::{Rng, rng};
use std::error::Error;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

pub trait AskAsync {
    type Response;

    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>>;
}

/// Retry settings for [`RetryAsk`].
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry number `attempt` (1-based), without jitter.
    pub fn delay_for(&self, attempt: usize) -> Duration {
        let shift = attempt.saturating_sub(1).min(31) as u32;
        self.base_delay
            .saturating_mul(1u32 << shift)
            .min(self.max_delay)
    }
}

pub struct RetryAsk<T> {
    inner: T,
    policy: RetryPolicy,
}

impl<T: AskAsync> RetryAsk<T> {
    pub fn new(inner: T, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

impl<T> fmt::Debug for RetryAsk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryAsk").field("policy", &self.policy).finish()
    }
}

impl<T: AskAsync> AskAsync for RetryAsk<T> {
    type Response = T::Response;

    #[instrument(level = "info", skip_all)]
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>> {
        let started = Instant::now();
        let mut attempt = 0usize;
        loop {
            match self.inner.ask(text).await {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    attempt += 1;
                    if attempt > self.policy.max_retries {
                        error!(
                            attempt,
                            max = self.policy.max_retries,
                            elapsed_ms_total = started.elapsed().as_millis() as u64,
                            error = %e,
                            "LLM call exhausted retries"
                        );
                        return Err(e);
                    }
                    let jitter = Duration::from_millis(rng().random_range(0..=250));
                    let delay = self.policy.delay_for(attempt) + jitter;
                    warn!(
                        attempt,
                        max = self.policy.max_retries,
                        ?delay,
                        error = %e,
                        "LLM call failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Adapter from `awful_aj::api::ask` to [`AskAsync`].
#[derive(Debug)]
pub struct AskFnWrapper<'a> {
    pub config: &'a AwfulJadeConfig,
    pub template: &'a ChatTemplate,
}

impl AskAsync for AskFnWrapper<'_> {
    type Response = String;

    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>> {
        ask(self.config, text.to_string(), self.template, None, None).await
    }
}

/// Send `text` through `template` with retries.
#[instrument(level = "info", skip_all, fields(bytes = text.len()))]
pub async fn ask_with_backoff(
    config: &AwfulJadeConfig,
    template: &ChatTemplate,
    text: &str,
    policy: RetryPolicy,
) -> Result<String, Box<dyn Error>> {
    let started = Instant::now();
    let api = RetryAsk::new(AskFnWrapper { config, template }, policy);
    let res = api.ask(text).await;
    let elapsed_ms = started.elapsed().as_millis() as u64;
    match &res {
        Ok(_) => info!(elapsed_ms, "LLM call succeeded"),
        Err(e) => error!(elapsed_ms, error = %e, "LLM call failed"),
    }
    res
}
