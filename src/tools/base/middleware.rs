//! Layers wrapped around tool handlers: required-parameter validation,
//! wall-time bounds, and retry with exponential backoff.
//!
//! Every layer takes a [`ToolHandler`] and returns one with the same
//! signature, so layers stack in any order.

use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use serde_json::{json, Map, Value};
use tokio::time;
use tracing::{error, warn};

use super::{
    error::{ToolError, ToolFailure, MISSING_PARAMETERS, TIMEOUT_ERROR},
    result::ToolOutput,
};

/// Named arguments supplied to a tool call.
pub type ToolArgs = Map<String, Value>;
/// Future produced by a tool handler.
pub type ToolFuture = Pin<Box<dyn Future<Output = Result<ToolOutput, ToolFailure>> + Send>>;
/// Shared, re-invocable tool handler.
pub type ToolHandler = Arc<dyn Fn(ToolArgs) -> ToolFuture + Send + Sync>;

/// Wrap an async closure as a [`ToolHandler`].
pub fn handler_fn<F, Fut>(f: F) -> ToolHandler
where
    F: Fn(ToolArgs) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ToolOutput, ToolFailure>> + Send + 'static,
{
    Arc::new(move |args: ToolArgs| -> ToolFuture { Box::pin(f(args)) })
}

/// A wrapper applied around a handler at registration time.
pub trait ToolLayer: Send + Sync {
    fn layer(&self, inner: ToolHandler) -> ToolHandler;
}

/// Names from `required` that are absent from `args`, in `required` order.
pub fn missing_parameters<S: AsRef<str>>(required: &[S], args: &ToolArgs) -> Vec<String> {
    required
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| !args.contains_key(*name))
        .map(str::to_string)
        .collect()
}

/// Fail with `MISSING_PARAMETERS` if any required name is absent.
pub fn ensure_required<S: AsRef<str>>(required: &[S], args: &ToolArgs) -> Result<(), ToolError> {
    let missing = missing_parameters(required, args);
    if missing.is_empty() {
        return Ok(());
    }
    Err(ToolError::new(
        format!("Missing required parameters: {}", missing.join(", ")),
        MISSING_PARAMETERS,
    )
    .with_detail("missing_parameters", json!(missing)))
}

/// Rejects calls that omit any of a fixed list of parameter names.
#[derive(Debug, Clone)]
pub struct RequireParams {
    names: Arc<[String]>,
}

impl RequireParams {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl ToolLayer for RequireParams {
    fn layer(&self, inner: ToolHandler) -> ToolHandler {
        let names = Arc::clone(&self.names);
        Arc::new(move |args: ToolArgs| -> ToolFuture {
            if let Err(err) = ensure_required(&names, &args) {
                return Box::pin(async move { Err::<ToolOutput, _>(ToolFailure::from(err)) });
            }
            inner(args)
        })
    }
}

/// Bounds the wall time of the wrapped handler.
#[derive(Debug, Clone, Copy)]
pub struct Timeout {
    limit: Duration,
}

impl Timeout {
    pub fn new(limit: Duration) -> Self {
        Self { limit }
    }

    pub fn from_secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }
}

impl ToolLayer for Timeout {
    fn layer(&self, inner: ToolHandler) -> ToolHandler {
        let limit = self.limit;
        Arc::new(move |args: ToolArgs| -> ToolFuture {
            let call = inner(args);
            Box::pin(async move {
                match time::timeout(limit, call).await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(ToolFailure::from(ToolError::new(
                        format!(
                            "Tool execution timed out after {} seconds",
                            limit.as_secs_f64()
                        ),
                        TIMEOUT_ERROR,
                    ))),
                }
            })
        })
    }
}

/// Attempt count and backoff schedule for [`Retry`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
    backoff: f64,
    max_delay: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1), 2.0)
    }
}

impl RetryPolicy {
    /// `max_attempts` counts the first call; zero is treated as one.
    pub fn new(max_attempts: u32, delay: Duration, backoff: f64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            backoff,
            max_delay: None,
        }
    }

    /// Cap the delay between attempts.
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = Some(max_delay);
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay slept after failed attempt number `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let mut delay = self.first_delay();
        for _ in 0..attempt {
            delay = self.next_delay(delay);
        }
        delay
    }

    fn first_delay(&self) -> Duration {
        self.max_delay.map_or(self.delay, |cap| self.delay.min(cap))
    }

    fn next_delay(&self, current: Duration) -> Duration {
        let grown = Duration::try_from_secs_f64(current.as_secs_f64() * self.backoff)
            .unwrap_or(if self.backoff < 0.0 || self.backoff.is_nan() {
                Duration::ZERO
            } else {
                Duration::MAX
            });
        match self.max_delay {
            Some(cap) => grown.min(cap),
            None => grown,
        }
    }
}

/// Re-invokes the wrapped handler on any failure, sleeping between attempts.
///
/// When attempts run out the last failure is returned as-is.
#[derive(Debug, Clone, Copy)]
pub struct Retry {
    policy: RetryPolicy,
}

impl Retry {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }
}

impl ToolLayer for Retry {
    fn layer(&self, inner: ToolHandler) -> ToolHandler {
        let policy = self.policy;
        Arc::new(move |args: ToolArgs| -> ToolFuture {
            let inner = Arc::clone(&inner);
            Box::pin(async move {
                let mut current_delay = policy.first_delay();
                let mut attempt = 0;
                loop {
                    attempt += 1;
                    match inner(args.clone()).await {
                        Ok(output) => return Ok(output),
                        Err(err) if attempt < policy.max_attempts => {
                            warn!(
                                target: "mcp_template::tools",
                                attempt,
                                delay_secs = current_delay.as_secs_f64(),
                                error = %err,
                                "Tool attempt failed; retrying"
                            );
                            time::sleep(current_delay).await;
                            current_delay = policy.next_delay(current_delay);
                        }
                        Err(err) => {
                            error!(
                                target: "mcp_template::tools",
                                attempts = policy.max_attempts,
                                error = %err,
                                "Tool failed after all attempts"
                            );
                            return Err(err);
                        }
                    }
                }
            })
        })
    }
}
