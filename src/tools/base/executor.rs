//! Outer execution wrapper: validation hook, panic capture, timing and
//! classification of every tool outcome into a [`ToolResult`].

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Instant,
};

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, error, Instrument};
use uuid::Uuid;

use super::{
    error::{ToolError, ToolFailure, TIMEOUT_ERROR},
    middleware::{ToolArgs, ToolHandler},
    result::{ToolOutput, ToolResult},
};
use crate::lib::telemetry::ToolSpan;

/// Pre-invocation argument check. Runs before any layer.
pub type ValidateHook = Arc<dyn Fn(&ToolArgs) -> Result<(), ToolError> + Send + Sync>;

/// Invocation counters for one tool.
#[derive(Debug, Default)]
pub struct ToolMetrics {
    calls: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
    timeouts: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ToolMetricsSnapshot {
    pub calls: u64,
    pub successes: u64,
    pub failures: u64,
    pub timeouts: u64,
}

impl ToolMetrics {
    fn record(&self, result: &ToolResult) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if result.is_success() {
            self.successes.fetch_add(1, Ordering::Relaxed);
            return;
        }
        self.failures.fetch_add(1, Ordering::Relaxed);
        if result.error_code() == Some(TIMEOUT_ERROR) {
            self.timeouts.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> ToolMetricsSnapshot {
        ToolMetricsSnapshot {
            calls: self.calls.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
        }
    }
}

/// Aborts the handler task if the caller stops waiting for it.
struct AbortOnDrop(JoinHandle<Result<ToolOutput, ToolFailure>>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// A composed handler plus everything needed to run it safely.
#[derive(Clone)]
pub struct ToolExecutor {
    name: Arc<str>,
    handler: ToolHandler,
    validate: Option<ValidateHook>,
    metrics: Arc<ToolMetrics>,
}

impl std::fmt::Debug for ToolExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolExecutor")
            .field("name", &self.name)
            .field("has_validate_hook", &self.validate.is_some())
            .finish()
    }
}

impl ToolExecutor {
    pub fn new(name: impl Into<Arc<str>>, handler: ToolHandler) -> Self {
        Self {
            name: name.into(),
            handler,
            validate: None,
            metrics: Arc::new(ToolMetrics::default()),
        }
    }

    pub fn with_validate_hook(mut self, hook: ValidateHook) -> Self {
        self.validate = Some(hook);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metrics(&self) -> ToolMetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn metrics_handle(&self) -> Arc<ToolMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Run the tool. Never fails: every outcome becomes a [`ToolResult`].
    pub async fn execute(&self, args: ToolArgs) -> ToolResult {
        let invocation_id = Uuid::new_v4();
        let span = ToolSpan::start(invocation_id, &self.name);
        let started_at = Instant::now();

        let outcome = self.run(args).instrument(span.span().clone()).await;
        let execution_time = started_at.elapsed().as_secs_f64();

        let result = match outcome {
            Ok(output) => ToolResult::success(output, execution_time),
            Err(ToolFailure::Classified(err)) => {
                error!(
                    target: "mcp_template::tools",
                    tool = %self.name,
                    %invocation_id,
                    error_code = %err.error_code,
                    error = %err.message,
                    "Tool error"
                );
                ToolResult::from_tool_error(err, execution_time)
            }
            Err(ToolFailure::Unexpected(err)) => {
                error!(
                    target: "mcp_template::tools",
                    tool = %self.name,
                    %invocation_id,
                    error = ?err,
                    "Unexpected error in tool"
                );
                ToolResult::unexpected(format!("{err:#}"), execution_time)
            }
        };

        self.metrics.record(&result);
        span.finish(result.is_success(), result.error_code(), execution_time);
        result
    }

    async fn run(&self, args: ToolArgs) -> Result<ToolOutput, ToolFailure> {
        debug!(
            target: "mcp_template::tools",
            tool = %self.name,
            arg_count = args.len(),
            "Executing tool"
        );

        if let Some(validate) = &self.validate {
            validate(&args)?;
        }

        let handler = Arc::clone(&self.handler);
        let mut task = AbortOnDrop(tokio::spawn(
            async move { handler(args).await }.in_current_span(),
        ));
        match (&mut task.0).await {
            Ok(outcome) => outcome,
            Err(join_err) if join_err.is_panic() => {
                let panic = join_err.into_panic();
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "non-string panic payload".to_string());
                Err(anyhow::anyhow!("tool panicked: {message}").into())
            }
            Err(join_err) => Err(anyhow::anyhow!("tool task was cancelled: {join_err}").into()),
        }
    }
}
