//! Tools demonstrating the timeout and retry layers.

use std::time::{Duration, Instant};

use chrono::Utc;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;

use crate::{
    lib::errors::RegistrationError,
    server::config::Settings,
    tools::base::{
        parse_args, Retry, RetryPolicy, Timeout, ToolArgs, ToolDefinition, ToolError, ToolFailure,
        ToolOutput, ToolRegistry,
    },
};

pub const INVALID_DURATION: &str = "INVALID_DURATION";
pub const DURATION_TOO_LONG: &str = "DURATION_TOO_LONG";
pub const SIMULATED_FAILURE: &str = "SIMULATED_FAILURE";
pub const INVALID_RATE: &str = "INVALID_RATE";
pub const RANDOM_FAILURE: &str = "RANDOM_FAILURE";

pub const SIMULATED_WORK_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_SIMULATED_SECONDS: f64 = 30.0;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AsyncWorkRequest {
    /// Seconds of simulated work.
    #[serde(default = "default_duration")]
    pub duration: f64,
    /// Fail after the work completes.
    #[serde(default)]
    pub should_fail: bool,
    /// Value returned on success.
    #[serde(default = "default_return_data")]
    pub return_data: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UnreliableRequest {
    /// Probability of success for each attempt (0.0 to 1.0).
    #[serde(default = "default_success_rate")]
    pub success_rate: f64,
    /// Value returned on success.
    #[serde(default = "default_operation_data")]
    pub data: String,
}

fn default_duration() -> f64 {
    1.0
}

fn default_return_data() -> String {
    "work completed".to_string()
}

fn default_success_rate() -> f64 {
    0.7
}

fn default_operation_data() -> String {
    "operation result".to_string()
}

/// Retry schedule for `unreliable_operation`: 3 attempts, 0.5 s doubling.
pub fn unreliable_retry_policy(settings: &Settings) -> RetryPolicy {
    RetryPolicy::new(3, Duration::from_millis(500), 2.0)
        .with_max_delay(settings.performance.retry_max_delay())
}

pub fn register(
    registry: &mut ToolRegistry,
    settings: &Settings,
) -> Result<usize, RegistrationError> {
    registry.register(
        ToolDefinition::new(
            "simulate_async_work",
            "Simulate asynchronous work with configurable duration and failure (10 s timeout)",
        )
        .input_schema::<AsyncWorkRequest>()
        .layer(Timeout::new(SIMULATED_WORK_TIMEOUT))
        .handler(simulate_async_work),
    )?;
    registry.register(
        ToolDefinition::new(
            "unreliable_operation",
            "Simulate an operation that fails at random; retried up to 3 times with backoff",
        )
        .input_schema::<UnreliableRequest>()
        .layer(Retry::new(unreliable_retry_policy(settings)))
        .handler(unreliable_operation),
    )?;
    Ok(2)
}

pub async fn simulate_async_work(args: ToolArgs) -> Result<ToolOutput, ToolFailure> {
    let request: AsyncWorkRequest = parse_args(args)?;
    if request.duration.is_nan() || request.duration < 0.0 {
        return Err(ToolError::new("Duration cannot be negative", INVALID_DURATION).into());
    }
    if request.duration > MAX_SIMULATED_SECONDS {
        return Err(ToolError::new(
            "Duration too long (max 30 seconds)",
            DURATION_TOO_LONG,
        )
        .into());
    }

    let started_at = Instant::now();
    tokio::time::sleep(Duration::from_secs_f64(request.duration)).await;
    if request.should_fail {
        return Err(ToolError::new("Simulated failure occurred", SIMULATED_FAILURE).into());
    }

    let actual = started_at.elapsed().as_secs_f64();
    Ok(ToolOutput::new(json!({
        "result": request.return_data,
        "requested_duration": request.duration,
        "actual_duration": (actual * 1000.0).round() / 1000.0,
        "timestamp": Utc::now().to_rfc3339(),
    }))
    .with_message("Async work completed successfully"))
}

pub async fn unreliable_operation(args: ToolArgs) -> Result<ToolOutput, ToolFailure> {
    let request: UnreliableRequest = parse_args(args)?;
    if !(0.0..=1.0).contains(&request.success_rate) {
        return Err(ToolError::new(
            "Success rate must be between 0.0 and 1.0",
            INVALID_RATE,
        )
        .into());
    }
    if rand::random::<f64>() > request.success_rate {
        return Err(ToolError::new("Random failure occurred", RANDOM_FAILURE).into());
    }

    Ok(ToolOutput::new(json!({ "result": request.data }))
        .with_message("Unreliable operation succeeded")
        .with_metadata("success_rate", request.success_rate)
        .with_metadata("attempt_time", Utc::now().to_rfc3339()))
}
