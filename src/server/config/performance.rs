use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::server::non_blank;
use crate::lib::errors::FieldProblem;

pub const DEFAULT_MAX_WORKERS: usize = 4;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_MAX_REQUEST_SIZE: usize = 1024 * 1024;
pub const DEFAULT_RETRY_MAX_DELAY_SECONDS: f64 = 30.0;
pub const DEFAULT_ENVIRONMENT: &str = "production";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceSection {
    pub max_workers: usize,
    /// Server-wide bound on a single tool call; 0 disables it.
    pub timeout_seconds: u64,
    pub max_request_size: usize,
    pub retry_max_delay_seconds: f64,
}

impl Default for PerformanceSection {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_MAX_WORKERS,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            max_request_size: DEFAULT_MAX_REQUEST_SIZE,
            retry_max_delay_seconds: DEFAULT_RETRY_MAX_DELAY_SECONDS,
        }
    }
}

impl PerformanceSection {
    pub fn tool_timeout(&self) -> Option<Duration> {
        (self.timeout_seconds > 0).then(|| Duration::from_secs(self.timeout_seconds))
    }

    pub fn retry_max_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.retry_max_delay_seconds)
            .unwrap_or(Duration::from_secs_f64(DEFAULT_RETRY_MAX_DELAY_SECONDS))
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct RawPerformanceSection {
    pub max_workers: Option<i64>,
    pub timeout_seconds: Option<i64>,
    pub max_request_size: Option<i64>,
    pub retry_max_delay_seconds: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentSection {
    pub debug: bool,
    pub name: String,
}

impl Default for EnvironmentSection {
    fn default() -> Self {
        Self {
            debug: false,
            name: DEFAULT_ENVIRONMENT.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct RawEnvironmentSection {
    pub debug: Option<bool>,
    pub name: Option<String>,
}

pub fn parse_performance_section(
    raw: Option<RawPerformanceSection>,
    problems: &mut Vec<FieldProblem>,
) -> PerformanceSection {
    let raw = raw.unwrap_or_default();
    let defaults = PerformanceSection::default();

    let max_workers = match raw.max_workers {
        None => defaults.max_workers,
        Some(n) if n >= 1 => usize::try_from(n).unwrap_or(defaults.max_workers),
        Some(n) => {
            problems.push(FieldProblem::new(
                "performance.max_workers",
                format!("must be at least 1 (got {n})"),
            ));
            defaults.max_workers
        }
    };
    let timeout_seconds = non_negative(
        raw.timeout_seconds,
        "performance.timeout_seconds",
        defaults.timeout_seconds,
        problems,
    );
    let max_request_size = match raw.max_request_size {
        None => defaults.max_request_size,
        Some(n) if n >= 1 => usize::try_from(n).unwrap_or(defaults.max_request_size),
        Some(n) => {
            problems.push(FieldProblem::new(
                "performance.max_request_size",
                format!("must be at least 1 byte (got {n})"),
            ));
            defaults.max_request_size
        }
    };
    let retry_max_delay_seconds = match raw.retry_max_delay_seconds {
        None => defaults.retry_max_delay_seconds,
        Some(secs) if secs.is_finite() && secs >= 0.0 => secs,
        Some(secs) => {
            problems.push(FieldProblem::new(
                "performance.retry_max_delay_seconds",
                format!("must be a non-negative number (got {secs})"),
            ));
            defaults.retry_max_delay_seconds
        }
    };

    PerformanceSection {
        max_workers,
        timeout_seconds,
        max_request_size,
        retry_max_delay_seconds,
    }
}

pub fn parse_environment_section(raw: Option<RawEnvironmentSection>) -> EnvironmentSection {
    let raw = raw.unwrap_or_default();
    EnvironmentSection {
        debug: raw.debug.unwrap_or(false),
        name: non_blank(raw.name)
            .map(|name| name.to_ascii_lowercase())
            .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string()),
    }
}

fn non_negative(
    value: Option<i64>,
    field: &'static str,
    default: u64,
    problems: &mut Vec<FieldProblem>,
) -> u64 {
    match value {
        None => default,
        Some(n) => u64::try_from(n).unwrap_or_else(|_| {
            problems.push(FieldProblem::new(
                field,
                format!("must not be negative (got {n})"),
            ));
            default
        }),
    }
}
