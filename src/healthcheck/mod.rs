//! `healthcheck` command: probes a running server and reports one verdict.

pub mod checks;

use std::time::Instant;

use reqwest::Client;
use serde::Serialize;
use tracing::info;

use crate::{cli::HealthcheckArgs, lib::errors::HealthCheckError};

pub use checks::{
    check_http, check_mcp, check_resources, classify_resources, overall_status, CheckResult,
    CheckStatus, REQUEST_TIMEOUT,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthChecks {
    pub http: CheckResult,
    pub mcp: CheckResult,
    pub resources: CheckResult,
}

impl HealthChecks {
    fn iter(&self) -> impl Iterator<Item = (&'static str, &CheckResult)> {
        [
            ("http", &self.http),
            ("mcp", &self.mcp),
            ("resources", &self.resources),
        ]
        .into_iter()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub overall_status: CheckStatus,
    pub checks: HealthChecks,
    pub execution_time: f64,
    pub timestamp: f64,
}

impl HealthReport {
    pub fn new(checks: HealthChecks, execution_time: f64) -> Self {
        let overall_status = overall_status(checks.iter().map(|(_, check)| check.status));
        Self {
            overall_status,
            checks,
            execution_time: (execution_time * 1000.0).round() / 1000.0,
            timestamp: chrono::Utc::now().timestamp_millis() as f64 / 1000.0,
        }
    }

    /// 0 when the server can keep serving (healthy or warning), 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        match self.overall_status {
            CheckStatus::Healthy | CheckStatus::Warning => 0,
            CheckStatus::Unhealthy => 1,
        }
    }

    /// Summary line followed by the relevant check messages.
    pub fn render_summary(&self, verbose: bool) -> String {
        let headline = match self.overall_status {
            CheckStatus::Healthy => "Health check PASSED",
            CheckStatus::Warning => "Health check WARNING",
            CheckStatus::Unhealthy => "Health check FAILED",
        };
        let mut lines = vec![format!("{headline} (took {}s)", self.execution_time)];
        for (name, check) in self.checks.iter() {
            let shown = match self.overall_status {
                CheckStatus::Healthy => verbose,
                CheckStatus::Warning => check.status != CheckStatus::Healthy,
                CheckStatus::Unhealthy => check.status == CheckStatus::Unhealthy,
            };
            if shown {
                lines.push(format!("   - {name}: {}", check.message));
            }
        }
        lines.join("\n")
    }
}

/// Runs the three checks against one server.
pub struct HealthChecker {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HealthChecker {
    pub fn new(host: &str, port: u16, api_key: Option<String>) -> Result<Self, HealthCheckError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(HealthCheckError::Client)?;
        Ok(Self {
            client,
            base_url: format!("http://{host}:{port}"),
            api_key,
        })
    }

    pub fn mcp_url(&self) -> String {
        format!("{}/mcp", self.base_url)
    }

    pub async fn run_all_checks(&self) -> HealthReport {
        let started_at = Instant::now();
        let api_key = self.api_key.as_deref();
        let checks = HealthChecks {
            http: check_http(&self.client, &self.base_url, api_key).await,
            mcp: check_mcp(&self.mcp_url(), api_key).await,
            resources: check_resources().await,
        };
        let report = HealthReport::new(checks, started_at.elapsed().as_secs_f64());
        info!(
            target: "mcp_template::health",
            overall_status = report.overall_status.as_str(),
            execution_time = report.execution_time,
            "Health check finished"
        );
        report
    }
}

/// Execute the `healthcheck` command; returns the text to print and the exit code.
pub async fn run(args: &HealthcheckArgs) -> Result<(String, u8), HealthCheckError> {
    let checker = HealthChecker::new(&args.host, args.port, args.api_key.clone())?;
    let report = checker.run_all_checks().await;
    let output = if args.json {
        serde_json::to_string_pretty(&report)?
    } else {
        report.render_summary(args.verbose)
    };
    Ok((output, report.exit_code()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checks(http: CheckStatus, mcp: CheckStatus, resources: CheckStatus) -> HealthChecks {
        HealthChecks {
            http: CheckResult::new(http, "http says hi"),
            mcp: CheckResult::new(mcp, "mcp says hi"),
            resources: CheckResult::new(resources, "resources say hi"),
        }
    }

    #[test]
    fn healthy_report_is_terse_unless_verbose() {
        use CheckStatus::Healthy;
        let report = HealthReport::new(checks(Healthy, Healthy, Healthy), 0.12345);
        assert_eq!(report.exit_code(), 0);
        assert_eq!(report.render_summary(false), "Health check PASSED (took 0.123s)");
        assert_eq!(
            report.render_summary(true),
            "Health check PASSED (took 0.123s)\n   - http: http says hi\n   - mcp: mcp says hi\n   - resources: resources say hi"
        );
    }

    #[test]
    fn warning_lists_non_healthy_checks_and_exits_zero() {
        use CheckStatus::{Healthy, Warning};
        let report = HealthReport::new(checks(Healthy, Healthy, Warning), 1.0);
        assert_eq!(report.overall_status, Warning);
        assert_eq!(report.exit_code(), 0);
        assert_eq!(
            report.render_summary(false),
            "Health check WARNING (took 1s)\n   - resources: resources say hi"
        );
    }

    #[test]
    fn unhealthy_lists_only_failures_and_exits_one() {
        use CheckStatus::{Healthy, Unhealthy, Warning};
        let report = HealthReport::new(checks(Unhealthy, Healthy, Warning), 0.5);
        assert_eq!(report.exit_code(), 1);
        assert_eq!(
            report.render_summary(true),
            "Health check FAILED (took 0.5s)\n   - http: http says hi"
        );
    }

    #[test]
    fn json_report_has_named_checks() {
        use CheckStatus::Healthy;
        let report = HealthReport::new(checks(Healthy, Healthy, Healthy), 0.0);
        let value = serde_json::to_value(&report).expect("serializes");
        assert_eq!(value["overall_status"], serde_json::json!("healthy"));
        assert_eq!(value["checks"]["mcp"]["message"], serde_json::json!("mcp says hi"));
    }
}
