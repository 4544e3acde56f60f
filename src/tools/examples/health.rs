use chrono::Utc;
use serde_json::{json, Value};

use crate::{
    lib::{errors::RegistrationError, system::SystemSnapshot},
    server::config::Settings,
    tools::base::{
        ToolArgs, ToolDefinition, ToolError, ToolFailure, ToolOutput, ToolRegistry,
    },
};

pub const HEALTH_CHECK_ERROR: &str = "HEALTH_CHECK_ERROR";

/// Usage (percent) at or above which CPU or memory turns the status to `warning`.
const WARNING_THRESHOLD: f64 = 90.0;

pub fn register(
    registry: &mut ToolRegistry,
    _settings: &Settings,
) -> Result<usize, RegistrationError> {
    registry.register(
        ToolDefinition::new(
            "system_health_check",
            "Report host CPU, memory and disk usage",
        )
        .handler(system_health_check),
    )?;
    Ok(1)
}

pub async fn system_health_check(_args: ToolArgs) -> Result<ToolOutput, ToolFailure> {
    let snapshot = tokio::task::spawn_blocking(SystemSnapshot::capture)
        .await
        .map_err(|err| ToolError::new(format!("Health check failed: {err}"), HEALTH_CHECK_ERROR))?;

    Ok(ToolOutput::new(health_report(&snapshot))
        .with_message("Health check completed")
        .with_metadata("check_time", Utc::now().to_rfc3339()))
}

pub fn health_report(snapshot: &SystemSnapshot) -> Value {
    let disk = snapshot.disk.as_ref().map(|disk| {
        json!({
            "mount_point": disk.mount_point,
            "total_gb": disk.total_gb,
            "free_gb": disk.free_gb,
            "usage_percent": disk.percent,
        })
    });
    json!({
        "os": snapshot.os,
        "cpu_count": snapshot.cpu_count,
        "cpu_usage_percent": crate::lib::system::round2(snapshot.cpu_percent),
        "memory": {
            "total_gb": snapshot.memory_total_gb,
            "available_gb": snapshot.memory_available_gb,
            "usage_percent": crate::lib::system::round2(snapshot.memory_percent),
        },
        "disk": disk,
        "status": status_for(snapshot.cpu_percent, snapshot.memory_percent),
    })
}

fn status_for(cpu_percent: f64, memory_percent: f64) -> &'static str {
    if cpu_percent < WARNING_THRESHOLD && memory_percent < WARNING_THRESHOLD {
        "healthy"
    } else {
        "warning"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lib::system::DiskUsage;

    fn snapshot(cpu: f64, memory: f64) -> SystemSnapshot {
        SystemSnapshot {
            cpu_percent: cpu,
            cpu_count: 4,
            memory_percent: memory,
            memory_total_gb: 16.0,
            memory_available_gb: 8.0,
            disk: Some(DiskUsage {
                mount_point: "/".into(),
                total_gb: 100.0,
                free_gb: 40.0,
                percent: 60.0,
            }),
            os: "Linux".into(),
        }
    }

    #[test]
    fn status_turns_to_warning_at_ninety_percent() {
        assert_eq!(status_for(89.9, 10.0), "healthy");
        assert_eq!(status_for(90.0, 10.0), "warning");
        assert_eq!(status_for(10.0, 95.0), "warning");
    }

    #[test]
    fn report_shape() {
        let report = health_report(&snapshot(12.345, 50.0));
        assert_eq!(report["cpu_usage_percent"], json!(12.35));
        assert_eq!(report["memory"]["total_gb"], json!(16.0));
        assert_eq!(report["disk"]["usage_percent"], json!(60.0));
        assert_eq!(report["status"], json!("healthy"));
    }

    #[tokio::test]
    async fn tool_returns_report_with_message() {
        let output = system_health_check(ToolArgs::new()).await.expect("health");
        assert!(output.data["status"].is_string());
        assert!(output.data.get("success").is_none());
        assert_eq!(output.message(), Some("Health check completed"));
        assert!(output.metadata.contains_key("check_time"));
    }
}
