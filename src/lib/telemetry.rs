//! Telemetry initialization and tool invocation span helpers.

use std::{fs, path::Path, time::Instant};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, info_span, Dispatch, Span};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::server::config::Settings;

/// Initialize `tracing` from the logging settings.
///
/// `RUST_LOG` wins over `logging.level`. Does nothing when
/// `features.logging` is off or a subscriber is already installed.
pub fn init_tracing(settings: &Settings) -> Result<()> {
    if !settings.features.logging || tracing::dispatcher::has_been_set() {
        return Ok(());
    }

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(settings)));
    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_writer(std::io::stderr);
    let file_layer = match settings.logging.file.as_deref() {
        Some(path) => Some(
            fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_writer(open_log_file(path)?),
        ),
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to initialize tracing: {err}"))
}

/// Minimal stderr subscriber used while settings are still being loaded.
pub fn bootstrap_dispatch() -> Dispatch {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();
    Dispatch::new(subscriber)
}

/// `EnvFilter` directives for the configured level; debug mode lifts this
/// crate and `rmcp` to `debug`.
pub fn filter_directives(settings: &Settings) -> String {
    let level = settings.logging.filter_directive();
    if settings.environment.debug {
        format!("{level},rmcp=debug,mcp_template=debug")
    } else {
        level.to_string()
    }
}

fn open_log_file(path: &Path) -> Result<RollingFileAppender> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .with_context(|| format!("log file path {} has no file name", path.display()))?;
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create log directory {}", dir.display()))?;
    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name.to_string_lossy())
        .build(dir)
        .with_context(|| format!("failed to open log file {}", path.display()))
}

/// Span helper recording start and finish of one tool invocation.
pub struct ToolSpan {
    span: Span,
    started_at: Instant,
    invocation_id: Uuid,
}

impl ToolSpan {
    pub fn start(invocation_id: Uuid, tool: &str) -> Self {
        let span = info_span!(
            target: "mcp_template::tools",
            "tool_invocation",
            %invocation_id,
            tool
        );
        Self {
            span,
            started_at: Instant::now(),
            invocation_id,
        }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Close the span while recording outcome and timing.
    pub fn finish(self, success: bool, error_code: Option<&str>, execution_time: f64) {
        let elapsed_ms = self.started_at.elapsed().as_millis();
        let _entered = self.span.enter();
        debug!(
            target: "mcp_template::tools",
            invocation_id = %self.invocation_id,
            success,
            error_code = error_code.unwrap_or(""),
            execution_time,
            elapsed_ms,
            "Tool execution finished"
        );
    }
}

/// Payload for logging MCP runtime state as structured telemetry.
#[derive(Debug, Serialize)]
pub struct RuntimeModeTelemetry<'a> {
    pub transport: &'a str,
    pub host: Option<&'a str>,
    pub port: Option<u16>,
    pub config_path: &'a str,
    pub tools: usize,
    pub resources: usize,
    pub prompts: usize,
    pub launch_args: &'a [String],
}

/// Emit runtime mode to `tracing`.
pub fn emit_runtime_mode(telemetry: &RuntimeModeTelemetry<'_>) {
    info!(
        target: "mcp_template::runtime",
        transport = telemetry.transport,
        host = telemetry.host.unwrap_or(""),
        port = telemetry.port.unwrap_or_default(),
        config_path = telemetry.config_path,
        tools = telemetry.tools,
        resources = telemetry.resources,
        prompts = telemetry.prompts,
        launch_args = ?telemetry.launch_args,
        "Started MCP server"
    );
}
