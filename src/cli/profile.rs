//! LaunchProfile and transport resolution.
use std::path::PathBuf;

use clap::ValueEnum;
use serde::Serialize;

use crate::server::config::LoadOptions;

/// MCP transport mode.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    Stdio,
    Tcp,
    /// Streamable HTTP. `sse` is accepted as an alias.
    #[value(alias = "sse")]
    Http,
}

impl TransportMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TransportMode::Stdio => "stdio",
            TransportMode::Tcp => "tcp",
            TransportMode::Http => "http",
        }
    }

    /// Parse a settings value, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "stdio" => Some(TransportMode::Stdio),
            "tcp" => Some(TransportMode::Tcp),
            "http" | "sse" | "streamable-http" => Some(TransportMode::Http),
            _ => None,
        }
    }

    /// Whether `value` names a legacy alias rather than the canonical mode.
    pub fn is_alias(value: &str) -> bool {
        value.trim().eq_ignore_ascii_case("sse")
    }
}

/// Resolved launch profile: command-line overrides for settings loading.
#[derive(Debug, Clone, Default)]
pub struct LaunchProfile {
    pub config_path: Option<PathBuf>,
    pub transport: Option<TransportMode>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub launch_args: Vec<String>,
}

impl LaunchProfile {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config_path.clone(),
            host: self.host.clone(),
            port: self.port,
            transport: self.transport,
        }
    }
}

/// Build launch arguments suitable for reproduction/logging.
pub fn build_launch_args(
    transport: Option<TransportMode>,
    config: Option<&PathBuf>,
    host: Option<&str>,
    port: Option<u16>,
) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(transport) = transport {
        args.push(format!("--transport={}", transport.as_str()));
    }
    if let Some(config) = config {
        args.push(format!("--config={}", config.display()));
    }
    if let Some(host) = host {
        args.push(format!("--host={host}"));
    }
    if let Some(port) = port {
        args.push(format!("--port={port}"));
    }
    args
}
