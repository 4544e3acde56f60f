//! CLI argument definitions and `LaunchProfile` construction.
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use super::{build_launch_args, LaunchProfile, TransportMode};

/// Parsed command intent from CLI.
#[derive(Debug, Clone)]
pub enum ParsedCommand {
    RunServer(LaunchProfile),
    Cli(LaunchProfile, CliCommand),
}

/// Top-level optional CLI commands.
#[derive(Debug, Clone, Subcommand)]
pub enum CliCommand {
    /// Probe a running server and exit 0 (healthy/warning) or 1 (unhealthy).
    #[command(about = "Check the health of a running server")]
    Healthcheck(HealthcheckArgs),
    /// Print the effective settings as JSON, without secrets.
    #[command(about = "Print the effective settings (secrets omitted)")]
    ShowConfig,
}

/// Arguments for `healthcheck`.
#[derive(Debug, Clone, Args)]
#[command(
    long_about = "Check the health of a running server.\n\nChecks:\n  http       GET /health\n  mcp        initialize, ping and tools/list over /mcp\n  resources  local CPU and memory usage",
    after_help = "Exit status is 0 for healthy or warning, 1 for unhealthy."
)]
pub struct HealthcheckArgs {
    /// Server host.
    #[arg(long, env = "MCP_HOST", default_value = "localhost")]
    pub host: String,
    /// Server port.
    #[arg(long, env = "MCP_PORT", default_value_t = 8000)]
    pub port: u16,
    /// Print check details even when healthy.
    #[arg(long, env = "HEALTH_CHECK_VERBOSE", default_value_t = false)]
    pub verbose: bool,
    /// Print the full report as JSON.
    #[arg(long, default_value_t = false)]
    pub json: bool,
    /// Sent as `X-API-Key` when the server requires one.
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

/// Command-line arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "mcp-template",
    author,
    version,
    about = "MCP server template (tools, resources, prompts)",
    long_about = None
)]
pub struct LaunchProfileArgs {
    /// Transport to serve: stdio, tcp or http (`sse` is an alias of http).
    #[arg(long, value_enum)]
    pub transport: Option<TransportMode>,
    /// Path to config.toml (overrides MCP_CONFIG_PATH).
    #[arg(long = "config")]
    pub config_override: Option<PathBuf>,
    /// Listener host (overrides MCP_HOST).
    #[arg(long)]
    pub host: Option<String>,
    /// Listener port (overrides MCP_PORT).
    #[arg(long)]
    pub port: Option<u16>,
    /// Optional CLI command mode.
    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

impl LaunchProfileArgs {
    /// Build a `LaunchProfile` from the CLI overrides.
    pub fn build(&self) -> LaunchProfile {
        LaunchProfile {
            config_path: self.config_override.clone(),
            transport: self.transport,
            host: self.host.clone(),
            port: self.port,
            launch_args: build_launch_args(
                self.transport,
                self.config_override.as_ref(),
                self.host.as_deref(),
                self.port,
            ),
        }
    }

    /// Parse CLI args into either server launch mode or utility command mode.
    pub fn into_command(self) -> ParsedCommand {
        let profile = self.build();
        match self.command {
            Some(command) => ParsedCommand::Cli(profile, command),
            None => ParsedCommand::RunServer(profile),
        }
    }
}
