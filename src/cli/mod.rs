//! CLI entrypoint module structure.
use anyhow::{Context, Result};

use crate::server::config::Settings;

pub mod args;
pub mod profile;

pub use args::{CliCommand, HealthcheckArgs, LaunchProfileArgs, ParsedCommand};
pub use profile::{build_launch_args, LaunchProfile, TransportMode};

/// Render the `show-config` payload.
pub fn render_settings(settings: &Settings) -> Result<String> {
    serde_json::to_string_pretty(&settings.redacted_json()).context("failed to render settings")
}
