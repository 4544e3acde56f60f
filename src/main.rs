//! Entry point for the MCP server template.
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use mcp_template::{
    cli::{render_settings, CliCommand, HealthcheckArgs, LaunchProfileArgs, ParsedCommand},
    healthcheck,
    lib::telemetry,
    server::{
        config::Settings,
        runtime::{self, RuntimeExit},
    },
};

fn main() -> ExitCode {
    match bootstrap() {
        Ok(code) => code,
        Err(exit) => exit.report(),
    }
}

fn bootstrap() -> Result<ExitCode, RuntimeExit> {
    let args = LaunchProfileArgs::parse();
    match args.into_command() {
        ParsedCommand::Cli(_, CliCommand::Healthcheck(args)) => run_healthcheck(&args),
        ParsedCommand::Cli(profile, CliCommand::ShowConfig) => {
            let settings = load_settings(&profile)?;
            let rendered = render_settings(&settings).map_err(RuntimeExit::from_error)?;
            println!("{rendered}");
            Ok(ExitCode::SUCCESS)
        }
        ParsedCommand::RunServer(profile) => {
            let settings = load_settings(&profile)?;
            telemetry::init_tracing(&settings).map_err(RuntimeExit::from_error)?;
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(settings.performance.max_workers)
                .enable_all()
                .build()
                .context("failed to build the tokio runtime")
                .map_err(RuntimeExit::from_error)?;
            runtime.block_on(runtime::run_server(profile, settings))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Load settings with a temporary stderr subscriber so config problems are
/// reported before the configured one exists.
fn load_settings(profile: &mcp_template::cli::LaunchProfile) -> Result<Settings, RuntimeExit> {
    tracing::dispatcher::with_default(&telemetry::bootstrap_dispatch(), || {
        Settings::load(&profile.load_options())
    })
    .map_err(RuntimeExit::from_error)
}

/// The probe needs no settings; it logs through the bootstrap subscriber.
fn run_healthcheck(args: &HealthcheckArgs) -> Result<ExitCode, RuntimeExit> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build the tokio runtime")
        .map_err(RuntimeExit::from_error)?;
    let (output, code) = tracing::dispatcher::with_default(&telemetry::bootstrap_dispatch(), || {
        runtime.block_on(healthcheck::run(args))
    })
    .map_err(|err| RuntimeExit::new(format!("Health check ERROR: {err}"), 1))?;
    println!("{output}");
    Ok(ExitCode::from(code))
}
