use std::path::Path;

use tracing::{debug, info};

use super::{ConfigOrigin, Settings, CONFIG_ENV_KEY, DEFAULT_CONFIG_PATH};

pub fn log_env_source(path: &Path, origin: ConfigOrigin) {
    match origin {
        ConfigOrigin::Cli => info!(
            target: "mcp_template::config",
            path = %path.display(),
            "Loading configuration from --config"
        ),
        ConfigOrigin::Env => info!(
            target: "mcp_template::config",
            path = %path.display(),
            "Loading configuration using MCP_CONFIG_PATH environment variable"
        ),
        ConfigOrigin::Default => debug!(
            target: "mcp_template::config",
            path = %path.display(),
            env = CONFIG_ENV_KEY,
            default = DEFAULT_CONFIG_PATH,
            "MCP_CONFIG_PATH not set; using optional default config.toml"
        ),
    }
}

pub fn log_loaded(settings: &Settings) {
    info!(
        target: "mcp_template::config",
        path = %settings
            .source_path
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<defaults>".to_string()),
        name = %settings.server.name,
        transport = settings.server.transport.as_str(),
        host = %settings.server.host,
        port = settings.server.port,
        environment = %settings.environment.name,
        debug = settings.environment.debug,
        require_auth = settings.require_auth(),
        timeout_seconds = settings.performance.timeout_seconds,
        "Configuration loaded successfully"
    );
}
