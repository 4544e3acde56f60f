//! Load and validate server settings.
//!
//! Precedence, lowest first: built-in defaults, TOML file, environment
//! variables, command-line overrides.
use std::{env, path::PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, warn};

use crate::{cli::TransportMode, lib::errors::ConfigError};

pub mod logging;
pub mod performance;
pub mod security;
pub mod server;
pub mod telemetry;

pub use logging::{parse_logging_section, LoggingSection, RawLoggingSection, LOG_LEVELS};
pub use performance::{
    parse_environment_section, parse_performance_section, EnvironmentSection, PerformanceSection,
    RawEnvironmentSection, RawPerformanceSection,
};
pub use security::{parse_security_section, RawSecuritySection, SecuritySection};
pub use server::{
    parse_features_section, parse_server_section, FeaturesSection, RawFeaturesSection,
    RawServerSection, ServerSection, DEFAULT_HOST, DEFAULT_PORT,
};

pub const CONFIG_ENV_KEY: &str = "MCP_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Environment variables mapped onto settings keys.
pub const ENV_BINDINGS: &[(&str, &str)] = &[
    ("server.name", "MCP_SERVER_NAME"),
    ("server.version", "MCP_SERVER_VERSION"),
    ("server.description", "MCP_SERVER_DESCRIPTION"),
    ("server.host", "MCP_HOST"),
    ("server.port", "MCP_PORT"),
    ("server.transport", "MCP_TRANSPORT"),
    ("features.health_check", "ENABLE_HEALTH_CHECK"),
    ("features.metrics", "ENABLE_METRICS"),
    ("features.cors", "ENABLE_CORS"),
    ("features.logging", "ENABLE_LOGGING"),
    ("security.api_key", "API_KEY"),
    ("security.cors_origins", "CORS_ORIGINS"),
    ("security.cors_methods", "CORS_METHODS"),
    ("logging.level", "LOG_LEVEL"),
    ("logging.file", "LOG_FILE"),
    ("performance.max_workers", "MAX_WORKERS"),
    ("performance.timeout_seconds", "TIMEOUT_SECONDS"),
    ("performance.max_request_size", "MAX_REQUEST_SIZE"),
    ("performance.retry_max_delay_seconds", "RETRY_MAX_DELAY_SECONDS"),
    ("environment.debug", "DEBUG"),
    ("environment.name", "ENVIRONMENT"),
];

/// Where the settings file path came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOrigin {
    Cli,
    Env,
    Default,
}

/// Command-line values layered on top of file and environment.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub transport: Option<TransportMode>,
}

/// Top-level settings container.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Settings {
    pub server: ServerSection,
    pub features: FeaturesSection,
    pub security: SecuritySection,
    pub logging: LoggingSection,
    pub performance: PerformanceSection,
    pub environment: EnvironmentSection,
    /// File the settings were read from, if any.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
struct RawSettings {
    server: Option<RawServerSection>,
    features: Option<RawFeaturesSection>,
    security: Option<RawSecuritySection>,
    logging: Option<RawLoggingSection>,
    performance: Option<RawPerformanceSection>,
    environment: Option<RawEnvironmentSection>,
}

impl Settings {
    /// Load using the process environment.
    pub fn load(options: &LoadOptions) -> Result<Self, ConfigError> {
        Self::load_with_env(options, |key| env::var(key).ok())
    }

    /// Load with an explicit environment lookup.
    pub fn load_with_env<F>(options: &LoadOptions, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| env(key).filter(|value| !value.trim().is_empty());

        let (path, origin) = match (&options.config_path, lookup(CONFIG_ENV_KEY)) {
            (Some(path), _) => (path.clone(), ConfigOrigin::Cli),
            (None, Some(path)) => (PathBuf::from(path), ConfigOrigin::Env),
            (None, None) => (PathBuf::from(DEFAULT_CONFIG_PATH), ConfigOrigin::Default),
        };
        let required = origin != ConfigOrigin::Default;
        telemetry::log_env_source(&path, origin);

        let read_error = |err| {
            let error = ConfigError::from_read_error(path.clone(), err);
            error!(
                target: "mcp_template::config",
                path = %path.display(),
                reason = %error,
                "Failed to read configuration file"
            );
            error
        };

        let mut builder = config::Config::builder().add_source(
            config::File::from(path.clone())
                .format(config::FileFormat::Toml)
                .required(required),
        );
        for (key, var) in ENV_BINDINGS {
            builder = builder
                .set_override_option(*key, lookup(*var))
                .map_err(read_error)?;
        }
        builder = builder
            .set_override_option("server.host", options.host.clone())
            .map_err(read_error)?
            .set_override_option("server.port", options.port.map(i64::from))
            .map_err(read_error)?
            .set_override_option(
                "server.transport",
                options.transport.map(|t| t.as_str().to_string()),
            )
            .map_err(read_error)?;

        let document = builder.build().map_err(read_error)?;
        let raw: RawSettings = document.try_deserialize().map_err(|err| {
            let error = ConfigError::from_parse_error(path.clone(), err);
            error!(
                target: "mcp_template::config",
                path = %path.display(),
                reason = %error,
                "Failed to parse configuration file"
            );
            error
        })?;

        let source_path = (required || path.exists()).then(|| path.clone());
        let (settings, problems) = Self::from_raw(raw, source_path);

        if !problems.is_empty() {
            let error = ConfigError::Invalid { problems };
            if settings.is_production() {
                error!(
                    target: "mcp_template::config",
                    path = %path.display(),
                    reason = %error,
                    "Invalid configuration in production"
                );
                return Err(error);
            }
            warn!(
                target: "mcp_template::config",
                reason = %error,
                "Invalid configuration; falling back to defaults for rejected fields"
            );
        }

        telemetry::log_loaded(&settings);
        Ok(settings)
    }

    fn from_raw(
        raw: RawSettings,
        source_path: Option<PathBuf>,
    ) -> (Self, Vec<crate::lib::errors::FieldProblem>) {
        let mut problems = Vec::new();
        let server = parse_server_section(raw.server, &mut problems);
        let features = parse_features_section(raw.features);
        let security = parse_security_section(raw.security);
        let logging = parse_logging_section(raw.logging, &mut problems);
        let performance = parse_performance_section(raw.performance, &mut problems);
        let environment = parse_environment_section(raw.environment);

        let settings = Self {
            server,
            features,
            security,
            logging,
            performance,
            environment,
            source_path,
        };
        (settings, problems)
    }

    pub fn is_development(&self) -> bool {
        self.environment.debug || self.environment.name == "development"
    }

    pub fn is_production(&self) -> bool {
        !self.environment.debug && self.environment.name == "production"
    }

    pub fn require_auth(&self) -> bool {
        self.security.api_key.is_some()
    }

    /// Base URL of the HTTP listener.
    pub fn server_url(&self) -> String {
        let scheme = if self.require_auth() { "https" } else { "http" };
        format!("{scheme}://{}:{}", self.server.host, self.server.port)
    }

    pub fn mcp_endpoint(&self) -> String {
        format!("{}/mcp", self.server_url())
    }

    /// JSON view without secrets, for display.
    pub fn redacted_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// TOML rendering usable as a starting `config.toml`.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
