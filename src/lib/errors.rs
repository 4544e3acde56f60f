use std::path::PathBuf;

use config::ConfigError as ConfigLoaderError;
use rmcp::model::ErrorData;
use thiserror::Error;

use crate::tools::base::ToolError;

/// Errors that can occur while loading or validating configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to build (read) the configuration sources.
    #[error("Failed to read configuration file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: ConfigLoaderError,
    },
    /// Failed to deserialize the merged sources into settings.
    #[error("Failed to parse configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ConfigLoaderError,
    },
    /// One or more fields failed validation.
    #[error("Configuration validation failed: {}", join_problems(.problems))]
    Invalid { problems: Vec<FieldProblem> },
}

impl ConfigError {
    /// Helper to wrap `config::ConfigError` as a read failure.
    pub fn from_read_error(path: PathBuf, source: ConfigLoaderError) -> Self {
        Self::FileRead { path, source }
    }

    /// Helper to wrap `config::ConfigError` as a parse failure.
    pub fn from_parse_error(path: PathBuf, source: ConfigLoaderError) -> Self {
        Self::Parse { path, source }
    }
}

/// A single rejected setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldProblem {
    pub field: &'static str,
    pub message: String,
}

impl FieldProblem {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

fn join_problems(problems: &[FieldProblem]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl std::fmt::Display for FieldProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "`{}` {}", self.field, self.message)
    }
}

/// Errors raised while adding tools, resources or prompts to a registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("`{name}` is already registered")]
    Duplicate { name: String },
    #[error("invalid name `{name}`: {reason}")]
    InvalidName { name: String, reason: &'static str },
    #[error("`{name}` has no handler")]
    MissingHandler { name: String },
    #[error("input schema for `{name}` is not a JSON object")]
    Schema { name: String },
}

/// Failures of the health-check probe that prevent a verdict.
#[derive(Debug, Error)]
pub enum HealthCheckError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("Failed to serialize health report: {0}")]
    Report(#[from] serde_json::Error),
}

/// Map a tool-level failure to protocol `invalid_params`, keeping the
/// structured envelope as error data.
pub fn tool_error_to_error_data(err: &ToolError) -> ErrorData {
    ErrorData::invalid_params(err.message.clone(), Some(err.to_value()))
}
