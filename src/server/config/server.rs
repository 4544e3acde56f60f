use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{cli::TransportMode, lib::errors::FieldProblem};

pub const DEFAULT_NAME: &str = "MCP Server Template";
pub const DEFAULT_VERSION: &str = "1.0.0";
pub const DEFAULT_DESCRIPTION: &str = "A robust template for building MCP servers";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_TRANSPORT: TransportMode = TransportMode::Http;

/// Server identity and listener settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerSection {
    pub name: String,
    pub version: String,
    pub description: String,
    pub host: String,
    pub port: u16,
    pub transport: TransportMode,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            version: DEFAULT_VERSION.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            transport: DEFAULT_TRANSPORT,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct RawServerSection {
    pub name: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    pub host: Option<String>,
    pub port: Option<i64>,
    pub transport: Option<String>,
}

/// Optional capabilities toggled per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeaturesSection {
    pub health_check: bool,
    pub metrics: bool,
    pub cors: bool,
    pub logging: bool,
}

impl Default for FeaturesSection {
    fn default() -> Self {
        Self {
            health_check: true,
            metrics: false,
            cors: true,
            logging: true,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct RawFeaturesSection {
    pub health_check: Option<bool>,
    pub metrics: Option<bool>,
    pub cors: Option<bool>,
    pub logging: Option<bool>,
}

pub fn parse_server_section(
    raw: Option<RawServerSection>,
    problems: &mut Vec<FieldProblem>,
) -> ServerSection {
    let raw = raw.unwrap_or_default();
    let defaults = ServerSection::default();

    let port = match raw.port {
        None => defaults.port,
        Some(port) => match u16::try_from(port) {
            Ok(port) if port >= 1 => port,
            _ => {
                problems.push(FieldProblem::new(
                    "server.port",
                    format!("must be between 1 and 65535 (got {port})"),
                ));
                defaults.port
            }
        },
    };

    let transport = match raw.transport.as_deref() {
        None => defaults.transport,
        Some(value) => match TransportMode::parse(value) {
            Some(mode) => {
                if TransportMode::is_alias(value) {
                    warn!(
                        target: "mcp_template::config",
                        transport = value,
                        "SSE transport is served as streamable HTTP at /mcp"
                    );
                }
                mode
            }
            None => {
                problems.push(FieldProblem::new(
                    "server.transport",
                    format!("must be one of stdio, tcp, http, sse (got `{value}`)"),
                ));
                defaults.transport
            }
        },
    };

    ServerSection {
        name: non_blank(raw.name).unwrap_or(defaults.name),
        version: non_blank(raw.version).unwrap_or(defaults.version),
        description: raw.description.unwrap_or(defaults.description),
        host: non_blank(raw.host).unwrap_or(defaults.host),
        port,
        transport,
    }
}

pub fn parse_features_section(raw: Option<RawFeaturesSection>) -> FeaturesSection {
    let raw = raw.unwrap_or_default();
    let defaults = FeaturesSection::default();
    FeaturesSection {
        health_check: raw.health_check.unwrap_or(defaults.health_check),
        metrics: raw.metrics.unwrap_or(defaults.metrics),
        cors: raw.cors.unwrap_or(defaults.cors),
        logging: raw.logging.unwrap_or(defaults.logging),
    }
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
