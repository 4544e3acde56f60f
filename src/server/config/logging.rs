use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::server::non_blank;
use crate::lib::errors::FieldProblem;

pub const DEFAULT_LOG_LEVEL: &str = "INFO";
pub const LOG_LEVELS: &[&str] = &["TRACE", "DEBUG", "INFO", "WARNING", "WARN", "ERROR", "CRITICAL"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoggingSection {
    /// Upper-cased level name, one of [`LOG_LEVELS`].
    pub level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            file: None,
        }
    }
}

impl LoggingSection {
    /// Directive understood by `tracing_subscriber::EnvFilter`.
    pub fn filter_directive(&self) -> &'static str {
        match self.level.as_str() {
            "TRACE" => "trace",
            "DEBUG" => "debug",
            "WARNING" | "WARN" => "warn",
            "ERROR" | "CRITICAL" => "error",
            _ => "info",
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct RawLoggingSection {
    pub level: Option<String>,
    pub file: Option<String>,
}

pub fn parse_logging_section(
    raw: Option<RawLoggingSection>,
    problems: &mut Vec<FieldProblem>,
) -> LoggingSection {
    let raw = raw.unwrap_or_default();
    let level = match non_blank(raw.level) {
        None => DEFAULT_LOG_LEVEL.to_string(),
        Some(level) => {
            let upper = level.to_ascii_uppercase();
            if LOG_LEVELS.contains(&upper.as_str()) {
                upper
            } else {
                problems.push(FieldProblem::new(
                    "logging.level",
                    format!("must be one of {} (got `{level}`)", LOG_LEVELS.join(", ")),
                ));
                DEFAULT_LOG_LEVEL.to_string()
            }
        }
    };

    LoggingSection {
        level,
        file: non_blank(raw.file).map(PathBuf::from),
    }
}
