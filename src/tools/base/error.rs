use serde_json::{json, Map, Value};
use thiserror::Error;

/// Classifier used when a tool raises a [`ToolError`] without naming one.
pub const TOOL_ERROR: &str = "TOOL_ERROR";
/// Classifier for failures that were not raised as a [`ToolError`].
pub const UNEXPECTED_ERROR: &str = "UNEXPECTED_ERROR";
/// Classifier raised by the timeout layer.
pub const TIMEOUT_ERROR: &str = "TIMEOUT_ERROR";
/// Classifier raised by the required-parameter validator.
pub const MISSING_PARAMETERS: &str = "MISSING_PARAMETERS";
/// Classifier raised when arguments cannot be decoded into the tool's request type.
pub const INVALID_PARAMETERS: &str = "INVALID_PARAMETERS";

/// Expected, named failure raised by a tool or one of its layers.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ToolError {
    pub message: String,
    pub error_code: String,
    pub details: Map<String, Value>,
}

impl ToolError {
    pub fn new(message: impl Into<String>, error_code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error_code: error_code.into(),
            details: Map::new(),
        }
    }

    /// Error carrying the generic `TOOL_ERROR` classifier.
    pub fn generic(message: impl Into<String>) -> Self {
        Self::new(message, TOOL_ERROR)
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    pub fn with_details(mut self, details: Map<String, Value>) -> Self {
        self.details.extend(details);
        self
    }

    /// Render as `{ error, error_code, message, details }`.
    pub fn to_value(&self) -> Value {
        json!({
            "error": true,
            "error_code": self.error_code,
            "message": self.message,
            "details": self.details,
        })
    }
}

/// Failure returned by a tool handler.
///
/// `Classified` failures keep their code all the way to the caller;
/// `Unexpected` failures are reported as [`UNEXPECTED_ERROR`].
#[derive(Debug, Error)]
pub enum ToolFailure {
    #[error(transparent)]
    Classified(#[from] ToolError),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl ToolFailure {
    /// Classifier code, if this failure carries one.
    pub fn error_code(&self) -> Option<&str> {
        match self {
            ToolFailure::Classified(err) => Some(err.error_code.as_str()),
            ToolFailure::Unexpected(_) => None,
        }
    }
}
