use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use super::error::{ToolError, UNEXPECTED_ERROR};

/// Successful handler output: payload plus optional auxiliary metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolOutput {
    pub data: Value,
    pub metadata: Map<String, Value>,
}

impl ToolOutput {
    pub fn new(data: impl Into<Value>) -> Self {
        Self {
            data: data.into(),
            metadata: Map::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Human readable summary, carried as `metadata.message`.
    pub fn with_message(self, message: impl Into<String>) -> Self {
        self.with_metadata("message", message.into())
    }

    pub fn message(&self) -> Option<&str> {
        self.metadata.get("message").and_then(Value::as_str)
    }
}

impl From<Value> for ToolOutput {
    fn from(data: Value) -> Self {
        Self::new(data)
    }
}

/// Outcome of one tool invocation, stamped with its wall-clock duration.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResult {
    Success {
        data: Value,
        metadata: Map<String, Value>,
        execution_time: f64,
    },
    Failure {
        error: String,
        error_code: String,
        details: Map<String, Value>,
        execution_time: f64,
    },
}

impl ToolResult {
    pub fn success(output: ToolOutput, execution_time: f64) -> Self {
        ToolResult::Success {
            data: output.data,
            metadata: output.metadata,
            execution_time,
        }
    }

    pub fn from_tool_error(err: ToolError, execution_time: f64) -> Self {
        ToolResult::Failure {
            error: err.message,
            error_code: err.error_code,
            details: err.details,
            execution_time,
        }
    }

    pub fn unexpected(message: impl Into<String>, execution_time: f64) -> Self {
        ToolResult::Failure {
            error: message.into(),
            error_code: UNEXPECTED_ERROR.to_string(),
            details: Map::new(),
            execution_time,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ToolResult::Success { .. })
    }

    pub fn execution_time(&self) -> f64 {
        match self {
            ToolResult::Success { execution_time, .. }
            | ToolResult::Failure { execution_time, .. } => *execution_time,
        }
    }

    pub fn error_code(&self) -> Option<&str> {
        match self {
            ToolResult::Success { .. } => None,
            ToolResult::Failure { error_code, .. } => Some(error_code.as_str()),
        }
    }

    pub fn data(&self) -> Option<&Value> {
        match self {
            ToolResult::Success { data, .. } => Some(data),
            ToolResult::Failure { .. } => None,
        }
    }

    /// Flat mapping suitable for any wire format.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[derive(Serialize)]
struct Envelope<'a> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<&'a Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a Map<String, Value>>,
    execution_time: f64,
}

impl Serialize for ToolResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let envelope = match self {
            ToolResult::Success {
                data,
                metadata,
                execution_time,
            } => Envelope {
                success: true,
                data: Some(data),
                metadata: Some(metadata).filter(|m| !m.is_empty()),
                error: None,
                error_code: None,
                details: None,
                execution_time: *execution_time,
            },
            ToolResult::Failure {
                error,
                error_code,
                details,
                execution_time,
            } => Envelope {
                success: false,
                data: None,
                metadata: None,
                error: Some(error),
                error_code: Some(error_code),
                details: Some(details).filter(|d| !d.is_empty()),
                execution_time: *execution_time,
            },
        };
        envelope.serialize(serializer)
    }
}
