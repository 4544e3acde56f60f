use std::{fmt::Display, future::Future};

use serde_json::{json, Map, Value};
use tracing::error;

/// `{ success: true, message, data, metadata? }`; `metadata` only when non-empty.
pub fn format_success_response(
    data: Value,
    message: &str,
    metadata: Option<Map<String, Value>>,
) -> Value {
    let mut response = json!({
        "success": true,
        "message": message,
        "data": data,
    });
    if let Some(metadata) = metadata.filter(|m| !m.is_empty()) {
        response["metadata"] = Value::Object(metadata);
    }
    response
}

/// `{ success: false, error, error_code, details }`.
pub fn format_error_response(
    error: &str,
    error_code: &str,
    details: Option<Map<String, Value>>,
) -> Value {
    json!({
        "success": false,
        "error": error,
        "error_code": error_code,
        "details": details.unwrap_or_default(),
    })
}

/// Await `operation`, substituting `default` if it fails.
pub async fn safe_execute<T, E, F>(operation: F, default: T, context: &str) -> T
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    match operation.await {
        Ok(value) => value,
        Err(err) => {
            error!(target: "mcp_template::tools", context, error = %err, "Operation failed; using default");
            default
        }
    }
}
