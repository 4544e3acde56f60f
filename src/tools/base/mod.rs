//! Tool execution core shared by every tool: result model, failure
//! signals, layers, the outer executor and the registry.

pub mod error;
pub mod executor;
pub mod middleware;
pub mod registry;
pub mod response;
pub mod result;

pub use error::{
    ToolError, ToolFailure, INVALID_PARAMETERS, MISSING_PARAMETERS, TIMEOUT_ERROR, TOOL_ERROR,
    UNEXPECTED_ERROR,
};
pub use executor::{ToolExecutor, ToolMetrics, ToolMetricsSnapshot, ValidateHook};
pub use middleware::{
    ensure_required, handler_fn, missing_parameters, RequireParams, Retry, RetryPolicy, Timeout,
    ToolArgs, ToolFuture, ToolHandler, ToolLayer,
};
pub use registry::{
    parse_args, schema_object, MetricsBoard, ToolDefinition, ToolInfo, ToolRegistry,
};
pub use response::{format_error_response, format_success_response, safe_execute};
pub use result::{ToolOutput, ToolResult};
