//! MCP server startup, transports and the registry-backed handler.
mod handler;
mod server_info;
mod startup;

pub use handler::{LoadSummary, ServerHealth, TemplateServer, HEALTH_TOOL};
pub use server_info::{build_instructions, build_server_info};
pub use startup::{build_http_router, run_server, serve_http, RuntimeExit};
