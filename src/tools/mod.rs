//! MCP tools registered on the server and the loader that installs them.

pub mod base;
pub mod examples;

use crate::{
    lib::loader::{run_loaders, LoadReport, RegisterFn},
    server::config::Settings,
};

use base::ToolRegistry;

/// Tool registration modules, loaded in order.
pub const TOOL_MODULES: &[(&str, RegisterFn<ToolRegistry>)] = &[
    ("basic", examples::basic::register),
    ("statistics", examples::statistics::register),
    ("async_ops", examples::async_ops::register),
    ("data", examples::data::register),
    ("health", examples::health::register),
];

/// Register every tool module; failing modules are logged and skipped.
pub fn load_tools(registry: &mut ToolRegistry, settings: &Settings) -> LoadReport {
    run_loaders("tools", registry, settings, TOOL_MODULES)
}
