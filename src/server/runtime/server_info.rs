use rmcp::model::{Implementation, ServerCapabilities, ServerInfo};

use crate::server::config::Settings;

/// Build the `ServerInfo.instructions` string shown to MCP clients.
pub fn build_instructions(settings: &Settings) -> String {
    let endpoint = match settings.server.transport {
        crate::cli::TransportMode::Http => format!(" at {}", settings.mcp_endpoint()),
        _ => String::new(),
    };
    format!(
        "{description}. Serving over {transport}{endpoint}. Tools return a JSON envelope with \
         `success`, `execution_time` and either `data` or `error`/`error_code`; call `tools/list` \
         for the catalogue and `resources/list` or `prompts/list` for templates.",
        description = settings.server.description.trim_end_matches('.'),
        transport = settings.server.transport.as_str(),
    )
}

/// `initialize` response: name and version from settings, all three capabilities.
pub fn build_server_info(settings: &Settings, instructions: &str) -> ServerInfo {
    ServerInfo {
        capabilities: ServerCapabilities::builder()
            .enable_tools()
            .enable_resources()
            .enable_prompts()
            .build(),
        server_info: Implementation {
            name: settings.server.name.clone(),
            version: settings.server.version.clone(),
            ..Implementation::from_build_env()
        },
        instructions: Some(instructions.to_string()),
        ..Default::default()
    }
}
