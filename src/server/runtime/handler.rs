//! `ServerHandler` backed by the tool, resource and prompt registries.
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Instant,
};

use chrono::Utc;
use rmcp::{
    model::{
        AnnotateAble, CallToolRequestParam, CallToolResult, ErrorData, GetPromptRequestParam,
        GetPromptResult, ListPromptsResult, ListResourcesResult, ListToolsResult,
        PaginatedRequestParam, Prompt, PromptArgument, PromptMessage, PromptMessageRole,
        RawResource, ReadResourceRequestParam, ReadResourceResult, ResourceContents, ServerInfo,
        Tool,
    },
    service::RequestContext,
    RoleServer, ServerHandler,
};
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::{
    lib::{
        errors::{tool_error_to_error_data, RegistrationError},
        loader::LoadReport,
    },
    prompts::{load_prompts, PromptRegistry},
    resources::{load_resources, ResourceRegistry},
    server::{
        config::Settings,
        runtime::server_info::{build_instructions, build_server_info},
    },
    tools::{
        base::{MetricsBoard, ToolArgs, ToolDefinition, ToolFailure, ToolOutput, ToolRegistry},
        load_tools,
    },
};

pub const HEALTH_TOOL: &str = "health_check";

/// Liveness data shared by the `health_check` tool and `GET /health`.
#[derive(Clone)]
pub struct ServerHealth {
    server: Arc<str>,
    version: Arc<str>,
    started_at: Instant,
    initialized: Arc<AtomicBool>,
    metrics: Option<MetricsBoard>,
}

impl ServerHealth {
    fn new(settings: &Settings, metrics: Option<MetricsBoard>) -> Self {
        Self {
            server: Arc::from(settings.server.name.as_str()),
            version: Arc::from(settings.server.version.as_str()),
            started_at: Instant::now(),
            initialized: Arc::new(AtomicBool::new(false)),
            metrics,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    fn set_initialized(&self, value: bool) {
        self.initialized.store(value, Ordering::SeqCst);
    }

    /// Per-tool counters; `None` unless metrics are enabled.
    pub fn metrics(&self) -> Option<Value> {
        let board = self.metrics.as_ref()?;
        let tools: Map<String, Value> = board
            .snapshot()
            .into_iter()
            .map(|(name, snapshot)| (name, serde_json::to_value(snapshot).unwrap_or_default()))
            .collect();
        Some(json!({ "tools": tools }))
    }

    pub fn payload(&self) -> Value {
        let uptime = self.started_at.elapsed().as_secs_f64();
        let mut payload = json!({
            "status": "healthy",
            "server": &*self.server,
            "version": &*self.version,
            "timestamp": Utc::now().to_rfc3339(),
            "uptime_seconds": (uptime * 1000.0).round() / 1000.0,
            "initialized": self.is_initialized(),
        });
        if let Some(metrics) = self.metrics() {
            payload["metrics"] = metrics;
        }
        payload
    }
}

fn register_health_tool(
    registry: &mut ToolRegistry,
    health: ServerHealth,
) -> Result<(), RegistrationError> {
    registry.register(
        ToolDefinition::new(HEALTH_TOOL, "Check server health status").handler(
            move |_args: ToolArgs| {
                let payload = health.payload();
                async move { Ok::<_, ToolFailure>(ToolOutput::new(payload)) }
            },
        ),
    )
}

/// Counts reported by the three loaders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub tools: LoadReport,
    pub resources: LoadReport,
    pub prompts: LoadReport,
}

struct ServerState {
    settings: Settings,
    info: ServerInfo,
    tools: ToolRegistry,
    resources: ResourceRegistry,
    prompts: PromptRegistry,
    health: ServerHealth,
    loaded: LoadSummary,
}

#[derive(Clone)]
pub struct TemplateServer {
    state: Arc<ServerState>,
}

impl TemplateServer {
    /// Load every registry and mark the server initialized.
    pub fn initialize(settings: Settings) -> Self {
        info!(
            target: "mcp_template::runtime",
            server = %settings.server.name,
            version = %settings.server.version,
            "Initializing server"
        );

        let mut tools = ToolRegistry::new().with_default_timeout(settings.performance.tool_timeout());
        let mut resources = ResourceRegistry::new();
        let mut prompts = PromptRegistry::new();
        let loaded = LoadSummary {
            tools: load_tools(&mut tools, &settings),
            resources: load_resources(&mut resources, &settings),
            prompts: load_prompts(&mut prompts, &settings),
        };

        let metrics = settings.features.metrics.then(|| tools.metrics_board());
        if metrics.is_some() {
            info!(target: "mcp_template::runtime", "Metrics collection enabled");
        }
        let health = ServerHealth::new(&settings, metrics);
        if settings.features.health_check {
            if let Err(err) = register_health_tool(&mut tools, health.clone()) {
                warn!(
                    target: "mcp_template::runtime",
                    error = %err,
                    "Failed to register the health_check tool"
                );
            }
        }

        let instructions = build_instructions(&settings);
        let info = build_server_info(&settings, &instructions);
        health.set_initialized(true);
        info!(
            target: "mcp_template::runtime",
            tools = tools.len(),
            resources = resources.len(),
            prompts = prompts.len(),
            "Server initialized"
        );

        Self {
            state: Arc::new(ServerState {
                settings,
                info,
                tools,
                resources,
                prompts,
                health,
                loaded,
            }),
        }
    }

    /// Mark the server as no longer serving.
    pub fn cleanup(&self) {
        info!(
            target: "mcp_template::runtime",
            server = %self.state.settings.server.name,
            "Shutting down"
        );
        self.state.health.set_initialized(false);
        info!(target: "mcp_template::runtime", "Cleanup completed");
    }

    pub fn settings(&self) -> &Settings {
        &self.state.settings
    }

    pub fn health(&self) -> &ServerHealth {
        &self.state.health
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.state.tools
    }

    pub fn resources(&self) -> &ResourceRegistry {
        &self.state.resources
    }

    pub fn prompts(&self) -> &PromptRegistry {
        &self.state.prompts
    }

    pub fn load_summary(&self) -> &LoadSummary {
        &self.state.loaded
    }

    fn tool_listing(&self) -> Vec<Tool> {
        self.state
            .tools
            .list()
            .into_iter()
            .map(|tool| Tool::new(tool.name, tool.description, tool.input_schema))
            .collect()
    }
}

impl ServerHandler for TemplateServer {
    fn get_info(&self) -> ServerInfo {
        self.state.info.clone()
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult::with_all_items(self.tool_listing()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let args = request.arguments.unwrap_or_default();
        let Some(result) = self.state.tools.invoke(&request.name, args).await else {
            return Err(ErrorData::invalid_params(
                format!("Unknown tool: {}", request.name),
                Some(json!({ "tool": request.name })),
            ));
        };
        let value = result.to_value();
        if result.is_success() {
            Ok(CallToolResult::structured(value))
        } else {
            Ok(CallToolResult::structured_error(value))
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, ErrorData> {
        let resources = self
            .state
            .resources
            .list()
            .iter()
            .map(|entry| {
                let mut resource = RawResource::new(entry.uri.clone(), entry.name.clone());
                resource.description =
                    (!entry.description.is_empty()).then(|| entry.description.clone());
                resource.mime_type = Some(entry.mime_type.clone());
                resource.no_annotation()
            })
            .collect();
        Ok(ListResourcesResult::with_all_items(resources))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, ErrorData> {
        let uri = request.uri;
        let text = match self.state.resources.read(&uri) {
            None => {
                return Err(ErrorData::resource_not_found(
                    format!("Resource not found: {uri}"),
                    Some(json!({ "uri": uri })),
                ))
            }
            Some(Err(err)) => {
                return Err(ErrorData::internal_error(
                    format!("Failed to read {uri}: {err:#}"),
                    None,
                ))
            }
            Some(Ok(text)) => text,
        };
        let mime = self
            .state
            .resources
            .get(&uri)
            .map(|entry| entry.mime_type.clone());
        let mut contents = ResourceContents::text(text, uri);
        if let ResourceContents::TextResourceContents { mime_type, .. } = &mut contents {
            *mime_type = mime;
        }
        Ok(ReadResourceResult {
            contents: vec![contents],
        })
    }

    async fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListPromptsResult, ErrorData> {
        let prompts = self
            .state
            .prompts
            .list()
            .iter()
            .map(|entry| {
                let arguments = entry
                    .arguments
                    .iter()
                    .map(|arg| PromptArgument {
                        name: arg.name.clone(),
                        title: None,
                        description: Some(arg.description.clone()),
                        required: Some(arg.required),
                    })
                    .collect();
                Prompt::new(&entry.name, Some(&entry.description), Some(arguments))
            })
            .collect();
        Ok(ListPromptsResult::with_all_items(prompts))
    }

    async fn get_prompt(
        &self,
        request: GetPromptRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<GetPromptResult, ErrorData> {
        let args = request.arguments.unwrap_or_default();
        let prompts = &self.state.prompts;
        let text = match prompts.render(&request.name, &args) {
            None => {
                return Err(ErrorData::invalid_params(
                    format!("Unknown prompt: {}", request.name),
                    Some(json!({ "prompt": request.name })),
                ))
            }
            Some(Err(err)) => return Err(tool_error_to_error_data(&err)),
            Some(Ok(text)) => text,
        };
        Ok(GetPromptResult {
            description: prompts.get(&request.name).map(|entry| entry.description.clone()),
            messages: vec![PromptMessage::new_text(PromptMessageRole::User, text)],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_loads_everything_and_adds_health_tool() {
        let server = TemplateServer::initialize(Settings::default());
        assert_eq!(server.load_summary().tools.items, 8);
        assert_eq!(server.load_summary().resources.items, 5);
        assert_eq!(server.load_summary().prompts.items, 6);
        assert!(server.tools().contains(HEALTH_TOOL));
        assert_eq!(server.tools().len(), 9);
        assert!(server.health().is_initialized());

        server.cleanup();
        assert!(!server.health().is_initialized());
    }

    #[test]
    fn health_tool_follows_feature_flag() {
        let mut settings = Settings::default();
        settings.features.health_check = false;
        let server = TemplateServer::initialize(settings);
        assert!(!server.tools().contains(HEALTH_TOOL));
    }

    #[tokio::test]
    async fn health_payload_includes_metrics_when_enabled() {
        let mut settings = Settings::default();
        settings.features.metrics = true;
        settings.server.name = "Health Target".into();
        let server = TemplateServer::initialize(settings);

        let echo_args = json!({ "message": "hi" }).as_object().cloned().expect("object");
        server.tools().invoke("echo", echo_args).await.expect("echo");
        let result = server
            .tools()
            .invoke(HEALTH_TOOL, ToolArgs::new())
            .await
            .expect("health tool");
        let data = result.data().expect("success");
        assert_eq!(data["status"], json!("healthy"));
        assert_eq!(data["server"], json!("Health Target"));
        assert_eq!(data["initialized"], json!(true));
        assert_eq!(data["metrics"]["tools"]["echo"]["calls"], json!(1));
        assert_eq!(data["metrics"]["tools"]["echo"]["successes"], json!(1));
    }

    #[test]
    fn health_payload_omits_metrics_by_default() {
        let server = TemplateServer::initialize(Settings::default());
        let payload = server.health().payload();
        assert!(payload.get("metrics").is_none());
        assert_eq!(payload["version"], json!("1.0.0"));
    }

    #[test]
    fn listing_carries_required_fields_in_schema() {
        let server = TemplateServer::initialize(Settings::default());
        let tools = server.tool_listing();
        let echo = tools.iter().find(|t| t.name == "echo").expect("echo listed");
        assert_eq!(echo.input_schema.get("required"), Some(&json!(["message"])));
    }
}
