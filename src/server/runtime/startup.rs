use std::{future::Future, process::ExitCode, sync::Arc};

use anyhow::{Context, Error};
use axum::{
    extract::State,
    http::{HeaderName, HeaderValue, Method},
    middleware,
    routing::get,
    Json, Router,
};
use rmcp::{
    transport::streamable_http_server::{
        session::local::LocalSessionManager, StreamableHttpServerConfig, StreamableHttpService,
    },
    ServiceExt,
};
use serde_json::Value;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::{
    cli::{LaunchProfile, TransportMode},
    lib::telemetry::{emit_runtime_mode, RuntimeModeTelemetry},
    server::{
        auth::{require_api_key, ApiKeyGuard},
        config::{SecuritySection, Settings},
        runtime::TemplateServer,
    },
};

/// Bundles a runtime error message with a process exit code.
#[derive(Debug)]
pub struct RuntimeExit {
    message: String,
    exit_code: ExitCode,
}

impl RuntimeExit {
    pub fn new(message: impl Into<String>, exit_code: u8) -> Self {
        Self {
            message: message.into(),
            exit_code: ExitCode::from(exit_code),
        }
    }

    pub fn from_error(err: impl Into<Error>) -> Self {
        let err = err.into();
        Self {
            message: format!("{err:#}"),
            exit_code: ExitCode::FAILURE,
        }
    }

    pub fn report(self) -> ExitCode {
        eprintln!("{}", self.message);
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn exit_code(&self) -> ExitCode {
        self.exit_code
    }
}

/// Initialize the registries and serve on the configured transport until
/// the client disconnects (stdio), forever (tcp) or Ctrl-C (http).
pub async fn run_server(profile: LaunchProfile, settings: Settings) -> Result<(), RuntimeExit> {
    let server = TemplateServer::initialize(settings.clone());
    let config_path = settings
        .source_path
        .as_deref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<defaults>".to_string());
    emit_runtime_mode(&RuntimeModeTelemetry {
        transport: settings.server.transport.as_str(),
        host: Some(settings.server.host.as_str()),
        port: Some(settings.server.port),
        config_path: &config_path,
        tools: server.tools().len(),
        resources: server.resources().len(),
        prompts: server.prompts().len(),
        launch_args: &profile.launch_args,
    });

    let outcome = match settings.server.transport {
        TransportMode::Stdio => run_stdio(server.clone()).await,
        TransportMode::Tcp => run_tcp(server.clone(), &settings).await,
        TransportMode::Http => run_http(server.clone(), &settings).await,
    };
    server.cleanup();
    outcome
}

async fn run_stdio(server: TemplateServer) -> Result<(), RuntimeExit> {
    let running = server
        .serve(rmcp::transport::stdio())
        .await
        .map_err(RuntimeExit::from_error)?;
    running.waiting().await.map_err(RuntimeExit::from_error)?;
    Ok(())
}

async fn run_tcp(server: TemplateServer, settings: &Settings) -> Result<(), RuntimeExit> {
    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind TCP port {addr}"))
        .map_err(RuntimeExit::from_error)?;
    tracing::info!(
        target: "mcp_template::runtime",
        transport = "tcp",
        bind_addr = %addr,
        "Started listening in TCP mode"
    );

    loop {
        let (stream, peer) = listener
            .accept()
            .await
            .with_context(|| format!("failed to accept TCP connection ({addr})"))
            .map_err(RuntimeExit::from_error)?;
        tracing::info!(
            target: "mcp_template::runtime",
            peer = %peer,
            "Accepted connection from MCP client"
        );
        let running = server
            .clone()
            .serve(stream)
            .await
            .map_err(RuntimeExit::from_error)?;
        running.waiting().await.map_err(RuntimeExit::from_error)?;
    }
}

async fn run_http(server: TemplateServer, settings: &Settings) -> Result<(), RuntimeExit> {
    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind HTTP port {addr}"))
        .map_err(RuntimeExit::from_error)?;
    tracing::info!(
        target: "mcp_template::runtime",
        transport = "http",
        bind_addr = %addr,
        endpoint = %settings.mcp_endpoint(),
        "Started listening in HTTP mode"
    );
    serve_http(listener, server, shutdown_signal())
        .await
        .map_err(RuntimeExit::from_error)
}

/// Serve the HTTP router on `listener` until `shutdown` resolves.
pub async fn serve_http<F>(
    listener: TcpListener,
    server: TemplateServer,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, build_http_router(server))
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(
            target: "mcp_template::runtime",
            error = %err,
            "Failed to listen for Ctrl-C; shutting down"
        );
        return;
    }
    tracing::info!(target: "mcp_template::runtime", "Received Ctrl-C; shutting down");
}

/// `/mcp` (streamable HTTP), `/health` and, when enabled, `/metrics`.
///
/// The API key guards `/mcp` and `/metrics`; `/health` stays open for
/// liveness probes.
pub fn build_http_router(server: TemplateServer) -> Router {
    let settings = server.settings().clone();
    let mcp_service = StreamableHttpService::new(
        {
            let server = server.clone();
            move || Ok(server.clone())
        },
        Arc::new(LocalSessionManager::default()),
        StreamableHttpServerConfig::default(),
    );

    let mut protected = Router::new().nest_service("/mcp", mcp_service);
    if settings.features.metrics {
        protected = protected.route("/metrics", get(metrics_endpoint));
    }
    let protected = protected.layer(middleware::from_fn_with_state(
        ApiKeyGuard::new(settings.security.api_key.as_deref()),
        require_api_key,
    ));

    let mut router = Router::new()
        .route("/health", get(health_endpoint))
        .merge(protected)
        .with_state(server)
        .layer(RequestBodyLimitLayer::new(
            settings.performance.max_request_size,
        ))
        .layer(TraceLayer::new_for_http());
    if settings.features.cors {
        router = router.layer(cors_layer(&settings.security));
    }
    router
}

async fn health_endpoint(State(server): State<TemplateServer>) -> Json<Value> {
    Json(server.health().payload())
}

async fn metrics_endpoint(State(server): State<TemplateServer>) -> Json<Value> {
    Json(server.health().metrics().unwrap_or_default())
}

fn cors_layer(security: &SecuritySection) -> CorsLayer {
    let origins = if security.cors_origins.iter().any(|origin| origin == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            security
                .cors_origins
                .iter()
                .filter_map(|origin| HeaderValue::from_str(origin).ok()),
        )
    };
    let methods: Vec<Method> = security
        .cors_methods
        .iter()
        .filter_map(|method| Method::from_bytes(method.as_bytes()).ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static("mcp-session-id")])
}
