//! Individual probes run by the health checker.

use std::{future::Future, time::Duration};

use reqwest::{header, Client, StatusCode};
use rmcp::{
    model::{ClientInfo, ClientRequest, PingRequest},
    serve_client,
    service::{ClientInitializeError, ServiceError},
    transport::{
        streamable_http_client::StreamableHttpClientTransportConfig,
        StreamableHttpClientTransport,
    },
};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::time;

use crate::{
    lib::system::{round2, SystemSnapshot},
    tools::base::safe_execute,
};

pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Healthy,
    Warning,
    Unhealthy,
}

impl CheckStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Healthy => "healthy",
            CheckStatus::Warning => "warning",
            CheckStatus::Unhealthy => "unhealthy",
        }
    }
}

/// Outcome of one check: status, a human message and check-specific fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResult {
    pub status: CheckStatus,
    pub message: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl CheckResult {
    pub fn new(status: CheckStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            fields: Map::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }
}

/// Worst status among `statuses`; healthy when empty.
pub fn overall_status<I>(statuses: I) -> CheckStatus
where
    I: IntoIterator<Item = CheckStatus>,
{
    statuses
        .into_iter()
        .max()
        .unwrap_or(CheckStatus::Healthy)
}

fn request_failure(prefix: &str, err: &reqwest::Error) -> CheckResult {
    if err.is_timeout() {
        CheckResult::new(CheckStatus::Unhealthy, format!("{prefix} timeout")).with("error", "timeout")
    } else if err.is_connect() {
        CheckResult::new(CheckStatus::Unhealthy, "Connection refused")
            .with("error", "connection_refused")
    } else {
        CheckResult::new(CheckStatus::Unhealthy, format!("{prefix} failed: {err}"))
            .with("error", "unknown")
    }
}

/// `GET {base_url}/health`; 200 and 405 both prove the listener is up.
pub async fn check_http(client: &Client, base_url: &str, api_key: Option<&str>) -> CheckResult {
    let mut request = client.get(format!("{base_url}/health"));
    if let Some(key) = api_key {
        request = request.header(API_KEY_HEADER, key);
    }
    match request.send().await {
        Ok(response) => {
            let status = response.status();
            if status == StatusCode::OK || status == StatusCode::METHOD_NOT_ALLOWED {
                CheckResult::new(CheckStatus::Healthy, "HTTP connectivity OK")
                    .with("status_code", status.as_u16())
            } else {
                CheckResult::new(
                    CheckStatus::Unhealthy,
                    format!("Unexpected status code: {}", status.as_u16()),
                )
                .with("status_code", status.as_u16())
            }
        }
        Err(err) => request_failure("HTTP check", &err),
    }
}

#[derive(Debug)]
enum McpCheckError {
    Client(reqwest::Error),
    Timeout(&'static str),
    Handshake(ClientInitializeError),
    Request(ServiceError),
}

impl From<ServiceError> for McpCheckError {
    fn from(err: ServiceError) -> Self {
        McpCheckError::Request(err)
    }
}

/// HTTP client for the MCP session; the API key rides on every request.
fn mcp_http_client(api_key: Option<&str>) -> Result<Client, McpCheckError> {
    let mut headers = header::HeaderMap::new();
    if let Some(key) = api_key.and_then(|key| header::HeaderValue::from_str(key).ok()) {
        headers.insert(API_KEY_HEADER, key);
    }
    Client::builder()
        .default_headers(headers)
        .build()
        .map_err(McpCheckError::Client)
}

async fn bounded<T, F>(step: &'static str, future: F) -> Result<T, McpCheckError>
where
    F: Future<Output = Result<T, McpCheckError>>,
{
    time::timeout(REQUEST_TIMEOUT, future)
        .await
        .map_err(|_| McpCheckError::Timeout(step))?
}

async fn run_mcp_session(url: &str, api_key: Option<&str>) -> Result<usize, McpCheckError> {
    let transport = StreamableHttpClientTransport::with_client(
        mcp_http_client(api_key)?,
        StreamableHttpClientTransportConfig::with_uri(url),
    );
    let client = bounded("initialize", async {
        serve_client(ClientInfo::default(), transport)
            .await
            .map_err(McpCheckError::Handshake)
    })
    .await?;

    let outcome = async {
        bounded("ping", async {
            client
                .send_request(ClientRequest::PingRequest(PingRequest::default()))
                .await
                .map_err(McpCheckError::from)
        })
        .await?;
        let tools = bounded("tools/list", async {
            client.list_all_tools().await.map_err(McpCheckError::from)
        })
        .await?;
        Ok(tools.len())
    }
    .await;

    let _ = time::timeout(REQUEST_TIMEOUT, client.cancel()).await;
    outcome
}

/// Handshake with the MCP endpoint through the rmcp client, then `ping`
/// and `tools/list`.
pub async fn check_mcp(url: &str, api_key: Option<&str>) -> CheckResult {
    match run_mcp_session(url, api_key).await {
        Ok(tools_count) => CheckResult::new(CheckStatus::Healthy, "MCP functionality OK")
            .with("tools_count", tools_count),
        Err(McpCheckError::Timeout(step)) => CheckResult::new(
            CheckStatus::Unhealthy,
            format!("MCP functionality check timeout during `{step}`"),
        )
        .with("error", "timeout"),
        Err(McpCheckError::Client(err)) => request_failure("MCP functionality check", &err),
        Err(McpCheckError::Handshake(err)) => CheckResult::new(
            CheckStatus::Unhealthy,
            format!("MCP functionality check failed: {err}"),
        )
        .with("error", "mcp_error"),
        Err(McpCheckError::Request(err)) => CheckResult::new(
            CheckStatus::Unhealthy,
            format!("MCP functionality check failed: {err}"),
        )
        .with("error", "mcp_error"),
    }
}

/// Classify local resource usage: above 95 % unhealthy, above 80 % warning.
pub fn classify_resources(memory_percent: f64, cpu_percent: f64) -> CheckResult {
    let memory = round2(memory_percent);
    let cpu = round2(cpu_percent);
    let (status, message) = if memory > 95.0 || cpu > 95.0 {
        (
            CheckStatus::Unhealthy,
            format!("High resource usage: Memory {memory}%, CPU {cpu}%"),
        )
    } else if memory > 80.0 || cpu > 80.0 {
        (
            CheckStatus::Warning,
            format!("Moderate resource usage: Memory {memory}%, CPU {cpu}%"),
        )
    } else {
        (CheckStatus::Healthy, "System resources OK".to_string())
    };
    CheckResult::new(status, message)
        .with("memory_percent", memory)
        .with("cpu_percent", cpu)
}

pub async fn check_resources() -> CheckResult {
    let sample = safe_execute(
        async { tokio::task::spawn_blocking(SystemSnapshot::capture).await.map(Some) },
        None,
        "resource sampling",
    )
    .await;
    match sample {
        Some(snapshot) => classify_resources(snapshot.memory_percent, snapshot.cpu_percent),
        None => CheckResult::new(
            CheckStatus::Warning,
            "Resource check failed: sampling did not complete",
        )
        .with("error", "resource_check_error"),
    }
}

/// Per-request timeout applied by the checker's HTTP client.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
