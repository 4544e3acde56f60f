use std::net::SocketAddr;

use anyhow::Result;
use mcp_template::{
    cli::TransportMode,
    healthcheck::{CheckStatus, HealthChecker},
    server::{
        config::Settings,
        runtime::{serve_http, TemplateServer},
    },
};
use reqwest::StatusCode;
use serde_json::Value;
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};

const API_KEY: &str = "integration-secret";

struct RunningHttp {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<anyhow::Result<()>>,
}

impl RunningHttp {
    async fn start(api_key: Option<&str>) -> Result<Self> {
        let mut settings = Settings::default();
        settings.server.transport = TransportMode::Http;
        settings.server.name = "HTTP Fixture".into();
        settings.features.metrics = true;
        settings.security.api_key = api_key.map(str::to_string);

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let server = TemplateServer::initialize(settings);
        let (tx, rx) = oneshot::channel::<()>();
        let task = tokio::spawn(serve_http(listener, server, async {
            let _ = rx.await;
        }));
        Ok(Self {
            addr,
            shutdown: Some(tx),
            task,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }
}

impl Drop for RunningHttp {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.task.abort();
    }
}

#[tokio::test]
async fn health_endpoint_is_open_even_with_api_key() -> Result<()> {
    let running = RunningHttp::start(Some(API_KEY)).await?;

    let response = reqwest::get(running.url("/health")).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["server"], "HTTP Fixture");
    assert_eq!(body["initialized"], true);
    Ok(())
}

#[tokio::test]
async fn metrics_endpoint_requires_the_api_key() -> Result<()> {
    let running = RunningHttp::start(Some(API_KEY)).await?;
    let client = reqwest::Client::new();

    let denied = client.get(running.url("/metrics")).send().await?;
    assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);
    let body: Value = denied.json().await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["error_code"], "UNAUTHORIZED");

    let wrong = client
        .get(running.url("/metrics"))
        .header("x-api-key", "nope")
        .send()
        .await?;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let allowed = client
        .get(running.url("/metrics"))
        .header("x-api-key", API_KEY)
        .send()
        .await?;
    assert_eq!(allowed.status(), StatusCode::OK);
    let body: Value = allowed.json().await?;
    assert!(body["tools"].is_object());
    Ok(())
}

#[tokio::test]
async fn healthchecker_passes_http_and_mcp_against_live_server() -> Result<()> {
    let running = RunningHttp::start(Some(API_KEY)).await?;

    let checker = HealthChecker::new("127.0.0.1", running.addr.port(), Some(API_KEY.into()))?;
    let report = checker.run_all_checks().await;
    assert_eq!(report.checks.http.status, CheckStatus::Healthy, "{report:?}");
    assert_eq!(report.checks.mcp.status, CheckStatus::Healthy, "{report:?}");
    assert_eq!(report.checks.mcp.fields.get("tools_count"), Some(&Value::from(9)));
    Ok(())
}

#[tokio::test]
async fn healthchecker_reports_mcp_failure_without_the_key() -> Result<()> {
    let running = RunningHttp::start(Some(API_KEY)).await?;

    let checker = HealthChecker::new("127.0.0.1", running.addr.port(), None)?;
    let report = checker.run_all_checks().await;
    assert_eq!(report.checks.http.status, CheckStatus::Healthy);
    assert_eq!(report.checks.mcp.status, CheckStatus::Unhealthy);
    assert_eq!(report.overall_status, CheckStatus::Unhealthy);
    assert_eq!(report.exit_code(), 1);
    Ok(())
}
