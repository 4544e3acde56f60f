use std::{io, path::PathBuf, process::Stdio};

use anyhow::{Context, Result};
use mcp_template::server::{config::Settings, runtime::TemplateServer};
use rmcp::{model::ClientInfo, serve_client, service::RunningService, RoleClient, ServiceExt};
use serde_json::{Map, Value};
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, ReadBuf},
    process::{Child, ChildStdin, ChildStdout, Command},
    task::JoinHandle,
};

pub const BINARY_PATH: &str = env!("CARGO_BIN_EXE_mcp-template");

pub type TestClient = RunningService<RoleClient, ClientInfo>;

/// Serve `settings` in-process over a duplex pipe and connect a client.
pub async fn connect_in_process(settings: Settings) -> Result<(TestClient, TemplateServer)> {
    let server = TemplateServer::initialize(settings);
    let (server_io, client_io) = tokio::io::duplex(4096);
    let serving = server.clone();
    tokio::spawn(async move {
        if let Ok(running) = serving.serve(server_io).await {
            let _ = running.waiting().await;
        }
    });
    let client = serve_client(ClientInfo::default(), client_io)
        .await
        .context("client handshake failed")?;
    Ok((client, server))
}

pub fn args(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

pub fn fixture(relative: &str) -> String {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    root.join(relative).display().to_string()
}

pub async fn spawn_server_process() -> Result<(Child, ChildIoBridge, Option<JoinHandle<()>>)> {
    let mut command = Command::new(BINARY_PATH);
    command
        .args(["--transport", "stdio"])
        .env(
            "MCP_CONFIG_PATH",
            fixture("tests/fixtures/settings_valid.toml"),
        )
        .env_remove("RUST_LOG")
        .env_remove("API_KEY")
        .stdout(Stdio::piped())
        .stdin(Stdio::piped())
        .stderr(Stdio::piped());
    let mut child = command.spawn().context("failed to spawn server process")?;
    let stdout = child.stdout.take().context("child stdout")?;
    let stdin = child.stdin.take().context("child stdin")?;
    let bridge = ChildIoBridge::new(stdout, stdin);
    let stderr_handle = child.stderr.take().map(|mut stderr| {
        tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stderr.read_to_end(&mut buf).await;
        })
    });
    Ok((child, bridge, stderr_handle))
}

pub struct ChildIoBridge {
    stdout: ChildStdout,
    stdin: ChildStdin,
}

impl ChildIoBridge {
    pub fn new(stdout: ChildStdout, stdin: ChildStdin) -> Self {
        Self { stdout, stdin }
    }
}

impl AsyncRead for ChildIoBridge {
    fn poll_read(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> std::task::Poll<io::Result<()>> {
        std::pin::Pin::new(&mut self.stdout).poll_read(cx, buf)
    }
}

impl AsyncWrite for ChildIoBridge {
    fn poll_write(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
        data: &[u8],
    ) -> std::task::Poll<io::Result<usize>> {
        std::pin::Pin::new(&mut self.stdin).poll_write(cx, data)
    }

    fn poll_flush(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<io::Result<()>> {
        std::pin::Pin::new(&mut self.stdin).poll_flush(cx)
    }

    fn poll_shutdown(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<io::Result<()>> {
        std::pin::Pin::new(&mut self.stdin).poll_shutdown(cx)
    }
}
