use std::{process::Command as StdCommand, time::Duration};

use anyhow::Result;
use rmcp::{model::ClientInfo, serve_client};
use serde_json::Value;
use tokio::time::timeout;

use crate::common::{fixture, spawn_server_process, BINARY_PATH};

#[tokio::test]
async fn inspector_style_spawn_lists_tools() -> Result<()> {
    let (mut child, transport, stderr_task) = spawn_server_process().await?;

    let client = serve_client(ClientInfo::default(), transport).await?;
    let info = client.peer_info().cloned().expect("server info after handshake");
    assert_eq!(info.server_info.name, "Fixture Server");
    assert_eq!(info.server_info.version, "2.3.4");

    let list = client.list_tools(None).await?;
    for expected in ["echo", "calculate_statistics", "health_check"] {
        assert!(
            list.tools.iter().any(|tool| tool.name.as_ref() == expected),
            "list_tools should include {expected}: {:?}",
            list.tools
        );
    }

    client.cancel().await?;
    let status = timeout(Duration::from_secs(5), child.wait()).await??;
    assert!(
        status.success(),
        "server should exit cleanly but exit status was {status:?}"
    );
    if let Some(handle) = stderr_task {
        let _ = handle.await;
    }
    Ok(())
}

#[test]
fn show_config_prints_fixture_settings_without_secrets() -> Result<()> {
    let output = StdCommand::new(BINARY_PATH)
        .arg("show-config")
        .env("MCP_CONFIG_PATH", fixture("tests/fixtures/settings_valid.toml"))
        .env("API_KEY", "never-printed")
        .env_remove("RUST_LOG")
        .output()?;
    assert!(output.status.success(), "show-config failed: {output:?}");

    let stdout = String::from_utf8(output.stdout)?;
    assert!(!stdout.contains("never-printed"));
    let rendered: Value = serde_json::from_str(&stdout)?;
    assert_eq!(rendered["server"]["name"], "Fixture Server");
    assert_eq!(rendered["performance"]["timeout_seconds"], 12);
    Ok(())
}

#[test]
fn invalid_production_config_exits_with_failure() -> Result<()> {
    let output = StdCommand::new(BINARY_PATH)
        .arg("show-config")
        .env("MCP_CONFIG_PATH", fixture("tests/fixtures/settings_invalid.toml"))
        .env_remove("RUST_LOG")
        .output()?;
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    Ok(())
}
