use anyhow::Result;
use mcp_template::server::config::Settings;
use rmcp::model::{CallToolRequestParam, GetPromptRequestParam, ReadResourceRequestParam};
use serde_json::{json, Value};

use crate::common::{args, connect_in_process};

#[tokio::test]
async fn echo_round_trips_through_the_envelope() -> Result<()> {
    let (client, _server) = connect_in_process(Settings::default()).await?;

    let result = client
        .call_tool(CallToolRequestParam {
            name: "echo".into(),
            arguments: Some(args(json!({ "message": "hello" }))),
        })
        .await?;
    assert_ne!(result.is_error, Some(true));
    let envelope = result.structured_content.expect("structured result");
    assert_eq!(envelope["success"], json!(true));
    assert_eq!(envelope["data"]["echoed_message"], json!("hello"));
    assert_eq!(envelope["metadata"]["tool_name"], json!("echo"));
    assert!(envelope["execution_time"].as_f64().is_some());

    client.cancel().await?;
    Ok(())
}

#[tokio::test]
async fn missing_parameters_come_back_as_a_tool_error() -> Result<()> {
    let (client, _server) = connect_in_process(Settings::default()).await?;

    let result = client
        .call_tool(CallToolRequestParam {
            name: "echo".into(),
            arguments: None,
        })
        .await?;
    assert_eq!(result.is_error, Some(true));
    let envelope = result.structured_content.expect("structured error");
    assert_eq!(envelope["success"], json!(false));
    assert_eq!(envelope["error_code"], json!("MISSING_PARAMETERS"));
    assert_eq!(
        envelope["details"]["missing_parameters"],
        json!(["message"])
    );

    client.cancel().await?;
    Ok(())
}

#[tokio::test]
async fn unknown_tool_is_a_protocol_error() -> Result<()> {
    let (client, _server) = connect_in_process(Settings::default()).await?;

    let outcome = client
        .call_tool(CallToolRequestParam {
            name: "does_not_exist".into(),
            arguments: None,
        })
        .await;
    assert!(outcome.is_err(), "unknown tool should fail: {outcome:?}");

    client.cancel().await?;
    Ok(())
}

#[tokio::test]
async fn statistics_tool_reports_mean() -> Result<()> {
    let (client, _server) = connect_in_process(Settings::default()).await?;

    let result = client
        .call_tool(CallToolRequestParam {
            name: "calculate_statistics".into(),
            arguments: Some(args(json!({ "numbers": [1, 2, 3, 4] }))),
        })
        .await?;
    let envelope = result.structured_content.expect("structured result");
    assert_eq!(envelope["success"], json!(true));
    assert_eq!(envelope["data"]["mean"], json!(2.5));

    client.cancel().await?;
    Ok(())
}

#[tokio::test]
async fn prompts_render_with_arguments() -> Result<()> {
    let (client, _server) = connect_in_process(Settings::default()).await?;

    let listed = client.list_prompts(None).await?;
    assert!(listed.prompts.iter().any(|p| p.name == "code-review"));

    let prompt = client
        .get_prompt(GetPromptRequestParam {
            name: "code-review".into(),
            arguments: Some(args(json!({ "code": "fn main() {}" }))),
        })
        .await?;
    assert_eq!(prompt.messages.len(), 1);
    let message = serde_json::to_value(&prompt.messages[0])?;
    let text = message["content"]["text"].as_str().unwrap_or_default();
    assert!(text.contains("fn main() {}"), "prompt text: {text}");

    let missing = client
        .get_prompt(GetPromptRequestParam {
            name: "code-review".into(),
            arguments: None,
        })
        .await;
    assert!(missing.is_err());

    client.cancel().await?;
    Ok(())
}

#[tokio::test]
async fn resources_list_and_read() -> Result<()> {
    let (client, _server) = connect_in_process(Settings::default()).await?;

    let listed = client.list_resources(None).await?;
    assert_eq!(listed.resources.len(), 5);

    let read = client
        .read_resource(ReadResourceRequestParam {
            uri: "config://example".into(),
        })
        .await?;
    let contents = serde_json::to_value(&read.contents[0])?;
    assert_eq!(contents["uri"], json!("config://example"));
    assert_eq!(contents["mimeType"], json!("application/toml"));
    assert!(contents["text"]
        .as_str()
        .is_some_and(|text| text.contains("[server]")));

    let missing = client
        .read_resource(ReadResourceRequestParam {
            uri: "template://missing".into(),
        })
        .await;
    assert!(missing.is_err());

    client.cancel().await?;
    Ok(())
}

#[tokio::test]
async fn health_tool_counts_calls_when_metrics_enabled() -> Result<()> {
    let mut settings = Settings::default();
    settings.features.metrics = true;
    let (client, server) = connect_in_process(settings).await?;

    for _ in 0..2 {
        client
            .call_tool(CallToolRequestParam {
                name: "echo".into(),
                arguments: Some(args(json!({ "message": "tick" }))),
            })
            .await?;
    }
    let result = client
        .call_tool(CallToolRequestParam {
            name: "health_check".into(),
            arguments: None,
        })
        .await?;
    let envelope: Value = result.structured_content.expect("structured result");
    assert_eq!(envelope["data"]["status"], json!("healthy"));
    assert_eq!(envelope["data"]["metrics"]["tools"]["echo"]["calls"], json!(2));
    assert!(server.health().is_initialized());

    client.cancel().await?;
    Ok(())
}
