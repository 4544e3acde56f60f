//! `process_json_data` and `generate_report`.

use std::cmp::Ordering;

use chrono::Utc;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::{
    lib::errors::RegistrationError,
    server::config::Settings,
    tools::base::{
        parse_args, ToolArgs, ToolDefinition, ToolError, ToolFailure, ToolOutput, ToolRegistry,
        MISSING_PARAMETERS,
    },
};

pub const INVALID_JSON: &str = "INVALID_JSON";
pub const INVALID_DATA_TYPE: &str = "INVALID_DATA_TYPE";
pub const SORT_ERROR: &str = "SORT_ERROR";
pub const UNKNOWN_OPERATION: &str = "UNKNOWN_OPERATION";
pub const EMPTY_TITLE: &str = "EMPTY_TITLE";
pub const INVALID_FORMAT: &str = "INVALID_FORMAT";

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ProcessJsonRequest {
    /// JSON document to process.
    pub json_string: String,
    /// One of `validate`, `filter`, `sort`, `transform`.
    #[serde(default = "default_operation")]
    pub operation: String,
    /// Key that array items must contain (`filter`).
    #[serde(default)]
    pub filter_key: Option<String>,
    /// Key to order array items by (`sort`).
    #[serde(default)]
    pub sort_by: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReportRequest {
    /// Report title.
    pub title: String,
    /// Data included in the report.
    pub data: Map<String, Value>,
    /// One of `json`, `text`, `markdown`.
    #[serde(default = "default_format")]
    pub format_type: String,
    #[serde(default = "default_true")]
    pub include_timestamp: bool,
}

fn default_operation() -> String {
    "validate".to_string()
}

fn default_format() -> String {
    "json".to_string()
}

fn default_true() -> bool {
    true
}

pub fn register(
    registry: &mut ToolRegistry,
    _settings: &Settings,
) -> Result<usize, RegistrationError> {
    registry.register(
        ToolDefinition::new(
            "process_json_data",
            "Validate, filter, sort or transform a JSON document",
        )
        .input_schema::<ProcessJsonRequest>()
        .require_params(["json_string"])
        .handler(process_json_data),
    )?;
    registry.register(
        ToolDefinition::new(
            "generate_report",
            "Render data as a JSON, plain-text or Markdown report",
        )
        .input_schema::<ReportRequest>()
        .require_params(["title", "data"])
        .handler(generate_report),
    )?;
    Ok(2)
}

pub async fn process_json_data(args: ToolArgs) -> Result<ToolOutput, ToolFailure> {
    let request: ProcessJsonRequest = parse_args(args)?;
    let data: Value = serde_json::from_str(&request.json_string)
        .map_err(|err| ToolError::new(format!("Invalid JSON: {err}"), INVALID_JSON))?;

    let mut result = Map::new();
    match request.operation.as_str() {
        "validate" => {
            result.insert(
                "validation".into(),
                json!({
                    "valid": true,
                    "type": type_name(&data),
                    "size": data.to_string().chars().count(),
                }),
            );
        }
        "filter" => {
            let key = required_key(request.filter_key.as_deref(), "filter_key")?;
            let items = data
                .as_array()
                .ok_or_else(|| ToolError::new("Filtering requires array data", INVALID_DATA_TYPE))?;
            let filtered: Vec<Value> = items
                .iter()
                .filter(|item| item.as_object().is_some_and(|obj| obj.contains_key(key)))
                .cloned()
                .collect();
            result.insert(
                "filter_stats".into(),
                json!({ "original_count": items.len(), "filtered_count": filtered.len() }),
            );
            result.insert("filtered_data".into(), Value::Array(filtered));
        }
        "sort" => {
            let key = required_key(request.sort_by.as_deref(), "sort_by")?;
            let sorted = sort_objects(&data, key)?;
            result.insert("sorted_data".into(), Value::Array(sorted));
            result.insert("sort_key".into(), json!(key));
        }
        "transform" => {
            result.insert("transformed_data".into(), transform(&data));
        }
        other => {
            return Err(ToolError::new(format!("Unknown operation: {other}"), UNKNOWN_OPERATION)
                .with_detail("supported_operations", json!(["validate", "filter", "sort", "transform"]))
                .into());
        }
    }
    result.insert("original_data".into(), data);

    Ok(ToolOutput::new(Value::Object(result))
        .with_message(format!("JSON {} completed successfully", request.operation))
        .with_metadata("operation", request.operation))
}

fn required_key<'a>(key: Option<&'a str>, name: &str) -> Result<&'a str, ToolError> {
    key.filter(|k| !k.is_empty()).ok_or_else(|| {
        ToolError::new(format!("Missing required parameters: {name}"), MISSING_PARAMETERS)
            .with_detail("missing_parameters", json!([name]))
    })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Clone, Copy)]
enum SortKey<'a> {
    Text(&'a str),
    Number(f64),
}

/// Stable sort of an array of objects by `key`; items without the key sort
/// as the empty string.
pub fn sort_objects(data: &Value, key: &str) -> Result<Vec<Value>, ToolError> {
    let invalid = || ToolError::new("Sorting requires array of objects", INVALID_DATA_TYPE);
    let items = data.as_array().ok_or_else(invalid)?;
    let objects: Vec<&Map<String, Value>> = items
        .iter()
        .map(Value::as_object)
        .collect::<Option<_>>()
        .ok_or_else(invalid)?;

    let mut keyed = Vec::with_capacity(objects.len());
    for (item, object) in items.iter().zip(&objects) {
        let sort_key = match object.get(key) {
            None => SortKey::Text(""),
            Some(Value::String(s)) => SortKey::Text(s),
            Some(Value::Number(n)) => SortKey::Number(n.as_f64().unwrap_or_default()),
            Some(Value::Bool(b)) => SortKey::Number(f64::from(u8::from(*b))),
            Some(other) => {
                return Err(ToolError::new(
                    format!("Sort failed: cannot order {} values", type_name(other)),
                    SORT_ERROR,
                ))
            }
        };
        keyed.push((sort_key, item));
    }

    let all_text = keyed.iter().all(|(k, _)| matches!(k, SortKey::Text(_)));
    let all_numbers = keyed.iter().all(|(k, _)| matches!(k, SortKey::Number(_)));
    if !all_text && !all_numbers {
        return Err(ToolError::new(
            format!("Sort failed: values of `{key}` mix strings and numbers"),
            SORT_ERROR,
        ));
    }

    keyed.sort_by(|(a, _), (b, _)| match (a, b) {
        (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
        (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
        _ => Ordering::Equal,
    });
    Ok(keyed.into_iter().map(|(_, item)| item.clone()).collect())
}

fn transform(data: &Value) -> Value {
    let upper = |value: &Value| match value {
        Value::String(s) => Value::String(s.to_uppercase()),
        other => other.clone(),
    };
    match data {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), upper(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(upper).collect()),
        Value::String(s) => Value::String(s.to_uppercase()),
        other => Value::String(other.to_string().to_uppercase()),
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    title: &'a str,
    data: &'a Map<String, Value>,
    generated_at: Option<&'a str>,
    format: &'static str,
}

pub async fn generate_report(args: ToolArgs) -> Result<ToolOutput, ToolFailure> {
    let request: ReportRequest = parse_args(args)?;
    if request.title.trim().is_empty() {
        return Err(ToolError::new("Title cannot be empty", EMPTY_TITLE).into());
    }
    let format = match request.format_type.as_str() {
        "json" | "text" | "markdown" => request.format_type.as_str(),
        _ => {
            return Err(
                ToolError::new("Format must be json, text, or markdown", INVALID_FORMAT).into(),
            )
        }
    };

    let timestamp = request.include_timestamp.then(|| Utc::now().to_rfc3339());
    let content = render_report(&request.title, &request.data, format, timestamp.as_deref())
        .map_err(anyhow::Error::from)?;

    Ok(ToolOutput::new(json!({
        "report_content": content,
        "title": request.title,
        "format": format,
        "size": content.chars().count(),
        "generated_at": timestamp,
    }))
    .with_message("Report generated successfully"))
}

fn render_report(
    title: &str,
    data: &Map<String, Value>,
    format: &str,
    timestamp: Option<&str>,
) -> serde_json::Result<String> {
    let pretty_data = serde_json::to_string_pretty(data)?;
    let content = match format {
        "json" => serde_json::to_string_pretty(&JsonReport {
            title,
            data,
            generated_at: timestamp,
            format: "json",
        })?,
        "text" => {
            let mut lines = vec![format!("Report: {title}")];
            if let Some(ts) = timestamp {
                lines.push(format!("Generated: {ts}"));
            }
            lines.push("-".repeat(50));
            lines.push(format!("Data: {pretty_data}"));
            lines.join("\n")
        }
        _ => {
            let mut lines = vec![format!("# {title}")];
            if let Some(ts) = timestamp {
                lines.push(format!("*Generated: {ts}*"));
            }
            lines.push("\n## Data\n".to_string());
            lines.push(format!("```json\n{pretty_data}\n```"));
            lines.join("\n")
        }
    };
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(value: Value) -> ToolArgs {
        value.as_object().cloned().expect("object")
    }

    async fn process(value: Value) -> Result<ToolOutput, ToolFailure> {
        process_json_data(args(value)).await
    }

    #[tokio::test]
    async fn validate_reports_type_and_size() {
        let output = process(json!({ "json_string": "{\"a\": 1}" })).await.expect("ok");
        assert_eq!(output.data["validation"]["type"], json!("object"));
        assert_eq!(output.data["validation"]["size"], json!(7));
        assert_eq!(output.data["original_data"], json!({ "a": 1 }));
        assert_eq!(output.metadata["operation"], json!("validate"));
    }

    #[tokio::test]
    async fn invalid_json_is_classified() {
        let err = process(json!({ "json_string": "{nope" })).await.expect_err("bad json");
        assert_eq!(err.error_code(), Some(INVALID_JSON));
    }

    #[tokio::test]
    async fn filter_keeps_objects_with_key() {
        let output = process(json!({
            "json_string": "[{\"a\": 1}, {\"b\": 2}, 3, {\"a\": null}]",
            "operation": "filter",
            "filter_key": "a",
        }))
        .await
        .expect("filter");
        assert_eq!(output.data["filtered_data"], json!([{ "a": 1 }, { "a": null }]));
        assert_eq!(
            output.data["filter_stats"],
            json!({ "original_count": 4, "filtered_count": 2 })
        );
    }

    #[tokio::test]
    async fn filter_without_key_is_missing_parameter() {
        let err = process(json!({ "json_string": "[]", "operation": "filter" }))
            .await
            .expect_err("no key");
        assert_eq!(err.error_code(), Some(MISSING_PARAMETERS));
    }

    #[test]
    fn sort_places_missing_keys_first_and_is_stable() {
        let data = json!([
            { "name": "carol" },
            { "id": 1 },
            { "name": "alice" },
            { "id": 2 },
        ]);
        let sorted = sort_objects(&data, "name").expect("sort");
        assert_eq!(
            sorted,
            vec![
                json!({ "id": 1 }),
                json!({ "id": 2 }),
                json!({ "name": "alice" }),
                json!({ "name": "carol" }),
            ]
        );
    }

    #[test]
    fn sort_rejects_mixed_and_non_object_data() {
        let mixed = json!([{ "k": 1 }, { "k": "x" }]);
        assert_eq!(sort_objects(&mixed, "k").expect_err("mixed").error_code, SORT_ERROR);

        let numbers = json!([{ "k": 2 }, { "k": 1.5 }]);
        assert_eq!(
            sort_objects(&numbers, "k").expect("numeric"),
            vec![json!({ "k": 1.5 }), json!({ "k": 2 })]
        );

        let scalars = json!([1, 2]);
        assert_eq!(
            sort_objects(&scalars, "k").expect_err("scalars").error_code,
            INVALID_DATA_TYPE
        );
    }

    #[test]
    fn transform_uppercases_strings_only() {
        assert_eq!(
            transform(&json!({ "a": "x", "b": 1 })),
            json!({ "a": "X", "b": 1 })
        );
        assert_eq!(transform(&json!(["a", 2])), json!(["A", 2]));
        assert_eq!(transform(&json!(true)), json!("TRUE"));
    }

    #[tokio::test]
    async fn unknown_operation_is_rejected() {
        let err = process(json!({ "json_string": "1", "operation": "explode" }))
            .await
            .expect_err("unknown");
        assert_eq!(err.error_code(), Some(UNKNOWN_OPERATION));
    }

    #[tokio::test]
    async fn markdown_report_without_timestamp() {
        let output = generate_report(args(json!({
            "title": "Weekly",
            "data": { "visits": 3 },
            "format_type": "markdown",
            "include_timestamp": false,
        })))
        .await
        .expect("report");
        let content = output.data["report_content"].as_str().expect("content");
        assert_eq!(
            content,
            "# Weekly\n\n## Data\n\n```json\n{\n  \"visits\": 3\n}\n```"
        );
        assert_eq!(output.data["generated_at"], Value::Null);
        assert_eq!(output.data["size"], json!(content.chars().count()));
    }

    #[tokio::test]
    async fn json_report_keeps_field_order() {
        let output = generate_report(args(json!({
            "title": "T",
            "data": {},
            "include_timestamp": false,
        })))
        .await
        .expect("report");
        assert_eq!(
            output.data["report_content"],
            json!("{\n  \"title\": \"T\",\n  \"data\": {},\n  \"generated_at\": null,\n  \"format\": \"json\"\n}")
        );
    }

    #[tokio::test]
    async fn report_validation_codes() {
        let err = generate_report(args(json!({ "title": "  ", "data": {} })))
            .await
            .expect_err("blank title");
        assert_eq!(err.error_code(), Some(EMPTY_TITLE));
        let err = generate_report(args(json!({ "title": "x", "data": {}, "format_type": "pdf" })))
            .await
            .expect_err("bad format");
        assert_eq!(err.error_code(), Some(INVALID_FORMAT));
    }
}
