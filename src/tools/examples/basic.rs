//! `echo` and `get_current_time`.

use std::fmt::Display;

use chrono::{DateTime, FixedOffset, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::{
    lib::errors::RegistrationError,
    server::config::Settings,
    tools::base::{
        parse_args, ToolArgs, ToolDefinition, ToolError, ToolFailure, ToolOutput, ToolRegistry,
    },
};

pub const INVALID_TIMEZONE: &str = "INVALID_TIMEZONE";

#[derive(Debug, Deserialize, JsonSchema)]
pub struct EchoRequest {
    /// The message to echo back.
    pub message: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CurrentTimeRequest {
    /// IANA name (`Europe/London`), `UTC`/`GMT`/`Z`, or a fixed offset
    /// such as `+05:30` or `UTC-8`.
    #[serde(default = "default_timezone")]
    pub timezone_name: String,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

pub fn register(
    registry: &mut ToolRegistry,
    _settings: &Settings,
) -> Result<usize, RegistrationError> {
    registry.register(
        ToolDefinition::new("echo", "Echo a message back to the caller")
            .input_schema::<EchoRequest>()
            .require_params(["message"])
            .handler(echo),
    )?;
    registry.register(
        ToolDefinition::new(
            "get_current_time",
            "Get the current time in a named timezone or at a fixed UTC offset",
        )
        .input_schema::<CurrentTimeRequest>()
        .handler(get_current_time),
    )?;
    Ok(2)
}

pub async fn echo(args: ToolArgs) -> Result<ToolOutput, ToolFailure> {
    let request: EchoRequest = parse_args(args)?;
    Ok(ToolOutput::new(json!({ "echoed_message": request.message }))
        .with_message("Message echoed successfully")
        .with_metadata("timestamp", Utc::now().to_rfc3339())
        .with_metadata("tool_name", "echo"))
}

pub async fn get_current_time(args: ToolArgs) -> Result<ToolOutput, ToolFailure> {
    let request: CurrentTimeRequest = parse_args(args)?;
    let zone = parse_timezone(&request.timezone_name).ok_or_else(|| {
        ToolError::new(
            format!("Invalid timezone: {}", request.timezone_name),
            INVALID_TIMEZONE,
        )
        .with_detail(
            "available_timezones",
            "Use an IANA name like Europe/London or US/Eastern, UTC, or a fixed offset like +05:30",
        )
    })?;

    let now = Utc::now();
    let mut data = match zone {
        Zone::Named(tz) => describe_time(now.with_timezone(&tz)),
        Zone::Fixed(offset) => describe_time(now.with_timezone(&offset)),
    };
    data.insert("timezone".into(), json!(request.timezone_name));
    Ok(ToolOutput::new(Value::Object(data))
        .with_message(format!("Current time retrieved for {}", request.timezone_name)))
}

fn describe_time<T>(now: DateTime<T>) -> Map<String, Value>
where
    T: TimeZone,
    T::Offset: Display,
{
    let mut data = Map::new();
    data.insert(
        "current_time".into(),
        json!(now.to_rfc3339_opts(SecondsFormat::Micros, false)),
    );
    data.insert(
        "unix_timestamp".into(),
        json!(now.timestamp_millis() as f64 / 1000.0),
    );
    data.insert(
        "formatted".into(),
        json!(now.format("%Y-%m-%d %H:%M:%S %Z").to_string()),
    );
    data
}

/// A resolved `timezone_name`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Zone {
    /// IANA zone; `formatted` carries its abbreviation.
    Named(Tz),
    Fixed(FixedOffset),
}

/// Resolve an IANA name, a UTC alias or a fixed offset such as `+05:30`.
pub fn parse_timezone(name: &str) -> Option<Zone> {
    let trimmed = name.trim();
    if let Ok(tz) = trimmed.parse::<Tz>() {
        return Some(Zone::Named(tz));
    }
    let upper = trimmed.to_ascii_uppercase();
    if matches!(upper.as_str(), "UTC" | "GMT" | "Z" | "ETC/UTC" | "ETC/GMT") {
        return Some(Zone::Named(Tz::UTC));
    }
    parse_fixed_offset(&upper).map(Zone::Fixed)
}

fn parse_fixed_offset(upper: &str) -> Option<FixedOffset> {
    let offset_text = upper
        .strip_prefix("UTC")
        .or_else(|| upper.strip_prefix("GMT"))
        .unwrap_or(upper);
    let (sign, rest) = match offset_text.chars().next()? {
        '+' => (1, &offset_text[1..]),
        '-' => (-1, &offset_text[1..]),
        _ => return None,
    };
    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h, m),
        None if rest.len() == 4 && rest.is_ascii() => rest.split_at(2),
        None => (rest, "0"),
    };
    let is_number = |part: &str| {
        !part.is_empty() && part.len() <= 2 && part.bytes().all(|b| b.is_ascii_digit())
    };
    if !is_number(hours) || !is_number(minutes) {
        return None;
    }
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 14 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
