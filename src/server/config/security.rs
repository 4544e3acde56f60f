use serde::{Deserialize, Serialize};

use super::server::non_blank;

pub const DEFAULT_CORS_ORIGINS: &[&str] = &["*"];
pub const DEFAULT_CORS_METHODS: &[&str] = &["GET", "POST", "PUT", "DELETE"];

/// HTTP access control settings.
#[derive(Clone, PartialEq, Serialize)]
pub struct SecuritySection {
    /// Required `X-API-Key` value for HTTP requests. Never serialized.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub cors_origins: Vec<String>,
    pub cors_methods: Vec<String>,
}

impl std::fmt::Debug for SecuritySection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecuritySection")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("cors_origins", &self.cors_origins)
            .field("cors_methods", &self.cors_methods)
            .finish()
    }
}

impl Default for SecuritySection {
    fn default() -> Self {
        Self {
            api_key: None,
            cors_origins: to_strings(DEFAULT_CORS_ORIGINS),
            cors_methods: to_strings(DEFAULT_CORS_METHODS),
        }
    }
}

/// List values accept a TOML array or a comma separated string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawList {
    Items(Vec<String>),
    Joined(String),
}

impl RawList {
    fn into_items(self) -> Vec<String> {
        let items = match self {
            RawList::Items(items) => items,
            RawList::Joined(joined) => joined.split(',').map(str::to_string).collect(),
        };
        items
            .into_iter()
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect()
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct RawSecuritySection {
    pub api_key: Option<String>,
    pub cors_origins: Option<RawList>,
    pub cors_methods: Option<RawList>,
}

pub fn parse_security_section(raw: Option<RawSecuritySection>) -> SecuritySection {
    let raw = raw.unwrap_or_default();
    let defaults = SecuritySection::default();
    SecuritySection {
        api_key: non_blank(raw.api_key),
        cors_origins: list_or(raw.cors_origins, defaults.cors_origins),
        cors_methods: list_or(raw.cors_methods, defaults.cors_methods)
            .into_iter()
            .map(|method| method.to_ascii_uppercase())
            .collect(),
    }
}

fn list_or(raw: Option<RawList>, default: Vec<String>) -> Vec<String> {
    match raw.map(RawList::into_items) {
        Some(items) if !items.is_empty() => items,
        _ => default,
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}
