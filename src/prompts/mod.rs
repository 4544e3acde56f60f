//! Parameterised prompt templates served through `prompts/get`.

pub mod templates;

use std::{collections::HashMap, sync::Arc};

use serde_json::{Map, Value};

use crate::{
    lib::{
        errors::RegistrationError,
        loader::{run_loaders, LoadReport, RegisterFn},
    },
    server::config::Settings,
    tools::base::{ensure_required, ToolError, INVALID_PARAMETERS},
};

pub type PromptArgs = Map<String, Value>;

/// Renders prompt text from already-validated arguments.
pub type PromptRenderer = Arc<dyn Fn(&PromptArgs) -> Result<String, ToolError> + Send + Sync>;

/// Prompt registration modules, loaded in order.
pub const PROMPT_MODULES: &[(&str, RegisterFn<PromptRegistry>)] =
    &[("templates", templates::register)];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptArgument {
    pub name: String,
    pub description: String,
    pub required: bool,
}

#[derive(Clone)]
pub struct PromptEntry {
    pub name: String,
    pub description: String,
    pub arguments: Vec<PromptArgument>,
    render: PromptRenderer,
}

impl PromptEntry {
    pub fn new<F>(name: impl Into<String>, description: impl Into<String>, render: F) -> Self
    where
        F: Fn(&PromptArgs) -> Result<String, ToolError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            arguments: Vec::new(),
            render: Arc::new(render),
        }
    }

    pub fn required(self, name: &str, description: &str) -> Self {
        self.argument(name, description, true)
    }

    pub fn optional(self, name: &str, description: &str) -> Self {
        self.argument(name, description, false)
    }

    fn argument(mut self, name: &str, description: &str, required: bool) -> Self {
        self.arguments.push(PromptArgument {
            name: name.to_string(),
            description: description.to_string(),
            required,
        });
        self
    }

    fn required_names(&self) -> Vec<&str> {
        self.arguments
            .iter()
            .filter(|arg| arg.required)
            .map(|arg| arg.name.as_str())
            .collect()
    }
}

impl std::fmt::Debug for PromptEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptEntry")
            .field("name", &self.name)
            .field("arguments", &self.arguments)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
pub struct PromptRegistry {
    entries: Vec<PromptEntry>,
    index: HashMap<String, usize>,
}

impl PromptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, entry: PromptEntry) -> Result<(), RegistrationError> {
        if entry.name.trim().is_empty() {
            return Err(RegistrationError::InvalidName {
                name: entry.name,
                reason: "must not be empty",
            });
        }
        if self.index.contains_key(&entry.name) {
            return Err(RegistrationError::Duplicate { name: entry.name });
        }
        self.index.insert(entry.name.clone(), self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    /// Render the named prompt; `None` when no such prompt exists.
    pub fn render(&self, name: &str, args: &PromptArgs) -> Option<Result<String, ToolError>> {
        let entry = self.get(name)?;
        Some(ensure_required(&entry.required_names(), args).and_then(|()| (entry.render)(args)))
    }

    pub fn get(&self, name: &str) -> Option<&PromptEntry> {
        self.index.get(name).map(|&idx| &self.entries[idx])
    }

    pub fn list(&self) -> &[PromptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Register every prompt module; failing modules are logged and skipped.
pub fn load_prompts(registry: &mut PromptRegistry, settings: &Settings) -> LoadReport {
    run_loaders("prompts", registry, settings, PROMPT_MODULES)
}

fn invalid_argument(name: &str, expected: &str) -> ToolError {
    ToolError::new(
        format!("Invalid parameters: `{name}` must be {expected}"),
        INVALID_PARAMETERS,
    )
    .with_detail("argument", name)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Text argument; `default` when absent or null.
pub fn text_arg(args: &PromptArgs, name: &str, default: &str) -> Result<String, ToolError> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(default.to_string()),
        Some(value) => scalar_text(value).ok_or_else(|| invalid_argument(name, "a string")),
    }
}

/// List argument given as a JSON array, a JSON array encoded in a string,
/// or newline- or comma-separated text. Blank items are dropped.
pub fn list_arg(args: &PromptArgs, name: &str) -> Result<Vec<String>, ToolError> {
    let array_items = |items: &[Value]| {
        items
            .iter()
            .map(|item| scalar_text(item).ok_or_else(|| invalid_argument(name, "a list of strings")))
            .collect::<Result<Vec<_>, _>>()
    };
    let items = match args.get(name) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => array_items(items)?,
        Some(Value::String(text)) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Array(items)) => array_items(&items)?,
            _ if text.contains('\n') => text.lines().map(str::to_string).collect(),
            _ => text.split(',').map(str::to_string).collect(),
        },
        Some(_) => return Err(invalid_argument(name, "a list of strings")),
    };
    Ok(items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect())
}

/// Key/value argument given as a JSON object or a JSON object encoded in a
/// string. Entries keep their given order.
pub fn map_arg(args: &PromptArgs, name: &str) -> Result<Vec<(String, String)>, ToolError> {
    let object = match args.get(name) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Object(object)) => object.clone(),
        Some(Value::String(text)) if text.trim().is_empty() => return Ok(Vec::new()),
        Some(Value::String(text)) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(object)) => object,
            _ => return Err(invalid_argument(name, "a JSON object")),
        },
        Some(_) => return Err(invalid_argument(name, "a JSON object")),
    };
    Ok(object
        .into_iter()
        .map(|(key, value)| {
            let text = scalar_text(&value).unwrap_or_else(|| value.to_string());
            (key, text)
        })
        .collect())
}
