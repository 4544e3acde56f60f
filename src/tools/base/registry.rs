//! Explicit tool registry: definitions are built with [`ToolDefinition`],
//! composed into a [`ToolExecutor`] and looked up by name at call time.

use std::{
    collections::HashMap,
    future::Future,
    sync::{Arc, RwLock},
    time::Duration,
};

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

use super::{
    error::{ToolError, ToolFailure, INVALID_PARAMETERS},
    executor::{ToolExecutor, ToolMetrics, ToolMetricsSnapshot, ValidateHook},
    middleware::{handler_fn, RequireParams, Timeout, ToolArgs, ToolHandler, ToolLayer},
    result::{ToolOutput, ToolResult},
};
use crate::lib::errors::RegistrationError;

/// Decode call arguments into a typed request.
pub fn parse_args<T: DeserializeOwned>(args: ToolArgs) -> Result<T, ToolError> {
    serde_json::from_value(Value::Object(args)).map_err(|err| {
        ToolError::new(format!("Invalid parameters: {err}"), INVALID_PARAMETERS)
            .with_detail("reason", err.to_string())
    })
}

/// Schema for `T`, as a JSON object.
pub fn schema_object<T: JsonSchema>() -> Option<Map<String, Value>> {
    match serde_json::to_value(schemars::schema_for!(T)) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Everything needed to register one tool.
pub struct ToolDefinition {
    name: String,
    description: String,
    input_schema: Option<Map<String, Value>>,
    schema_error: bool,
    required: Vec<String>,
    layers: Vec<Arc<dyn ToolLayer>>,
    validate: Option<ValidateHook>,
    handler: Option<ToolHandler>,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: None,
            schema_error: false,
            required: Vec::new(),
            layers: Vec::new(),
            validate: None,
            handler: None,
        }
    }

    /// Derive the advertised input schema from a request type.
    pub fn input_schema<T: JsonSchema>(mut self) -> Self {
        self.input_schema = schema_object::<T>();
        self.schema_error = self.input_schema.is_none();
        self
    }

    /// Reject calls missing any of `names` with `MISSING_PARAMETERS`.
    pub fn require_params<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required.extend(names.into_iter().map(Into::into));
        self
    }

    /// Add a layer. Layers added first wrap those added later.
    pub fn layer(mut self, layer: impl ToolLayer + 'static) -> Self {
        self.layers.push(Arc::new(layer));
        self
    }

    pub fn validate_with<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ToolArgs) -> Result<(), ToolError> + Send + Sync + 'static,
    {
        self.validate = Some(Arc::new(hook));
        self
    }

    pub fn handler<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(ToolArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ToolOutput, ToolFailure>> + Send + 'static,
    {
        self.handler = Some(handler_fn(f));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn advertised_schema(&self) -> Map<String, Value> {
        let mut schema = self.input_schema.clone().unwrap_or_else(|| {
            let properties: Map<String, Value> = self
                .required
                .iter()
                .map(|name| (name.clone(), json!({})))
                .collect();
            let mut schema = Map::new();
            schema.insert("type".into(), json!("object"));
            schema.insert("properties".into(), Value::Object(properties));
            schema
        });
        if !self.required.is_empty() && !schema.contains_key("required") {
            schema.insert("required".into(), json!(self.required));
        }
        schema
    }
}

/// Listing entry for a registered tool.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub input_schema: Arc<Map<String, Value>>,
}

/// Shared view of per-tool counters, readable from inside a tool.
#[derive(Clone, Default)]
pub struct MetricsBoard(Arc<RwLock<Vec<(String, Arc<ToolMetrics>)>>>);

impl MetricsBoard {
    fn add(&self, name: &str, metrics: Arc<ToolMetrics>) {
        let mut entries = match self.0.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.push((name.to_string(), metrics));
    }

    /// Per-tool counters, in registration order.
    pub fn snapshot(&self) -> Vec<(String, ToolMetricsSnapshot)> {
        let entries = match self.0.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries
            .iter()
            .map(|(name, metrics)| (name.clone(), metrics.snapshot()))
            .collect()
    }
}

struct RegisteredTool {
    info: ToolInfo,
    executor: ToolExecutor,
}

/// Name-keyed tool store preserving registration order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
    default_timeout: Option<Duration>,
    metrics: MetricsBoard,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound every tool registered afterwards by `timeout`, outside its own layers.
    pub fn with_default_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.default_timeout = timeout.filter(|t| !t.is_zero());
        self
    }

    pub fn register(&mut self, definition: ToolDefinition) -> Result<(), RegistrationError> {
        validate_name(&definition.name)?;
        if self.index.contains_key(&definition.name) {
            return Err(RegistrationError::Duplicate {
                name: definition.name,
            });
        }
        if definition.schema_error {
            return Err(RegistrationError::Schema {
                name: definition.name,
            });
        }

        let input_schema = Arc::new(definition.advertised_schema());
        let ToolDefinition {
            name,
            description,
            required,
            layers,
            validate,
            handler,
            ..
        } = definition;
        let Some(mut handler) = handler else {
            return Err(RegistrationError::MissingHandler { name });
        };

        for layer in layers.iter().rev() {
            handler = layer.layer(handler);
        }
        if !required.is_empty() {
            handler = RequireParams::new(required).layer(handler);
        }
        if let Some(limit) = self.default_timeout {
            handler = Timeout::new(limit).layer(handler);
        }

        let mut executor = ToolExecutor::new(name.as_str(), handler);
        if let Some(hook) = validate {
            executor = executor.with_validate_hook(hook);
        }

        self.metrics.add(&name, executor.metrics_handle());
        self.index.insert(name.clone(), self.tools.len());
        self.tools.push(RegisteredTool {
            info: ToolInfo {
                name,
                description,
                input_schema,
            },
            executor,
        });
        Ok(())
    }

    /// Run the named tool; `None` when no such tool exists.
    pub async fn invoke(&self, name: &str, args: ToolArgs) -> Option<ToolResult> {
        let executor = self.executor(name)?.clone();
        Some(executor.execute(args).await)
    }

    pub fn executor(&self, name: &str) -> Option<&ToolExecutor> {
        self.index.get(name).map(|&idx| &self.tools[idx].executor)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn list(&self) -> Vec<ToolInfo> {
        self.tools.iter().map(|tool| tool.info.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Per-tool counters, in registration order.
    pub fn metrics_snapshot(&self) -> Vec<(String, ToolMetricsSnapshot)> {
        self.metrics.snapshot()
    }

    /// Handle that keeps observing tools registered later.
    pub fn metrics_board(&self) -> MetricsBoard {
        self.metrics.clone()
    }
}

fn validate_name(name: &str) -> Result<(), RegistrationError> {
    let reason = if name.is_empty() {
        "must not be empty"
    } else if name.chars().any(char::is_whitespace) {
        "must not contain whitespace"
    } else {
        return Ok(());
    };
    Err(RegistrationError::InvalidName {
        name: name.to_string(),
        reason,
    })
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use crate::tools::base::{
        error::{MISSING_PARAMETERS, TIMEOUT_ERROR},
        middleware::{Retry, RetryPolicy},
    };

    #[derive(Debug, Deserialize, JsonSchema)]
    struct GreetRequest {
        /// Person to greet.
        name: String,
        #[serde(default)]
        shout: bool,
    }

    fn greet_tool() -> ToolDefinition {
        ToolDefinition::new("greet", "Say hello")
            .input_schema::<GreetRequest>()
            .require_params(["name"])
            .handler(|args| async move {
                let request: GreetRequest = parse_args(args)?;
                let text = format!("hello {}", request.name);
                let text = if request.shout { text.to_uppercase() } else { text };
                Ok::<_, ToolFailure>(ToolOutput::new(json!(text)))
            })
    }

    fn args(value: Value) -> ToolArgs {
        value.as_object().cloned().expect("object")
    }

    #[tokio::test]
    async fn invoke_routes_by_name() {
        let mut registry = ToolRegistry::new();
        registry.register(greet_tool()).expect("register");

        let result = registry
            .invoke("greet", args(json!({ "name": "ada", "shout": true })))
            .await
            .expect("known tool");
        assert_eq!(result.data(), Some(&json!("HELLO ADA")));
        assert!(registry.invoke("missing", ToolArgs::new()).await.is_none());
    }

    #[tokio::test]
    async fn required_params_are_checked_before_decoding() {
        let mut registry = ToolRegistry::new();
        registry.register(greet_tool()).expect("register");

        let result = registry
            .invoke("greet", ToolArgs::new())
            .await
            .expect("known tool");
        assert_eq!(result.error_code(), Some(MISSING_PARAMETERS));
    }

    #[tokio::test]
    async fn badly_typed_arguments_are_invalid_parameters() {
        let mut registry = ToolRegistry::new();
        registry.register(greet_tool()).expect("register");

        let result = registry
            .invoke("greet", args(json!({ "name": 7 })))
            .await
            .expect("known tool");
        assert_eq!(result.error_code(), Some(INVALID_PARAMETERS));
    }

    #[test]
    fn duplicate_and_blank_names_are_rejected() {
        let mut registry = ToolRegistry::new();
        registry.register(greet_tool()).expect("first registration");
        assert_eq!(
            registry.register(greet_tool()),
            Err(RegistrationError::Duplicate {
                name: "greet".into()
            })
        );
        let blank = ToolDefinition::new("", "nothing").handler(|_args| async {
            Ok::<_, ToolFailure>(ToolOutput::default())
        });
        assert!(matches!(
            registry.register(blank),
            Err(RegistrationError::InvalidName { .. })
        ));
        let no_handler = ToolDefinition::new("hollow", "no body");
        assert!(matches!(
            registry.register(no_handler),
            Err(RegistrationError::MissingHandler { .. })
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn schema_lists_required_names() {
        let mut registry = ToolRegistry::new();
        registry.register(greet_tool()).expect("register");
        registry
            .register(
                ToolDefinition::new("bare", "No typed request")
                    .require_params(["a", "b"])
                    .handler(|_args| async { Ok::<_, ToolFailure>(ToolOutput::default()) }),
            )
            .expect("register bare");

        let listed = registry.list();
        assert_eq!(listed.len(), 2);
        let greet = &listed[0].input_schema;
        assert!(greet["properties"].get("name").is_some());
        assert_eq!(greet["required"], json!(["name"]));
        let bare = &listed[1].input_schema;
        assert_eq!(bare["type"], json!("object"));
        assert_eq!(bare["required"], json!(["a", "b"]));
    }

    #[tokio::test]
    async fn default_timeout_wraps_tool_layers() {
        let mut registry = ToolRegistry::new().with_default_timeout(Some(Duration::from_millis(80)));
        registry
            .register(
                ToolDefinition::new("sleepy", "Retries a slow operation")
                    .layer(Retry::new(RetryPolicy::new(
                        5,
                        Duration::from_millis(50),
                        1.0,
                    )))
                    .handler(|_args| async {
                        tokio::time::sleep(Duration::from_millis(30)).await;
                        Err::<ToolOutput, _>(ToolFailure::from(ToolError::generic("still failing")))
                    }),
            )
            .expect("register");

        let result = registry
            .invoke("sleepy", ToolArgs::new())
            .await
            .expect("known tool");
        assert_eq!(result.error_code(), Some(TIMEOUT_ERROR));
    }

    #[tokio::test]
    async fn metrics_snapshot_follows_registration_order() {
        let mut registry = ToolRegistry::new();
        registry.register(greet_tool()).expect("register");
        registry
            .invoke("greet", args(json!({ "name": "x" })))
            .await
            .expect("known tool");
        let metrics = registry.metrics_snapshot();
        assert_eq!(metrics[0].0, "greet");
        assert_eq!(metrics[0].1.calls, 1);
        assert_eq!(metrics[0].1.successes, 1);
    }
}
