//! Static and generated documents served through `resources/read`.

pub mod templates;

use std::{collections::HashMap, sync::Arc};

use anyhow::Result;

use crate::{
    lib::{
        errors::RegistrationError,
        loader::{run_loaders, LoadReport, RegisterFn},
    },
    server::config::Settings,
};

/// Produces the text of a resource on each read.
pub type ResourceReader = Arc<dyn Fn() -> Result<String> + Send + Sync>;

/// Resource registration modules, loaded in order.
pub const RESOURCE_MODULES: &[(&str, RegisterFn<ResourceRegistry>)] =
    &[("templates", templates::register)];

#[derive(Clone)]
pub struct ResourceEntry {
    pub uri: String,
    pub name: String,
    pub description: String,
    pub mime_type: String,
    reader: ResourceReader,
}

impl ResourceEntry {
    pub fn new<F>(uri: impl Into<String>, name: impl Into<String>, reader: F) -> Self
    where
        F: Fn() -> Result<String> + Send + Sync + 'static,
    {
        Self {
            uri: uri.into(),
            name: name.into(),
            description: String::new(),
            mime_type: "text/plain".to_string(),
            reader: Arc::new(reader),
        }
    }

    /// Entry whose text never changes.
    pub fn fixed(uri: impl Into<String>, name: impl Into<String>, text: &'static str) -> Self {
        Self::new(uri, name, move || Ok(text.to_string()))
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }
}

impl std::fmt::Debug for ResourceEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceEntry")
            .field("uri", &self.uri)
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
pub struct ResourceRegistry {
    entries: Vec<ResourceEntry>,
    index: HashMap<String, usize>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, entry: ResourceEntry) -> Result<(), RegistrationError> {
        let reason = match entry.uri.split_once("://") {
            None => Some("must have the form scheme://path"),
            Some((scheme, path)) if scheme.is_empty() || path.is_empty() => {
                Some("scheme and path must not be empty")
            }
            Some(_) => None,
        };
        if let Some(reason) = reason {
            return Err(RegistrationError::InvalidName {
                name: entry.uri,
                reason,
            });
        }
        if self.index.contains_key(&entry.uri) {
            return Err(RegistrationError::Duplicate { name: entry.uri });
        }
        self.index.insert(entry.uri.clone(), self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    /// Text of the resource at `uri`; `None` when nothing is registered there.
    pub fn read(&self, uri: &str) -> Option<Result<String>> {
        let entry = self.get(uri)?;
        Some((entry.reader)())
    }

    pub fn get(&self, uri: &str) -> Option<&ResourceEntry> {
        self.index.get(uri).map(|&idx| &self.entries[idx])
    }

    pub fn list(&self) -> &[ResourceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Register every resource module; failing modules are logged and skipped.
pub fn load_resources(registry: &mut ResourceRegistry, settings: &Settings) -> LoadReport {
    run_loaders("resources", registry, settings, RESOURCE_MODULES)
}
