use crate::{
    lib::errors::RegistrationError,
    resources::{ResourceEntry, ResourceRegistry},
    server::config::Settings,
};

const README_TEMPLATE: &str = include_str!("../../templates/README.md");
const DOCKERFILE_TEMPLATE: &str = include_str!("../../templates/Dockerfile");
const GITIGNORE_TEMPLATE: &str = include_str!("../../templates/gitignore");
const API_DOCUMENTATION: &str = include_str!("../../templates/api.md");

pub fn register(
    registry: &mut ResourceRegistry,
    _settings: &Settings,
) -> Result<usize, RegistrationError> {
    let entries = [
        ResourceEntry::fixed("template://readme", "README template", README_TEMPLATE)
            .description("README skeleton for a new server project")
            .mime_type("text/markdown"),
        ResourceEntry::fixed("template://dockerfile", "Dockerfile template", DOCKERFILE_TEMPLATE)
            .description("Multi-stage container build for the server binary"),
        ResourceEntry::fixed("template://gitignore", ".gitignore template", GITIGNORE_TEMPLATE)
            .description("Ignore rules for a Cargo project"),
        ResourceEntry::new("config://example", "Example configuration", example_config)
            .description("config.toml holding every setting at its default value")
            .mime_type("application/toml"),
        ResourceEntry::fixed("docs://api", "API documentation", API_DOCUMENTATION)
            .description("Endpoints, authentication and the result envelope")
            .mime_type("text/markdown"),
    ];
    let count = entries.len();
    for entry in entries {
        registry.register(entry)?;
    }
    Ok(count)
}

fn example_config() -> anyhow::Result<String> {
    Ok(Settings::default().to_toml()?)
}
