//! Component creation and application membership

use std::collections::BTreeMap;

use tracing::info;
use ucd_models::CreateComponentRequest;

use crate::errors::PublisherError;
use crate::http::api::DeployApi;

/// Description given to components this tool creates
pub const COMPONENT_DESCRIPTION: &str = "Created by ucdpub";

/// Request to create the component when the server does not have it
#[derive(Debug, Clone, Default)]
pub struct CreateComponent {
    /// Component template to base a new component on; may be empty
    pub template: String,

    /// Application the component should belong to
    pub application: Option<String>,
}

/// How a new component gets its versions
#[derive(Debug, Clone, Default)]
pub struct ComponentSource {
    /// Source config plugin name; empty for pushed versions
    pub plugin: String,
    /// `FULL` or `INCREMENTAL`
    pub default_version_type: String,
    /// Source config properties, also set on the component itself
    pub properties: BTreeMap<String, String>,
}

/// Make sure the component exists and, when requested, belongs to the
/// application.
pub async fn ensure_component(
    api: &dyn DeployApi,
    name: &str,
    create: &CreateComponent,
    source: &ComponentSource,
) -> Result<(), PublisherError> {
    info!("Checking the server for an existing component '{}'", name);
    match api.get_component(name).await? {
        Some(existing) => {
            info!(
                "Component '{}' already exists with id {}",
                name, existing.id
            );
        }
        None => {
            info!("Creating new component '{}'", name);
            let request = CreateComponentRequest {
                name: name.to_string(),
                description: COMPONENT_DESCRIPTION.to_string(),
                source_config_plugin: source.plugin.clone(),
                default_version_type: source.default_version_type.clone(),
                template_name: create.template.clone(),
                template_version: -1,
                import_automatically: false,
                use_vfs: true,
                properties: source.properties.clone(),
            };
            let id = api.create_component(&request).await?;
            info!("Created component '{}' with id {}", name, id);
        }
    }

    for (key, value) in &source.properties {
        info!("Setting component property '{}' to '{}'", key, value);
        api.set_component_property(name, key, value).await?;
    }

    if let Some(application) = create
        .application
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
    {
        let members = api.get_application_components(application).await?;
        if members.iter().any(|c| c.name == name) {
            info!(
                "Component '{}' is already part of application '{}'",
                name, application
            );
        } else {
            info!("Adding component '{}' to application '{}'", name, application);
            api.add_component_to_application(application, name).await?;
        }
    }

    Ok(())
}

/// Apply tags to a component; blank tags are ignored
pub async fn tag_component(
    api: &dyn DeployApi,
    name: &str,
    tags: &[String],
) -> Result<(), PublisherError> {
    let tags: Vec<String> = tags
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    if tags.is_empty() {
        return Ok(());
    }

    info!("Tagging component '{}' with {}", name, tags.join(", "));
    api.add_component_tags(name, &tags).await
}
