//! Per-invocation job options

use std::path::PathBuf;

use crate::deploy::request::{DeployRequest, REQUEST_DESCRIPTION};
use crate::utils::expand_vars;
use crate::version::component::CreateComponent;
use crate::version::publish::{
    Delivery, PublishRequest, PullDelivery, PushDelivery, VersionLink,
};

/// Pull delivery options
#[derive(Debug, Clone, Default)]
pub struct PullOptions {
    pub properties: String,
    pub source_type: String,
    pub source_properties: String,
}

/// Options for publishing one version per component
#[derive(Debug, Clone, Default)]
pub struct PublishJob {
    /// Components to publish, in order
    pub components: Vec<String>,
    pub version: String,
    pub description: String,
    pub base_dir: PathBuf,
    pub offset: Option<String>,
    pub includes: String,
    pub excludes: String,
    pub properties: String,
    pub incremental: bool,

    /// Import through the component's source config instead of uploading
    pub pull: Option<PullOptions>,

    pub create_component: bool,
    pub template: String,
    pub application: Option<String>,
    pub tags: Vec<String>,

    pub link_name: String,
    pub link_url: Option<String>,
}

impl PublishJob {
    /// Build one request per component, expanding `${VAR}` references
    pub fn requests<F>(&self, lookup: F) -> Vec<PublishRequest>
    where
        F: Fn(&str) -> Option<String>,
    {
        let expand = |s: &str| expand_vars(s, &lookup);

        self.components
            .iter()
            .map(|component| expand(component).trim().to_string())
            .filter(|component| !component.is_empty())
            .map(|component| {
                let delivery = match &self.pull {
                    Some(pull) => Delivery::Pull(PullDelivery {
                        properties: expand(&pull.properties),
                        source_type: expand(&pull.source_type),
                        source_properties: expand(&pull.source_properties),
                        incremental: self.incremental,
                    }),
                    None => Delivery::Push(PushDelivery {
                        version: expand(&self.version).trim().to_string(),
                        description: expand(&self.description),
                        base_dir: PathBuf::from(expand(&self.base_dir.to_string_lossy())),
                        offset: self.offset.as_deref().map(|o| expand(o)),
                        includes: expand(&self.includes),
                        excludes: expand(&self.excludes),
                        properties: expand(&self.properties),
                        incremental: self.incremental,
                    }),
                };

                PublishRequest {
                    component,
                    delivery,
                    create_component: self.create_component.then(|| CreateComponent {
                        template: expand(&self.template),
                        application: self.application.as_deref().map(|a| expand(a)),
                    }),
                    tags: self.tags.iter().map(|t| expand(t)).collect(),
                    link: self.link_url.as_deref().map(|url| VersionLink {
                        name: expand(&self.link_name),
                        url: expand(url),
                    }),
                }
            })
            .collect()
    }
}

/// Options for one deployment
#[derive(Debug, Clone, Default)]
pub struct DeployJob {
    pub application: String,
    pub environment: String,
    pub process: String,
    pub versions: String,
    pub only_changed: bool,
    pub create_process: Option<String>,
}

impl DeployJob {
    /// Build the request, expanding `${VAR}` references
    pub fn request<F>(&self, lookup: F) -> DeployRequest
    where
        F: Fn(&str) -> Option<String>,
    {
        let expand = |s: &str| expand_vars(s, &lookup).trim().to_string();

        DeployRequest {
            application: expand(&self.application),
            environment: expand(&self.environment),
            process: expand(&self.process),
            versions: expand(&self.versions),
            only_changed: self.only_changed,
            create_process: self
                .create_process
                .as_deref()
                .map(expand)
                .filter(|p| !p.is_empty()),
            description: REQUEST_DESCRIPTION.to_string(),
        }
    }
}
