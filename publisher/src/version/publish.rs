//! Component version publication

use std::path::PathBuf;

use tracing::{error, info, warn};
use ucd_models::ImportVersionsRequest;
use uuid::Uuid;

use crate::errors::PublisherError;
use crate::http::api::DeployApi;
use crate::upload::fileset::{resolve_work_dir, FileSelection};
use crate::upload::patterns::PatternSet;
use crate::upload::vfs::{ArtifactUploader, UploadSummary};
use crate::version::component::{ensure_component, tag_component, ComponentSource, CreateComponent};
use crate::version::properties::{parse_properties, reconcile, ReconcileReport};

/// Longest version name the server accepts
pub const MAX_VERSION_NAME_LEN: usize = 255;

/// Files pushed from the local workspace into a new version
#[derive(Debug, Clone, Default)]
pub struct PushDelivery {
    pub version: String,
    pub description: String,
    pub base_dir: PathBuf,
    /// Subdirectory of `base_dir` to upload from
    pub offset: Option<String>,
    /// Newline-separated include globs, optionally suffixed with `=component`
    pub includes: String,
    pub excludes: String,
    /// Newline-separated `name=value` version properties
    pub properties: String,
    pub incremental: bool,
}

/// Versions imported by the server through the component's source config
#[derive(Debug, Clone, Default)]
pub struct PullDelivery {
    /// `name=value` lines passed to the import
    pub properties: String,
    /// Source config plugin used when the component is created
    pub source_type: String,
    /// `name=value` source config properties for a created component
    pub source_properties: String,
    pub incremental: bool,
}

/// How the new version's content reaches the server
#[derive(Debug, Clone)]
pub enum Delivery {
    Push(PushDelivery),
    Pull(PullDelivery),
}

impl Delivery {
    pub fn version_type(&self) -> &'static str {
        let incremental = match self {
            Delivery::Push(push) => push.incremental,
            Delivery::Pull(pull) => pull.incremental,
        };
        if incremental {
            "INCREMENTAL"
        } else {
            "FULL"
        }
    }
}

/// Link from a version back to the build that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionLink {
    pub name: String,
    pub url: String,
}

/// One component to publish
#[derive(Debug, Clone)]
pub struct PublishRequest {
    pub component: String,
    pub delivery: Delivery,
    pub create_component: Option<CreateComponent>,
    pub tags: Vec<String>,
    pub link: Option<VersionLink>,
}

impl PublishRequest {
    pub fn push(component: impl Into<String>, push: PushDelivery) -> Self {
        Self {
            component: component.into(),
            delivery: Delivery::Push(push),
            create_component: None,
            tags: Vec::new(),
            link: None,
        }
    }

    pub fn pull(component: impl Into<String>, pull: PullDelivery) -> Self {
        Self {
            component: component.into(),
            delivery: Delivery::Pull(pull),
            create_component: None,
            tags: Vec::new(),
            link: None,
        }
    }
}

/// What publishing one component produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishResult {
    /// A pushed version
    Created {
        version_id: Uuid,
        version: String,
        upload: UploadSummary,
        properties: ReconcileReport,
    },

    /// The server was asked to import versions itself
    Imported,
}

/// Per-component result of a multi-component run
#[derive(Debug)]
pub enum ComponentOutcome {
    Published {
        component: String,
        result: PublishResult,
    },
    Failed {
        component: String,
        error: PublisherError,
    },
    /// Not attempted because an earlier component failed
    Skipped { component: String },
}

impl ComponentOutcome {
    pub fn component(&self) -> &str {
        match self {
            ComponentOutcome::Published { component, .. }
            | ComponentOutcome::Failed { component, .. }
            | ComponentOutcome::Skipped { component } => component,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ComponentOutcome::Failed { .. })
    }
}

/// Version names must be 1 to 255 characters
pub fn validate_version_name(name: &str) -> Result<(), PublisherError> {
    let len = name.chars().count();
    if len == 0 || len > MAX_VERSION_NAME_LEN {
        return Err(PublisherError::Validation(format!(
            "Version name '{}' must be between 1 and {} characters long (current length: {})",
            name, MAX_VERSION_NAME_LEN, len
        )));
    }
    Ok(())
}

/// Publishes component versions through a deployment server
pub struct VersionPublisher<'a> {
    api: &'a dyn DeployApi,
    uploader: &'a dyn ArtifactUploader,
}

impl<'a> VersionPublisher<'a> {
    pub fn new(api: &'a dyn DeployApi, uploader: &'a dyn ArtifactUploader) -> Self {
        Self { api, uploader }
    }

    /// Publish one component.
    ///
    /// Everything that can be checked locally is checked before the first
    /// server call. If the upload fails the new version is deleted again;
    /// a failure after the upload leaves the version in place.
    pub async fn publish(&self, request: &PublishRequest) -> Result<PublishResult, PublisherError> {
        let component = request.component.trim();
        if component.is_empty() {
            return Err(PublisherError::Validation(
                "Component name is a required field".to_string(),
            ));
        }

        match &request.delivery {
            Delivery::Push(push) => self.publish_push(component, request, push).await,
            Delivery::Pull(pull) => self.publish_pull(component, request, pull).await,
        }
    }

    async fn publish_push(
        &self,
        component: &str,
        request: &PublishRequest,
        push: &PushDelivery,
    ) -> Result<PublishResult, PublisherError> {
        validate_version_name(&push.version)?;
        let properties = parse_properties(&push.properties)?;
        let selection = FileSelection::new(
            &PatternSet::for_component(&push.includes, component),
            &PatternSet::for_component(&push.excludes, component),
        )?;
        let work_dir = resolve_work_dir(&push.base_dir, push.offset.as_deref())?;

        self.prepare_component(component, request, ComponentSource {
            plugin: String::new(),
            default_version_type: request.delivery.version_type().to_string(),
            properties: Default::default(),
        })
        .await?;

        info!(
            "Creating new component version '{}' on component '{}'",
            push.version, component
        );
        let version_id = self
            .api
            .create_version(
                component,
                &push.version,
                &push.description,
                Some(request.delivery.version_type()),
            )
            .await?;
        info!("Created component version with id {}", version_id);

        info!(
            "Uploading files from {} to version '{}'",
            work_dir.display(),
            push.version
        );
        let upload = match self
            .uploader
            .upload(component, &push.version, &work_dir, &selection)
            .await
        {
            Ok(summary) => summary,
            Err(cause) => {
                error!("Failed to upload files: {}", cause);
                let cleanup = match self.api.delete_version(&version_id).await {
                    Ok(()) => {
                        info!("Deleted version {} after failed upload", version_id);
                        None
                    }
                    Err(e) => {
                        warn!("Failed to delete version {}: {}", version_id, e);
                        Some(e.to_string())
                    }
                };
                return Err(PublisherError::Upload {
                    version_id: version_id.to_string(),
                    cause: Box::new(cause),
                    cleanup,
                });
            }
        };
        info!("Uploaded {} files ({} bytes)", upload.files, upload.bytes);

        let report = reconcile(self.api, component, &version_id, &properties).await?;

        if let Some(link) = request.link.as_ref().filter(|l| !l.url.trim().is_empty()) {
            info!(
                "Creating component version link '{}' to URL '{}'",
                link.name, link.url
            );
            self.api
                .add_version_link(component, &push.version, &link.name, &link.url)
                .await?;
        }

        Ok(PublishResult::Created {
            version_id,
            version: push.version.clone(),
            upload,
            properties: report,
        })
    }

    async fn publish_pull(
        &self,
        component: &str,
        request: &PublishRequest,
        pull: &PullDelivery,
    ) -> Result<PublishResult, PublisherError> {
        let import_properties = parse_properties(&pull.properties)?;
        let source_properties = parse_properties(&pull.source_properties)?;

        self.prepare_component(component, request, ComponentSource {
            plugin: pull.source_type.trim().to_string(),
            default_version_type: request.delivery.version_type().to_string(),
            properties: source_properties,
        })
        .await?;

        info!(
            "Importing versions of component '{}' with properties {:?}",
            component, import_properties
        );
        self.api
            .import_versions(&ImportVersionsRequest {
                component: component.to_string(),
                properties: import_properties,
            })
            .await?;

        Ok(PublishResult::Imported)
    }

    async fn prepare_component(
        &self,
        component: &str,
        request: &PublishRequest,
        source: ComponentSource,
    ) -> Result<(), PublisherError> {
        if let Some(create) = &request.create_component {
            ensure_component(self.api, component, create, &source).await?;
        }
        tag_component(self.api, component, &request.tags).await
    }

    /// Publish several components one after another.
    ///
    /// The first failure stops the run; components after it are reported as
    /// skipped and versions already published stay on the server.
    pub async fn publish_all(&self, requests: &[PublishRequest]) -> Vec<ComponentOutcome> {
        let mut outcomes = Vec::with_capacity(requests.len());
        let mut failed = false;

        for request in requests {
            let component = request.component.clone();
            if failed {
                outcomes.push(ComponentOutcome::Skipped { component });
                continue;
            }

            match self.publish(request).await {
                Ok(result) => outcomes.push(ComponentOutcome::Published { component, result }),
                Err(error) => {
                    error!("Publishing component '{}' failed: {}", component, error);
                    failed = true;
                    outcomes.push(ComponentOutcome::Failed { component, error });
                }
            }
        }

        outcomes
    }
}
