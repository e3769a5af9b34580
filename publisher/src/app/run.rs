//! Command execution against a configured site

use tracing::info;

use crate::app::options::{DeployJob, PublishJob};
use crate::deploy::poller::{CancelSignal, PollOptions};
use crate::deploy::request::{Deployer, DeploymentOutcome};
use crate::errors::PublisherError;
use crate::http::site::Site;
use crate::storage::settings::Settings;
use crate::upload::vfs::VfsUploader;
use crate::version::publish::{ComponentOutcome, VersionPublisher};

/// Resolve the requested site profile from loaded settings
pub fn select_site(settings: &Settings, name: Option<&str>) -> Result<Site, PublisherError> {
    let site_settings = settings.site(name)?;
    info!(
        "Using site '{}' at {}",
        site_settings.profile_name, site_settings.url
    );
    Site::from_settings(site_settings, &settings.http)
}

/// Check that the site is reachable with the configured credentials
pub async fn verify(site: &Site) -> Result<(), PublisherError> {
    let client = site.client().await?;
    client.verify_connection().await?;
    info!("Successfully connected to {}", site.base_url());
    Ok(())
}

/// Publish a version of every component in the job
pub async fn publish(site: &Site, job: &PublishJob) -> Result<Vec<ComponentOutcome>, PublisherError> {
    let requests = job.requests(|name| std::env::var(name).ok());
    if requests.is_empty() {
        return Err(PublisherError::Validation(
            "Component name is a required field".to_string(),
        ));
    }

    let client = site.client().await?;
    let uploader = VfsUploader::new(client);
    let publisher = VersionPublisher::new(client, &uploader);

    Ok(publisher.publish_all(&requests).await)
}

/// Run a deployment and wait for its outcome
pub async fn deploy(
    site: &Site,
    poll: PollOptions,
    job: &DeployJob,
    cancel: CancelSignal,
) -> Result<DeploymentOutcome, PublisherError> {
    let request = job.request(|name| std::env::var(name).ok());
    let client = site.client().await?;
    Deployer::new(client, poll).deploy(&request, cancel).await
}
