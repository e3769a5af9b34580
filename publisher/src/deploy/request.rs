//! Deployment request workflow

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use ucd_models::ApplicationProcessRequest;
use uuid::Uuid;

use crate::deploy::fsm::RequestState;
use crate::deploy::poller::{poll_until_terminal, CancelSignal, PollOptions};
use crate::deploy::process::ensure_process;
use crate::deploy::versions::VersionSpec;
use crate::errors::PublisherError;
use crate::http::api::DeployApi;

/// Description attached to submitted requests
pub const REQUEST_DESCRIPTION: &str = "Requested from ucdpub";

/// What to deploy and where
#[derive(Debug, Clone)]
pub struct DeployRequest {
    pub application: String,
    pub environment: String,
    pub process: String,
    /// `SNAPSHOT=name`, or newline-separated `component:version` lines
    pub versions: String,
    pub only_changed: bool,
    /// Component process to build the application process from when it is missing
    pub create_process: Option<String>,
    pub description: String,
}

impl DeployRequest {
    pub fn new(
        application: impl Into<String>,
        environment: impl Into<String>,
        process: impl Into<String>,
        versions: impl Into<String>,
    ) -> Self {
        Self {
            application: application.into(),
            environment: environment.into(),
            process: process.into(),
            versions: versions.into(),
            only_changed: false,
            create_process: None,
            description: REQUEST_DESCRIPTION.to_string(),
        }
    }

    fn validate(&self) -> Result<(), PublisherError> {
        let required = [
            ("Deploy application", &self.application),
            ("Deploy environment", &self.environment),
            ("Deploy process", &self.process),
            ("Deploy versions", &self.versions),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(PublisherError::Validation(format!(
                    "{} is a required field for deployment",
                    field
                )));
            }
        }
        Ok(())
    }
}

/// Terminal outcome of a deployment
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentOutcome {
    pub request_id: Uuid,
    pub state: RequestState,
    pub result: String,
    pub polls: u32,
    pub elapsed: Duration,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Runs deployment requests against one server
pub struct Deployer<'a> {
    api: &'a dyn DeployApi,
    poll: PollOptions,
}

impl<'a> Deployer<'a> {
    pub fn new(api: &'a dyn DeployApi, poll: PollOptions) -> Self {
        Self { api, poll }
    }

    /// Submit a request and wait for it, sleeping on the tokio timer
    pub async fn deploy(
        &self,
        request: &DeployRequest,
        cancel: CancelSignal,
    ) -> Result<DeploymentOutcome, PublisherError> {
        self.deploy_with(request, tokio::time::sleep, cancel).await
    }

    /// Submit a request and wait for it using `sleep_fn` between checks.
    ///
    /// A terminal `FAULTED` or `FAILED TO START` result is returned as
    /// `ProcessFailed`; any other terminal result is a completed deployment.
    pub async fn deploy_with<S, F>(
        &self,
        request: &DeployRequest,
        sleep_fn: S,
        cancel: CancelSignal,
    ) -> Result<DeploymentOutcome, PublisherError>
    where
        S: Fn(Duration) -> F,
        F: Future<Output = ()>,
    {
        request.validate()?;
        let versions = VersionSpec::parse(&request.versions)?;

        if let Some(component_process) = &request.create_process {
            ensure_process(
                self.api,
                &request.application,
                &request.process,
                component_process,
            )
            .await?;
        }

        match &versions {
            VersionSpec::Snapshot(name) => info!("Deploying snapshot '{}'", name),
            VersionSpec::Components(_) => info!("Deploying component versions {}", versions),
        }
        info!(
            "Starting deployment process '{}' of application '{}' in environment '{}'",
            request.process, request.application, request.environment
        );

        let payload = ApplicationProcessRequest {
            application: request.application.clone(),
            application_process: request.process.clone(),
            description: request.description.clone(),
            environment: request.environment.clone(),
            only_changed: request.only_changed,
            snapshot: versions.snapshot().map(str::to_string),
            versions: versions.selectors(),
        };

        let started_at = Utc::now();
        let request_id = self.api.request_application_process(&payload).await?;
        info!("Deployment request id is {}", request_id);

        let report =
            poll_until_terminal(self.api, &request_id, &self.poll, sleep_fn, cancel).await?;
        let finished_at = Utc::now();

        info!(
            "Finished the deployment in {} seconds with result {}",
            report.elapsed.as_secs(),
            report.result
        );

        if report.state.is_failure() {
            return Err(PublisherError::ProcessFailed {
                request_id: request_id.to_string(),
                result: report.result,
            });
        }

        Ok(DeploymentOutcome {
            request_id,
            state: report.state,
            result: report.result,
            polls: report.polls,
            elapsed: report.elapsed,
            started_at,
            finished_at,
        })
    }
}
