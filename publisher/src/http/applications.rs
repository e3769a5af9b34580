//! Application and application process API client

use serde_json::Value;
use tracing::debug;
use ucd_models::{
    ApplicationComponent, ApplicationProcess, ApplicationProcessRequest, Created, RequestCreated,
    RequestStatus,
};
use uuid::Uuid;

use crate::errors::PublisherError;
use crate::http::client::{is_not_found, parse_json, HttpClient};

impl HttpClient {
    /// Components that belong to an application
    pub async fn fetch_application_components(
        &self,
        application: &str,
    ) -> Result<Vec<ApplicationComponent>, PublisherError> {
        let url = self.url(
            &["cli", "application", "componentsInApplication"],
            &[("application", application)],
        )?;
        self.get(&url, "reading application components").await
    }

    /// Add an existing component to an application
    pub async fn put_component_in_application(
        &self,
        application: &str,
        component: &str,
    ) -> Result<(), PublisherError> {
        let url = self.url(
            &["cli", "application", "addComponentToApp"],
            &[("application", application), ("component", component)],
        )?;
        self.put::<()>(&url, None).await?;
        Ok(())
    }

    /// Look up an application process, `None` if it does not exist
    pub async fn fetch_application_process(
        &self,
        application: &str,
        process: &str,
    ) -> Result<Option<ApplicationProcess>, PublisherError> {
        let url = self.url(
            &["cli", "applicationProcess", "info"],
            &[("application", application), ("applicationProcess", process)],
        )?;
        match self.get(&url, "reading the application process").await {
            Ok(found) => Ok(Some(found)),
            Err(e) if is_not_found(&e) => {
                debug!("Application process '{}' not found", process);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Create an application process from its step-graph JSON
    pub async fn post_application_process(&self, process: &Value) -> Result<Uuid, PublisherError> {
        let url = self.url(&["cli", "applicationProcess", "create"], &[])?;
        let body = self.post(&url, Some(process)).await?;
        let created: Created = parse_json(&body, "creating the application process")?;
        Ok(created.id)
    }

    /// Submit an application process request
    pub async fn put_process_request(
        &self,
        request: &ApplicationProcessRequest,
    ) -> Result<Uuid, PublisherError> {
        let url = self.url(&["cli", "applicationProcessRequest", "request"], &[])?;
        let body = self.put(&url, Some(request)).await?;
        let created: RequestCreated = parse_json(&body, "submitting the application process request")?;
        Ok(created.request_id)
    }

    /// Current status of an application process request
    pub async fn fetch_request_status(&self, request_id: &Uuid) -> Result<RequestStatus, PublisherError> {
        let id = request_id.to_string();
        let url = self.url(
            &["cli", "applicationProcessRequest", "requestStatus"],
            &[("request", id.as_str())],
        )?;
        self.get(&url, "reading the application process request status").await
    }
}
