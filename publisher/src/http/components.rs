//! Component API client

use tracing::debug;
use ucd_models::{Component, Created, CreateComponentRequest, ImportVersionsRequest};
use uuid::Uuid;

use crate::errors::PublisherError;
use crate::http::client::{is_not_found, parse_json, HttpClient};

impl HttpClient {
    /// Get a component by name, `None` if it does not exist
    pub async fn fetch_component(&self, name: &str) -> Result<Option<Component>, PublisherError> {
        let url = self.url(&["rest", "deploy", "component", name], &[])?;
        match self.get(&url, "reading the component").await {
            Ok(component) => Ok(Some(component)),
            Err(e) if is_not_found(&e) => {
                debug!("Component '{}' not found", name);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Create a component
    pub async fn post_component(&self, request: &CreateComponentRequest) -> Result<Uuid, PublisherError> {
        let url = self.url(&["cli", "component", "create"], &[])?;
        let body = self.post(&url, Some(request)).await?;
        let created: Created = parse_json(&body, "creating the component")?;
        Ok(created.id)
    }

    /// Set a plain (non-secure) component property
    pub async fn put_component_property(
        &self,
        component: &str,
        name: &str,
        value: &str,
    ) -> Result<(), PublisherError> {
        let url = self.url(
            &["cli", "component", "propValue"],
            &[
                ("component", component),
                ("name", name),
                ("value", value),
                ("isSecure", "false"),
            ],
        )?;
        self.put::<()>(&url, None).await?;
        Ok(())
    }

    /// Add tags to a component
    pub async fn put_component_tags(&self, component: &str, tags: &[String]) -> Result<(), PublisherError> {
        for tag in tags {
            let url = self.url(
                &["cli", "component", "tag"],
                &[("component", component), ("tags", tag)],
            )?;
            self.put::<()>(&url, None).await?;
        }
        Ok(())
    }

    /// Trigger a source-config version import
    pub async fn put_integrate(&self, request: &ImportVersionsRequest) -> Result<(), PublisherError> {
        let url = self.url(&["cli", "component", "integrate"], &[])?;
        self.put(&url, Some(request)).await?;
        Ok(())
    }
}
