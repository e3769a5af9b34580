//! Deployment server API seam used by the workflows

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use ucd_models::{
    ApplicationComponent, ApplicationProcess, ApplicationProcessRequest, Component,
    CreateComponentRequest, ImportVersionsRequest, NewPropDef, PropDef, PropSheetDef,
    RequestStatus,
};
use uuid::Uuid;

use crate::errors::PublisherError;
use crate::http::client::HttpClient;

/// REST operations the workflows need, as a trait for testability
#[async_trait]
pub trait DeployApi: Send + Sync {
    /// Fetch a component; `None` when the server does not know it
    async fn get_component(&self, name: &str) -> Result<Option<Component>, PublisherError>;

    async fn create_component(&self, request: &CreateComponentRequest) -> Result<Uuid, PublisherError>;

    async fn set_component_property(
        &self,
        component: &str,
        name: &str,
        value: &str,
    ) -> Result<(), PublisherError>;

    async fn add_component_tags(&self, component: &str, tags: &[String]) -> Result<(), PublisherError>;

    /// Ask the server to import versions through the component's source config
    async fn import_versions(&self, request: &ImportVersionsRequest) -> Result<(), PublisherError>;

    async fn get_application_components(
        &self,
        application: &str,
    ) -> Result<Vec<ApplicationComponent>, PublisherError>;

    async fn add_component_to_application(
        &self,
        application: &str,
        component: &str,
    ) -> Result<(), PublisherError>;

    async fn create_version(
        &self,
        component: &str,
        name: &str,
        description: &str,
        version_type: Option<&str>,
    ) -> Result<Uuid, PublisherError>;

    async fn delete_version(&self, version_id: &Uuid) -> Result<(), PublisherError>;

    async fn add_version_link(
        &self,
        component: &str,
        version: &str,
        link_name: &str,
        link_url: &str,
    ) -> Result<(), PublisherError>;

    /// Write several property values to a version's property sheet in one
    /// request; every name must already have a definition
    async fn set_version_properties(
        &self,
        version_id: &Uuid,
        values: &BTreeMap<String, String>,
    ) -> Result<(), PublisherError>;

    /// The property-sheet definition governing a component's versions
    async fn get_version_prop_sheet_def(&self, component: &str) -> Result<PropSheetDef, PublisherError> {
        let found = self.get_component(component).await?.ok_or_else(|| {
            PublisherError::Validation(format!("Component '{}' does not exist", component))
        })?;
        found.version_prop_sheet_def.ok_or_else(|| {
            PublisherError::UnexpectedResponse(format!(
                "Component '{}' has no version property sheet definition",
                component
            ))
        })
    }

    async fn list_prop_defs(&self, sheet_def: &PropSheetDef) -> Result<Vec<PropDef>, PublisherError>;

    async fn create_prop_def(&self, sheet_def: &PropSheetDef, def: &NewPropDef) -> Result<(), PublisherError>;

    async fn get_application_process(
        &self,
        application: &str,
        process: &str,
    ) -> Result<Option<ApplicationProcess>, PublisherError>;

    async fn create_application_process(&self, process: &Value) -> Result<Uuid, PublisherError>;

    async fn request_application_process(
        &self,
        request: &ApplicationProcessRequest,
    ) -> Result<Uuid, PublisherError>;

    async fn request_status(&self, request_id: &Uuid) -> Result<RequestStatus, PublisherError>;
}

#[async_trait]
impl DeployApi for HttpClient {
    async fn get_component(&self, name: &str) -> Result<Option<Component>, PublisherError> {
        self.fetch_component(name).await
    }

    async fn create_component(&self, request: &CreateComponentRequest) -> Result<Uuid, PublisherError> {
        self.post_component(request).await
    }

    async fn set_component_property(
        &self,
        component: &str,
        name: &str,
        value: &str,
    ) -> Result<(), PublisherError> {
        self.put_component_property(component, name, value).await
    }

    async fn add_component_tags(&self, component: &str, tags: &[String]) -> Result<(), PublisherError> {
        self.put_component_tags(component, tags).await
    }

    async fn import_versions(&self, request: &ImportVersionsRequest) -> Result<(), PublisherError> {
        self.put_integrate(request).await
    }

    async fn get_application_components(
        &self,
        application: &str,
    ) -> Result<Vec<ApplicationComponent>, PublisherError> {
        self.fetch_application_components(application).await
    }

    async fn add_component_to_application(
        &self,
        application: &str,
        component: &str,
    ) -> Result<(), PublisherError> {
        self.put_component_in_application(application, component).await
    }

    async fn create_version(
        &self,
        component: &str,
        name: &str,
        description: &str,
        version_type: Option<&str>,
    ) -> Result<Uuid, PublisherError> {
        self.post_version(component, name, description, version_type).await
    }

    async fn delete_version(&self, version_id: &Uuid) -> Result<(), PublisherError> {
        self.remove_version(version_id).await
    }

    async fn add_version_link(
        &self,
        component: &str,
        version: &str,
        link_name: &str,
        link_url: &str,
    ) -> Result<(), PublisherError> {
        self.put_version_link(component, version, link_name, link_url).await
    }

    async fn set_version_properties(
        &self,
        version_id: &Uuid,
        values: &BTreeMap<String, String>,
    ) -> Result<(), PublisherError> {
        self.merge_version_properties(version_id, values).await
    }

    async fn list_prop_defs(&self, sheet_def: &PropSheetDef) -> Result<Vec<PropDef>, PublisherError> {
        self.fetch_prop_defs(sheet_def).await
    }

    async fn create_prop_def(&self, sheet_def: &PropSheetDef, def: &NewPropDef) -> Result<(), PublisherError> {
        self.put_prop_def(sheet_def, def).await
    }

    async fn get_application_process(
        &self,
        application: &str,
        process: &str,
    ) -> Result<Option<ApplicationProcess>, PublisherError> {
        self.fetch_application_process(application, process).await
    }

    async fn create_application_process(&self, process: &Value) -> Result<Uuid, PublisherError> {
        self.post_application_process(process).await
    }

    async fn request_application_process(
        &self,
        request: &ApplicationProcessRequest,
    ) -> Result<Uuid, PublisherError> {
        self.put_process_request(request).await
    }

    async fn request_status(&self, request_id: &Uuid) -> Result<RequestStatus, PublisherError> {
        self.fetch_request_status(request_id).await
    }
}
