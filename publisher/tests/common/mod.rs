//! Shared test doubles

#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use ucd_models::{
    ApplicationComponent, ApplicationProcess, ApplicationProcessRequest, Component,
    CreateComponentRequest, ImportVersionsRequest, NewPropDef, PropDef, PropSheetDef,
    RequestStatus,
};
use uuid::Uuid;

use ucdpub::errors::PublisherError;
use ucdpub::http::api::DeployApi;
use ucdpub::upload::fileset::FileSelection;
use ucdpub::upload::vfs::{ArtifactUploader, UploadSummary};

/// Every server call the fake saw, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    GetComponent(String),
    CreateComponent(String),
    SetComponentProperty(String, String),
    AddTags(Vec<String>),
    ImportVersions(String),
    GetApplicationComponents(String),
    AddComponentToApplication(String, String),
    CreateVersion(String, String),
    DeleteVersion(Uuid),
    AddVersionLink(String, String),
    SetVersionProperties(BTreeMap<String, String>),
    ListPropDefs(String),
    CreatePropDef(String),
    GetApplicationProcess(String),
    CreateApplicationProcess(String),
    RequestApplicationProcess,
    RequestStatus(Uuid),
}

#[derive(Default)]
struct State {
    calls: Vec<Call>,
    components: BTreeMap<String, Component>,
    app_components: Vec<String>,
    prop_defs: Vec<String>,
    version_properties: BTreeMap<String, String>,
    processes: Vec<String>,
    statuses: VecDeque<Result<RequestStatus, u16>>,
    submitted: Vec<ApplicationProcessRequest>,
    created_processes: Vec<Value>,
    fail_delete: bool,
    fail_set_property: Option<String>,
}

/// In-memory deployment server that records every call
pub struct FakeApi {
    state: Mutex<State>,
    pub version_id: Uuid,
    pub request_id: Uuid,
}

pub const SHEET_PATH: &str = "components/c1/versionPropSheetDef";

impl FakeApi {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            version_id: Uuid::new_v4(),
            request_id: Uuid::new_v4(),
        }
    }

    /// A fake that already knows `name`, with a version property sheet
    pub fn with_component(name: &str) -> Self {
        let api = Self::new();
        api.add_component(name);
        api
    }

    pub fn add_component(&self, name: &str) {
        let component = Component {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: None,
            version_prop_sheet_def: Some(PropSheetDef {
                id: Uuid::new_v4().to_string(),
                path: SHEET_PATH.to_string(),
            }),
            properties: Vec::new(),
        };
        self.state
            .lock()
            .unwrap()
            .components
            .insert(name.to_string(), component);
    }

    pub fn add_prop_def(&self, name: &str) {
        self.state.lock().unwrap().prop_defs.push(name.to_string());
    }

    pub fn add_app_component(&self, name: &str) {
        self.state.lock().unwrap().app_components.push(name.to_string());
    }

    pub fn add_process(&self, name: &str) {
        self.state.lock().unwrap().processes.push(name.to_string());
    }

    /// Queue a status response
    pub fn push_status(&self, status: Option<&str>, result: Option<&str>) {
        self.state.lock().unwrap().statuses.push_back(Ok(RequestStatus {
            status: status.map(str::to_string),
            result: result.map(str::to_string),
        }));
    }

    /// Queue an HTTP failure for the next status check
    pub fn push_status_error(&self, status: u16) {
        self.state.lock().unwrap().statuses.push_back(Err(status));
    }

    pub fn fail_delete(&self) {
        self.state.lock().unwrap().fail_delete = true;
    }

    pub fn fail_set_property(&self, name: &str) {
        self.state.lock().unwrap().fail_set_property = Some(name.to_string());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| matches(c)).count()
    }

    pub fn prop_defs(&self) -> Vec<String> {
        self.state.lock().unwrap().prop_defs.clone()
    }

    pub fn version_properties(&self) -> BTreeMap<String, String> {
        self.state.lock().unwrap().version_properties.clone()
    }

    pub fn submitted(&self) -> Vec<ApplicationProcessRequest> {
        self.state.lock().unwrap().submitted.clone()
    }

    pub fn created_processes(&self) -> Vec<Value> {
        self.state.lock().unwrap().created_processes.clone()
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }
}

fn http_error(status: u16, uri: &str) -> PublisherError {
    PublisherError::Http {
        status,
        uri: uri.to_string(),
        body: String::new(),
    }
}

#[async_trait]
impl DeployApi for FakeApi {
    async fn get_component(&self, name: &str) -> Result<Option<Component>, PublisherError> {
        self.record(Call::GetComponent(name.to_string()));
        Ok(self.state.lock().unwrap().components.get(name).cloned())
    }

    async fn create_component(&self, request: &CreateComponentRequest) -> Result<Uuid, PublisherError> {
        self.record(Call::CreateComponent(request.name.clone()));
        self.add_component(&request.name);
        Ok(Uuid::new_v4())
    }

    async fn set_component_property(
        &self,
        _component: &str,
        name: &str,
        value: &str,
    ) -> Result<(), PublisherError> {
        self.record(Call::SetComponentProperty(name.to_string(), value.to_string()));
        Ok(())
    }

    async fn add_component_tags(&self, _component: &str, tags: &[String]) -> Result<(), PublisherError> {
        self.record(Call::AddTags(tags.to_vec()));
        Ok(())
    }

    async fn import_versions(&self, request: &ImportVersionsRequest) -> Result<(), PublisherError> {
        self.record(Call::ImportVersions(request.component.clone()));
        Ok(())
    }

    async fn get_application_components(
        &self,
        application: &str,
    ) -> Result<Vec<ApplicationComponent>, PublisherError> {
        self.record(Call::GetApplicationComponents(application.to_string()));
        Ok(self
            .state
            .lock()
            .unwrap()
            .app_components
            .iter()
            .map(|name| ApplicationComponent {
                id: None,
                name: name.clone(),
            })
            .collect())
    }

    async fn add_component_to_application(
        &self,
        application: &str,
        component: &str,
    ) -> Result<(), PublisherError> {
        self.record(Call::AddComponentToApplication(
            application.to_string(),
            component.to_string(),
        ));
        self.add_app_component(component);
        Ok(())
    }

    async fn create_version(
        &self,
        component: &str,
        name: &str,
        _description: &str,
        _version_type: Option<&str>,
    ) -> Result<Uuid, PublisherError> {
        self.record(Call::CreateVersion(component.to_string(), name.to_string()));
        Ok(self.version_id)
    }

    async fn delete_version(&self, version_id: &Uuid) -> Result<(), PublisherError> {
        self.record(Call::DeleteVersion(*version_id));
        if self.state.lock().unwrap().fail_delete {
            return Err(http_error(500, "rest/deploy/version"));
        }
        Ok(())
    }

    async fn add_version_link(
        &self,
        _component: &str,
        _version: &str,
        link_name: &str,
        link_url: &str,
    ) -> Result<(), PublisherError> {
        self.record(Call::AddVersionLink(link_name.to_string(), link_url.to_string()));
        Ok(())
    }

    async fn set_version_properties(
        &self,
        _version_id: &Uuid,
        values: &BTreeMap<String, String>,
    ) -> Result<(), PublisherError> {
        self.record(Call::SetVersionProperties(values.clone()));
        let mut state = self.state.lock().unwrap();
        if let Some(failing) = &state.fail_set_property {
            if values.contains_key(failing) {
                return Err(http_error(500, "property/propSheet"));
            }
        }
        if values
            .keys()
            .any(|name| !state.prop_defs.iter().any(|d| d == name))
        {
            return Err(http_error(400, "property/propSheet"));
        }
        state.version_properties.extend(values.clone());
        Ok(())
    }

    async fn list_prop_defs(&self, sheet_def: &PropSheetDef) -> Result<Vec<PropDef>, PublisherError> {
        self.record(Call::ListPropDefs(sheet_def.path.clone()));
        Ok(self
            .state
            .lock()
            .unwrap()
            .prop_defs
            .iter()
            .map(|name| PropDef {
                id: None,
                name: name.clone(),
                prop_type: Some("TEXT".to_string()),
            })
            .collect())
    }

    async fn create_prop_def(&self, _sheet_def: &PropSheetDef, def: &NewPropDef) -> Result<(), PublisherError> {
        self.record(Call::CreatePropDef(def.name.clone()));
        self.add_prop_def(&def.name);
        Ok(())
    }

    async fn get_application_process(
        &self,
        _application: &str,
        process: &str,
    ) -> Result<Option<ApplicationProcess>, PublisherError> {
        self.record(Call::GetApplicationProcess(process.to_string()));
        let exists = self.state.lock().unwrap().processes.iter().any(|p| p == process);
        Ok(exists.then(|| ApplicationProcess {
            id: None,
            name: process.to_string(),
        }))
    }

    async fn create_application_process(&self, process: &Value) -> Result<Uuid, PublisherError> {
        let name = process["name"].as_str().unwrap_or_default().to_string();
        self.record(Call::CreateApplicationProcess(name.clone()));
        let mut state = self.state.lock().unwrap();
        state.processes.push(name);
        state.created_processes.push(process.clone());
        Ok(Uuid::new_v4())
    }

    async fn request_application_process(
        &self,
        request: &ApplicationProcessRequest,
    ) -> Result<Uuid, PublisherError> {
        self.record(Call::RequestApplicationProcess);
        self.state.lock().unwrap().submitted.push(request.clone());
        Ok(self.request_id)
    }

    async fn request_status(&self, request_id: &Uuid) -> Result<RequestStatus, PublisherError> {
        self.record(Call::RequestStatus(*request_id));
        match self.state.lock().unwrap().statuses.pop_front() {
            Some(Ok(status)) => Ok(status),
            Some(Err(code)) => Err(http_error(code, "requestStatus")),
            None => Ok(RequestStatus {
                status: Some("EXECUTING".to_string()),
                result: None,
            }),
        }
    }
}

/// Uploader that records its calls and optionally fails
type UploadFailure = Box<dyn Fn() -> PublisherError + Send + Sync>;

pub struct FakeUploader {
    failure: Option<UploadFailure>,
    uploads: Mutex<Vec<(String, String, PathBuf)>>,
}

impl FakeUploader {
    pub fn ok() -> Self {
        Self {
            failure: None,
            uploads: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        let message = message.to_string();
        Self::failing_with(move || PublisherError::Io(std::io::Error::other(message.clone())))
    }

    /// Fails every upload with the error `make` builds
    pub fn failing_with(make: impl Fn() -> PublisherError + Send + Sync + 'static) -> Self {
        Self {
            failure: Some(Box::new(make)),
            uploads: Mutex::new(Vec::new()),
        }
    }

    pub fn uploads(&self) -> Vec<(String, String, PathBuf)> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArtifactUploader for FakeUploader {
    async fn upload(
        &self,
        component: &str,
        version: &str,
        work_dir: &Path,
        selection: &FileSelection,
    ) -> Result<UploadSummary, PublisherError> {
        self.uploads.lock().unwrap().push((
            component.to_string(),
            version.to_string(),
            work_dir.to_path_buf(),
        ));
        if let Some(make) = &self.failure {
            return Err(make());
        }
        let files = selection.scan(work_dir)?;
        Ok(UploadSummary {
            files: files.len(),
            bytes: files.iter().map(|f| f.size).sum(),
            change_set: Some("cs-1".to_string()),
        })
    }
}
