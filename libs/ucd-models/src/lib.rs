//! Wire models for the UrbanCode Deploy REST API

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Property sheet definition reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropSheetDef {
    pub id: String,
    pub path: String,
}

/// A name/value property as returned inside entity payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropValue {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

/// Component as returned by `/rest/deploy/component/{name}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub version_prop_sheet_def: Option<PropSheetDef>,
    #[serde(default)]
    pub properties: Vec<PropValue>,
}

impl Component {
    /// Look up a component property by name (case-insensitive)
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .map(|p| p.value.as_str())
    }
}

/// Existing property definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropDef {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type", default)]
    pub prop_type: Option<String>,
}

/// Property definition creation payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPropDef {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub prop_type: String,
    pub value: String,
    pub required: bool,
    pub description: String,
    pub inherited: bool,
}

impl NewPropDef {
    /// Plain, optional TEXT definition with empty label and description
    pub fn text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: String::new(),
            prop_type: "TEXT".to_string(),
            value: String::new(),
            required: false,
            description: String::new(),
            inherited: false,
        }
    }
}

/// Response carrying the id of a newly created entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Created {
    pub id: Uuid,
}

/// Property sheet attached to a version
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropSheet {
    #[serde(default)]
    pub name: Option<String>,
    pub path: String,
    #[serde(default = "default_sheet_version", deserialize_with = "lenient_u64")]
    pub version: u64,
}

fn default_sheet_version() -> u64 {
    1
}

/// Version as returned by `/rest/deploy/version/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionDetail {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub prop_sheets: Vec<PropSheet>,
}

impl VersionDetail {
    /// The unnamed sheet holds the version's custom properties
    pub fn property_sheet(&self) -> Option<&PropSheet> {
        self.prop_sheets.iter().find(|s| s.name.is_none())
    }
}

/// Component membership entry of an application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationComponent {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

/// Application process lookup result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationProcess {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

/// Component creation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateComponentRequest {
    pub name: String,
    pub description: String,
    pub source_config_plugin: String,
    pub default_version_type: String,
    pub template_name: String,
    pub template_version: i32,
    pub import_automatically: bool,
    pub use_vfs: bool,
    pub properties: BTreeMap<String, String>,
}

/// Source-config import trigger payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportVersionsRequest {
    pub component: String,
    pub properties: BTreeMap<String, String>,
}

/// One component/version pair inside a deployment request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionSelector {
    pub version: String,
    pub component: String,
}

/// Application process request payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationProcessRequest {
    pub application: String,
    pub application_process: String,
    pub description: String,
    pub environment: String,
    pub only_changed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub versions: Vec<VersionSelector>,
}

/// Response to a submitted application process request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestCreated {
    #[serde(rename = "requestId", alias = "id")]
    pub request_id: Uuid,
}

/// Response of the request status endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestStatus {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
}

/// Manifest entry committed with a staged change set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSetEntry {
    pub path: String,
    pub sha256: String,
    pub size: u64,
    pub executable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symlink: Option<String>,
}

/// Change set commit payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeSet {
    pub user: String,
    pub comment: String,
    pub entries: Vec<ChangeSetEntry>,
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrString {
        Num(u64),
        Str(String),
    }

    match NumOrString::deserialize(deserializer)? {
        NumOrString::Num(n) => Ok(n),
        NumOrString::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
