//! Version property parsing and reconciliation

use std::collections::BTreeMap;

use tracing::info;
use ucd_models::NewPropDef;
use uuid::Uuid;

use crate::errors::PublisherError;
use crate::http::api::DeployApi;

/// Desired property values keyed by name
pub type PropertyMap = BTreeMap<String, String>;

/// Parse newline-separated `name=value` lines.
///
/// Lines split at the first `=`, so values may contain `=`. An empty value is
/// kept as an empty string. Later lines override earlier ones.
pub fn parse_properties(text: &str) -> Result<PropertyMap, PublisherError> {
    let mut properties = PropertyMap::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }

        let (name, value) = line.split_once('=').ok_or_else(|| {
            PublisherError::Config(format!(
                "Missing property delimiter '=' in property definition '{}'",
                line.trim()
            ))
        })?;

        let name = name.trim();
        if name.is_empty() {
            return Err(PublisherError::Config(format!(
                "Missing property name in property definition '{}'",
                line.trim()
            )));
        }

        properties.insert(name.to_string(), value.trim().to_string());
    }

    Ok(properties)
}

/// What a reconciliation did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Properties set against an existing definition
    pub updated: Vec<String>,

    /// Properties whose definition had to be created first
    pub created: Vec<String>,
}

/// Set every desired property on a version, creating missing definitions.
///
/// Missing definitions are created first, then all values go out in a single
/// write. A failed definition create leaves earlier creates in place but
/// writes no values. Re-running with the same input is safe.
pub async fn reconcile(
    api: &dyn DeployApi,
    component: &str,
    version_id: &Uuid,
    desired: &PropertyMap,
) -> Result<ReconcileReport, PublisherError> {
    let mut report = ReconcileReport::default();
    if desired.is_empty() {
        return Ok(report);
    }

    let sheet_def = api.get_version_prop_sheet_def(component).await?;
    let existing = api.list_prop_defs(&sheet_def).await?;

    for name in desired.keys() {
        if existing.iter().any(|def| def.name == *name) {
            report.updated.push(name.clone());
        } else {
            info!("Creating property definition for '{}'", name);
            api.create_prop_def(&sheet_def, &NewPropDef::text(name.as_str()))
                .await?;
            report.created.push(name.clone());
        }
    }

    for (name, value) in desired {
        info!("Setting version property '{}' to '{}'", name, value);
    }
    api.set_version_properties(version_id, desired).await?;

    Ok(report)
}
