//! Parsing of the versions to deploy

use ucd_models::VersionSelector;

use crate::errors::PublisherError;

/// Versions requested for one component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentVersions {
    pub component: String,
    pub versions: Vec<String>,
}

/// What a deployment request installs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSpec {
    /// A single named snapshot
    Snapshot(String),

    /// Explicit versions per component, in first-appearance order
    Components(Vec<ComponentVersions>),
}

impl VersionSpec {
    /// Parse the versions text.
    ///
    /// Text containing `=` names a snapshot (`SNAPSHOT=name`) and must be a
    /// single line. Anything else is newline-separated `component:version`
    /// pairs; a component may repeat to request several versions.
    pub fn parse(raw: &str) -> Result<Self, PublisherError> {
        let text = raw.trim();
        if text.is_empty() {
            return Err(PublisherError::Config(
                "Deploy versions must not be empty".to_string(),
            ));
        }

        if let Some((_, name)) = text.split_once('=') {
            if raw.contains('\n') {
                return Err(PublisherError::Config(
                    "Only a single snapshot can be specified".to_string(),
                ));
            }
            let name = name.trim();
            if name.is_empty() {
                return Err(PublisherError::Config(format!(
                    "Missing snapshot name in '{}'",
                    text
                )));
            }
            return Ok(VersionSpec::Snapshot(name.to_string()));
        }

        let mut components: Vec<ComponentVersions> = Vec::new();
        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }

            let (component, version) = match line.find(':') {
                Some(delim) if !line[..delim].trim().is_empty() =>(line[..delim].trim(), line[delim + 1..].trim()),
                _ => {
                    return Err(PublisherError::Config(format!(
                        "Component/version pairs must be of the form {{Component}}:{{Version}}, got '{}'",
                        line.trim()
                    )));
                }
            };

            match components.iter_mut().find(|c| c.component == component) {
                Some(existing) => existing.versions.push(version.to_string()),
                None => components.push(ComponentVersions {
                    component: component.to_string(),
                    versions: vec![version.to_string()],
                }),
            }
        }

        Ok(VersionSpec::Components(components))
    }

    pub fn snapshot(&self) -> Option<&str> {
        match self {
            VersionSpec::Snapshot(name) => Some(name),
            VersionSpec::Components(_) => None,
        }
    }

    /// Flatten into request selectors; empty for a snapshot
    pub fn selectors(&self) -> Vec<VersionSelector> {
        match self {
            VersionSpec::Snapshot(_) => Vec::new(),
            VersionSpec::Components(components) => components
                .iter()
                .flat_map(|c| {
                    c.versions.iter().map(move |v| VersionSelector {
                        version: v.clone(),
                        component: c.component.clone(),
                    })
                })
                .collect(),
        }
    }
}

impl std::fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VersionSpec::Snapshot(name) => write!(f, "snapshot '{}'", name),
            VersionSpec::Components(components) => {
                let parts: Vec<String> = components
                    .iter()
                    .map(|c| format!("{}: [{}]", c.component, c.versions.join(", ")))
                    .collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
        }
    }
}
