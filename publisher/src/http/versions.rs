//! Component version API client

use std::collections::BTreeMap;

use reqwest::header::{HeaderMap, HeaderValue};
use ucd_models::{Created, VersionDetail};
use uuid::Uuid;

use crate::errors::PublisherError;
use crate::http::client::{parse_json, HttpClient};

impl HttpClient {
    /// Create a component version; the server issues its id
    pub async fn post_version(
        &self,
        component: &str,
        name: &str,
        description: &str,
        version_type: Option<&str>,
    ) -> Result<Uuid, PublisherError> {
        let mut query = vec![
            ("component", component),
            ("name", name),
            ("description", description),
        ];
        if let Some(version_type) = version_type {
            query.push(("type", version_type));
        }
        let url = self.url(&["cli", "version", "createVersion"], &query)?;
        let body = self.post::<()>(&url, None).await?;
        let created: Created = parse_json(&body, "creating the component version")?;
        Ok(created.id)
    }

    /// Delete a component version
    pub async fn remove_version(&self, version_id: &Uuid) -> Result<(), PublisherError> {
        let id = version_id.to_string();
        let url = self.url(&["rest", "deploy", "version", &id], &[])?;
        self.delete(&url).await
    }

    /// Get a version with its property sheets
    pub async fn fetch_version(&self, version_id: &Uuid) -> Result<VersionDetail, PublisherError> {
        let id = version_id.to_string();
        let url = self.url(&["rest", "deploy", "version", &id], &[])?;
        self.get(&url, "reading the component version").await
    }

    /// Link a version to an external URL
    pub async fn put_version_link(
        &self,
        component: &str,
        version: &str,
        link_name: &str,
        link_url: &str,
    ) -> Result<(), PublisherError> {
        let url = self.url(
            &["cli", "version", "addLink"],
            &[
                ("component", component),
                ("version", version),
                ("linkName", link_name),
                ("link", link_url),
            ],
        )?;
        self.put::<()>(&url, None).await?;
        Ok(())
    }

    /// Merge values into a version's property sheet.
    ///
    /// The sheet is versioned: the write carries the sheet version read just
    /// before it, and existing values are read first so the bulk write keeps them.
    pub async fn merge_version_properties(
        &self,
        version_id: &Uuid,
        values: &BTreeMap<String, String>,
    ) -> Result<(), PublisherError> {
        let version = self.fetch_version(version_id).await?;
        let sheet = version.property_sheet().ok_or_else(|| {
            PublisherError::UnexpectedResponse(format!(
                "Did not find the property sheet of component version {}",
                version_id
            ))
        })?;

        let sheet_ref = format!("{}.{}", sheet.path, sheet.version);
        let url = self.url(&["property", "propSheet", &sheet_ref, "allPropValues"], &[])?;

        let mut merged: BTreeMap<String, String> =
            self.get(&url, "reading the version properties").await?;
        merged.extend(values.iter().map(|(k, v)| (k.clone(), v.clone())));

        let mut headers = HeaderMap::new();
        headers.insert(
            "version",
            HeaderValue::from_str(&sheet.version.to_string())
                .map_err(|e| PublisherError::Internal(e.to_string()))?,
        );
        self.put_with_headers(&url, Some(&merged), headers).await?;
        Ok(())
    }
}
