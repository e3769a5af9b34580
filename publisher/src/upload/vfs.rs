//! Artifact transfer into the server's versioned file store

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info, warn};
use ucd_models::{ChangeSet, ChangeSetEntry};

use crate::errors::PublisherError;
use crate::http::client::HttpClient;
use crate::upload::fileset::{FileEntry, FileSelection};

const REPOSITORY_PROPERTY: &str = "code_station/repository";

/// Result of an upload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadSummary {
    pub files: usize,
    pub bytes: u64,
    pub change_set: Option<String>,
}

/// Transfers a selected file tree into a component version
#[async_trait]
pub trait ArtifactUploader: Send + Sync {
    async fn upload(
        &self,
        component: &str,
        version: &str,
        work_dir: &Path,
        selection: &FileSelection,
    ) -> Result<UploadSummary, PublisherError>;
}

/// Uploader speaking the staged VFS protocol: stage files, commit a change
/// set with a content manifest, then label it with the version name
pub struct VfsUploader<'a> {
    client: &'a HttpClient,
}

impl<'a> VfsUploader<'a> {
    pub fn new(client: &'a HttpClient) -> Self {
        Self { client }
    }

    async fn repository_id(&self, component: &str) -> Result<String, PublisherError> {
        let found = self.client.fetch_component(component).await?.ok_or_else(|| {
            PublisherError::Validation(format!("Component '{}' does not exist", component))
        })?;
        found
            .property(REPOSITORY_PROPERTY)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                PublisherError::UnexpectedResponse(format!(
                    "Component '{}' has no '{}' property",
                    component, REPOSITORY_PROPERTY
                ))
            })
    }

    async fn create_staging_directory(&self) -> Result<String, PublisherError> {
        let url = self.client.url(&["vfs", "stagingDirectory"], &[])?;
        let id = self.client.post::<()>(&url, None).await?.trim().to_string();
        if id.is_empty() {
            return Err(PublisherError::UnexpectedResponse(
                "Empty staging directory id".to_string(),
            ));
        }
        Ok(id)
    }

    async fn delete_staging_directory(&self, stage_id: &str) -> Result<(), PublisherError> {
        let url = self.client.url(&["vfs", "stagingDirectory", stage_id], &[])?;
        self.client.delete(&url).await
    }

    async fn stage_and_commit(
        &self,
        stage_id: &str,
        repository: &str,
        version: &str,
        entries: &[FileEntry],
    ) -> Result<String, PublisherError> {
        for entry in entries.iter().filter(|e| e.symlink.is_none()) {
            debug!("Adding {} to staging directory", entry.path);
            let bytes = tokio::fs::read(&entry.absolute_path).await?;
            let url = self.client.url(
                &["vfs", "stagingDirectory", stage_id, "file"],
                &[("path", entry.path.as_str())],
            )?;
            self.client.put_bytes(&url, bytes).await?;
        }

        let change_set = ChangeSet {
            user: self.client.user().to_string(),
            comment: "Uploaded by ucdpub".to_string(),
            entries: entries
                .iter()
                .map(|e| ChangeSetEntry {
                    path: e.path.clone(),
                    sha256: e.sha256.clone(),
                    size: e.size,
                    executable: e.executable,
                    symlink: e.symlink.clone(),
                })
                .collect(),
        };

        let url = self.client.url(
            &["vfs", "repository", repository, "changeSet"],
            &[("stagingDirectory", stage_id)],
        )?;
        let change_set_id = self.client.post(&url, Some(&change_set)).await?.trim().to_string();
        info!("Created change set {}", change_set_id);

        let comment = format!("Associated with version {}", version);
        let url = self.client.url(
            &["vfs", "repository", repository, "changeSet", &change_set_id, "label"],
            &[
                ("name", version),
                ("user", self.client.user()),
                ("comment", comment.as_str()),
            ],
        )?;
        self.client.put::<()>(&url, None).await?;
        info!("Labeled change set {} with '{}'", change_set_id, version);

        Ok(change_set_id)
    }
}

#[async_trait]
impl ArtifactUploader for VfsUploader<'_> {
    async fn upload(
        &self,
        component: &str,
        version: &str,
        work_dir: &Path,
        selection: &FileSelection,
    ) -> Result<UploadSummary, PublisherError> {
        let entries = scan_blocking(work_dir.to_path_buf(), selection.clone()).await?;
        if entries.is_empty() {
            info!("Did not find any files to upload in {}", work_dir.display());
            return Ok(UploadSummary::default());
        }

        let repository = self.repository_id(component).await?;
        let stage_id = self.create_staging_directory().await?;
        debug!("Created staging directory {}", stage_id);

        match self
            .stage_and_commit(&stage_id, &repository, version, &entries)
            .await
        {
            Ok(change_set) => Ok(UploadSummary {
                files: entries.len(),
                bytes: entries.iter().map(|e| e.size).sum(),
                change_set: Some(change_set),
            }),
            Err(e) => {
                if let Err(cleanup) = self.delete_staging_directory(&stage_id).await {
                    warn!("Failed to delete staging directory {}: {}", stage_id, cleanup);
                }
                Err(e)
            }
        }
    }
}

/// Scan a tree off the async runtime
pub async fn scan_blocking(
    work_dir: PathBuf,
    selection: FileSelection,
) -> Result<Vec<FileEntry>, PublisherError> {
    tokio::task::spawn_blocking(move || selection.scan(&work_dir))
        .await
        .map_err(|e| PublisherError::Internal(format!("File scan task failed: {}", e)))?
}
