//! Local artifact tree selection

use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use tracing::debug;
use walkdir::WalkDir;

use crate::errors::PublisherError;
use crate::upload::patterns::PatternSet;
use crate::utils::sha256_hash;

const DEFAULT_INCLUDE: &str = "**/*";

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A file selected for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Path relative to the working directory, `/`-separated
    pub path: String,
    pub absolute_path: PathBuf,
    pub size: u64,
    pub sha256: String,
    pub executable: bool,
    /// Link target when the entry is a symlink; the link is uploaded as a link
    pub symlink: Option<String>,
}

/// Compiled include/exclude globs
#[derive(Debug, Clone)]
pub struct FileSelection {
    includes: Vec<Pattern>,
    excludes: Vec<Pattern>,
}

impl FileSelection {
    /// Compile pattern sets; an empty include set selects everything
    pub fn new(includes: &PatternSet, excludes: &PatternSet) -> Result<Self, PublisherError> {
        let includes = if includes.is_empty() {
            vec![compile(DEFAULT_INCLUDE)?]
        } else {
            includes
                .patterns()
                .iter()
                .map(|p| compile(p))
                .collect::<Result<_, _>>()?
        };
        let excludes = excludes
            .patterns()
            .iter()
            .map(|p| compile(p))
            .collect::<Result<_, _>>()?;

        Ok(Self { includes, excludes })
    }

    /// Whether a relative path is selected
    pub fn matches(&self, path: &str) -> bool {
        self.includes.iter().any(|p| p.matches_with(path, MATCH_OPTIONS))
            && !self.excludes.iter().any(|p| p.matches_with(path, MATCH_OPTIONS))
    }

    /// Walk `root` and collect the selected files, sorted by path
    pub fn scan(&self, root: &Path) -> Result<Vec<FileEntry>, PublisherError> {
        let mut entries = Vec::new();

        for entry in WalkDir::new(root).follow_links(false).min_depth(1) {
            let entry = entry.map_err(|e| {
                PublisherError::Io(std::io::Error::other(format!(
                    "Failed to read {}: {}",
                    root.display(),
                    e
                )))
            })?;

            if entry.file_type().is_dir() {
                continue;
            }

            let relative = relative_path(root, entry.path())?;
            if !self.matches(&relative) {
                continue;
            }

            let metadata = entry.path().symlink_metadata()?;
            let (sha256, symlink) = if entry.path_is_symlink() {
                let target = std::fs::read_link(entry.path())?;
                let target = target.to_string_lossy().replace('\\', "/");
                (sha256_hash(target.as_bytes()), Some(target))
            } else {
                (sha256_hash(&std::fs::read(entry.path())?), None)
            };

            debug!("Selected {}", relative);
            entries.push(FileEntry {
                path: relative,
                absolute_path: entry.path().to_path_buf(),
                size: metadata.len(),
                sha256,
                executable: is_executable(&metadata),
                symlink,
            });
        }

        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }
}

fn compile(pattern: &str) -> Result<Pattern, PublisherError> {
    Pattern::new(pattern)
        .map_err(|e| PublisherError::Config(format!("Invalid file pattern '{}': {}", pattern, e)))
}

fn relative_path(root: &Path, path: &Path) -> Result<String, PublisherError> {
    let relative = path
        .strip_prefix(root)
        .map_err(|e| PublisherError::Internal(e.to_string()))?;
    Ok(relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/"))
}

#[cfg(unix)]
fn is_executable(metadata: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    !metadata.file_type().is_symlink() && metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &std::fs::Metadata) -> bool {
    false
}

/// Resolve the directory files are uploaded from.
///
/// The base directory must exist; a non-blank offset is joined onto it.
pub fn resolve_work_dir(base_dir: &Path, offset: Option<&str>) -> Result<PathBuf, PublisherError> {
    if !base_dir.exists() {
        return Err(PublisherError::Config(format!(
            "Base artifact directory {} does not exist",
            base_dir.display()
        )));
    }

    let work_dir = match offset.map(str::trim).filter(|o| !o.is_empty()) {
        Some(offset) => base_dir.join(offset),
        None => base_dir.to_path_buf(),
    };

    if !work_dir.is_dir() {
        return Err(PublisherError::Config(format!(
            "Artifact directory {} is not a directory",
            work_dir.display()
        )));
    }

    Ok(work_dir)
}
