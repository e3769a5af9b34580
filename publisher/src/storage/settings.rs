//! Settings file management

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;
use tracing::debug;

use crate::deploy::poller::PollOptions;
use crate::errors::PublisherError;
use crate::logs::LogLevel;

/// Publisher settings, loaded once per process and passed down explicitly
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Directory for a rolling log file
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Emit JSON logs
    #[serde(default)]
    pub json_logs: bool,

    /// Configured deployment servers
    #[serde(default)]
    pub sites: Vec<SiteSettings>,

    /// Profile used when none is requested
    #[serde(default)]
    pub default_site: Option<String>,

    /// Deployment status polling
    #[serde(default)]
    pub poll: PollSettings,

    /// HTTP client tuning
    #[serde(default)]
    pub http: HttpSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_dir: None,
            json_logs: false,
            sites: Vec::new(),
            default_site: None,
            poll: PollSettings::default(),
            http: HttpSettings::default(),
        }
    }
}

impl Settings {
    /// Read and validate a settings file
    pub async fn load(path: &Path) -> Result<Self, PublisherError> {
        debug!("Loading settings from {}", path.display());
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            PublisherError::Config(format!(
                "Unable to read settings file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&contents)
    }

    /// Parse and validate settings from a JSON document
    pub fn from_json(contents: &str) -> Result<Self, PublisherError> {
        let settings: Settings = serde_json::from_str(contents)
            .map_err(|e| PublisherError::json("reading settings", e))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check profile names are unique and URLs usable
    pub fn validate(&self) -> Result<(), PublisherError> {
        let mut seen = HashSet::new();
        for site in &self.sites {
            if site.profile_name.trim().is_empty() {
                return Err(PublisherError::Config(
                    "Site profile name must not be empty".to_string(),
                ));
            }
            if !seen.insert(site.profile_name.as_str()) {
                return Err(PublisherError::Config(format!(
                    "Duplicate site profile '{}'",
                    site.profile_name
                )));
            }
            site.base_url()?;
        }

        if let Some(default) = &self.default_site {
            if !seen.contains(default.as_str()) {
                return Err(PublisherError::Config(format!(
                    "Default site '{}' is not configured",
                    default
                )));
            }
        }

        if self.poll.interval_secs == 0 {
            return Err(PublisherError::Config(
                "poll.interval_secs must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Resolve a site by profile name, falling back to the default, then the first site
    pub fn site(&self, name: Option<&str>) -> Result<&SiteSettings, PublisherError> {
        let wanted = name.or(self.default_site.as_deref());
        match wanted {
            Some(wanted) => self
                .sites
                .iter()
                .find(|s| s.profile_name == wanted)
                .ok_or_else(|| {
                    PublisherError::Config(format!("No site profile named '{}'", wanted))
                }),
            None => self.sites.first().ok_or_else(|| {
                PublisherError::Config("No UrbanCode Deploy site is configured".to_string())
            }),
        }
    }
}

/// Connection profile for one deployment server
#[derive(Debug, Deserialize)]
pub struct SiteSettings {
    /// Profile name used to select the site
    pub profile_name: String,

    /// Server base URL
    pub url: String,

    /// User name
    pub user: String,

    /// Password; prefer `password_env` outside of local testing
    #[serde(default)]
    pub password: Option<SecretString>,

    /// Environment variable holding the password
    #[serde(default)]
    pub password_env: Option<String>,

    /// Accept any server certificate
    #[serde(default)]
    pub trust_all_certs: bool,
}

impl SiteSettings {
    /// Parsed base URL, with http(s) scheme enforced
    pub fn base_url(&self) -> Result<url::Url, PublisherError> {
        let url = url::Url::parse(self.url.trim()).map_err(|e| {
            PublisherError::Config(format!("URL {} is malformed: {}", self.url, e))
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(PublisherError::Config(format!(
                "URL {} uses unsupported scheme '{}'",
                self.url, other
            ))),
        }
    }

    /// Resolve the password to plaintext-at-use form
    pub fn resolve_password(&self) -> Result<SecretString, PublisherError> {
        if let Some(var) = &self.password_env {
            return std::env::var(var).map(SecretString::from).map_err(|_| {
                PublisherError::Config(format!(
                    "Password variable '{}' for site '{}' is not set",
                    var, self.profile_name
                ))
            });
        }
        match &self.password {
            Some(password) => {
                use secrecy::ExposeSecret;
                Ok(SecretString::from(password.expose_secret().to_string()))
            }
            None => Err(PublisherError::Config(format!(
                "Site '{}' has neither password nor password_env",
                self.profile_name
            ))),
        }
    }
}

/// Deployment status polling settings
#[derive(Debug, Clone, Deserialize)]
pub struct PollSettings {
    /// Seconds between status checks
    #[serde(default = "default_poll_interval")]
    pub interval_secs: u64,

    /// Give up after this many seconds; unbounded when absent
    #[serde(default)]
    pub max_wait_secs: Option<u64>,

    /// Give up after this many status checks; unbounded when absent
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

fn default_poll_interval() -> u64 {
    3
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval_secs: default_poll_interval(),
            max_wait_secs: None,
            max_attempts: None,
        }
    }
}

impl PollSettings {
    pub fn to_options(&self) -> PollOptions {
        PollOptions {
            interval: Duration::from_secs(self.interval_secs),
            max_wait: self.max_wait_secs.map(Duration::from_secs),
            max_attempts: self.max_attempts,
        }
    }
}

/// HTTP client settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HttpSettings {
    /// Per-request timeout; the client default applies when absent
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}
