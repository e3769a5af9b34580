//! Runtime handle for a configured deployment server

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tokio::sync::OnceCell;
use tracing::debug;
use url::Url;

use crate::errors::PublisherError;
use crate::http::client::{ClientOptions, HttpClient};
use crate::storage::settings::{HttpSettings, SiteSettings};

/// A site profile with its lazily created, reused HTTP client
pub struct Site {
    profile_name: String,
    base_url: Url,
    user: String,
    password: SecretString,
    options: ClientOptions,
    client: OnceCell<HttpClient>,
}

impl Site {
    /// Resolve a site profile; the password is read here, once
    pub fn from_settings(site: &SiteSettings, http: &HttpSettings) -> Result<Self, PublisherError> {
        Ok(Self {
            profile_name: site.profile_name.clone(),
            base_url: site.base_url()?,
            user: site.user.clone(),
            password: site.resolve_password()?,
            options: ClientOptions {
                trust_all_certs: site.trust_all_certs,
                timeout: http.request_timeout_secs.map(Duration::from_secs),
            },
            client: OnceCell::new(),
        })
    }

    pub fn profile_name(&self) -> &str {
        &self.profile_name
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The site's HTTP client, created on first use
    pub async fn client(&self) -> Result<&HttpClient, PublisherError> {
        self.client
            .get_or_try_init(|| async {
                debug!(
                    "Creating HTTP client for site '{}' ({})",
                    self.profile_name, self.base_url
                );
                HttpClient::new(
                    self.base_url.clone(),
                    self.user.clone(),
                    SecretString::from(self.password.expose_secret().to_string()),
                    &self.options,
                )
            })
            .await
    }
}
