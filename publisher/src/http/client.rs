//! HTTP client implementation

use std::time::Duration;

use reqwest::{header::HeaderMap, Client, Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};
use url::Url;

use crate::errors::PublisherError;

/// Client construction options
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    /// Accept any server certificate
    pub trust_all_certs: bool,

    /// Per-request timeout; reqwest's default when absent
    pub timeout: Option<Duration>,
}

/// Authenticated HTTP client for one deployment server
pub struct HttpClient {
    client: Client,
    base_url: Url,
    user: String,
    password: SecretString,
}

impl HttpClient {
    /// Create a new HTTP client using preemptive Basic authentication
    pub fn new(
        base_url: Url,
        user: impl Into<String>,
        password: SecretString,
        options: &ClientOptions,
    ) -> Result<Self, PublisherError> {
        let mut builder = Client::builder().danger_accept_invalid_certs(options.trust_all_certs);
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
            user: user.into(),
            password,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Get the authenticated user name
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Build a URL below the base URL. Every segment is percent-encoded as a
    /// single path segment, so `/` inside a segment becomes `%2F`.
    pub fn url(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url, PublisherError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                PublisherError::Config(format!("URL {} cannot be a base", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: &Url) -> RequestBuilder {
        self.client
            .request(method, url.clone())
            .basic_auth(&self.user, Some(self.password.expose_secret()))
    }

    /// Send a request and return the response body, classifying failures
    async fn execute(
        &self,
        method: Method,
        url: &Url,
        builder: RequestBuilder,
    ) -> Result<String, PublisherError> {
        debug!("{} {}", method, url);
        let response = builder.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            error!("HTTP {} {} rejected credentials", method, url);
            return Err(PublisherError::Credentials {
                uri: url.to_string(),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("HTTP {} failed: {} - {}", method, status, body);
            return Err(PublisherError::Http {
                status: status.as_u16(),
                uri: url.to_string(),
                body,
            });
        }

        Ok(response.text().await?)
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, url: &Url, context: &str) -> Result<T, PublisherError> {
        let body = self
            .execute(Method::GET, url, self.request(Method::GET, url))
            .await?;
        parse_json(&body, context)
    }

    /// Make a POST request with an optional JSON body, returning the raw response body
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        url: &Url,
        body: Option<&B>,
    ) -> Result<String, PublisherError> {
        let mut request = self.request(Method::POST, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        self.execute(Method::POST, url, request).await
    }

    /// Make a PUT request with an optional JSON body, returning the raw response body
    pub async fn put<B: Serialize + ?Sized>(
        &self,
        url: &Url,
        body: Option<&B>,
    ) -> Result<String, PublisherError> {
        self.put_with_headers(url, body, HeaderMap::new()).await
    }

    /// Make a PUT request carrying extra headers
    pub async fn put_with_headers<B: Serialize + ?Sized>(
        &self,
        url: &Url,
        body: Option<&B>,
        headers: HeaderMap,
    ) -> Result<String, PublisherError> {
        let mut request = self.request(Method::PUT, url).headers(headers);
        if let Some(body) = body {
            request = request.json(body);
        }
        self.execute(Method::PUT, url, request).await
    }

    /// Make a PUT request with a raw byte body
    pub async fn put_bytes(&self, url: &Url, bytes: Vec<u8>) -> Result<String, PublisherError> {
        let request = self
            .request(Method::PUT, url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(bytes);
        self.execute(Method::PUT, url, request).await
    }

    /// Make a DELETE request
    pub async fn delete(&self, url: &Url) -> Result<(), PublisherError> {
        self.execute(Method::DELETE, url, self.request(Method::DELETE, url))
            .await?;
        Ok(())
    }

    /// Check the server is reachable and accepts the credentials
    pub async fn verify_connection(&self) -> Result<(), PublisherError> {
        let url = self.url(&["rest", "state"], &[])?;
        self.execute(Method::GET, &url, self.request(Method::GET, &url))
            .await?;
        Ok(())
    }
}

/// Parse a JSON body, naming the operation on failure
pub fn parse_json<T: DeserializeOwned>(body: &str, context: &str) -> Result<T, PublisherError> {
    serde_json::from_str(body).map_err(|e| PublisherError::json(context, e))
}

/// Whether an HTTP error means the entity does not exist
pub fn is_not_found(err: &PublisherError) -> bool {
    matches!(err, PublisherError::Http { status: 400 | 404, .. })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> HttpClient {
        HttpClient::new(
            Url::parse(base).unwrap(),
            "admin",
            SecretString::from("secret"),
            &ClientOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_url_encodes_segments() {
        let client = client("https://ucd.example.com:8443/");
        let url = client
            .url(
                &["property", "propSheetDef", "components/abc/versionPropSheetDef.-1", "propDefs"],
                &[],
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://ucd.example.com:8443/property/propSheetDef/components%2Fabc%2FversionPropSheetDef.-1/propDefs"
        );
    }

    #[test]
    fn test_url_keeps_base_path_and_query() {
        let client = client("https://example.com/ucd");
        let url = client
            .url(
                &["cli", "version", "createVersion"],
                &[("component", "web app"), ("name", "1.0&2")],
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.com/ucd/cli/version/createVersion?component=web+app&name=1.0%262"
        );
    }

    #[test]
    fn test_not_found_classification() {
        let missing = PublisherError::Http {
            status: 404,
            uri: "u".to_string(),
            body: String::new(),
        };
        let broken = PublisherError::Http {
            status: 500,
            uri: "u".to_string(),
            body: String::new(),
        };
        assert!(is_not_found(&missing));
        assert!(!is_not_found(&broken));
    }
}
