//! Error types for the publisher

use std::time::Duration;

use thiserror::Error;

/// Main error type for the publisher
#[derive(Error, Debug)]
pub enum PublisherError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Error connecting to UrbanCode Deploy: invalid user and/or password (URI: {uri})")]
    Credentials { uri: String },

    #[error("Error connecting to UrbanCode Deploy: {status} using URI: {uri}{}", fmt_body(.body))]
    Http { status: u16, uri: String, body: String },

    #[error("Failed to process JSON while {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Failed to upload files to version '{version_id}': {cause}{}", fmt_cleanup(.cleanup))]
    Upload {
        version_id: String,
        #[source]
        cause: Box<PublisherError>,
        cleanup: Option<String>,
    },

    #[error("Deployment process failed with result {result} (request {request_id})")]
    ProcessFailed { request_id: String, result: String },

    #[error("Gave up waiting for deployment request {request_id} after {waited:?}")]
    PollTimeout { request_id: String, waited: Duration },

    #[error("Waiting for deployment request {request_id} was cancelled")]
    Cancelled { request_id: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

fn fmt_body(body: &str) -> String {
    if body.is_empty() {
        String::new()
    } else {
        format!(" - {}", body)
    }
}

fn fmt_cleanup(cleanup: &Option<String>) -> String {
    match cleanup {
        Some(e) => format!(" (the version could not be deleted either: {})", e),
        None => String::new(),
    }
}

impl PublisherError {
    /// Wrap a serde error with the operation it came from
    pub fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json {
            context: context.into(),
            source,
        }
    }

    /// The error that actually stopped the run; an upload failure is
    /// classified by what broke the upload
    pub fn primary(&self) -> &PublisherError {
        match self {
            Self::Upload { cause, .. } => cause.primary(),
            other => other,
        }
    }

    /// A terminal deployment state the server reported as failed
    pub fn is_process_failure(&self) -> bool {
        matches!(self.primary(), Self::ProcessFailed { .. })
    }

    /// Failed before talking to the server
    pub fn is_configuration(&self) -> bool {
        matches!(self.primary(), Self::Config(_) | Self::Validation(_))
    }

    /// Transport or HTTP-status failure
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self.primary(),
            Self::Credentials { .. } | Self::Http { .. } | Self::Transport(_)
        )
    }
}

impl From<anyhow::Error> for PublisherError {
    fn from(err: anyhow::Error) -> Self {
        PublisherError::Internal(err.to_string())
    }
}
