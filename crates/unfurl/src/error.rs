//! Error types for Unfurl

use thiserror::Error;

/// Errors that can occur while resolving a link into embeds
///
/// Failures are isolated per originating URL: the registry logs the
/// error and drops that URL's output without affecting siblings.
#[derive(Debug, Error)]
pub enum UnfurlError {
    /// Failed to build the HTTP client
    #[error("Failed to create HTTP client")]
    ClientBuildError(#[source] reqwest::Error),

    /// Transport-level request failure
    #[error("Request failed: {0}")]
    RequestError(String),

    /// The provider reported the content as missing
    #[error("Content not found: {url}")]
    NotFound { url: String },

    /// Non-success status from the remote provider
    #[error("Provider request failed: HTTP {status} {url}")]
    ProviderStatus { status: u16, url: String },

    /// The provider response could not be decoded
    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    /// The work is flagged as age-restricted and is never embedded
    #[error("Restricted content: {id}")]
    RestrictedContent { id: u64 },

    /// An image-size probe failed; this aborts the whole resolution
    #[error("Size probe failed: {reason} {url}")]
    SizeProbeFailed { url: String, reason: String },

    /// The retrying fetch utility exhausted its attempt budget
    #[error("Request failed after {attempts} attempts: {}", errors.join("; "))]
    RetriesExhausted { attempts: usize, errors: Vec<String> },

    /// A provider was handed a reference it did not produce
    #[error("Provider error: {0}")]
    ProviderError(String),
}

impl UnfurlError {
    /// Map a non-success HTTP status to the matching error variant
    pub fn from_status(status: u16, url: impl Into<String>) -> Self {
        let url = url.into();
        if status == 404 {
            UnfurlError::NotFound { url }
        } else {
            UnfurlError::ProviderStatus { status, url }
        }
    }
}
