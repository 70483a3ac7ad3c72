//! Errors raised while building documents or talking to the control plane.

use std::time::Duration;
use thiserror::Error;

/// Boxed source error from a transport implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur when building or submitting control-plane documents.
#[derive(Error, Debug)]
pub enum Error {
    /// A status code that is not an integer in the HTTP range (100 to 599).
    #[error("invalid status code: {0:?}")]
    InvalidStatusCode(String),

    /// A document could not be serialized to JSON.
    #[error("failed to serialize document: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] BoxError),

    /// Connection or protocol error below HTTP status level.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: BoxError,
    },

    /// The per-call deadline expired.
    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    /// The mock server answered with a status >= 400.
    #[error("mock server failed with {status}: {body}")]
    Rejected { status: u16, body: String },

    /// A retrieve response was not valid JSON.
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    /// Status code of a control-plane rejection, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the mock server itself refused the call (as opposed to the
    /// call never reaching it). Failed verifications surface this way.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Error::Rejected { .. })
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
