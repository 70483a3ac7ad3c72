//! Verification documents: did the server see a request, how often, and in
//! what order.
//!
//! Two wire encodings exist for counts. [`CountEncoding`] selects one per
//! protocol revision and every verification built by a client uses it.

use crate::client::{endpoint, ControlPlaneClient, Payload};
use crate::error::Result;
use crate::matcher::RequestMatcher;
use crate::transport::Transport;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Wire shape of a verification count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountEncoding {
    /// `{count, exact}`
    Legacy,
    /// `{atLeast, atMost}`
    Threshold,
}

/// How many matching requests the server must have observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VerificationTimes {
    /// Exactly `count` when `exact`, otherwise at least `count`.
    Legacy { count: u32, exact: bool },
    /// Between the bounds; no upper bound when `at_most` is absent.
    #[serde(rename_all = "camelCase")]
    Threshold {
        at_least: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        at_most: Option<u32>,
    },
}

impl VerificationTimes {
    pub fn new(encoding: CountEncoding, count: u32, exact: bool) -> Self {
        match encoding {
            CountEncoding::Legacy => VerificationTimes::Legacy { count, exact },
            CountEncoding::Threshold => VerificationTimes::Threshold {
                at_least: count,
                at_most: exact.then_some(count),
            },
        }
    }

}

/// Verification document sent to `/verify`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    pub http_request: RequestMatcher,
    pub times: VerificationTimes,
}

impl Verification {
    pub fn new(request: RequestMatcher, encoding: CountEncoding, count: u32, exact: bool) -> Self {
        Self {
            http_request: request,
            times: VerificationTimes::new(encoding, count, exact),
        }
    }
}

/// Ordered-sequence document sent to `/verifySequence`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationSequence {
    pub http_requests: Vec<RequestMatcher>,
}

impl VerificationSequence {
    pub fn new(requests: impl IntoIterator<Item = RequestMatcher>) -> Self {
        Self {
            http_requests: requests.into_iter().collect(),
        }
    }
}

impl<T: Transport> ControlPlaneClient<T> {
    /// Assert the server saw `count` requests matching `request`: exactly
    /// when `exact`, at least otherwise.
    ///
    /// A mismatch comes back from the server as [`crate::Error::Rejected`].
    pub async fn verify(&self, request: RequestMatcher, count: u32, exact: bool) -> Result<()> {
        let verification =
            Verification::new(request, self.protocol().count_encoding, count, exact);
        self.send(endpoint::VERIFY, Some(Payload::document(&verification)?)).await?;
        info!(
            method = %verification.http_request.method,
            path = %verification.http_request.path,
            count,
            exact,
            "Verification passed"
        );
        Ok(())
    }

    /// Submit a caller-assembled verification document unchanged.
    pub async fn verify_raw(&self, document: impl Into<Payload>) -> Result<()> {
        self.send(endpoint::VERIFY, Some(document.into())).await?;
        Ok(())
    }

    /// Assert the server saw requests matching `requests` in this relative
    /// order. Other requests may appear in between.
    pub async fn verify_sequence(
        &self,
        requests: impl IntoIterator<Item = RequestMatcher>,
    ) -> Result<()> {
        let sequence = VerificationSequence::new(requests);
        self.send(endpoint::VERIFY_SEQUENCE, Some(Payload::document(&sequence)?)).await?;
        info!(
            length = sequence.http_requests.len(),
            "Sequence verification passed"
        );
        Ok(())
    }
}
