//! Control-plane client.
//!
//! Owns the base address, the protocol revision and the transport. Every
//! operation is a single PUT; a status >= 400 becomes [`Error::Rejected`].

use crate::config::{ClientConfig, Protocol};
use crate::error::{Error, Result};
use crate::transport::{HttpTransport, RawResponse, Transport};
use serde::Serialize;
use tracing::{debug, warn};

/// Control-plane endpoints.
pub mod endpoint {
    pub const EXPECTATION: &str = "/expectation";
    pub const VERIFY: &str = "/verify";
    pub const VERIFY_SEQUENCE: &str = "/verifySequence";
    pub const RETRIEVE: &str = "/retrieve";
    pub const CLEAR: &str = "/clear";
    pub const RESET: &str = "/reset";
    pub const DUMP_TO_LOG: &str = "/dumpToLog";
}

/// A request body for the control plane.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Document serialized by the client before sending
    Json(serde_json::Value),
    /// Already-serialized document, sent as is
    Serialized(String),
}

impl Payload {
    /// Serialize any document into a payload.
    pub fn document<D: Serialize>(document: &D) -> Result<Self> {
        Ok(Payload::Json(serde_json::to_value(document)?))
    }

    fn into_body(self) -> Result<String> {
        match self {
            Payload::Json(value) => Ok(serde_json::to_string(&value)?),
            Payload::Serialized(text) => Ok(text),
        }
    }
}

impl From<serde_json::Value> for Payload {
    fn from(value: serde_json::Value) -> Self {
        Payload::Json(value)
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Serialized(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Serialized(text.to_string())
    }
}

#[derive(Serialize)]
struct PathQuery<'a> {
    path: &'a str,
}

/// Client for the mock server's control plane.
///
/// Calls are independent and sequential; share one client per test context
/// rather than driving it from several tasks at once.
#[derive(Debug)]
pub struct ControlPlaneClient<T = HttpTransport> {
    base_url: String,
    protocol: Protocol,
    transport: T,
}

impl ControlPlaneClient<HttpTransport> {
    /// Create a client over HTTP with the configured timeout.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(config.timeout())?;
        Ok(Self::with_transport(&config.base_url, config.protocol, transport))
    }
}

impl<T: Transport> ControlPlaneClient<T> {
    /// Create a client over a caller-supplied transport.
    pub fn with_transport(base_url: &str, protocol: Protocol, transport: T) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            protocol,
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// PUT `payload` to `endpoint` and fail on any status >= 400.
    pub async fn send(&self, endpoint: &str, payload: Option<Payload>) -> Result<RawResponse> {
        let body = payload.map(Payload::into_body).transpose()?;
        let url = format!("{}{}", self.base_url, endpoint);

        debug!(url = %url, data = body.as_deref().unwrap_or(""), "Sending control-plane request");
        let response = self.transport.put(&url, body).await?;
        debug!(url = %url, status = response.status, "Control-plane response");

        if response.is_rejection() {
            warn!(
                url = %url,
                status = response.status,
                body = %response.body,
                "Mock server rejected request"
            );
            return Err(Error::Rejected {
                status: response.status,
                body: response.body,
            });
        }

        Ok(response)
    }

    /// List the requests the server has received on `path`.
    pub async fn retrieve_requests(&self, path: &str) -> Result<serde_json::Value> {
        self.retrieve(endpoint::RETRIEVE.to_string(), path).await
    }

    /// List the expectations currently active on `path`.
    pub async fn retrieve_expectations(&self, path: &str) -> Result<serde_json::Value> {
        let endpoint = format!(
            "{}?type={}",
            endpoint::RETRIEVE,
            self.protocol.expectation_query.as_str()
        );
        self.retrieve(endpoint, path).await
    }

    async fn retrieve(&self, endpoint: String, path: &str) -> Result<serde_json::Value> {
        let response = self
            .send(&endpoint, Some(Payload::document(&PathQuery { path })?))
            .await?;

        if response.body.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_str(&response.body).map_err(|source| Error::Decode {
            url: format!("{}{}", self.base_url, endpoint),
            source,
        })
    }

    /// Remove expectations and recorded requests matching `path`.
    pub async fn clear(&self, path: &str) -> Result<()> {
        self.send(endpoint::CLEAR, Some(Payload::document(&PathQuery { path })?)).await?;
        Ok(())
    }

    /// Remove every expectation and recorded request.
    pub async fn reset_all(&self) -> Result<()> {
        self.send(endpoint::RESET, None).await?;
        Ok(())
    }

    /// Ask the server to dump its state to its log.
    ///
    /// A no-op when the protocol marks the capability as disabled.
    pub async fn dump_to_log(&self) -> Result<()> {
        if !self.protocol.dump_to_log.is_enabled() {
            debug!("dumpToLog disabled for this protocol, skipping");
            return Ok(());
        }
        self.send(endpoint::DUMP_TO_LOG, None).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Capability;
    use crate::transport::testing::RecordingTransport;
    use serde_json::json;

    fn client(transport: RecordingTransport) -> ControlPlaneClient<RecordingTransport> {
        ControlPlaneClient::with_transport(
            "http://localhost:1080/",
            Protocol::threshold(),
            transport,
        )
    }

    #[tokio::test]
    async fn test_reset_sends_no_body() {
        let client = client(RecordingTransport::default());
        client.reset_all().await.unwrap();

        let call = client.transport().last_call();
        assert_eq!(call.url, "http://localhost:1080/reset");
        assert_eq!(call.body, None);
    }

    #[tokio::test]
    async fn test_rejection_carries_status_and_text() {
        let client = client(RecordingTransport::default().respond_with(500, "mismatch"));
        let err = client.reset_all().await.unwrap_err();

        assert_eq!(err.status(), Some(500));
        let message = err.to_string();
        assert!(message.contains("500"));
        assert!(message.contains("mismatch"));
    }

    #[tokio::test]
    async fn test_status_below_400_is_success() {
        let accepted = client(RecordingTransport::default().respond_with(399, ""));
        assert!(accepted.reset_all().await.is_ok());

        let rejected = client(RecordingTransport::default().respond_with(400, "bad"));
        assert!(rejected.reset_all().await.is_err());
    }

    #[tokio::test]
    async fn test_serialized_payload_passes_through() {
        let client = client(RecordingTransport::default());
        client
            .send(endpoint::EXPECTATION, Some(Payload::from("{ \"raw\" : 1 }")))
            .await
            .unwrap();
        assert_eq!(
            client.transport().last_call().body.as_deref(),
            Some("{ \"raw\" : 1 }")
        );
    }

    #[tokio::test]
    async fn test_clear_sends_path() {
        let client = client(RecordingTransport::default());
        client.clear("/api/users").await.unwrap();

        let call = client.transport().last_call();
        assert_eq!(call.url, "http://localhost:1080/clear");
        assert_eq!(call.json(), json!({"path": "/api/users"}));
    }

    #[tokio::test]
    async fn test_retrieve_requests_parses_document() {
        let transport =
            RecordingTransport::default().respond_with(200, r#"[{"method":"GET","path":"/a"}]"#);
        let client = client(transport);

        let requests = client.retrieve_requests("/a").await.unwrap();
        assert_eq!(requests, json!([{"method": "GET", "path": "/a"}]));

        let call = client.transport().last_call();
        assert_eq!(call.url, "http://localhost:1080/retrieve");
        assert_eq!(call.json(), json!({"path": "/a"}));
    }

    #[tokio::test]
    async fn test_retrieve_empty_body_is_null() {
        let client = client(RecordingTransport::default());
        assert_eq!(
            client.retrieve_requests("/a").await.unwrap(),
            serde_json::Value::Null
        );
    }

    #[tokio::test]
    async fn test_retrieve_invalid_json_is_decode_error() {
        let client = client(RecordingTransport::default().respond_with(200, "<html>"));
        let err = client.retrieve_requests("/a").await.unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[tokio::test]
    async fn test_retrieve_expectations_uses_protocol_discriminator() {
        let client = client(RecordingTransport::default());
        client.retrieve_expectations("/a").await.unwrap();
        assert_eq!(
            client.transport().last_call().url,
            "http://localhost:1080/retrieve?type=active_expectations"
        );

        let legacy = ControlPlaneClient::with_transport(
            "http://localhost:1080",
            Protocol::legacy(),
            RecordingTransport::default(),
        );
        legacy.retrieve_expectations("/a").await.unwrap();
        assert_eq!(
            legacy.transport().last_call().url,
            "http://localhost:1080/retrieve?type=expectation"
        );
    }

    #[tokio::test]
    async fn test_dump_to_log() {
        let client = client(RecordingTransport::default());
        client.dump_to_log().await.unwrap();
        let call = client.transport().last_call();
        assert_eq!(call.url, "http://localhost:1080/dumpToLog");
        assert_eq!(call.body, None);
    }

    #[tokio::test]
    async fn test_disabled_dump_to_log_is_noop() {
        let client = ControlPlaneClient::with_transport(
            "http://localhost:1080",
            Protocol::threshold().with_dump_to_log(Capability::Disabled),
            RecordingTransport::default().respond_with(500, "should not be called"),
        );
        client.dump_to_log().await.unwrap();
        assert!(client.transport().calls().is_empty());
    }
}
