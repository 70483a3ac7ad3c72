//! Expectation documents and their registration.
//!
//! An expectation binds a request matcher to exactly one action, either a
//! canned response or a forward, plus a repetition policy.

use crate::client::{endpoint, ControlPlaneClient, Payload};
use crate::error::Result;
use crate::forward::ForwardAction;
use crate::matcher::{BodyKind, MatcherBuilder, RequestMatcher};
use crate::response::{ResponseBuilder, ResponseDefinition};
use crate::transport::Transport;
use serde::{Deserialize, Serialize};
use tracing::info;

/// How often an expectation fires before it expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Times {
    /// Remaining matches; ignored by the server when `unlimited` is set
    pub remaining_times: u32,
    pub unlimited: bool,
}

impl Times {
    pub fn new(remaining_times: u32, unlimited: bool) -> Self {
        Self {
            remaining_times,
            unlimited,
        }
    }

    /// Fire on every matching request.
    pub fn unlimited() -> Self {
        Self::new(1, true)
    }

    /// Fire `count` times, then expire.
    pub fn exactly(count: u32) -> Self {
        Self::new(count, false)
    }
}

impl Default for Times {
    fn default() -> Self {
        Self::unlimited()
    }
}

/// What the server does with a matched request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    HttpResponse(ResponseDefinition),
    HttpOverrideForwardedRequest(ForwardAction),
}

/// Expectation envelope sent to `/expectation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expectation {
    pub http_request: RequestMatcher,
    #[serde(flatten)]
    pub action: Action,
    pub times: Times,
}

impl Expectation {
    /// Answer matching requests with `response`.
    pub fn respond(request: RequestMatcher, response: ResponseDefinition, times: Times) -> Self {
        Self {
            http_request: request,
            action: Action::HttpResponse(response),
            times,
        }
    }

    /// Forward matching requests according to `forward`.
    pub fn forward(request: RequestMatcher, forward: ForwardAction, times: Times) -> Self {
        Self {
            http_request: request,
            action: Action::HttpOverrideForwardedRequest(forward),
            times,
        }
    }
}

impl<T: Transport> ControlPlaneClient<T> {
    /// Register an assembled expectation.
    pub async fn create_expectation(&self, expectation: &Expectation) -> Result<()> {
        self.send(endpoint::EXPECTATION, Some(Payload::document(expectation)?)).await?;
        info!(
            method = %expectation.http_request.method,
            path = %expectation.http_request.path,
            "Expectation registered"
        );
        Ok(())
    }

    /// Register a response expectation firing `count` times, or forever when
    /// `unlimited` is set.
    pub async fn expect_response(
        &self,
        request: RequestMatcher,
        response: ResponseDefinition,
        count: u32,
        unlimited: bool,
    ) -> Result<()> {
        let expectation = Expectation::respond(request, response, Times::new(count, unlimited));
        self.create_expectation(&expectation).await
    }

    /// Register a forward expectation.
    pub async fn expect_forward(
        &self,
        request: RequestMatcher,
        forward: ForwardAction,
        count: u32,
        unlimited: bool,
    ) -> Result<()> {
        let expectation = Expectation::forward(request, forward, Times::new(count, unlimited));
        self.create_expectation(&expectation).await
    }

    /// Answer any matching traffic forever: partial body matching on the
    /// request side, unlimited repetition.
    pub async fn default_expectation(
        &self,
        method: &str,
        path: &str,
        response: ResponseBuilder,
    ) -> Result<()> {
        let request = MatcherBuilder::new(method, path).exact(false).build();
        self.expect_response(request, response.build(), 1, true).await
    }

    /// Convenience over [`Self::default_expectation`] taking the response
    /// parts directly.
    pub async fn default_expectation_with(
        &self,
        method: &str,
        path: &str,
        status_code: u16,
        headers: &[(&str, &str)],
        body_kind: BodyKind,
        body: Option<serde_json::Value>,
    ) -> Result<()> {
        let mut response = ResponseBuilder::new(status_code).headers(headers.iter().copied());
        if let Some(body) = body {
            response = response.body(body_kind, body);
        }
        self.default_expectation(method, path, response).await
    }

    /// Register a caller-assembled expectation document unchanged.
    pub async fn create_expectation_raw(&self, document: impl Into<Payload>) -> Result<()> {
        self.send(endpoint::EXPECTATION, Some(document.into())).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Protocol;
    use crate::forward::ForwardBuilder;
    use crate::transport::testing::RecordingTransport;
    use serde_json::json;

    fn client() -> ControlPlaneClient<RecordingTransport> {
        ControlPlaneClient::with_transport(
            "http://localhost:1080",
            Protocol::threshold(),
            RecordingTransport::default(),
        )
    }

    #[test]
    fn test_response_expectation_document() {
        let expectation = Expectation::respond(
            RequestMatcher::new("GET", "/api"),
            ResponseBuilder::new(200).build(),
            Times::exactly(2),
        );
        assert_eq!(
            serde_json::to_value(&expectation).unwrap(),
            json!({
                "httpRequest": {"method": "GET", "path": "/api"},
                "httpResponse": {"statusCode": 200},
                "times": {"remainingTimes": 2, "unlimited": false}
            })
        );
    }

    #[test]
    fn test_forward_expectation_document() {
        let expectation = Expectation::forward(
            RequestMatcher::new("POST", "/old"),
            ForwardBuilder::new("/new").build(),
            Times::unlimited(),
        );
        let value = serde_json::to_value(&expectation).unwrap();
        assert!(value.get("httpResponse").is_none());
        assert_eq!(
            value["httpOverrideForwardedRequest"],
            json!({
                "httpRequest": {"path": "/new"},
                "delay": {"timeUnit": "SECONDS", "value": 1}
            })
        );
        assert_eq!(value["times"], json!({"remainingTimes": 1, "unlimited": true}));
    }

    #[tokio::test]
    async fn test_expect_response_submits_envelope() {
        let client = client();
        client
            .expect_response(
                RequestMatcher::new("GET", "/api"),
                ResponseBuilder::new(201).build(),
                3,
                false,
            )
            .await
            .unwrap();

        let call = client.transport().last_call();
        assert_eq!(call.url, "http://localhost:1080/expectation");
        assert_eq!(
            call.json()["times"],
            json!({"remainingTimes": 3, "unlimited": false})
        );
        assert_eq!(call.json()["httpResponse"]["statusCode"], 201);
    }

    #[tokio::test]
    async fn test_expect_forward_submits_envelope() {
        let client = client();
        client
            .expect_forward(
                RequestMatcher::new("GET", "/api"),
                ForwardBuilder::new("/backend").delay(0).build(),
                1,
                true,
            )
            .await
            .unwrap();

        let body = client.transport().last_call().json();
        assert_eq!(
            body["httpOverrideForwardedRequest"]["httpRequest"]["path"],
            "/backend"
        );
        assert_eq!(body["httpOverrideForwardedRequest"]["delay"]["value"], 0);
    }

    #[tokio::test]
    async fn test_default_expectation_is_partial_and_unlimited() {
        let client = client();
        client
            .default_expectation_with(
                "POST",
                "/users",
                200,
                &[("Content-Type", "application/json")],
                BodyKind::Json,
                Some(json!({"id": 1})),
            )
            .await
            .unwrap();

        let body = client.transport().last_call().json();
        assert_eq!(body["httpRequest"], json!({"method": "POST", "path": "/users"}));
        assert_eq!(body["times"]["unlimited"], true);
        assert_eq!(
            body["httpResponse"],
            json!({
                "statusCode": 200,
                "headers": [{"name": "Content-Type", "values": ["application/json"]}],
                "body": "{\"id\":1}"
            })
        );
    }

    #[tokio::test]
    async fn test_raw_expectation_is_sent_unchanged() {
        let client = client();
        let document = json!({
            "httpRequest": {"path": "/raw", "headers": {"X-Trace": ["1"]}},
            "httpResponse": {"statusCode": 418}
        });
        client.create_expectation_raw(document.clone()).await.unwrap();
        assert_eq!(client.transport().last_call().json(), document);
    }

    #[tokio::test]
    async fn test_rejected_expectation_fails() {
        let client = ControlPlaneClient::with_transport(
            "http://localhost:1080",
            Protocol::threshold(),
            RecordingTransport::default().respond_with(400, "incorrect expectation json format"),
        );
        let err = client
            .expect_response(
                RequestMatcher::new("GET", "/api"),
                ResponseBuilder::new(200).build(),
                1,
                true,
            )
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert!(err.to_string().contains("incorrect expectation json format"));
    }
}
