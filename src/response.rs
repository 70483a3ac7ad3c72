//! Response documents returned by the mock server when an expectation matches.

use crate::error::{Error, Result};
use crate::matcher::{is_empty_body, BodyKind};
use serde::{Deserialize, Serialize};

/// A response header with its values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub values: Vec<String>,
}

impl Header {
    /// Build a header from a comma-separated value string.
    pub fn from_csv(name: impl Into<String>, value: &str) -> Self {
        Self {
            name: name.into(),
            values: value.split(',').map(String::from).collect(),
        }
    }
}

/// Response document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseDefinition {
    /// HTTP status code
    pub status_code: u16,

    /// Headers in insertion order; names may repeat
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Vec<Header>>,

    /// Serialized JSON body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// Builder for [`ResponseDefinition`].
#[derive(Debug, Clone)]
pub struct ResponseBuilder {
    status_code: u16,
    headers: Vec<Header>,
    body_kind: BodyKind,
    body: Option<serde_json::Value>,
}

impl ResponseBuilder {
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code,
            headers: Vec::new(),
            body_kind: BodyKind::Json,
            body: None,
        }
    }

    /// Start from a textual status code, as supplied by test tables.
    pub fn from_status_str(status_code: &str) -> Result<Self> {
        match status_code.trim().parse::<u16>() {
            Ok(status) if (100..=599).contains(&status) => Ok(Self::new(status)),
            _ => Err(Error::InvalidStatusCode(status_code.to_string())),
        }
    }

    /// Add a header. The value is split on `,` into separate values.
    pub fn header(mut self, name: impl Into<String>, value: &str) -> Self {
        self.headers.push(Header::from_csv(name, value));
        self
    }

    /// Add headers in iteration order.
    pub fn headers<I, K, V>(self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        headers
            .into_iter()
            .fold(self, |builder, (name, value)| builder.header(name, value.as_ref()))
    }

    /// Set the body and its kind. Only JSON bodies are emitted.
    pub fn body(mut self, kind: BodyKind, body: serde_json::Value) -> Self {
        self.body_kind = kind;
        self.body = Some(body);
        self
    }

    pub fn json_body(self, body: serde_json::Value) -> Self {
        self.body(BodyKind::Json, body)
    }

    pub fn build(self) -> ResponseDefinition {
        let body = match (self.body_kind, self.body) {
            (BodyKind::Json, Some(body)) if !is_empty_body(&body) => Some(body.to_string()),
            _ => None,
        };

        ResponseDefinition {
            status_code: self.status_code,
            headers: (!self.headers.is_empty()).then_some(self.headers),
            body,
        }
    }
}
