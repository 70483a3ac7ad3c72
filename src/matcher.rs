//! Request matcher documents.
//!
//! A [`RequestMatcher`] selects the requests an expectation answers or a
//! verification counts: method, path and an optional body predicate.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Kind of body criterion supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BodyKind {
    /// JSON document, matched strictly or by fields.
    #[default]
    Json,
    /// JSON schema the body must validate against.
    JsonSchema,
    /// Any other kind. Never produces a body matcher.
    Other(String),
}

impl FromStr for BodyKind {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "JSON" => BodyKind::Json,
            "JSON_SCHEMA" => BodyKind::JsonSchema,
            other => BodyKind::Other(other.to_string()),
        })
    }
}

impl From<String> for BodyKind {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(kind) => kind,
            Err(never) => match never {},
        }
    }
}

impl From<BodyKind> for String {
    fn from(kind: BodyKind) -> Self {
        kind.to_string()
    }
}

impl fmt::Display for BodyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BodyKind::Json => f.write_str("JSON"),
            BodyKind::JsonSchema => f.write_str("JSON_SCHEMA"),
            BodyKind::Other(kind) => f.write_str(kind),
        }
    }
}

/// How a JSON body criterion is compared against the request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchType {
    /// Full equality.
    #[serde(rename = "STRICT")]
    Strict,
    /// Only the fields present in the criterion must match.
    #[serde(rename = "ONLY_MATCHING_FIELDS")]
    Partial,
}

impl MatchType {
    fn from_exact(exact: bool) -> Self {
        if exact {
            MatchType::Strict
        } else {
            MatchType::Partial
        }
    }
}

/// Body predicate of a request matcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BodyMatcher {
    /// Serialized JSON compared with the given match type.
    Json {
        json: String,
        #[serde(rename = "matchType")]
        match_type: MatchType,
    },
    /// Serialized JSON schema.
    JsonSchema {
        #[serde(rename = "jsonSchema")]
        json_schema: String,
    },
}

/// Request-matching document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestMatcher {
    /// HTTP verb
    pub method: String,
    /// Literal path or pattern; empty matches the base
    pub path: String,
    /// Body predicate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<BodyMatcher>,
}

impl RequestMatcher {
    /// Shorthand for a matcher without a body predicate.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        MatcherBuilder::new(method, path).build()
    }
}

/// Builder for [`RequestMatcher`].
///
/// Defaults follow the common case: JSON body kind, strict matching.
#[derive(Debug, Clone)]
pub struct MatcherBuilder {
    method: String,
    path: String,
    body_kind: BodyKind,
    body: Option<serde_json::Value>,
    exact: bool,
}

impl MatcherBuilder {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            body_kind: BodyKind::Json,
            body: None,
            exact: true,
        }
    }

    /// Set the body criterion and its kind.
    pub fn body(mut self, kind: BodyKind, body: serde_json::Value) -> Self {
        self.body_kind = kind;
        self.body = Some(body);
        self
    }

    /// Set a JSON body criterion.
    pub fn json_body(self, body: serde_json::Value) -> Self {
        self.body(BodyKind::Json, body)
    }

    /// Set a JSON schema body criterion.
    pub fn schema_body(self, schema: serde_json::Value) -> Self {
        self.body(BodyKind::JsonSchema, schema)
    }

    /// Strict (`true`) or only-matching-fields (`false`) JSON comparison.
    pub fn exact(mut self, exact: bool) -> Self {
        self.exact = exact;
        self
    }

    pub fn build(self) -> RequestMatcher {
        let body = match self.body.filter(|b| !is_empty_body(b)) {
            None => None,
            Some(body) => match self.body_kind {
                BodyKind::Json => Some(BodyMatcher::Json {
                    json: body.to_string(),
                    match_type: MatchType::from_exact(self.exact),
                }),
                BodyKind::JsonSchema => Some(BodyMatcher::JsonSchema {
                    json_schema: body.to_string(),
                }),
                BodyKind::Other(_) => None,
            },
        };

        RequestMatcher {
            method: self.method,
            path: self.path,
            body,
        }
    }
}

/// Null, `{}`, `[]` and `""` carry no criterion.
pub(crate) fn is_empty_body(body: &serde_json::Value) -> bool {
    match body {
        serde_json::Value::Null => true,
        serde_json::Value::Object(map) => map.is_empty(),
        serde_json::Value::Array(items) => items.is_empty(),
        serde_json::Value::String(s) => s.is_empty(),
        _ => false,
    }
}
