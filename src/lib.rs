//! MockServer control-plane client
//!
//! Programs a running mock server with expectations and asks it whether
//! requests were, or were not, received.
//!
//! # Features
//!
//! - **Request Matchers**: Method, path and JSON or JSON-schema body criteria
//! - **Responses**: Status, ordered multi-value headers, JSON body
//! - **Forwarding**: Redirect matched requests to another path after a delay
//! - **Repetition**: Expectations that fire a fixed number of times or forever
//! - **Verification**: Exact or at-least counts, and ordered sequences
//! - **Scenarios**: Load expectations and verifications from YAML
//!
//! # Example
//!
//! ```no_run
//! use mockserver_control::{
//!     ClientConfig, ControlPlaneClient, MatcherBuilder, Protocol, ResponseBuilder,
//! };
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), mockserver_control::Error> {
//! let config = ClientConfig::new("http://localhost:1080", Protocol::threshold());
//! let client = ControlPlaneClient::new(&config)?;
//!
//! let request = MatcherBuilder::new("GET", "/hello").build();
//! let response = ResponseBuilder::new(200)
//!     .header("Content-Type", "application/json")
//!     .json_body(json!({"message": "Hello, World!"}))
//!     .build();
//! client.expect_response(request.clone(), response, 1, true).await?;
//!
//! // ... exercise the system under test ...
//!
//! client.verify(request, 1, true).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod expectation;
pub mod forward;
pub mod matcher;
pub mod response;
pub mod scenario;
pub mod transport;
pub mod verification;

pub use client::{ControlPlaneClient, Payload};
pub use config::{Capability, ClientConfig, ExpectationQuery, Protocol};
pub use error::{Error, Result};
pub use expectation::{Action, Expectation, Times};
pub use forward::{ForwardAction, ForwardBuilder, TimeUnit};
pub use matcher::{BodyKind, BodyMatcher, MatchType, MatcherBuilder, RequestMatcher};
pub use response::{Header, ResponseBuilder, ResponseDefinition};
pub use scenario::{Scenario, ScenarioReport};
pub use transport::{HttpTransport, RawResponse, Transport};
pub use verification::{CountEncoding, Verification, VerificationSequence, VerificationTimes};
