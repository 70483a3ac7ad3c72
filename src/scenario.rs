//! Scenario files.
//!
//! A scenario lists expectations to register and verifications to run
//! against a mock server, so a test setup can live in YAML:
//!
//! ```yaml
//! expectations:
//!   - request:
//!       method: GET
//!       path: /hello
//!     response:
//!       status: 200
//!       body:
//!         message: "Hello, World!"
//! verifications:
//!   - request:
//!       method: GET
//!       path: /hello
//!     count: 1
//! ```

use crate::client::ControlPlaneClient;
use crate::error::Result as ClientResult;
use crate::expectation::{Expectation, Times};
use crate::forward::{ForwardAction, ForwardBuilder, TimeUnit};
use crate::matcher::{BodyKind, MatcherBuilder, RequestMatcher};
use crate::response::{ResponseBuilder, ResponseDefinition};
use crate::transport::Transport;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// A set of expectations, verifications and sequence checks.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    #[serde(default)]
    pub expectations: Vec<ExpectationDefinition>,

    #[serde(default)]
    pub verifications: Vec<VerificationDefinition>,

    #[serde(default)]
    pub sequences: Vec<SequenceDefinition>,
}

/// Counts of what [`Scenario::apply`] submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScenarioReport {
    pub expectations: usize,
    pub verifications: usize,
    pub sequences: usize,
}

impl Scenario {
    /// Load a scenario from a YAML file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate a scenario from a YAML string.
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        let scenario: Self = serde_yaml::from_str(yaml)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Validate every definition without contacting the server.
    pub fn validate(&self) -> anyhow::Result<()> {
        for (i, expectation) in self.expectations.iter().enumerate() {
            expectation
                .to_expectation()
                .with_context(|| format!("Expectation {}", i))?;
        }
        for (i, verification) in self.verifications.iter().enumerate() {
            verification
                .request
                .validate()
                .with_context(|| format!("Verification {}", i))?;
        }
        for (i, sequence) in self.sequences.iter().enumerate() {
            sequence
                .validate()
                .with_context(|| format!("Sequence {}", i))?;
        }
        Ok(())
    }

    /// Register every expectation in file order, then run verifications and
    /// sequence checks. Stops at the first failure; earlier registrations
    /// stay on the server.
    pub async fn apply<T: Transport>(
        &self,
        client: &ControlPlaneClient<T>,
    ) -> anyhow::Result<ScenarioReport> {
        let mut report = ScenarioReport::default();

        for (i, definition) in self.expectations.iter().enumerate() {
            let expectation = definition
                .to_expectation()
                .with_context(|| format!("Expectation {}", i))?;
            client
                .create_expectation(&expectation)
                .await
                .with_context(|| format!("Expectation {}", i))?;
            report.expectations += 1;
        }

        for (i, definition) in self.verifications.iter().enumerate() {
            definition
                .run(client)
                .await
                .with_context(|| format!("Verification {}", i))?;
            report.verifications += 1;
        }

        for (i, sequence) in self.sequences.iter().enumerate() {
            let label = sequence.name.as_deref().unwrap_or("unnamed");
            client
                .verify_sequence(sequence.requests.iter().map(MatcherDefinition::build))
                .await
                .with_context(|| format!("Sequence {} ({})", i, label))?;
            report.sequences += 1;
        }

        info!(
            expectations = report.expectations,
            verifications = report.verifications,
            sequences = report.sequences,
            "Scenario applied"
        );
        Ok(report)
    }
}

fn default_true() -> bool {
    true
}

fn default_one() -> u32 {
    1
}

fn default_delay() -> u64 {
    1
}

/// Request matcher as written in a scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatcherDefinition {
    pub method: String,

    #[serde(default)]
    pub path: String,

    #[serde(default)]
    pub body_type: BodyKind,

    #[serde(default)]
    pub body: Option<serde_json::Value>,

    /// Strict body matching
    #[serde(default = "default_true")]
    pub exact: bool,
}

impl MatcherDefinition {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.method.is_empty() {
            anyhow::bail!("Request method cannot be empty");
        }
        Ok(())
    }

    pub fn build(&self) -> RequestMatcher {
        let mut builder = MatcherBuilder::new(&self.method, &self.path).exact(self.exact);
        if let Some(body) = &self.body {
            builder = builder.body(self.body_type.clone(), body.clone());
        }
        builder.build()
    }
}

/// Status code written either as a number or as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatusValue {
    Number(u16),
    Text(String),
}

/// Response as written in a scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResponseTemplate {
    pub status: StatusValue,

    /// Headers in order; values are comma-separated
    #[serde(default)]
    pub headers: Vec<HeaderEntry>,

    #[serde(default)]
    pub body_type: BodyKind,

    #[serde(default)]
    pub body: Option<serde_json::Value>,
}

/// One response header line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeaderEntry {
    pub name: String,
    pub value: String,
}

impl ResponseTemplate {
    pub fn build(&self) -> ClientResult<ResponseDefinition> {
        let mut builder = match &self.status {
            StatusValue::Number(status) => ResponseBuilder::new(*status),
            StatusValue::Text(status) => ResponseBuilder::from_status_str(status)?,
        };
        builder = builder.headers(self.headers.iter().map(|h| (h.name.as_str(), &h.value)));
        if let Some(body) = &self.body {
            builder = builder.body(self.body_type.clone(), body.clone());
        }
        Ok(builder.build())
    }
}

/// Forward action as written in a scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForwardTemplate {
    pub path: String,

    #[serde(default = "default_delay")]
    pub delay: u64,

    #[serde(default)]
    pub unit: TimeUnit,
}

impl ForwardTemplate {
    pub fn build(&self) -> ForwardAction {
        ForwardBuilder::new(&self.path)
            .delay(self.delay)
            .unit(self.unit)
            .build()
    }
}

/// Repetition policy as written in a scenario.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimesTemplate {
    #[serde(default = "default_one")]
    pub count: u32,

    #[serde(default = "default_true")]
    pub unlimited: bool,
}

impl Default for TimesTemplate {
    fn default() -> Self {
        Self {
            count: 1,
            unlimited: true,
        }
    }
}

/// An expectation: a request plus exactly one of `response` or `forward`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpectationDefinition {
    pub request: MatcherDefinition,

    #[serde(default)]
    pub response: Option<ResponseTemplate>,

    #[serde(default)]
    pub forward: Option<ForwardTemplate>,

    #[serde(default)]
    pub times: TimesTemplate,
}

impl ExpectationDefinition {
    pub fn to_expectation(&self) -> anyhow::Result<Expectation> {
        self.request.validate()?;
        let request = self.request.build();
        let times = Times::new(self.times.count, self.times.unlimited);

        match (&self.response, &self.forward) {
            (Some(response), None) => Ok(Expectation::respond(request, response.build()?, times)),
            (None, Some(forward)) => Ok(Expectation::forward(request, forward.build(), times)),
            (Some(_), Some(_)) => {
                anyhow::bail!("Expectation cannot have both response and forward")
            }
            (None, None) => anyhow::bail!("Expectation needs a response or a forward"),
        }
    }
}

/// A count check for one request matcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerificationDefinition {
    pub request: MatcherDefinition,

    #[serde(default = "default_one")]
    pub count: u32,

    #[serde(default = "default_true")]
    pub exact: bool,
}

impl VerificationDefinition {
    async fn run<T: Transport>(&self, client: &ControlPlaneClient<T>) -> ClientResult<()> {
        client
            .verify(self.request.build(), self.count, self.exact)
            .await
    }
}

/// An ordered list of request matchers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SequenceDefinition {
    #[serde(default)]
    pub name: Option<String>,

    pub requests: Vec<MatcherDefinition>,
}

impl SequenceDefinition {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.requests.is_empty() {
            anyhow::bail!("Sequence cannot be empty");
        }
        for request in &self.requests {
            request.validate()?;
        }
        Ok(())
    }
}
