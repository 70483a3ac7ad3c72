//! Client configuration.
//!
//! Names the mock server and the protocol revision it speaks. The revision
//! is never guessed: the count encoding has to be chosen explicitly.

use crate::transport::DEFAULT_TIMEOUT;
use crate::verification::CountEncoding;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration for a control-plane client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Base address of the mock server, e.g. `http://localhost:1080`
    pub base_url: String,

    /// Per-call deadline in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Protocol revision spoken by the server
    pub protocol: Protocol,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT.as_millis() as u64
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, protocol: Protocol) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_ms: default_timeout_ms(),
            protocol,
        }
    }

    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.base_url.is_empty() {
            anyhow::bail!("base_url cannot be empty");
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            anyhow::bail!("base_url must be an http(s) address: {}", self.base_url);
        }
        if self.timeout_ms == 0 {
            anyhow::bail!("timeout_ms must be greater than zero");
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Protocol revision of the target mock server.
///
/// In YAML only `count_encoding` is required; omitted fields come from the
/// preset for that encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ProtocolFile")]
pub struct Protocol {
    /// Wire shape of verification counts
    pub count_encoding: CountEncoding,

    /// Discriminator for retrieving active expectations
    pub expectation_query: ExpectationQuery,

    /// Whether `/dumpToLog` is available
    pub dump_to_log: Capability,
}

/// `protocol` section as written in a config file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProtocolFile {
    count_encoding: CountEncoding,
    #[serde(default)]
    expectation_query: Option<ExpectationQuery>,
    #[serde(default)]
    dump_to_log: Option<Capability>,
}

impl From<ProtocolFile> for Protocol {
    fn from(file: ProtocolFile) -> Self {
        let preset = Protocol::for_encoding(file.count_encoding);
        Self {
            count_encoding: preset.count_encoding,
            expectation_query: file.expectation_query.unwrap_or(preset.expectation_query),
            dump_to_log: file.dump_to_log.unwrap_or(preset.dump_to_log),
        }
    }
}

impl Protocol {
    /// Preset for a count encoding.
    pub fn for_encoding(encoding: CountEncoding) -> Self {
        match encoding {
            CountEncoding::Legacy => Self::legacy(),
            CountEncoding::Threshold => Self::threshold(),
        }
    }

    /// `count`/`exact` verification, `type=expectation` retrieval.
    pub fn legacy() -> Self {
        Self {
            count_encoding: CountEncoding::Legacy,
            expectation_query: ExpectationQuery::Expectation,
            dump_to_log: Capability::Enabled,
        }
    }

    /// `atLeast`/`atMost` verification, `type=active_expectations` retrieval.
    pub fn threshold() -> Self {
        Self {
            count_encoding: CountEncoding::Threshold,
            expectation_query: ExpectationQuery::ActiveExpectations,
            dump_to_log: Capability::Enabled,
        }
    }

    pub fn with_dump_to_log(mut self, capability: Capability) -> Self {
        self.dump_to_log = capability;
        self
    }
}

/// Value of the `type` query parameter on `/retrieve` for expectations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectationQuery {
    Expectation,
    ActiveExpectations,
}

impl ExpectationQuery {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpectationQuery::Expectation => "expectation",
            ExpectationQuery::ActiveExpectations => "active_expectations",
        }
    }
}

/// An optional server capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Enabled,
    Disabled,
}

impl Capability {
    pub fn is_enabled(&self) -> bool {
        matches!(self, Capability::Enabled)
    }
}
