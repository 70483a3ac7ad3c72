//! Forwarding actions: send matched requests to another path after a delay.

use serde::{Deserialize, Serialize};

/// Unit of a [`Delay`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeUnit {
    Nanoseconds,
    Microseconds,
    Milliseconds,
    #[default]
    Seconds,
    Minutes,
    Hours,
    Days,
}

/// Delay applied before forwarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delay {
    pub time_unit: TimeUnit,
    pub value: u64,
}

impl Default for Delay {
    fn default() -> Self {
        Self {
            time_unit: TimeUnit::Seconds,
            value: 1,
        }
    }
}

/// Request override applied to a forwarded request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardTarget {
    pub path: String,
}

/// Forwarding-action document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardAction {
    pub http_request: ForwardTarget,
    pub delay: Delay,
}

/// Builder for [`ForwardAction`]. Delay defaults to one second.
#[derive(Debug, Clone)]
pub struct ForwardBuilder {
    path: String,
    delay: Delay,
}

impl ForwardBuilder {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            delay: Delay::default(),
        }
    }

    pub fn delay(mut self, value: u64) -> Self {
        self.delay.value = value;
        self
    }

    pub fn unit(mut self, unit: TimeUnit) -> Self {
        self.delay.time_unit = unit;
        self
    }

    pub fn build(self) -> ForwardAction {
        ForwardAction {
            http_request: ForwardTarget { path: self.path },
            delay: self.delay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_delay() {
        let forward = ForwardBuilder::new("/elsewhere").build();
        assert_eq!(
            serde_json::to_value(&forward).unwrap(),
            json!({
                "httpRequest": {"path": "/elsewhere"},
                "delay": {"timeUnit": "SECONDS", "value": 1}
            })
        );
    }

    #[test]
    fn test_custom_delay() {
        let forward = ForwardBuilder::new("/slow")
            .delay(250)
            .unit(TimeUnit::Milliseconds)
            .build();
        assert_eq!(forward.delay.value, 250);
        assert_eq!(
            serde_json::to_value(&forward).unwrap()["delay"]["timeUnit"],
            "MILLISECONDS"
        );
    }
}
