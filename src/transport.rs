//! HTTP transport used by the control-plane client.

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::fmt::Debug;
use std::time::Duration;

/// Default per-call deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Status and body text of a control-plane response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_rejection(&self) -> bool {
        self.status >= 400
    }
}

/// Issues a single PUT and returns whatever the server answered.
///
/// Implementations do not interpret the status code and do not retry.
#[async_trait]
pub trait Transport: Debug + Send + Sync {
    async fn put(&self, url: &str, body: Option<String>) -> Result<RawResponse>;
}

/// `reqwest`-backed transport with a fixed per-call timeout.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::ClientBuild(Box::new(e)))?;
        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn map_error(&self, url: &str, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                url: url.to_string(),
                timeout: self.timeout,
            }
        } else {
            Error::Transport {
                url: url.to_string(),
                source: Box::new(err),
            }
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn put(&self, url: &str, body: Option<String>) -> Result<RawResponse> {
        let mut request = self.client.put(url);
        if let Some(body) = body {
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        let response = request.send().await.map_err(|e| self.map_error(url, e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| self.map_error(url, e))?;

        Ok(RawResponse { status, body })
    }
}


#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// A PUT captured by [`RecordingTransport`].
    #[derive(Debug, Clone, PartialEq)]
    pub struct RecordedCall {
        pub url: String,
        pub body: Option<String>,
    }

    impl RecordedCall {
        pub fn json(&self) -> serde_json::Value {
            serde_json::from_str(self.body.as_deref().unwrap()).unwrap()
        }
    }

    /// In-memory transport that records calls and replays queued responses.
    /// Answers 200 with an empty body once the queue is drained.
    #[derive(Debug, Default)]
    pub struct RecordingTransport {
        calls: Mutex<Vec<RecordedCall>>,
        responses: Mutex<VecDeque<RawResponse>>,
    }

    impl RecordingTransport {
        pub fn respond_with(self, status: u16, body: &str) -> Self {
            self.responses.lock().unwrap().push_back(RawResponse {
                status,
                body: body.to_string(),
            });
            self
        }

        pub fn calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().unwrap().clone()
        }

        pub fn last_call(&self) -> RecordedCall {
            self.calls().pop().expect("no calls recorded")
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn put(&self, url: &str, body: Option<String>) -> Result<RawResponse> {
            self.calls.lock().unwrap().push(RecordedCall {
                url: url.to_string(),
                body,
            });
            Ok(self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(RawResponse {
                    status: 200,
                    body: String::new(),
                }))
        }
    }
}
