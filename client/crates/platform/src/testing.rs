//! Scripted transport for tests
//!
//! Replies are queued per method and path. The last queued reply for a route
//! is repeated once the queue drains; unknown routes answer 404. Every request
//! is recorded for assertions.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde_json::Value;

use crate::error::TransportError;
use crate::http::Method;
use crate::transport::{HttpTransport, RawRequest, RawResponse};

/// A canned outcome for one request
#[derive(Debug, Clone)]
pub struct Reply {
    outcome: Result<RawResponse, TransportError>,
    delay: Duration,
}

impl Reply {
    pub fn json(status: u16, body: Value) -> Self {
        Self::text(status, body.to_string())
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            outcome: Ok(RawResponse {
                status,
                body: body.into(),
            }),
            delay: Duration::ZERO,
        }
    }

    pub fn network_failure() -> Self {
        Self {
            outcome: Err(TransportError::Network("connection refused".into())),
            delay: Duration::ZERO,
        }
    }

    /// Hold the reply back for `delay` (virtual time under a paused runtime)
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// What the transport saw
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub bearer: Option<String>,
    pub body: Option<Value>,
}

#[derive(Debug, Default)]
struct Script {
    routes: HashMap<(Method, String), VecDeque<Reply>>,
    requests: Vec<RecordedRequest>,
}

/// In-memory [`HttpTransport`]; clones share one script
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for `method path`
    pub fn on(&self, method: Method, path: &str, reply: Reply) -> &Self {
        self.lock()
            .routes
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    /// Number of requests seen for `method path`
    pub fn count(&self, method: Method, path: &str) -> usize {
        self.lock()
            .requests
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_reply(&self, request: &RawRequest) -> Reply {
        let mut script = self.lock();
        script.requests.push(RecordedRequest {
            method: request.method,
            path: request.url.path().to_string(),
            query: request.url.query().map(str::to_string),
            bearer: request.bearer_token().map(str::to_string),
            body: request
                .body
                .as_deref()
                .and_then(|b| serde_json::from_slice(b).ok()),
        });

        let key = (request.method, request.url.path().to_string());
        let queued = match script.routes.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        queued.unwrap_or_else(|| Reply::text(404, r#"{"detail":"Not Found"}"#))
    }
}

impl HttpTransport for ScriptedTransport {
    async fn execute(&self, request: RawRequest) -> Result<RawResponse, TransportError> {
        let reply = self.next_reply(&request);
        if !reply.delay.is_zero() {
            tokio::time::sleep(reply.delay).await;
        }
        reply.outcome
    }
}
