//! In-memory transport for testing and offline use
//!
//! Replays scripted responses per `(method, path)` and records every request
//! it receives. Clones share the same script and request log.

use super::{ApiRequest, Method, Transport, TransportFailure, TransportResponse};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

type Outcome = std::result::Result<TransportResponse, TransportFailure>;

#[derive(Default)]
struct Script {
    /// One-shot outcomes, consumed in order
    queued: HashMap<(Method, String), VecDeque<Outcome>>,
    /// Outcomes served whenever the queue for a route is empty
    sticky: HashMap<(Method, String), Outcome>,
    /// Every request received, in dispatch order
    requests: Vec<ApiRequest>,
}

/// Scripted `Transport` implementation
#[derive(Clone, Default)]
pub struct MemoryTransport {
    script: Arc<Mutex<Script>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn push(&self, method: Method, path: &str, outcome: Outcome) {
        self.script()
            .queued
            .entry((method, path.to_string()))
            .or_default()
            .push_back(outcome);
    }

    /// Queue one 200 response
    pub fn respond(&self, method: Method, path: &str, body: serde_json::Value) -> &Self {
        self.push(method, path, Ok(TransportResponse { status: 200, body }));
        self
    }

    /// Queue one error-status response
    pub fn fail(
        &self,
        method: Method,
        path: &str,
        status: u16,
        body: Option<serde_json::Value>,
    ) -> &Self {
        self.push(method, path, Err(TransportFailure::status(status, body)));
        self
    }

    /// Queue one raw failure envelope
    pub fn fail_with(&self, method: Method, path: &str, failure: TransportFailure) -> &Self {
        self.push(method, path, Err(failure));
        self
    }

    /// Queue one failure where the server was never reached
    pub fn fail_network(&self, method: Method, path: &str, message: &str) -> &Self {
        self.push(method, path, Err(TransportFailure::network(message)));
        self
    }

    /// Serve a 200 response for every call once the queue is drained
    pub fn respond_always(&self, method: Method, path: &str, body: serde_json::Value) -> &Self {
        self.script().sticky.insert(
            (method, path.to_string()),
            Ok(TransportResponse { status: 200, body }),
        );
        self
    }

    /// All requests received so far
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.script().requests.clone()
    }

    /// Requests received for one route
    pub fn requests_to(&self, method: Method, path: &str) -> Vec<ApiRequest> {
        self.script()
            .requests
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .cloned()
            .collect()
    }

    pub fn request_count(&self) -> usize {
        self.script().requests.len()
    }

    /// Most recent request, if any
    pub fn last_request(&self) -> Option<ApiRequest> {
        self.script().requests.last().cloned()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send(&self, request: &ApiRequest) -> Outcome {
        let mut script = self.script();
        script.requests.push(request.clone());

        let key = (request.method, request.path.clone());
        if let Some(outcome) = script.queued.get_mut(&key).and_then(|q| q.pop_front()) {
            return outcome;
        }
        if let Some(outcome) = script.sticky.get(&key) {
            return outcome.clone();
        }

        tracing::debug!(
            method = %request.method,
            path = %request.path,
            "No scripted response, answering 404"
        );
        Err(TransportFailure::status(404, None))
    }

    fn name(&self) -> &str {
        "memory"
    }
}
