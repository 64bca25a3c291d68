//! Transport trait: the network seam under the interceptor pipeline
//!
//! A transport performs one HTTP-style call per `ApiRequest` and answers with
//! either a success envelope (`TransportResponse`) or a failure envelope
//! (`TransportFailure`). Only the pipeline looks inside failures.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

pub mod http;
pub mod memory;

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One part of a multipart form upload
#[derive(Debug, Clone)]
pub enum MultipartPart {
    /// Plain text field
    Text { name: String, value: String },
    /// File field
    File {
        name: String,
        file_name: String,
        content: Bytes,
        mime: Option<String>,
    },
}

impl MultipartPart {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Text {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn file(
        name: impl Into<String>,
        file_name: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> Self {
        Self::File {
            name: name.into(),
            file_name: file_name.into(),
            content: content.into(),
            mime: None,
        }
    }

    /// Field name of this part
    pub fn name(&self) -> &str {
        match self {
            Self::Text { name, .. } | Self::File { name, .. } => name,
        }
    }
}

/// Request body
#[derive(Debug, Clone)]
pub enum RequestBody {
    Json(serde_json::Value),
    Multipart(Vec<MultipartPart>),
}

/// An outbound call, relative to the configured base URL
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the base URL (e.g. `/auth/me`)
    pub path: String,
    /// Query parameters; `None` values are never sent
    pub query: Vec<(String, String)>,
    /// Header overrides
    pub headers: BTreeMap<String, String>,
    pub body: Option<RequestBody>,
    /// Per-request timeout override (bulk transfers)
    pub timeout: Option<Duration>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: BTreeMap::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Attach a JSON body
    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    /// Attach a multipart form body
    pub fn multipart(mut self, parts: Vec<MultipartPart>) -> Self {
        self.body = Some(RequestBody::Multipart(parts));
        self
    }

    /// Add a query parameter if a value is present
    pub fn query_opt<V: ToString>(mut self, key: &str, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.query.push((key.to_string(), value.to_string()));
        }
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Look up a header case-insensitively
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Look up a query parameter
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Success envelope
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    /// Parsed JSON body (`Null` when the body was empty)
    pub body: serde_json::Value,
}

/// Failure envelope
///
/// `status` is `None` when the server was never reached.
#[derive(Debug, Clone, Default)]
pub struct TransportFailure {
    pub status: Option<u16>,
    /// Transport-supplied description (e.g. "connection refused")
    pub message: Option<String>,
    /// Structured error body, if the server sent JSON
    pub body: Option<serde_json::Value>,
}

impl TransportFailure {
    /// Server answered with an error status
    pub fn status(status: u16, body: Option<serde_json::Value>) -> Self {
        Self {
            status: Some(status),
            message: Some(format!("Request failed with status code {}", status)),
            body,
        }
    }

    /// Server was never reached
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: Some(message.into()),
            body: None,
        }
    }
}

/// Core trait for transports
///
/// Implementations perform the network call and report the outcome without
/// interpreting it. The pipeline owns auth, unwrapping and normalization.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Dispatch one request
    async fn send(
        &self,
        request: &ApiRequest,
    ) -> std::result::Result<TransportResponse, TransportFailure>;

    /// Transport name (e.g., "http", "memory")
    fn name(&self) -> &str;
}
