//! Session interceptor pipeline
//!
//! Every outbound call passes through here: the bearer token is attached on
//! the way out, the transport envelope is unwrapped on the way back, and raw
//! transport failures are folded into `ClientError`.
//!
//! The pipeline performs no side effects on failure. A 401 outside the
//! login/register entry points comes back as `ClientError::SessionExpired`
//! and the caller that owns navigation (`HelmetClient`) reacts to it.

use crate::error::{ClientError, Result, FALLBACK_MESSAGE};
use crate::navigation::is_entry_point;
use crate::session::Session;
use crate::transport::{ApiRequest, Transport, TransportFailure, TransportResponse};
use std::sync::Arc;

pub const AUTHORIZATION: &str = "Authorization";
pub const REQUEST_ID: &str = "X-Request-Id";

/// Attach `Authorization: Bearer <token>` when the session holds a token
pub fn prepare_request(mut request: ApiRequest, session: &Session) -> ApiRequest {
    if let Some(token) = session.get() {
        request
            .headers
            .retain(|name, _| !name.eq_ignore_ascii_case(AUTHORIZATION));
        request
            .headers
            .insert(AUTHORIZATION.to_string(), format!("Bearer {}", token));
    }
    request
}

/// Strip the transport envelope, keeping only the body payload
pub fn handle_success(response: TransportResponse) -> serde_json::Value {
    response.body
}

/// Fold a raw transport failure into a normalized error
///
/// Message precedence: the server's `message` field, then the transport's
/// message, then `FALLBACK_MESSAGE`.
pub fn handle_failure(failure: TransportFailure, current_path: &str) -> ClientError {
    let server_message = failure
        .body
        .as_ref()
        .and_then(|b| b.get("message"))
        .and_then(|m| m.as_str())
        .filter(|m| !m.is_empty())
        .map(str::to_string);
    let message = server_message
        .or_else(|| failure.message.clone().filter(|m| !m.is_empty()))
        .unwrap_or_else(|| FALLBACK_MESSAGE.to_string());

    match failure.status {
        None => ClientError::Network { message },
        Some(401) if !is_entry_point(current_path) => ClientError::SessionExpired {
            message,
            body: failure.body,
        },
        Some(status) => ClientError::Server {
            status,
            message,
            body: failure.body,
        },
    }
}

/// Transport wrapped with the interceptors
#[derive(Clone)]
pub struct Pipeline {
    transport: Arc<dyn Transport>,
    session: Arc<Session>,
}

impl Pipeline {
    pub fn new(transport: Arc<dyn Transport>, session: Arc<Session>) -> Self {
        Self { transport, session }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn transport_name(&self) -> &str {
        self.transport.name()
    }

    /// Dispatch one call from a fixed location
    pub async fn execute(
        &self,
        request: ApiRequest,
        current_path: &str,
    ) -> Result<serde_json::Value> {
        self.execute_at(request, || current_path.to_string()).await
    }

    /// Dispatch one call; `location` is read only when a failure comes back,
    /// so the 401 check sees where the client is at that moment
    pub async fn execute_at<F>(&self, request: ApiRequest, location: F) -> Result<serde_json::Value>
    where
        F: FnOnce() -> String,
    {
        let request_id = uuid::Uuid::new_v4().to_string();
        let request =
            prepare_request(request, &self.session).header(REQUEST_ID, request_id.clone());

        tracing::debug!(
            request_id = %request_id,
            method = %request.method,
            path = %request.path,
            authenticated = request.header_value(AUTHORIZATION).is_some(),
            "Dispatching request"
        );

        match self.transport.send(&request).await {
            Ok(response) => Ok(handle_success(response)),
            Err(failure) => {
                let current_path = location();
                let error = handle_failure(failure, &current_path);
                tracing::debug!(
                    request_id = %request_id,
                    path = %request.path,
                    location = %current_path,
                    status = ?error.status_code(),
                    error = %error,
                    "Request failed"
                );
                Err(error)
            }
        }
    }
}
