//! Realtime detection session controller
//!
//! Drives the server's single continuous-detection session through
//! `Idle → Running → Stopped → Idle`. The controller never schedules
//! anything itself: callers decide when to poll (see `poller`), and every
//! method takes `&mut self` so one owner serializes start/poll/stop.

use crate::error::{ClientError, Result};
use crate::pipeline::Pipeline;
use crate::transport::ApiRequest;
use crate::types::{Ack, DetectionFrame};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

pub const START_PATH: &str = "/detect/realtime/start";
pub const FRAME_PATH: &str = "/detect/realtime/frame";
pub const STOP_PATH: &str = "/detect/realtime/stop";

/// Status reported when `start` is issued while a session is running
pub const CONFLICT_STATUS: u16 = 409;

/// Lifecycle state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RealtimeState {
    #[default]
    Idle,
    Running,
    Stopped,
}

impl fmt::Display for RealtimeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Stopped => "stopped",
        })
    }
}

/// Parameters sent with `start`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RealtimeParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<u32>,
}

impl RealtimeParams {
    pub fn new(model_id: Option<i64>, confidence: Option<f32>, fps: Option<u32>) -> Self {
        Self {
            model_id,
            confidence,
            fps,
        }
    }
}

/// Client-side record of the realtime session
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RealtimeSession {
    pub state: RealtimeState,
    pub model_id: Option<i64>,
    pub confidence: Option<f32>,
    pub fps: Option<u32>,
}

/// Where a controller sends its calls
///
/// `HelmetClient` implements this so realtime calls share its session-expiry
/// handling; a bare `Pipeline` works too.
#[async_trait::async_trait]
pub trait RealtimeApi: Send + Sync {
    async fn call(&self, request: ApiRequest) -> Result<serde_json::Value>;
}

#[async_trait::async_trait]
impl RealtimeApi for Pipeline {
    async fn call(&self, request: ApiRequest) -> Result<serde_json::Value> {
        self.execute(request, "").await
    }
}

/// Three-state controller for the realtime protocol
pub struct RealtimeController {
    api: Arc<dyn RealtimeApi>,
    session: RealtimeSession,
}

impl RealtimeController {
    pub fn new(api: Arc<dyn RealtimeApi>) -> Self {
        Self {
            api,
            session: RealtimeSession::default(),
        }
    }

    pub fn state(&self) -> RealtimeState {
        self.session.state
    }

    pub fn session(&self) -> &RealtimeSession {
        &self.session
    }

    pub fn is_running(&self) -> bool {
        self.session.state == RealtimeState::Running
    }

    /// Start the server-side session (valid only from `Idle`)
    ///
    /// While `Running` this fails with a 409 `Server` error without
    /// contacting the server. A server rejection leaves the state `Idle`.
    /// A malformed acknowledgement is reported as `Serialization`, but the
    /// server accepted the call, so the state is `Running` regardless.
    pub async fn start(&mut self, params: RealtimeParams) -> Result<Ack> {
        match self.session.state {
            RealtimeState::Idle => {}
            RealtimeState::Running => {
                return Err(ClientError::Server {
                    status: CONFLICT_STATUS,
                    message: "Realtime detection already running".to_string(),
                    body: None,
                })
            }
            RealtimeState::Stopped => {
                return Err(ClientError::InvalidState {
                    operation: "start",
                    state: RealtimeState::Stopped,
                })
            }
        }

        let body = serde_json::to_value(params)?;
        let reply = self.api.call(ApiRequest::post(START_PATH).json(body)).await?;

        self.session = RealtimeSession {
            state: RealtimeState::Running,
            model_id: params.model_id,
            confidence: params.confidence,
            fps: params.fps,
        };
        tracing::info!(
            model_id = ?params.model_id,
            confidence = ?params.confidence,
            fps = ?params.fps,
            "Realtime detection started"
        );
        decode_ack(reply)
    }

    /// Fetch the latest frame (valid only from `Running`)
    ///
    /// Omitted overrides fall back to the parameters given at `start`.
    /// Failures leave the state untouched, except `SessionExpired`, which
    /// resets the controller to `Idle`.
    pub async fn poll(&mut self, confidence: Option<f32>, fps: Option<u32>) -> Result<DetectionFrame> {
        if self.session.state != RealtimeState::Running {
            return Err(ClientError::InvalidState {
                operation: "poll",
                state: self.session.state,
            });
        }

        let request = ApiRequest::get(FRAME_PATH)
            .query_opt("confidence", confidence.or(self.session.confidence))
            .query_opt("fps", fps.or(self.session.fps));

        match self.api.call(request).await {
            Ok(body) => Ok(serde_json::from_value(body)?),
            Err(e) => {
                if e.is_session_expired() {
                    tracing::warn!("Session expired during realtime poll, resetting to idle");
                    self.session = RealtimeSession::default();
                }
                Err(e)
            }
        }
    }

    /// Stop the session; always ends in `Idle`
    ///
    /// A no-op when not running. The stop request's error is still
    /// returned, but local state is reset regardless.
    pub async fn stop(&mut self) -> Result<Ack> {
        if self.session.state != RealtimeState::Running {
            // Stopped only survives a stop future dropped mid-flight
            self.session = RealtimeSession::default();
            return Ok(Ack::default());
        }

        self.session.state = RealtimeState::Stopped;
        let result = self.api.call(ApiRequest::post(STOP_PATH)).await;
        self.session = RealtimeSession::default();

        match result {
            Ok(body) => {
                tracing::info!("Realtime detection stopped");
                decode_ack(body)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Realtime stop request failed, local session reset");
                Err(e)
            }
        }
    }
}

/// Empty bodies count as an acknowledgement without a message
fn decode_ack(body: serde_json::Value) -> Result<Ack> {
    Ok(serde_json::from_value::<Option<Ack>>(body)?.unwrap_or_default())
}

impl fmt::Debug for RealtimeController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RealtimeController")
            .field("session", &self.session)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use crate::transport::memory::MemoryTransport;
    use crate::transport::Method;

    fn controller() -> (RealtimeController, MemoryTransport) {
        let transport = MemoryTransport::new();
        let pipeline = Pipeline::new(Arc::new(transport.clone()), Arc::new(Session::in_memory()));
        (RealtimeController::new(Arc::new(pipeline)), transport)
    }

    fn started_ack() -> serde_json::Value {
        serde_json::json!({"message": "Realtime detection started"})
    }

    #[tokio::test]
    async fn test_start_poll_stop() {
        let (mut ctl, transport) = controller();
        transport
            .respond(Method::Post, START_PATH, started_ack())
            .respond(Method::Get, FRAME_PATH, serde_json::json!({"image": "", "detections": []}))
            .respond(Method::Post, STOP_PATH, serde_json::json!({"message": "Realtime detection stopped"}));

        let ack = ctl.start(RealtimeParams::new(Some(3), Some(0.5), Some(10))).await.unwrap();
        assert_eq!(ack.message.as_deref(), Some("Realtime detection started"));
        assert_eq!(ctl.state(), RealtimeState::Running);
        assert_eq!(ctl.session().model_id, Some(3));

        let start = transport.requests_to(Method::Post, START_PATH);
        match &start[0].body {
            Some(crate::transport::RequestBody::Json(body)) => {
                assert_eq!(body["model_id"], 3);
                assert_eq!(body["confidence"], 0.5);
                assert_eq!(body["fps"], 10);
            }
            other => panic!("unexpected start body: {:?}", other),
        }

        let frame = ctl.poll(None, None).await.unwrap();
        assert!(frame.detections.is_empty());

        ctl.stop().await.unwrap();
        assert_eq!(ctl.state(), RealtimeState::Idle);
        assert_eq!(*ctl.session(), RealtimeSession::default());
    }

    #[tokio::test]
    async fn test_start_omits_absent_params() {
        let (mut ctl, transport) = controller();
        transport.respond(Method::Post, START_PATH, started_ack());

        ctl.start(RealtimeParams::default()).await.unwrap();
        match &transport.last_request().unwrap().body {
            Some(crate::transport::RequestBody::Json(body)) => {
                assert_eq!(body, &serde_json::json!({}))
            }
            other => panic!("unexpected start body: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_poll_when_idle_does_not_contact_server() {
        let (mut ctl, transport) = controller();
        let err = ctl.poll(Some(0.4), None).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::InvalidState { operation: "poll", state: RealtimeState::Idle }
        ));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_start_while_running_is_conflict() {
        let (mut ctl, transport) = controller();
        transport.respond(Method::Post, START_PATH, started_ack());
        ctl.start(RealtimeParams::default()).await.unwrap();

        let err = ctl.start(RealtimeParams::new(Some(1), None, None)).await.unwrap_err();
        assert_eq!(err.status_code(), Some(CONFLICT_STATUS));
        assert_eq!(ctl.state(), RealtimeState::Running);
        assert_eq!(transport.requests_to(Method::Post, START_PATH).len(), 1);
    }

    #[tokio::test]
    async fn test_server_rejects_start() {
        let (mut ctl, transport) = controller();
        transport.fail(
            Method::Post,
            START_PATH,
            409,
            Some(serde_json::json!({"message": "Realtime detection already active"})),
        );

        let err = ctl.start(RealtimeParams::default()).await.unwrap_err();
        assert!(matches!(err, ClientError::Server { status: 409, .. }));
        assert_eq!(err.message(), "Realtime detection already active");
        assert_eq!(ctl.state(), RealtimeState::Idle);
    }

    #[tokio::test]
    async fn test_poll_overrides_and_fallbacks() {
        let (mut ctl, transport) = controller();
        transport
            .respond(Method::Post, START_PATH, started_ack())
            .respond_always(Method::Get, FRAME_PATH, serde_json::json!({"image": "", "detections": []}));
        ctl.start(RealtimeParams::new(None, Some(0.25), Some(5))).await.unwrap();

        ctl.poll(None, None).await.unwrap();
        ctl.poll(Some(0.75), None).await.unwrap();

        let polls = transport.requests_to(Method::Get, FRAME_PATH);
        assert_eq!(polls[0].query_value("confidence"), Some("0.25"));
        assert_eq!(polls[0].query_value("fps"), Some("5"));
        assert_eq!(polls[1].query_value("confidence"), Some("0.75"));
        assert_eq!(polls[1].query_value("fps"), Some("5"));
    }

    #[tokio::test]
    async fn test_poll_failure_keeps_running() {
        let (mut ctl, transport) = controller();
        transport
            .respond(Method::Post, START_PATH, started_ack())
            .fail(
                Method::Get,
                FRAME_PATH,
                400,
                Some(serde_json::json!({"message": "Realtime detection not active"})),
            )
            .fail_network(Method::Get, FRAME_PATH, "timeout of 30000ms exceeded");
        ctl.start(RealtimeParams::default()).await.unwrap();

        let err = ctl.poll(None, None).await.unwrap_err();
        assert_eq!(err.message(), "Realtime detection not active");
        assert_eq!(ctl.state(), RealtimeState::Running);

        let err = ctl.poll(None, None).await.unwrap_err();
        assert!(matches!(err, ClientError::Network { .. }));
        assert_eq!(ctl.state(), RealtimeState::Running);
    }

    #[tokio::test]
    async fn test_poll_session_expired_resets() {
        let (mut ctl, transport) = controller();
        transport
            .respond(Method::Post, START_PATH, started_ack())
            .fail(Method::Get, FRAME_PATH, 401, None);
        ctl.start(RealtimeParams::default()).await.unwrap();

        let err = ctl.poll(None, None).await.unwrap_err();
        assert!(err.is_session_expired());
        assert_eq!(ctl.state(), RealtimeState::Idle);
    }

    #[tokio::test]
    async fn test_stop_failure_still_resets() {
        let (mut ctl, transport) = controller();
        transport
            .respond(Method::Post, START_PATH, started_ack())
            .fail(Method::Post, STOP_PATH, 500, None);
        ctl.start(RealtimeParams::default()).await.unwrap();

        assert!(ctl.stop().await.is_err());
        assert_eq!(ctl.state(), RealtimeState::Idle);

        transport.respond(Method::Post, START_PATH, started_ack());
        ctl.start(RealtimeParams::default()).await.unwrap();
        assert!(ctl.is_running());
    }

    #[tokio::test]
    async fn test_interrupted_stop_blocks_start_until_stopped() {
        let (mut ctl, _transport) = controller();
        ctl.session.state = RealtimeState::Stopped;

        let err = ctl.start(RealtimeParams::default()).await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidState { operation: "start", .. }));
        let err = ctl.poll(None, None).await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidState { operation: "poll", .. }));

        ctl.stop().await.unwrap();
        assert_eq!(ctl.state(), RealtimeState::Idle);
    }

    #[tokio::test]
    async fn test_stop_when_idle_is_noop() {
        let (mut ctl, transport) = controller();
        ctl.stop().await.unwrap();
        ctl.stop().await.unwrap();
        assert_eq!(ctl.state(), RealtimeState::Idle);
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_ack_is_reported() {
        let (mut controller, transport) = controller();
        transport
            .respond(Method::Post, START_PATH, serde_json::json!({"message": 42}))
            .respond(Method::Post, STOP_PATH, serde_json::json!("stopped"));

        let err = controller.start(RealtimeParams::default()).await.unwrap_err();
        assert!(matches!(err, ClientError::Serialization(_)));
        assert_eq!(controller.state(), RealtimeState::Running);

        let err = controller.stop().await.unwrap_err();
        assert!(matches!(err, ClientError::Serialization(_)));
        assert_eq!(controller.state(), RealtimeState::Idle);
    }

    #[tokio::test]
    async fn test_empty_ack_body_is_accepted() {
        let (mut controller, transport) = controller();
        transport
            .respond(Method::Post, START_PATH, serde_json::Value::Null)
            .respond(Method::Post, STOP_PATH, serde_json::Value::Null);

        let ack = controller.start(RealtimeParams::default()).await.unwrap();
        assert!(ack.message.is_none());
        assert!(controller.stop().await.unwrap().message.is_none());
    }
}
