//! High-level client built on the interceptor pipeline
//!
//! `HelmetClient` is the single place that owns navigation side effects:
//! when the pipeline reports `SessionExpired`, the client clears the session
//! and sends the navigator to the login entry point before handing the error
//! back to the caller.

use crate::config::ClientConfig;
use crate::credentials::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
use crate::error::Result;
use crate::navigation::{MemoryNavigator, NavigationGuard, Navigator, Router, LANDING_PATH, LOGIN_PATH};
use crate::pipeline::Pipeline;
use crate::realtime::{RealtimeApi, RealtimeController};
use crate::session::Session;
use crate::transport::http::HttpTransport;
use crate::transport::{ApiRequest, Transport};
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Typed client for the helmet-detection backend
///
/// Cheap to clone; clones share the transport, session and navigator.
#[derive(Clone)]
pub struct HelmetClient {
    pipeline: Pipeline,
    navigator: Arc<dyn Navigator>,
    config: ClientConfig,
}

impl HelmetClient {
    /// HTTP client from configuration
    ///
    /// The token is persisted at `config.token_path` when set, otherwise
    /// kept in memory. Location is tracked by a `MemoryNavigator`.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        let store: Arc<dyn CredentialStore> = match &config.token_path {
            Some(path) => Arc::new(FileCredentialStore::new(path)),
            None => Arc::new(MemoryCredentialStore::default()),
        };
        let session = Arc::new(Session::new(store));
        let navigator = Arc::new(MemoryNavigator::new(LANDING_PATH));

        tracing::debug!(
            base_url = %config.base_url,
            persistent = config.token_path.is_some(),
            signed_in = session.is_present(),
            "Helmet client created"
        );

        Ok(Self::with_parts(config, Arc::new(transport), session, navigator))
    }

    /// Client configured from `HELMET_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Assemble a client from explicit collaborators
    pub fn with_parts(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        session: Arc<Session>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            pipeline: Pipeline::new(transport, session),
            navigator,
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<Session> {
        self.pipeline.session()
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    pub fn is_signed_in(&self) -> bool {
        self.session().is_present()
    }

    /// Guarded router over the default route table
    pub fn router(&self) -> Router {
        Router::new(
            NavigationGuard::default(),
            self.session().clone(),
            self.navigator.clone(),
        )
    }

    /// Controller for a realtime detection session
    pub fn realtime(&self) -> RealtimeController {
        RealtimeController::new(Arc::new(self.clone()))
    }

    /// Send a request through the pipeline and apply session-expiry handling
    ///
    /// The location used for the login/register exemption is the one current
    /// when the failure arrives, not when the call was sent.
    pub async fn dispatch(&self, request: ApiRequest) -> Result<serde_json::Value> {
        let navigator = &self.navigator;
        let result = self
            .pipeline
            .execute_at(request, || navigator.current_path())
            .await;

        if let Err(e) = &result {
            if e.is_session_expired() {
                self.expire_session();
            }
        }
        result
    }

    /// Dispatch and decode the payload
    pub async fn request<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let body = self.dispatch(request).await?;
        Ok(serde_json::from_value(body)?)
    }

    fn expire_session(&self) {
        tracing::warn!(
            from = %self.navigator.current_path(),
            "Session expired, redirecting to login"
        );
        if let Err(e) = self.session().clear() {
            tracing::warn!(error = %e, "Failed to remove stored credentials");
        }
        self.navigator.redirect(LOGIN_PATH);
    }
}

#[async_trait::async_trait]
impl RealtimeApi for HelmetClient {
    async fn call(&self, request: ApiRequest) -> Result<serde_json::Value> {
        self.dispatch(request).await
    }
}
