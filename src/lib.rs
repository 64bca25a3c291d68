//! # helmet-client
//!
//! Access layer for the helmet-detection backend.
//!
//! ## Overview
//!
//! `helmet-client` wraps the detection service's REST API behind one typed
//! client. Every call flows through an interceptor pipeline that attaches the
//! bearer token and normalizes failures; a navigation guard decides which
//! routes need a session; and a small state machine drives the server's
//! realtime detection session.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use helmet_client::{ClientConfig, HelmetClient, RealtimeParams};
//!
//! # async fn example() -> helmet_client::Result<()> {
//! let client = HelmetClient::new(ClientConfig::default())?;
//! client.login("admin", "admin123").await?;
//!
//! // Run realtime detection with model 3 at 10 fps
//! let mut realtime = client.realtime();
//! realtime.start(RealtimeParams::new(Some(3), Some(0.5), Some(10))).await?;
//! let frame = realtime.poll(None, None).await?;
//! println!("{} people without a helmet", frame.stats().without_helmet);
//! realtime.stop().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Transports
//!
//! - **http**: reqwest-based transport against a live server
//! - **memory**: scripted transport for tests and offline use
//!
//! ## Architecture
//!
//! - **Transport** trait: raw request/response seam every backend implements
//! - **Pipeline**: request/response interceptors, pure of side effects
//! - **HelmetClient**: typed resources plus session-expiry handling
//! - **NavigationGuard** / **Router**: route access decisions
//! - **RealtimeController** / **RealtimePoller**: realtime session lifecycle

pub mod api;
pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod navigation;
pub mod pipeline;
pub mod poller;
pub mod realtime;
pub mod session;
pub mod transport;
pub mod types;

// Re-export core types
pub use api::UploadFile;
pub use client::HelmetClient;
pub use config::ClientConfig;
pub use credentials::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use error::{ClientError, Result};
pub use navigation::{
    GuardDecision, MemoryNavigator, NavigationGuard, Navigator, Route, RouteTable, Router,
};
pub use pipeline::Pipeline;
pub use poller::RealtimePoller;
pub use realtime::{RealtimeController, RealtimeParams, RealtimeSession, RealtimeState};
pub use session::Session;
pub use transport::{ApiRequest, Method, Transport, TransportFailure, TransportResponse};
pub use types::{
    Ack, BoundingBox, Dataset, DatasetUpload, DetectResult, Detection, DetectionFrame,
    DetectionRecord, DetectionStats, Model, ModelMetrics, ModelTrainingData, ModelType, NewUser,
    Role, Statistics, TrainRequest, User, UserUpdate, VideoDetectResult,
};

// Re-export transports for convenience
pub use transport::http::HttpTransport;
pub use transport::memory::MemoryTransport;
