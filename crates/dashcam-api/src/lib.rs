//! Axum HTTP/WebSocket server for live dashcam scene streaming.
//!
//! This crate provides:
//! - One WebSocket session per client, streaming frames in and scene
//!   previews out
//! - A registry of active sessions
//! - Health, detector-config and Prometheus metrics endpoints

pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod registry;
pub mod routes;
pub mod session;
pub mod state;
pub mod ws;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, RegistryError, SessionError};
pub use registry::{SessionHandle, SessionRegistry};
pub use routes::create_router;
pub use session::{run_session, SessionOutcome, SessionSettings};
pub use state::AppState;
