//! Structured session logging.

use dashcam_models::ClientId;
use tracing::{error, info, warn, Span};

/// Logger carrying a session's client id through its lifecycle events.
#[derive(Debug, Clone)]
pub struct SessionLogger {
    client_id: String,
}

impl SessionLogger {
    pub fn new(client_id: &ClientId) -> Self {
        Self {
            client_id: client_id.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(client_id = %self.client_id, "Session started: {}", message);
    }

    pub fn log_warning(&self, message: &str) {
        warn!(client_id = %self.client_id, "Session warning: {}", message);
    }

    pub fn log_error(&self, message: &str) {
        error!(client_id = %self.client_id, "Session error: {}", message);
    }

    pub fn log_completion(&self, message: &str) {
        info!(client_id = %self.client_id, "Session completed: {}", message);
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Span covering the whole session.
    pub fn create_span(&self) -> Span {
        tracing::info_span!("session", client_id = %self.client_id)
    }
}
