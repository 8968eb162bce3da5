//! WebSocket message types.
//!
//! These messages keep wire compatibility with the mobile and web clients,
//! which exchange JSON objects discriminated by a `type` field.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::SessionStatistics;

/// Messages sent by a streaming client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    /// One captured frame, base64-encoded compressed still image
    Frame { data: String },

    /// End of stream; finalize the output video
    Stop,

    /// Any message type this server does not know about
    #[serde(other)]
    Unknown,
}

impl InboundMessage {
    /// Parse a text payload.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Outbound message types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum OutboundMessageType {
    ProcessedFrame,
    Completed,
    Error,
}

impl OutboundMessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutboundMessageType::ProcessedFrame => "processed_frame",
            OutboundMessageType::Completed => "completed",
            OutboundMessageType::Error => "error",
        }
    }
}

/// Messages sent to a streaming client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// Representative frame of a scene that just closed
    ProcessedFrame {
        data: String,
        timestamp: DateTime<Utc>,
    },

    /// Stream finalized
    Completed {
        output_path: String,
        statistics: SessionStatistics,
    },

    /// Session-ending (or frame-level, when skipping is enabled) failure
    Error { message: String },
}

impl OutboundMessage {
    /// Create a processed frame message stamped with the current time.
    pub fn processed_frame(data: impl Into<String>) -> Self {
        OutboundMessage::ProcessedFrame {
            data: data.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a completion message.
    pub fn completed(output_path: impl Into<String>, statistics: SessionStatistics) -> Self {
        OutboundMessage::Completed {
            output_path: output_path.into(),
            statistics,
        }
    }

    /// Create an error message.
    pub fn error(message: impl Into<String>) -> Self {
        OutboundMessage::Error {
            message: message.into(),
        }
    }

    /// Get the message type.
    pub fn message_type(&self) -> OutboundMessageType {
        match self {
            OutboundMessage::ProcessedFrame { .. } => OutboundMessageType::ProcessedFrame,
            OutboundMessage::Completed { .. } => OutboundMessageType::Completed,
            OutboundMessage::Error { .. } => OutboundMessageType::Error,
        }
    }
}
