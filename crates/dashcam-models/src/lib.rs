//! Shared data models for the dashcam scene streaming backend.
//!
//! This crate provides Serde-serializable types for:
//! - WebSocket message schemas (inbound and outbound)
//! - Client identifiers
//! - Session statistics reported when a stream completes

pub mod client;
pub mod statistics;
pub mod ws;

// Re-export common types
pub use client::{ClientId, ClientIdError};
pub use statistics::SessionStatistics;
pub use ws::{InboundMessage, OutboundMessage, OutboundMessageType};
