//! Application state.

use std::sync::Arc;

use dashcam_media::{FfmpegSinkFactory, ImageCodec, JpegCodec, SinkFactory};

use crate::config::ApiConfig;
use crate::error::ApiResult;
use crate::registry::SessionRegistry;
use crate::session::SessionSettings;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ApiConfig>,
    pub settings: Arc<SessionSettings>,
    pub registry: SessionRegistry,
    pub sinks: Arc<dyn SinkFactory>,
    pub codec: Arc<dyn ImageCodec>,
}

impl AppState {
    /// Create application state writing videos through FFmpeg.
    pub fn new(config: ApiConfig) -> ApiResult<Self> {
        Self::with_sink_factory(config, Arc::new(FfmpegSinkFactory::new()))
    }

    /// Create application state with a custom output sink factory.
    pub fn with_sink_factory(config: ApiConfig, sinks: Arc<dyn SinkFactory>) -> ApiResult<Self> {
        let settings = config.session_settings()?;
        Ok(Self {
            config: Arc::new(config),
            settings: Arc::new(settings),
            registry: SessionRegistry::new(),
            sinks,
            codec: Arc::new(JpegCodec),
        })
    }
}
