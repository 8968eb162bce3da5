//! Per-client streaming session.
//!
//! A session consumes inbound messages strictly in order, drives the frame
//! pipeline, and reports back over its registry handle. Whatever ends the
//! session (stop, disconnect, or a failure), cleanup closes the output,
//! resets detector state and drops the registry handle.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Local};
use dashcam_media::{
    frame_from_base64, frame_to_base64, FrameProcessor, ImageCodec, ProcessorConfig, SinkFactory,
};
use dashcam_models::{ClientId, InboundMessage, OutboundMessage, SessionStatistics};
use futures_util::{Stream, StreamExt};
use tracing::{debug, Instrument};

use crate::error::SessionError;
use crate::logging::SessionLogger;
use crate::metrics;
use crate::registry::SessionHandle;

/// Settings shared by every session of a server.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub processor: ProcessorConfig,
    pub output_dir: PathBuf,
    pub preview_quality: u8,
    pub skip_invalid_frames: bool,
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    /// Client sent `stop`; output finalized
    Completed {
        output_path: PathBuf,
        statistics: SessionStatistics,
    },
    /// Peer went away before stopping
    Disconnected,
    /// Session ended by an error, already reported to the client
    Failed(SessionError),
}

impl SessionOutcome {
    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            SessionOutcome::Completed { .. } => "completed",
            SessionOutcome::Disconnected => "disconnected",
            SessionOutcome::Failed(_) => "failed",
        }
    }
}

/// Output file for a session started at `started_at`.
pub fn output_path(dir: &Path, client_id: &ClientId, started_at: DateTime<Local>) -> PathBuf {
    dir.join(format!(
        "output_{}_{}.mp4",
        client_id,
        started_at.format("%Y%m%d_%H%M%S")
    ))
}

/// Run one session to completion.
///
/// `inbound` yields parsed client messages; a transport failure should be
/// yielded as [`SessionError::Disconnected`] or simply end the stream.
pub async fn run_session<S>(
    handle: SessionHandle,
    settings: &SessionSettings,
    sinks: &dyn SinkFactory,
    codec: &dyn ImageCodec,
    inbound: S,
) -> SessionOutcome
where
    S: Stream<Item = Result<InboundMessage, SessionError>>,
{
    let logger = SessionLogger::new(handle.client_id());
    let span = logger.create_span();

    async move {
        let mut session = match Session::open(handle, settings, sinks, codec, logger).await {
            Ok(session) => session,
            Err((handle, logger, err)) => {
                logger.log_error(&err.to_string());
                handle.send(OutboundMessage::error(err.to_string())).await;
                metrics::record_session_finished("failed");
                return SessionOutcome::Failed(err);
            }
        };

        let outcome = session.run(inbound).await;
        session.cleanup().await;
        metrics::record_session_finished(outcome.label());
        outcome
    }
    .instrument(span)
    .await
}

/// Lifecycle of an open session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Active,
    Closed,
}

struct Session<'a> {
    handle: SessionHandle,
    settings: &'a SessionSettings,
    codec: &'a dyn ImageCodec,
    logger: SessionLogger,
    processor: FrameProcessor,
    output_path: PathBuf,
    state: SessionState,
}

impl<'a> Session<'a> {
    async fn open(
        handle: SessionHandle,
        settings: &'a SessionSettings,
        sinks: &dyn SinkFactory,
        codec: &'a dyn ImageCodec,
        logger: SessionLogger,
    ) -> Result<Session<'a>, (SessionHandle, SessionLogger, SessionError)> {
        let output_path = output_path(&settings.output_dir, handle.client_id(), Local::now());

        let opened = async {
            tokio::fs::create_dir_all(&settings.output_dir)
                .await
                .map_err(|e| {
                    SessionError::sink(format!(
                        "cannot create output directory {}: {}",
                        settings.output_dir.display(),
                        e
                    ))
                })?;
            let mut processor = FrameProcessor::new(settings.processor)?;
            processor.open_output(sinks, &output_path)?;
            Ok::<_, SessionError>(processor)
        }
        .await;

        match opened {
            Ok(processor) => {
                logger.log_start(&format!("writing {}", output_path.display()));
                Ok(Session {
                    handle,
                    settings,
                    codec,
                    logger,
                    processor,
                    output_path,
                    state: SessionState::Active,
                })
            }
            Err(err) => Err((handle, logger, err)),
        }
    }

    async fn run<S>(&mut self, inbound: S) -> SessionOutcome
    where
        S: Stream<Item = Result<InboundMessage, SessionError>>,
    {
        let mut inbound = std::pin::pin!(inbound);

        while self.state == SessionState::Active {
            let Some(item) = inbound.next().await else {
                self.logger.log_warning("client disconnected before stop");
                return SessionOutcome::Disconnected;
            };
            metrics::record_ws_message_received();

            let message = match item {
                Ok(message) => message,
                Err(SessionError::Disconnected) => {
                    self.logger.log_warning("client disconnected before stop");
                    return SessionOutcome::Disconnected;
                }
                Err(err) => return self.fail(err).await,
            };

            match message {
                InboundMessage::Frame { data } => {
                    if data.is_empty() {
                        debug!("Ignoring frame message without data");
                        continue;
                    }
                    match self.handle_frame(&data).await {
                        Ok(()) => {}
                        Err(SessionError::Decode(msg)) if self.settings.skip_invalid_frames => {
                            self.logger.log_warning(&format!("skipping invalid frame: {}", msg));
                            self.handle
                                .send(OutboundMessage::error(SessionError::Decode(msg).to_string()))
                                .await;
                        }
                        Err(err) => return self.fail(err).await,
                    }
                }
                InboundMessage::Stop => return self.complete().await,
                InboundMessage::Unknown => debug!("Ignoring unknown message type"),
            }
        }

        SessionOutcome::Disconnected
    }

    async fn handle_frame(&mut self, data: &str) -> Result<(), SessionError> {
        let started = Instant::now();
        let frame = frame_from_base64(self.codec, data)?;
        let outcome = self.processor.process_frame(frame).await?;
        metrics::record_frame_processed(started.elapsed());

        if let Some(representative) = outcome.representative {
            metrics::record_scene_closed();
            let preview = frame_to_base64(self.codec, &representative, self.settings.preview_quality)?;
            if !self.handle.send(OutboundMessage::processed_frame(preview)).await {
                debug!("Preview dropped, peer is gone");
            }
        }
        Ok(())
    }

    async fn complete(&mut self) -> SessionOutcome {
        self.state = SessionState::Closed;
        match self.processor.finish().await {
            Ok(statistics) => {
                let path = self.output_path.to_string_lossy().into_owned();
                self.handle
                    .send(OutboundMessage::completed(path, statistics))
                    .await;
                self.logger.log_completion(&format!(
                    "{} frames in {}",
                    statistics.total_frames,
                    self.output_path.display()
                ));
                SessionOutcome::Completed {
                    output_path: self.output_path.clone(),
                    statistics,
                }
            }
            Err(err) => self.fail(err.into()).await,
        }
    }

    /// Report a failure once and end the session.
    async fn fail(&mut self, err: SessionError) -> SessionOutcome {
        self.state = SessionState::Closed;
        self.logger.log_error(&format!("[{}] {}", err.kind(), err));
        if err.is_reportable() {
            self.handle.send(OutboundMessage::error(err.to_string())).await;
        }
        SessionOutcome::Failed(err)
    }

    /// Release the output and per-session state. Consumes the registry handle.
    async fn cleanup(mut self) {
        self.state = SessionState::Closed;
        if let Err(e) = self.processor.close().await {
            self.logger.log_warning(&format!("output did not close cleanly: {}", e));
        }
        self.processor.reset();
        debug!(
            frames_received = self.processor.frames_received(),
            "Session resources released"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_output_path_format() {
        let started = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        let path = output_path(
            Path::new("outputs"),
            &ClientId::parse("cam-1").unwrap(),
            started,
        );
        assert_eq!(path, PathBuf::from("outputs/output_cam-1_20240309_070501.mp4"));
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(SessionOutcome::Disconnected.label(), "disconnected");
        assert_eq!(
            SessionOutcome::Failed(SessionError::protocol("x")).label(),
            "failed"
        );
    }
}
