//! FFmpeg-backed output sink.
//!
//! Frames are piped to an `ffmpeg` child process as raw RGB24 and encoded
//! into an MP4 container. Closing stdin signals end of stream; FFmpeg then
//! writes the container trailer and exits.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};
use tracing::{debug, warn};

use crate::assembler::{SinkFactory, SinkSpec, VideoSink};
use crate::error::{MediaError, MediaResult};
use crate::frame::Frame;

/// Default video codec for assembled output.
pub const DEFAULT_VIDEO_CODEC: &str = "mpeg4";

/// Check that FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

/// Build the FFmpeg argument list for a raw RGB24 stdin input.
pub fn ffmpeg_args(spec: &SinkSpec, codec: &str) -> Vec<String> {
    let mut args: Vec<String> = [
        "-hide_banner",
        "-loglevel",
        "error",
        "-y",
        "-f",
        "rawvideo",
        "-pix_fmt",
        "rgb24",
        "-s",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    args.push(format!("{}x{}", spec.width, spec.height));
    args.push("-r".to_string());
    args.push(spec.fps.to_string());
    args.push("-i".to_string());
    args.push("-".to_string());

    args.extend(
        ["-an", "-c:v", codec, "-q:v", "3", "-pix_fmt", "yuv420p"]
            .iter()
            .map(|s| s.to_string()),
    );
    args.push(spec.path.to_string_lossy().into_owned());
    args
}

/// Opens [`FfmpegSink`]s.
#[derive(Debug, Clone)]
pub struct FfmpegSinkFactory {
    codec: String,
}

impl FfmpegSinkFactory {
    pub fn new() -> Self {
        Self {
            codec: DEFAULT_VIDEO_CODEC.to_string(),
        }
    }

    /// Use a different FFmpeg video encoder.
    pub fn with_codec(mut self, codec: impl Into<String>) -> Self {
        self.codec = codec.into();
        self
    }

    pub fn codec(&self) -> &str {
        &self.codec
    }
}

impl Default for FfmpegSinkFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl SinkFactory for FfmpegSinkFactory {
    fn open(&self, spec: &SinkSpec) -> MediaResult<Box<dyn VideoSink>> {
        Ok(Box::new(FfmpegSink::spawn(spec, &self.codec)?))
    }
}

/// Output video encoded by an FFmpeg child process.
pub struct FfmpegSink {
    path: PathBuf,
    frame_bytes: usize,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
}

impl FfmpegSink {
    /// Spawn FFmpeg writing to `spec.path`.
    pub fn spawn(spec: &SinkSpec, codec: &str) -> MediaResult<Self> {
        check_ffmpeg()?;

        let args = ffmpeg_args(spec, codec);
        debug!(args = ?args, "Spawning FFmpeg sink");

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                MediaError::sink(format!("Failed to spawn FFmpeg: {}", e), Some(spec.path.clone()))
            })?;

        let stdin = child.stdin.take().ok_or_else(|| {
            MediaError::sink("Failed to capture FFmpeg stdin", Some(spec.path.clone()))
        })?;

        Ok(Self {
            path: spec.path.clone(),
            frame_bytes: spec.width as usize * spec.height as usize * Frame::CHANNELS,
            child: Some(child),
            stdin: Some(stdin),
        })
    }
}

#[async_trait]
impl VideoSink for FfmpegSink {
    async fn write_frame(&mut self, frame: &Frame) -> MediaResult<()> {
        let bytes = frame.to_rgb_bytes();
        if bytes.len() != self.frame_bytes {
            return Err(MediaError::sink(
                format!(
                    "frame of {} bytes does not match output frame size ({} bytes)",
                    bytes.len(),
                    self.frame_bytes
                ),
                Some(self.path.clone()),
            ));
        }

        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| MediaError::sink("FFmpeg sink is finished", Some(self.path.clone())))?;
        stdin.write_all(&bytes).await.map_err(|e| {
            MediaError::sink(format!("Failed to write frame to FFmpeg: {}", e), Some(self.path.clone()))
        })
    }

    async fn finish(&mut self) -> MediaResult<()> {
        if let Some(mut stdin) = self.stdin.take() {
            if let Err(e) = stdin.flush().await {
                warn!(error = %e, "Failed to flush FFmpeg stdin");
            }
            // Dropping stdin closes the pipe.
        }

        let Some(child) = self.child.take() else {
            return Ok(());
        };

        let output = child.wait_with_output().await.map_err(|e| {
            MediaError::sink(format!("FFmpeg process error: {}", e), Some(self.path.clone()))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MediaError::sink(
                format!(
                    "FFmpeg exited with status {:?}: {}",
                    output.status.code(),
                    stderr.trim()
                ),
                Some(self.path.clone()),
            ));
        }

        debug!(path = %self.path.display(), "FFmpeg sink finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(path: PathBuf) -> SinkSpec {
        SinkSpec {
            path,
            fps: 30,
            width: 16,
            height: 8,
        }
    }

    #[test]
    fn test_ffmpeg_args() {
        let args = ffmpeg_args(&spec(PathBuf::from("out/video.mp4")), "mpeg4");
        let joined = args.join(" ");
        assert!(joined.contains("-f rawvideo -pix_fmt rgb24 -s 16x8 -r 30 -i -"));
        assert!(joined.contains("-c:v mpeg4"));
        assert_eq!(args.last().map(String::as_str), Some("out/video.mp4"));
    }

    #[test]
    fn test_factory_codec() {
        assert_eq!(FfmpegSinkFactory::default().codec(), DEFAULT_VIDEO_CODEC);
        assert_eq!(FfmpegSinkFactory::new().with_codec("libx264").codec(), "libx264");
    }

    #[tokio::test]
    async fn test_encodes_when_ffmpeg_available() {
        if check_ffmpeg().is_err() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mp4");

        let mut sink = FfmpegSinkFactory::new().open(&spec(path.clone())).unwrap();
        for value in [0u8, 128, 255] {
            sink.write_frame(&Frame::filled(16, 8, [value, value, value]))
                .await
                .unwrap();
        }
        sink.finish().await.unwrap();
        sink.finish().await.unwrap();

        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[tokio::test]
    async fn test_rejects_wrong_frame_size_when_ffmpeg_available() {
        if check_ffmpeg().is_err() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FfmpegSinkFactory::new()
            .open(&spec(dir.path().join("out.mp4")))
            .unwrap();
        let err = sink.write_frame(&Frame::filled(4, 4, [0, 0, 0])).await.unwrap_err();
        assert!(err.is_sink_error());
        let _ = sink.finish().await;
    }
}
