//! Still-image codec for inbound frames and outbound previews.
//!
//! Clients send each captured frame as a base64-encoded compressed still
//! (JPEG in practice, anything the `image` crate can sniff is accepted).
//! Previews of representative frames go back out as JPEG.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::ColorType;

use crate::error::{MediaError, MediaResult};
use crate::frame::{ChannelOrder, Frame};

/// Default JPEG quality of outbound previews.
pub const DEFAULT_PREVIEW_QUALITY: u8 = 80;

/// Converts between compressed stills and raw frames.
pub trait ImageCodec: Send + Sync {
    /// Decode a compressed still. Never returns a partially valid frame.
    fn decode(&self, bytes: &[u8]) -> MediaResult<Frame>;

    /// Encode a frame with the given quality (0-100).
    fn encode(&self, frame: &Frame, quality: u8) -> MediaResult<Vec<u8>>;
}

/// `image`-crate backed codec producing JPEG output.
#[derive(Debug, Clone, Copy, Default)]
pub struct JpegCodec;

impl ImageCodec for JpegCodec {
    fn decode(&self, bytes: &[u8]) -> MediaResult<Frame> {
        if bytes.is_empty() {
            return Err(MediaError::decode("empty image payload"));
        }
        let image = image::load_from_memory(bytes)
            .map_err(|e| MediaError::decode(e.to_string()))?
            .to_rgb8();
        let (width, height) = image.dimensions();
        Frame::new(width, height, ChannelOrder::Rgb, image.into_raw())
    }

    fn encode(&self, frame: &Frame, quality: u8) -> MediaResult<Vec<u8>> {
        // The encoder's quantization tables are defined for 1..=100.
        let quality = quality.clamp(1, 100);
        let rgb = frame.to_rgb_bytes();
        let mut buf = Vec::new();
        {
            let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality);
            encoder
                .encode(&rgb, frame.width(), frame.height(), ColorType::Rgb8)
                .map_err(|e| MediaError::encode(e.to_string()))?;
        }
        Ok(buf)
    }
}

/// Decode a base64 text payload, tolerating a `data:image/...;base64,` prefix.
pub fn decode_base64_payload(payload: &str) -> MediaResult<Vec<u8>> {
    let payload = payload.trim();
    let encoded = match payload.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => payload,
    };
    STANDARD
        .decode(encoded)
        .map_err(|e| MediaError::decode(format!("invalid base64 payload: {}", e)))
}

/// Encode bytes as standard base64 text.
pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode a base64 payload straight into a frame.
pub fn frame_from_base64(codec: &dyn ImageCodec, payload: &str) -> MediaResult<Frame> {
    let bytes = decode_base64_payload(payload)?;
    codec.decode(&bytes)
}

/// Encode a frame and wrap it as base64 text.
pub fn frame_to_base64(codec: &dyn ImageCodec, frame: &Frame, quality: u8) -> MediaResult<String> {
    let bytes = codec.encode(frame, quality)?;
    Ok(encode_base64(&bytes))
}
