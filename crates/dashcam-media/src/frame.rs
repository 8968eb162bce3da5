//! Raw frame buffers.

use image::RgbImage;

use crate::error::{MediaError, MediaResult};

/// Byte order of the three color channels in a packed pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelOrder {
    #[default]
    Rgb,
    Bgr,
}

/// A decoded frame: packed 8-bit, 3-channel pixels in row-major order.
///
/// Frames are plain owned buffers. Retaining a frame anywhere (reference
/// frame, scene buffer) clones it, so no two stages alias the same pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    order: ChannelOrder,
    data: Vec<u8>,
}

impl Frame {
    /// Bytes per pixel.
    pub const CHANNELS: usize = 3;

    /// Wrap a packed pixel buffer, checking its length against the dimensions.
    pub fn new(width: u32, height: u32, order: ChannelOrder, data: Vec<u8>) -> MediaResult<Self> {
        let expected = width as usize * height as usize * Self::CHANNELS;
        if width == 0 || height == 0 {
            return Err(MediaError::decode(format!(
                "empty frame {}x{}",
                width, height
            )));
        }
        if data.len() != expected {
            return Err(MediaError::decode(format!(
                "buffer of {} bytes does not match {}x{} frame ({} bytes)",
                data.len(),
                width,
                height,
                expected
            )));
        }
        Ok(Self {
            width,
            height,
            order,
            data,
        })
    }

    /// Frame of a single RGB color.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let pixels = width as usize * height as usize;
        let mut data = Vec::with_capacity(pixels * Self::CHANNELS);
        for _ in 0..pixels {
            data.extend_from_slice(&rgb);
        }
        Self {
            width,
            height,
            order: ChannelOrder::Rgb,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn order(&self) -> ChannelOrder {
        self.order
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Iterate pixels as `[r, g, b]` regardless of the stored channel order.
    pub fn rgb_pixels(&self) -> impl Iterator<Item = [u8; 3]> + '_ {
        let order = self.order;
        self.data.chunks_exact(Self::CHANNELS).map(move |px| match order {
            ChannelOrder::Rgb => [px[0], px[1], px[2]],
            ChannelOrder::Bgr => [px[2], px[1], px[0]],
        })
    }

    /// Overwrite the pixel at (x, y) with an RGB color.
    pub fn set_rgb(&mut self, x: u32, y: u32, rgb: [u8; 3]) -> MediaResult<()> {
        if x >= self.width || y >= self.height {
            return Err(MediaError::PixelOutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        let offset = (y as usize * self.width as usize + x as usize) * Self::CHANNELS;
        let px = match self.order {
            ChannelOrder::Rgb => rgb,
            ChannelOrder::Bgr => [rgb[2], rgb[1], rgb[0]],
        };
        self.data[offset..offset + Self::CHANNELS].copy_from_slice(&px);
        Ok(())
    }

    /// Convert to an RGB image buffer.
    pub fn to_rgb_image(&self) -> RgbImage {
        let data = match self.order {
            ChannelOrder::Rgb => self.data.clone(),
            ChannelOrder::Bgr => self.rgb_pixels().flatten().collect(),
        };
        // Length was validated on construction.
        RgbImage::from_raw(self.width, self.height, data)
            .unwrap_or_else(|| RgbImage::new(self.width, self.height))
    }

    /// Raw RGB24 bytes, converting from BGR when needed.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        match self.order {
            ChannelOrder::Rgb => self.data.clone(),
            ChannelOrder::Bgr => self.rgb_pixels().flatten().collect(),
        }
    }
}

impl From<RgbImage> for Frame {
    fn from(image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            order: ChannelOrder::Rgb,
            data: image.into_raw(),
        }
    }
}
