//! Caller-owned pixel buffers.

use image::RgbaImage;

use crate::metadata::VideoStream;

/// Width used when the declared width is not positive.
pub const FALLBACK_WIDTH: u32 = 1920;
/// Height used when the declared height is not positive.
pub const FALLBACK_HEIGHT: u32 = 1080;

/// A tightly packed RGBA8 buffer with dimensions fixed up front.
///
/// [`FrameLoader::load_into`](crate::FrameLoader::load_into) scales the
/// decoded frame to exactly these dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Allocate a zeroed buffer.
    ///
    /// If either declared dimension is not positive, the buffer falls back
    /// to 1920×1080.
    pub fn new(width: i32, height: i32) -> Self {
        let (width, height) = if width > 0 && height > 0 {
            (width as u32, height as u32)
        } else {
            (FALLBACK_WIDTH, FALLBACK_HEIGHT)
        };
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    /// Allocate a buffer matching a video stream's coded size.
    pub fn for_stream(stream: &VideoStream) -> Self {
        Self::new(stream.frame_width, stream.frame_height)
    }

    /// Buffer width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Buffer height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row stride in bytes.
    pub fn stride(&self) -> usize {
        self.width as usize * 4
    }

    /// Raw RGBA bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Mutable raw RGBA bytes.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Overwrite the buffer from an image of the same size.
    ///
    /// Returns `false` and leaves the buffer untouched on a size mismatch.
    pub fn copy_from_image(&mut self, image: &RgbaImage) -> bool {
        if image.width() != self.width || image.height() != self.height {
            return false;
        }
        self.data.copy_from_slice(image.as_raw());
        true
    }

    /// Convert into an [`RgbaImage`].
    pub fn into_image(self) -> RgbaImage {
        let (width, height) = (self.width, self.height);
        // Length is width * height * 4 by construction.
        RgbaImage::from_raw(width, height, self.data)
            .unwrap_or_else(|| RgbaImage::new(width, height))
    }
}
