//! Decoded image representation.
//!
//! An [`ImageFile`] owns the CPU-side pixels of a still image or of every
//! frame of an animation, plus the GPU texture created from it once it has
//! been published. It is moved between the in-flight job, the pending slot
//! and the active slot, never cloned.

use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{BYTES_PER_PIXEL, DEFAULT_FRAME_DELAY, MIN_FRAME_DELAY};
use crate::error::DecodeError;
use crate::graphics::{Graphics, TextureHandle};

/// How alpha is premultiplied into the color channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlphaMode {
    /// Multiply the sRGB-encoded values directly
    #[default]
    Premultiply,
    /// Decode to linear light, multiply, re-encode
    PremultiplySrgb,
}

impl AlphaMode {
    /// Map the `linear_alpha` setting to a mode.
    pub fn from_linear_alpha(linear_alpha: bool) -> Self {
        if linear_alpha {
            AlphaMode::PremultiplySrgb
        } else {
            AlphaMode::Premultiply
        }
    }
}

/// Color space the texture samples are in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorSpace {
    /// 8-bit sRGB
    #[default]
    Srgb,
    /// Half-float sRGB primaries, for high bit depth decoders
    Srgb16F,
}

/// One frame of premultiplied RGBA8 pixels.
#[derive(Debug)]
pub struct Frame {
    /// RGBA pixel data (width * height * 4 bytes)
    pub pixels: Vec<u8>,
    /// How long the frame stays on screen, as stored in the file
    pub delay: Duration,
}

impl Frame {
    pub fn new(pixels: Vec<u8>, delay: Duration) -> Self {
        Self { pixels, delay }
    }
}

/// Normalize a frame delay: tiny or zero delays play at the default rate.
pub fn effective_delay(delay: Duration) -> Duration {
    if delay < MIN_FRAME_DELAY {
        DEFAULT_FRAME_DELAY
    } else {
        delay
    }
}

/// A decoded image or animation, possibly with a GPU texture attached.
#[derive(Debug)]
pub struct ImageFile {
    path: PathBuf,
    width: u32,
    height: u32,
    frames: Vec<Frame>,
    durations: Vec<Duration>,
    loaded: bool,
    space: ColorSpace,
    texture: Option<TextureHandle>,
}

impl ImageFile {
    /// Representation of a file that could not be decoded.
    pub fn failed(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            width: 0,
            height: 0,
            frames: Vec::new(),
            durations: Vec::new(),
            loaded: false,
            space: ColorSpace::Srgb,
            texture: None,
        }
    }

    /// A single-frame image.
    pub fn still(
        path: impl Into<PathBuf>,
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    ) -> Result<Self, DecodeError> {
        Self::animated(path, width, height, vec![Frame::new(pixels, Duration::ZERO)])
    }

    /// An image with one or more frames; more than one frame is an animation.
    pub fn animated(
        path: impl Into<PathBuf>,
        width: u32,
        height: u32,
        frames: Vec<Frame>,
    ) -> Result<Self, DecodeError> {
        let path = path.into();
        if frames.is_empty() {
            return Err(DecodeError::EmptyAnimation { path });
        }

        let expected = width as usize * height as usize * BYTES_PER_PIXEL;
        if let Some(bad) = frames.iter().find(|f| f.pixels.len() != expected) {
            return Err(DecodeError::FrameSize {
                expected,
                found: bad.pixels.len(),
            });
        }

        let durations = frames.iter().map(|f| effective_delay(f.delay)).collect();

        Ok(Self {
            path,
            width,
            height,
            frames,
            durations,
            loaded: true,
            space: ColorSpace::Srgb,
            texture: None,
        })
    }

    /// Builder: tag the samples with a color space.
    pub fn with_color_space(mut self, space: ColorSpace) -> Self {
        self.space = space;
        self
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Whether decoding produced pixels.
    pub fn loaded(&self) -> bool {
        self.loaded
    }

    /// Whether the image has more than one frame.
    pub fn is_animated(&self) -> bool {
        self.frames.len() > 1
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn color_space(&self) -> ColorSpace {
        self.space
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    /// Effective per-frame durations, used by the animation clock.
    pub fn durations(&self) -> &[Duration] {
        &self.durations
    }

    /// GPU texture, present once the image has been published.
    pub fn texture(&self) -> Option<TextureHandle> {
        self.texture
    }

    /// Total size of the CPU-side pixel data.
    pub fn byte_size(&self) -> usize {
        self.frames.iter().map(|f| f.pixels.len()).sum()
    }

    /// Create the GPU texture from frame 0. Gate must be held.
    pub(crate) fn init_texture(&mut self, graphics: &mut dyn Graphics) {
        if !self.loaded || self.texture.is_some() {
            return;
        }
        if let Some(first) = self.frames.first() {
            self.texture = graphics.create_texture(self.width, self.height, &first.pixels);
        }
    }

    /// Upload frame `index` into the existing texture. Gate must be held.
    pub(crate) fn update_texture(&mut self, graphics: &mut dyn Graphics, index: usize) {
        if let (Some(texture), Some(frame)) = (self.texture, self.frames.get(index)) {
            graphics.update_texture(texture, &frame.pixels);
        }
    }

    /// Destroy the GPU texture, if any. Gate must be held.
    pub(crate) fn release_texture(&mut self, graphics: &mut dyn Graphics) {
        if let Some(texture) = self.texture.take() {
            graphics.destroy_texture(texture);
        }
    }
}

impl Drop for ImageFile {
    fn drop(&mut self) {
        if let Some(texture) = self.texture {
            log::warn!(
                "Image {:?} dropped with live texture {:?}",
                self.path,
                texture
            );
        }
    }
}
