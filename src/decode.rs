//! Decode boundary and the default `image`-crate decoder.
//!
//! The pipeline only needs [`Decoder`]: a routine that turns a path into an
//! [`ImageFile`] and reports failure through `loaded() == false` instead of
//! an error. [`ImageDecoder`] is the stock implementation.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

use image::codecs::gif::GifDecoder;
use image::codecs::webp::WebPDecoder;
use image::{AnimationDecoder, ImageFormat, ImageReader};

use crate::error::DecodeError;
use crate::image_file::{AlphaMode, Frame, ImageFile};

/// Turns a file into a decoded representation.
///
/// Runs on loader worker threads, concurrently with other decodes and with
/// the tick driver. Must not touch the GPU.
pub trait Decoder: Send + Sync {
    /// Decode `path` with premultiplied alpha. Failures return an unloaded image.
    fn decode(&self, path: &Path, alpha_mode: AlphaMode) -> ImageFile;
}

/// Decoder for the formats the `image` crate understands.
///
/// GIF and WebP files with more than one frame become animations; everything
/// else is decoded as a still image.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageDecoder;

impl ImageDecoder {
    /// Decode, keeping the error.
    pub fn try_decode(&self, path: &Path, alpha_mode: AlphaMode) -> Result<ImageFile, DecodeError> {
        let reader = ImageReader::open(path)?.with_guessed_format()?;

        match reader.format() {
            Some(ImageFormat::Gif) => {
                let decoder = GifDecoder::new(BufReader::new(File::open(path)?))?;
                decode_frames(path, decoder, alpha_mode)
            }
            Some(ImageFormat::WebP) => {
                let decoder = WebPDecoder::new(BufReader::new(File::open(path)?))?;
                if decoder.has_animation() {
                    decode_frames(path, decoder, alpha_mode)
                } else {
                    decode_still(path, reader, alpha_mode)
                }
            }
            _ => decode_still(path, reader, alpha_mode),
        }
    }
}

impl Decoder for ImageDecoder {
    fn decode(&self, path: &Path, alpha_mode: AlphaMode) -> ImageFile {
        match self.try_decode(path, alpha_mode) {
            Ok(image) => image,
            Err(e) => {
                log::debug!("Failed to decode {:?}: {}", path, e);
                ImageFile::failed(path)
            }
        }
    }
}

fn decode_still(
    path: &Path,
    reader: ImageReader<BufReader<File>>,
    alpha_mode: AlphaMode,
) -> Result<ImageFile, DecodeError> {
    let rgba = reader.decode()?.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut pixels = rgba.into_raw();
    premultiply(&mut pixels, alpha_mode);
    ImageFile::still(path, width, height, pixels)
}

fn decode_frames<'a>(
    path: &Path,
    decoder: impl AnimationDecoder<'a>,
    alpha_mode: AlphaMode,
) -> Result<ImageFile, DecodeError> {
    let decoded = decoder.into_frames().collect_frames()?;

    let Some(first) = decoded.first() else {
        return Err(DecodeError::EmptyAnimation {
            path: path.to_path_buf(),
        });
    };
    let (width, height) = first.buffer().dimensions();

    let frames = decoded
        .into_iter()
        .map(|frame| {
            let delay = delay_of(&frame);
            let mut pixels = frame.into_buffer().into_raw();
            premultiply(&mut pixels, alpha_mode);
            Frame::new(pixels, delay)
        })
        .collect();

    ImageFile::animated(path, width, height, frames)
}

fn delay_of(frame: &image::Frame) -> Duration {
    let (numer, denom) = frame.delay().numer_denom_ms();
    if denom == 0 {
        return Duration::ZERO;
    }
    Duration::from_nanos(u64::from(numer) * 1_000_000 / u64::from(denom))
}

/// Premultiply RGBA8 pixels in place.
pub fn premultiply(pixels: &mut [u8], mode: AlphaMode) {
    for px in pixels.chunks_exact_mut(4) {
        let alpha = px[3];
        if alpha == u8::MAX {
            continue;
        }
        match mode {
            AlphaMode::Premultiply => {
                for c in &mut px[..3] {
                    *c = ((u16::from(*c) * u16::from(alpha) + 127) / 255) as u8;
                }
            }
            AlphaMode::PremultiplySrgb => {
                let a = f32::from(alpha) / 255.0;
                let table = srgb_to_linear_table();
                for c in &mut px[..3] {
                    *c = linear_to_srgb(table[usize::from(*c)] * a);
                }
            }
        }
    }
}

fn srgb_to_linear_table() -> &'static [f32; 256] {
    static TABLE: OnceLock<[f32; 256]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = [0.0; 256];
        for (i, v) in table.iter_mut().enumerate() {
            let s = i as f32 / 255.0;
            *v = if s <= 0.04045 {
                s / 12.92
            } else {
                ((s + 0.055) / 1.055).powf(2.4)
            };
        }
        table
    })
}

fn linear_to_srgb(v: f32) -> u8 {
    let s = if v <= 0.003_130_8 {
        v * 12.92
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    };
    (s.clamp(0.0, 1.0) * 255.0).round() as u8
}
