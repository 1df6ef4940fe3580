//! Active and staged resource slots.

use crate::graphics::TextureHandle;
use crate::image_file::{ColorSpace, ImageFile};
use crate::probe::FileStamp;

/// The resource the source currently shows.
#[derive(Debug, Default)]
pub struct ResourceState {
    /// Path the image was loaded from
    pub path: String,
    /// Stays loaded while hidden
    pub persistent: bool,
    /// Alpha was premultiplied in linear space
    pub linear_alpha: bool,
    /// Modification time of the last successfully decoded version
    pub timestamp: FileStamp,
    /// Decoded representation, if any
    pub image: Option<ImageFile>,
}

impl ResourceState {
    pub fn is_animated(&self) -> bool {
        self.image.as_ref().is_some_and(ImageFile::is_animated)
    }

    pub fn is_loaded(&self) -> bool {
        self.image.as_ref().is_some_and(ImageFile::loaded)
    }

    pub fn width(&self) -> u32 {
        self.image.as_ref().map_or(0, ImageFile::width)
    }

    pub fn height(&self) -> u32 {
        self.image.as_ref().map_or(0, ImageFile::height)
    }

    pub fn texture(&self) -> Option<TextureHandle> {
        self.image.as_ref().and_then(ImageFile::texture)
    }

    /// Color space of the texture; sRGB when nothing is on the GPU.
    pub fn color_space(&self) -> ColorSpace {
        match &self.image {
            Some(image) if image.texture().is_some() => image.color_space(),
            _ => ColorSpace::Srgb,
        }
    }
}

/// A decode result waiting for the next tick to be promoted.
#[derive(Debug)]
pub struct PendingResource {
    pub path: String,
    pub persistent: bool,
    pub linear_alpha: bool,
    /// Set only when the decode succeeded; `None` keeps the active timestamp
    pub timestamp: Option<FileStamp>,
    pub image: ImageFile,
    /// Generation of the request that produced it
    pub generation: u64,
}

/// Outcome counters of the staging area.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Load requests issued
    pub requested: u64,
    /// Results deposited as pending (including ones that replaced another)
    pub published: u64,
    /// Pending results replaced before they were promoted
    pub superseded: u64,
    /// Results dropped because a newer request existed
    pub stale: u64,
    /// Published results whose decode failed
    pub failed: u64,
    /// Pending results moved into the active slot
    pub promoted: u64,
}

/// What happened to a finished decode at publish time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Deposited into an empty pending slot
    Published,
    /// Deposited, replacing an older pending result
    Superseded,
    /// Dropped; a newer request was issued meanwhile
    Stale,
}
