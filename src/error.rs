//! Error types for the image source pipeline.
//!
//! None of these escape the pipeline as a fault. Decode errors become an
//! unloaded representation, loader errors are logged at the call site.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while decoding an image file.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// I/O error while opening or reading the file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The image codec rejected the data
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// An animation container held no frames
    #[error("Animation has no frames: {path:?}")]
    EmptyAnimation {
        /// Path of the offending file
        path: PathBuf,
    },

    /// Decoded pixel data does not match the reported dimensions
    #[error("Frame size mismatch: expected {expected} bytes, found {found}")]
    FrameSize {
        /// Byte length implied by width and height
        expected: usize,
        /// Byte length actually decoded
        found: usize,
    },
}

/// Errors from the background loader pool.
#[derive(Error, Debug)]
pub enum LoaderError {
    /// A worker thread could not be spawned
    #[error("Failed to spawn loader worker: {0}")]
    Spawn(#[source] std::io::Error),

    /// The pool has shut down and no longer accepts jobs
    #[error("Loader queue closed")]
    Closed,
}

/// Errors while reading pipeline configuration or source settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// I/O error reading the configuration file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Version newer than this build understands
    #[error("Unsupported config version {found} (newest supported: {supported})")]
    UnsupportedVersion {
        /// Version found in the file
        found: u32,
        /// Newest version this build reads
        supported: u32,
    },
}
