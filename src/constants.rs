//! Global constants for the image source pipeline

use std::time::Duration;

/// Seconds between two modification-time checks of the backing file
pub const FILE_CHECK_INTERVAL_SECS: f32 = 1.0;

/// Default number of background decode workers
pub const DEFAULT_LOADER_WORKERS: usize = 2;

/// Thread name prefix for decode workers
pub const LOADER_THREAD_NAME: &str = "image-loader";

/// Frame delays shorter than this are treated as "unspecified"
pub const MIN_FRAME_DELAY: Duration = Duration::from_millis(20);

/// Delay used for frames with an unspecified (or too short) delay
pub const DEFAULT_FRAME_DELAY: Duration = Duration::from_millis(100);

/// Bytes per pixel of the decoded RGBA8 representation
pub const BYTES_PER_PIXEL: usize = 4;
