//! Asynchronous image source
//!
//! A display source that shows one image file, decoded on background worker
//! threads and swapped in on the host's video tick. Animated GIF and WebP
//! files play back in step with the host's frame clock, and the file is
//! reloaded when it changes on disk.
//!
//! The host supplies a [`Graphics`] backend per source and drives it through
//! [`ImageSource`]: `create`, `update`, `show`/`hide`, `tick` and `destroy`.

mod animation;
mod clock;
mod config;
mod constants;
mod decode;
mod error;
mod gate;
mod graphics;
mod image_file;
mod loader;
mod probe;
mod settings;
mod source;
mod state;

#[cfg(test)]
mod testing;

pub use animation::{AnimationClock, AnimationState};
pub use clock::{FrameClock, MonotonicClock};
pub use config::{CONFIG_VERSION, LogLevel, PipelineConfig};
pub use constants::{DEFAULT_LOADER_WORKERS, FILE_CHECK_INTERVAL_SECS};
pub use decode::{Decoder, ImageDecoder, premultiply};
pub use error::{ConfigError, DecodeError, LoaderError};
pub use gate::Gate;
pub use graphics::{Graphics, GraphicsCounters, HeadlessGraphics, TextureHandle};
pub use image_file::{AlphaMode, ColorSpace, Frame, ImageFile};
pub use loader::{LoadJob, LoadRequest, LoaderPool};
pub use probe::{FileProbe, FileStamp, FsProbe, stamp_changed};
pub use settings::SourceSettings;
pub use source::{ImageSource, SourceEnv};
pub use state::{LoadStats, PublishOutcome, ResourceState, Staging};
