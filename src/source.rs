//! Image source lifecycle and per-frame tick.
//!
//! [`ImageSource`] is what the host drives: it is created from settings,
//! updated when settings change, shown and hidden, ticked once per video
//! frame and finally destroyed. Decoding happens on a [`LoaderPool`]; the
//! results come back through the source's gate and are activated by
//! [`ImageSource::tick`].
//!
//! ## Threading
//!
//! All methods run on the host's driver thread. Only `Staging` (behind the
//! gate) is shared with loader workers.

use std::path::Path;
use std::sync::Arc;

use crate::animation::AnimationState;
use crate::clock::{FrameClock, MonotonicClock};
use crate::config::PipelineConfig;
use crate::constants::FILE_CHECK_INTERVAL_SECS;
use crate::decode::{Decoder, ImageDecoder};
use crate::error::LoaderError;
use crate::gate::Gate;
use crate::graphics::{Graphics, TextureHandle};
use crate::image_file::ColorSpace;
use crate::loader::{LoadJob, LoadRequest, LoaderPool};
use crate::probe::{FileProbe, FileStamp, FsProbe, stamp_changed};
use crate::settings::SourceSettings;
use crate::state::{LoadStats, Staging};

/// Collaborators shared by the sources of one host.
#[derive(Clone)]
pub struct SourceEnv {
    /// Worker pool running decodes
    pub loader: Arc<LoaderPool>,
    /// Decode routine
    pub decoder: Arc<dyn Decoder>,
    /// Video frame time base
    pub clock: Arc<dyn FrameClock>,
    /// File metadata queries
    pub probe: Arc<dyn FileProbe>,
    /// Seconds between file change checks
    pub file_check_interval: f32,
}

impl SourceEnv {
    /// Environment with the stock decoder, clock and probe.
    pub fn new(loader: Arc<LoaderPool>) -> Self {
        Self {
            loader,
            decoder: Arc::new(ImageDecoder),
            clock: Arc::new(MonotonicClock::new()),
            probe: Arc::new(FsProbe),
            file_check_interval: FILE_CHECK_INTERVAL_SECS,
        }
    }

    /// Spawn a loader pool sized by `config` and wrap it.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, LoaderError> {
        let loader = Arc::new(LoaderPool::spawn(config.workers)?);
        Ok(Self::new(loader).with_check_interval(config.file_check_interval_secs))
    }

    pub fn with_decoder(mut self, decoder: Arc<dyn Decoder>) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn FrameClock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_probe(mut self, probe: Arc<dyn FileProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn with_check_interval(mut self, seconds: f32) -> Self {
        self.file_check_interval = seconds;
        self
    }
}

impl std::fmt::Debug for SourceEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceEnv")
            .field("loader", &self.loader)
            .field("file_check_interval", &self.file_check_interval)
            .finish_non_exhaustive()
    }
}

/// An image source: one file, loaded in the background, shown by the host.
#[derive(Debug)]
pub struct ImageSource {
    settings: SourceSettings,
    env: SourceEnv,
    gate: Arc<Gate<Staging>>,
    animation: AnimationState,
    showing: bool,
    /// Seconds accumulated towards the next file check
    update_time_elapsed: f32,
    /// Stamp of the newest request not yet promoted
    in_flight: Option<FileStamp>,
}

impl ImageSource {
    /// Create a source and apply its initial settings.
    pub fn create(settings: SourceSettings, env: SourceEnv, graphics: Box<dyn Graphics>) -> Self {
        log::debug!("Creating image source for {:?}", settings.path);
        let mut source = Self {
            settings: SourceSettings::default(),
            env,
            gate: Arc::new(Gate::new(Staging::new(graphics))),
            animation: AnimationState::default(),
            showing: false,
            update_time_elapsed: 0.0,
            in_flight: None,
        };
        source.update(settings);
        source
    }

    /// Apply new settings. Loads if the source is persistent or showing,
    /// otherwise unloads.
    pub fn update(&mut self, settings: SourceSettings) {
        log::debug!("Updating image source: {:?}", settings);
        self.settings = settings;

        if self.settings.persistent() || self.showing {
            self.load();
        } else {
            self.unload();
        }
    }

    /// The source became visible.
    pub fn show(&mut self) {
        log::debug!("Showing image source {:?}", self.settings.path);
        self.showing = true;
        if !self.settings.persistent() {
            self.load();
        }
    }

    /// The source stopped being visible.
    pub fn hide(&mut self) {
        log::debug!("Hiding image source {:?}", self.settings.path);
        self.showing = false;
        if !self.settings.persistent() {
            self.unload();
        }
    }

    /// The source became active in the output; animations restart.
    pub fn activate(&mut self) {
        self.animation.restart_requested = true;
    }

    /// Free everything. Decodes still in flight are dropped on arrival.
    pub fn destroy(self) {
        drop(self);
    }

    /// Per-frame driver. `seconds` is the time since the previous tick.
    pub fn tick(&mut self, seconds: f32) {
        let frame_time = self.env.clock.frame_time();
        self.update_time_elapsed += seconds;

        self.activate_pending();

        if self.showing && self.update_time_elapsed >= self.env.file_check_interval {
            self.update_time_elapsed = 0.0;
            self.check_file();
        }

        let animated = self.gate.with(|staging| staging.current().is_animated());

        if self.showing {
            if !self.animation.active {
                if animated {
                    self.animation.last_tick = Some(frame_time);
                }
                self.animation.active = true;
            }
            if self.animation.restart_requested {
                self.restart_animation();
            }
        } else {
            if self.animation.active {
                self.restart_animation();
                self.animation.active = false;
            }
            return;
        }

        if animated && self.animation.active {
            if let Some(elapsed) = self.animation.elapsed_since(frame_time) {
                let mut staging = self.gate.enter();
                staging.advance_animation(&mut self.animation.clock, elapsed);
            }
        }

        self.animation.last_tick = Some(frame_time);
    }

    /// Width of the active image, 0 without one.
    pub fn width(&self) -> u32 {
        self.gate.with(|staging| staging.current().width())
    }

    /// Height of the active image, 0 without one.
    pub fn height(&self) -> u32 {
        self.gate.with(|staging| staging.current().height())
    }

    /// Color space the host should sample the texture in.
    pub fn color_space(&self) -> ColorSpace {
        self.gate.with(|staging| staging.current().color_space())
    }

    /// Texture the host should draw, if any.
    pub fn active_texture(&self) -> Option<TextureHandle> {
        self.gate.with(|staging| staging.current().texture())
    }

    /// The configured file, if it is set and missing on disk.
    pub fn missing_files(&self) -> Vec<String> {
        let path = &self.settings.path;
        if path.is_empty() || self.env.probe.exists(Path::new(path)) {
            Vec::new()
        } else {
            vec![path.clone()]
        }
    }

    pub fn settings(&self) -> &SourceSettings {
        &self.settings
    }

    pub fn is_showing(&self) -> bool {
        self.showing
    }

    /// Path of the active image.
    pub fn active_path(&self) -> String {
        self.gate.with(|staging| staging.current().path.clone())
    }

    /// Whether the active image decoded successfully.
    pub fn is_loaded(&self) -> bool {
        self.gate.with(|staging| staging.current().is_loaded())
    }

    /// Modification time recorded for the active image.
    pub fn active_timestamp(&self) -> FileStamp {
        self.gate.with(|staging| staging.current().timestamp)
    }

    /// Whether a decode result is waiting for the next tick.
    pub fn has_pending(&self) -> bool {
        self.gate.with(|staging| staging.has_pending())
    }

    pub fn generation(&self) -> u64 {
        self.gate.with(|staging| staging.generation())
    }

    pub fn load_stats(&self) -> LoadStats {
        self.gate.with(|staging| staging.stats())
    }

    pub fn animation(&self) -> &AnimationState {
        &self.animation
    }

    /// Snapshot the current settings and hand them to the loader.
    fn load(&mut self) {
        if self.settings.path.is_empty() {
            log::debug!("No file set, clearing image");
            self.unload();
            return;
        }

        let timestamp = self.env.probe.modified_time(Path::new(&self.settings.path));
        let generation = self.gate.with(Staging::next_generation);
        let request = LoadRequest {
            path: self.settings.path.clone(),
            persistent: self.settings.persistent(),
            alpha_mode: self.settings.alpha_mode(),
            timestamp,
            generation,
        };
        log::debug!(
            "Requesting load of {:?} (generation {})",
            request.path,
            generation
        );

        let job = LoadJob::new(
            request,
            Arc::clone(&self.env.decoder),
            Arc::clone(&self.gate),
        );
        match self.env.loader.submit(job) {
            Ok(()) => self.in_flight = Some(timestamp),
            Err(e) => {
                log::error!("Could not queue load of {:?}: {}", self.settings.path, e);
                self.in_flight = None;
            }
        }
    }

    /// Free the active image now, and drop anything staged or in flight.
    fn unload(&mut self) {
        self.gate.with(Staging::unload);
        self.in_flight = None;
    }

    /// Promote a staged decode, if one is waiting.
    fn activate_pending(&mut self) {
        let mut staging = self.gate.enter();
        if let Some(generation) = staging.promote() {
            self.animation.clock.reset();
            if generation == staging.generation() {
                self.in_flight = None;
            }
        }
    }

    /// Reload if the backing file changed since the newest request.
    fn check_file(&mut self) {
        if self.settings.path.is_empty() {
            return;
        }

        let current = self.env.probe.modified_time(Path::new(&self.settings.path));
        let reference = match self.in_flight {
            Some(stamp) => stamp,
            None => self.gate.with(|staging| staging.current().timestamp),
        };

        if stamp_changed(reference, current) {
            log::debug!("File {:?} changed, reloading", self.settings.path);
            self.load();
        }
    }

    fn restart_animation(&mut self) {
        self.animation.clock.reset();
        self.animation.restart_requested = false;
        self.gate.with(|staging| staging.show_frame(0));
    }
}

impl Drop for ImageSource {
    fn drop(&mut self) {
        log::debug!("Destroying image source {:?}", self.settings.path);
        self.unload();
    }
}
