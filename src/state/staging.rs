//! Data guarded by a source's gate.
//!
//! [`Staging`] owns the graphics backend together with the active and pending
//! slots, so textures can only be created, refreshed or destroyed by code
//! that holds the gate.

use std::time::Duration;

use crate::animation::AnimationClock;
use crate::graphics::Graphics;
use crate::image_file::ImageFile;
use crate::loader::LoadRequest;

use super::resource::{LoadStats, PendingResource, PublishOutcome, ResourceState};

/// Active and pending resources of one source, plus its generation counter.
pub struct Staging {
    graphics: Box<dyn Graphics>,
    current: ResourceState,
    pending: Option<PendingResource>,
    generation: u64,
    stats: LoadStats,
}

impl Staging {
    pub fn new(graphics: Box<dyn Graphics>) -> Self {
        Self {
            graphics,
            current: ResourceState::default(),
            pending: None,
            generation: 0,
            stats: LoadStats::default(),
        }
    }

    /// The active resource.
    pub fn current(&self) -> &ResourceState {
        &self.current
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Generation of the most recent request or unload.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn stats(&self) -> LoadStats {
        self.stats
    }

    /// Open a new generation for a load request.
    pub fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.stats.requested += 1;
        self.generation
    }

    /// Deposit a finished decode as the pending resource.
    ///
    /// Dropped if `request` is no longer the newest generation. Otherwise any
    /// older pending result is freed and the new one gets its texture.
    pub fn publish(&mut self, request: &LoadRequest, mut image: ImageFile) -> PublishOutcome {
        if request.generation < self.generation {
            log::debug!(
                "Discarding outdated load of {:?} (generation {} < {})",
                request.path,
                request.generation,
                self.generation
            );
            self.stats.stale += 1;
            drop(image);
            return PublishOutcome::Stale;
        }

        let outcome = match self.pending.take() {
            Some(previous) => {
                log::debug!("Discarding unpromoted texture {:?}", previous.path);
                Self::free(self.graphics.as_mut(), previous.image);
                self.stats.superseded += 1;
                PublishOutcome::Superseded
            }
            None => PublishOutcome::Published,
        };

        image.init_texture(self.graphics.as_mut());

        let timestamp = if image.loaded() {
            Some(request.timestamp)
        } else {
            self.stats.failed += 1;
            None
        };

        self.pending = Some(PendingResource {
            path: request.path.clone(),
            persistent: request.persistent,
            linear_alpha: request.linear_alpha(),
            timestamp,
            image,
            generation: request.generation,
        });
        self.stats.published += 1;
        outcome
    }

    /// Move the pending resource into the active slot.
    ///
    /// Returns the generation it was requested under, or `None` if nothing
    /// was pending.
    pub fn promote(&mut self) -> Option<u64> {
        let pending = self.pending.take()?;

        log::debug!("Activating texture {:?}", pending.path);
        if let Some(old) = self.current.image.take() {
            Self::free(self.graphics.as_mut(), old);
        }

        self.current.path = pending.path;
        self.current.persistent = pending.persistent;
        self.current.linear_alpha = pending.linear_alpha;
        if let Some(timestamp) = pending.timestamp {
            self.current.timestamp = timestamp;
        }
        self.current.image = Some(pending.image);
        self.stats.promoted += 1;

        Some(pending.generation)
    }

    /// Free the active resource and anything staged, immediately.
    ///
    /// Also opens a new generation so decodes still in flight are dropped
    /// when they finish.
    pub fn unload(&mut self) {
        self.generation += 1;
        if let Some(pending) = self.pending.take() {
            Self::free(self.graphics.as_mut(), pending.image);
        }
        if let Some(image) = self.current.image.take() {
            log::debug!("Unloaded texture {:?}", self.current.path);
            Self::free(self.graphics.as_mut(), image);
        }
    }

    /// Advance the active animation by `elapsed` and upload the frame if it
    /// changed. Returns whether it changed.
    pub fn advance_animation(&mut self, clock: &mut AnimationClock, elapsed: Duration) -> bool {
        let Some(image) = self.current.image.as_mut() else {
            return false;
        };
        if !image.is_animated() {
            return false;
        }

        let changed = clock.advance(elapsed, image.durations());
        if changed {
            log::trace!("Animation of {:?} at frame {}", image.path(), clock.frame_index());
            image.update_texture(self.graphics.as_mut(), clock.frame_index());
        }
        changed
    }

    /// Upload frame `index` of the active animation.
    pub fn show_frame(&mut self, index: usize) {
        if let Some(image) = self.current.image.as_mut() {
            if image.is_animated() {
                image.update_texture(self.graphics.as_mut(), index);
            }
        }
    }

    fn free(graphics: &mut dyn Graphics, mut image: ImageFile) {
        image.release_texture(graphics);
    }
}

impl Drop for Staging {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            Self::free(self.graphics.as_mut(), pending.image);
        }
        if let Some(image) = self.current.image.take() {
            Self::free(self.graphics.as_mut(), image);
        }
    }
}

impl std::fmt::Debug for Staging {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Staging")
            .field("current", &self.current)
            .field("pending", &self.pending)
            .field("generation", &self.generation)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::HeadlessGraphics;
    use crate::image_file::{AlphaMode, Frame};
    use std::time::SystemTime;

    fn request(path: &str, generation: u64, secs: u64) -> LoadRequest {
        LoadRequest {
            path: path.to_string(),
            persistent: true,
            alpha_mode: AlphaMode::Premultiply,
            timestamp: Some(SystemTime::UNIX_EPOCH + Duration::from_secs(secs)),
            generation,
        }
    }

    fn still(path: &str) -> ImageFile {
        ImageFile::still(path, 1, 1, vec![0; 4]).unwrap()
    }

    fn staging() -> (Staging, std::sync::Arc<crate::graphics::GraphicsCounters>) {
        let graphics = HeadlessGraphics::new();
        let counters = graphics.counters();
        (Staging::new(Box::new(graphics)), counters)
    }

    #[test]
    fn test_publish_then_promote() {
        let (mut staging, counters) = staging();
        let generation = staging.next_generation();

        let outcome = staging.publish(&request("a.png", generation, 5), still("a.png"));
        assert_eq!(outcome, PublishOutcome::Published);
        assert!(staging.has_pending());
        assert_eq!(counters.live_textures(), 1);
        assert!(staging.current().image.is_none());

        assert_eq!(staging.promote(), Some(generation));
        assert!(!staging.has_pending());
        assert_eq!(staging.current().path, "a.png");
        assert!(staging.current().is_loaded());
        assert_eq!(
            staging.current().timestamp,
            Some(SystemTime::UNIX_EPOCH + Duration::from_secs(5))
        );
        assert_eq!(staging.promote(), None);
    }

    #[test]
    fn test_stale_publish_dropped() {
        let (mut staging, counters) = staging();
        let old = staging.next_generation();
        staging.next_generation();

        let outcome = staging.publish(&request("a.png", old, 5), still("a.png"));
        assert_eq!(outcome, PublishOutcome::Stale);
        assert!(!staging.has_pending());
        assert_eq!(counters.created(), 0);
        assert_eq!(staging.stats().stale, 1);
    }

    #[test]
    fn test_newer_publish_supersedes_pending() {
        let (mut staging, counters) = staging();
        let first = staging.next_generation();
        staging.publish(&request("a.png", first, 5), still("a.png"));

        let second = staging.next_generation();
        let outcome = staging.publish(&request("b.png", second, 6), still("b.png"));
        assert_eq!(outcome, PublishOutcome::Superseded);
        assert_eq!(counters.created(), 2);
        assert_eq!(counters.live_textures(), 1);

        staging.promote();
        assert_eq!(staging.current().path, "b.png");
    }

    #[test]
    fn test_failed_decode_keeps_timestamp() {
        let (mut staging, _) = staging();
        let generation = staging.next_generation();
        staging.publish(&request("a.png", generation, 5), still("a.png"));
        staging.promote();

        let generation = staging.next_generation();
        staging.publish(&request("a.png", generation, 9), ImageFile::failed("a.png"));
        staging.promote();

        assert!(!staging.current().is_loaded());
        assert_eq!(
            staging.current().timestamp,
            Some(SystemTime::UNIX_EPOCH + Duration::from_secs(5))
        );
        assert_eq!(staging.stats().failed, 1);
    }

    #[test]
    fn test_promote_frees_previous_texture() {
        let (mut staging, counters) = staging();
        for path in ["a.png", "b.png", "c.png"] {
            let generation = staging.next_generation();
            staging.publish(&request(path, generation, 1), still(path));
            staging.promote();
        }
        assert_eq!(counters.created(), 3);
        assert_eq!(counters.live_textures(), 1);
    }

    #[test]
    fn test_unload_clears_everything() {
        let (mut staging, counters) = staging();
        let generation = staging.next_generation();
        staging.publish(&request("a.png", generation, 1), still("a.png"));
        staging.promote();
        let generation = staging.next_generation();
        staging.publish(&request("b.png", generation, 1), still("b.png"));

        staging.unload();
        assert!(staging.current().image.is_none());
        assert!(!staging.has_pending());
        assert_eq!(counters.live_textures(), 0);

        // A decode issued before the unload no longer lands
        let outcome = staging.publish(&request("b.png", generation, 1), still("b.png"));
        assert_eq!(outcome, PublishOutcome::Stale);
    }

    #[test]
    fn test_drop_releases_textures() {
        let (mut staging, counters) = staging();
        let generation = staging.next_generation();
        staging.publish(&request("a.png", generation, 1), still("a.png"));
        staging.promote();
        let generation = staging.next_generation();
        staging.publish(&request("b.png", generation, 1), still("b.png"));
        assert_eq!(counters.live_textures(), 2);

        drop(staging);
        assert_eq!(counters.live_textures(), 0);
    }

    #[test]
    fn test_advance_animation_uploads_on_frame_change() {
        let (mut staging, counters) = staging();
        let frames = vec![
            Frame::new(vec![0; 4], Duration::from_millis(100)),
            Frame::new(vec![0; 4], Duration::from_millis(100)),
        ];
        let image = ImageFile::animated("a.gif", 1, 1, frames).unwrap();
        let generation = staging.next_generation();
        staging.publish(&request("a.gif", generation, 1), image);
        staging.promote();

        let mut clock = AnimationClock::new();
        assert!(!staging.advance_animation(&mut clock, Duration::from_millis(50)));
        assert_eq!(counters.updates(), 0);
        assert!(staging.advance_animation(&mut clock, Duration::from_millis(60)));
        assert_eq!(counters.updates(), 1);
        assert_eq!(clock.frame_index(), 1);
    }

    #[test]
    fn test_still_image_does_not_animate() {
        let (mut staging, counters) = staging();
        let generation = staging.next_generation();
        staging.publish(&request("a.png", generation, 1), still("a.png"));
        staging.promote();

        let mut clock = AnimationClock::new();
        assert!(!staging.advance_animation(&mut clock, Duration::from_secs(10)));
        staging.show_frame(0);
        assert_eq!(counters.updates(), 0);
    }
}
