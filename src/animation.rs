//! Frame timing for animated images.
//!
//! [`AnimationClock`] is a pure state machine over a table of frame
//! durations. [`AnimationState`] adds what the tick driver needs around it:
//! the time base and the visibility/restart flags.

use std::time::Duration;

/// Playback position within an animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnimationClock {
    frame_index: usize,
    loop_count: u32,
    elapsed_in_frame: Duration,
}

impl AnimationClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    pub fn loop_count(&self) -> u32 {
        self.loop_count
    }

    /// Time spent so far on the current frame.
    pub fn elapsed_in_frame(&self) -> Duration {
        self.elapsed_in_frame
    }

    /// Back to the start of the first frame.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Move playback forward by `elapsed`.
    ///
    /// `durations` is the per-frame table of the animation being played.
    /// Returns `true` if the current frame changed.
    pub fn advance(&mut self, elapsed: Duration, durations: &[Duration]) -> bool {
        let cycle: Duration = durations.iter().sum();
        if cycle.is_zero() {
            return false;
        }
        if self.frame_index >= durations.len() {
            self.reset();
        }

        let start = self.frame_index;
        self.elapsed_in_frame += elapsed;

        // A full cycle from any frame lands on the same frame and wraps once.
        if self.elapsed_in_frame >= cycle {
            let elapsed_ns = self.elapsed_in_frame.as_nanos();
            let cycle_ns = cycle.as_nanos();
            let cycles = u32::try_from(elapsed_ns / cycle_ns).unwrap_or(u32::MAX);
            self.loop_count = self.loop_count.saturating_add(cycles);
            self.elapsed_in_frame = Duration::from_nanos((elapsed_ns % cycle_ns) as u64);
        }

        while self.elapsed_in_frame >= durations[self.frame_index] {
            self.elapsed_in_frame -= durations[self.frame_index];
            self.frame_index += 1;
            if self.frame_index == durations.len() {
                self.frame_index = 0;
                self.loop_count = self.loop_count.saturating_add(1);
            }
        }

        self.frame_index != start
    }
}

/// Animation playback state of one source.
#[derive(Debug, Clone, Default)]
pub struct AnimationState {
    /// Playback position
    pub clock: AnimationClock,
    /// Frame time (ns) of the last tick that ran while showing
    pub last_tick: Option<u64>,
    /// Source is showing and being ticked
    pub active: bool,
    /// Playback should restart from frame 0 on the next tick
    pub restart_requested: bool,
}

impl AnimationState {
    /// Time since the last tick, if there was one.
    pub fn elapsed_since(&self, now: u64) -> Option<Duration> {
        self.last_tick
            .map(|last| Duration::from_nanos(now.saturating_sub(last)))
    }
}
