//! Per-frame time base.

use web_time::Instant;

/// Monotonic frame clock provided by the host's video loop.
pub trait FrameClock: Send + Sync {
    /// Timestamp of the frame being produced, in nanoseconds.
    fn frame_time(&self) -> u64;
}

/// [`FrameClock`] reading a monotonic wall clock, for hosts without one.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock for MonotonicClock {
    fn frame_time(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }
}
