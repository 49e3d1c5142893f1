//! Frame time primitives for the avatar engine
//!
//! The render host hands us raw elapsed seconds once per display refresh.
//! - FrameDelta: a sanitized, non-negative frame step
//! - SessionClock: monotonic session time built from those steps

use std::ops::Add;
use std::time::Duration;

/// Frame delta - seconds since the previous rendered frame
/// INVARIANT: always finite and >= 0
#[derive(Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct FrameDelta(f32);

impl FrameDelta {
    pub const ZERO: FrameDelta = FrameDelta(0.0);

    /// Build from raw seconds. Negative, NaN and infinite inputs collapse to zero.
    #[inline]
    pub fn from_secs(secs: f32) -> Self {
        if secs.is_finite() && secs > 0.0 {
            FrameDelta(secs)
        } else {
            FrameDelta::ZERO
        }
    }

    #[inline]
    pub fn from_duration(duration: Duration) -> Self {
        Self::from_secs(duration.as_secs_f32())
    }

    #[inline]
    pub fn from_millis(millis: u64) -> Self {
        Self::from_secs(millis as f32 / 1000.0)
    }

    #[inline]
    pub fn as_secs(self) -> f32 {
        self.0
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == 0.0
    }

    /// Cap a delta to `max` seconds (non-positive `max` disables the cap)
    #[inline]
    pub fn capped(self, max: f32) -> Self {
        if max > 0.0 && self.0 > max {
            FrameDelta(max)
        } else {
            self
        }
    }
}

impl Add for FrameDelta {
    type Output = FrameDelta;

    #[inline]
    fn add(self, rhs: FrameDelta) -> Self::Output {
        FrameDelta::from_secs(self.0 + rhs.0)
    }
}

impl std::fmt::Debug for FrameDelta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Δ({:.3}ms)", self.0 as f64 * 1000.0)
    }
}

/// Session clock - monotonic, local-driven
/// INVARIANT: elapsed time never decreases
#[derive(Debug, Clone)]
pub struct SessionClock {
    /// Accumulated session time in seconds
    elapsed: f64,
    /// Host wall time: same sanitizing, no cap
    host_elapsed: f64,
    /// Largest step accepted in one frame (after host stalls)
    max_delta: f32,
    /// Number of frames advanced
    frames: u64,
}

impl SessionClock {
    /// Create a clock starting at zero
    pub fn new(max_delta: f32) -> Self {
        SessionClock {
            elapsed: 0.0,
            host_elapsed: 0.0,
            max_delta,
            frames: 0,
        }
    }

    /// Advance by a raw host delta, returning the sanitized step actually applied
    pub fn advance(&mut self, raw_secs: f32) -> FrameDelta {
        let raw = FrameDelta::from_secs(raw_secs);
        let delta = raw.capped(self.max_delta);
        self.elapsed += delta.as_secs() as f64;
        self.host_elapsed += raw.as_secs() as f64;
        self.frames += 1;
        delta
    }

    /// Elapsed session time in seconds
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed as f32
    }

    /// Elapsed host time in seconds, including stalls the cap cut short
    #[inline]
    pub fn host_elapsed(&self) -> f32 {
        self.host_elapsed as f32
    }

    #[inline]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    #[inline]
    pub fn max_delta(&self) -> f32 {
        self.max_delta
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new(0.1)
    }
}
