//! Blinking - involuntary eye closure on a randomized schedule
//!
//! Lifecycle: idle -> triggered once the timer reaches the drawn deadline ->
//! progresses over a fixed duration -> timer reset and a new deadline drawn.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

use lapwing_core::FrameDelta;

/// Blink configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlinkConfig {
    pub enabled: bool,
    /// Full close-open duration in seconds
    pub duration: f32,
    /// Average time between blinks in seconds
    pub frequency: f32,
}

impl Default for BlinkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            duration: 0.15,
            frequency: 3.0,
        }
    }
}

/// Quadratic ease-in/ease-out on [0, 1]
#[inline]
pub fn ease_in_out_quad(t: f32) -> f32 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

/// Eye closure for a blink at `progress` in [0, 1].
/// Closes to 1 at mid-progress and reopens to 0 at the end.
#[inline]
pub fn blink_curve(progress: f32) -> f32 {
    let p = progress.clamp(0.0, 1.0);
    let closure = 1.0 - (2.0 * p - 1.0).abs();
    ease_in_out_quad(closure)
}

/// Blink lifecycle transition reported by a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlinkPhase {
    Started,
    Finished,
}

/// Blink state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlinkState {
    /// Time since the last blink ended (or since load)
    pub timer: f32,
    /// Randomized deadline for the next blink
    pub next_blink: f32,
    pub blinking: bool,
    /// Blink progress [0.0 - 1.0]
    pub progress: f32,
}

/// Blink controller
#[derive(Debug, Clone)]
pub struct BlinkController {
    config: BlinkConfig,
    state: BlinkState,
    rng: StdRng,
}

impl BlinkController {
    /// Create a controller. A seed makes the blink schedule reproducible.
    pub fn new(config: BlinkConfig, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut controller = Self {
            config,
            state: BlinkState {
                timer: 0.0,
                next_blink: 0.0,
                blinking: false,
                progress: 0.0,
            },
            rng,
        };
        controller.state.next_blink = controller.draw_deadline();
        controller
    }

    pub fn config(&self) -> &BlinkConfig {
        &self.config
    }

    /// Replace tunables. A new frequency applies from the next drawn deadline.
    pub fn set_config(&mut self, config: BlinkConfig) {
        self.config = config;
    }

    pub fn state(&self) -> &BlinkState {
        &self.state
    }

    pub fn is_blinking(&self) -> bool {
        self.state.blinking
    }

    /// deadline = frequency / 2 + U(0, frequency)
    fn draw_deadline(&mut self) -> f32 {
        let frequency = self.config.frequency;
        if !frequency.is_finite() || frequency <= 0.0 {
            return 0.0;
        }
        frequency / 2.0 + self.rng.gen_range(0.0..frequency)
    }

    /// Advance by one frame. Disabled blinking does not advance at all.
    pub fn advance(&mut self, delta: FrameDelta) -> Option<BlinkPhase> {
        if !self.config.enabled {
            return None;
        }
        let dt = delta.as_secs();
        let mut phase = None;

        self.state.timer += dt;

        if !self.state.blinking && self.state.timer >= self.state.next_blink {
            self.state.blinking = true;
            self.state.progress = 0.0;
            self.state.timer = 0.0;
            phase = Some(BlinkPhase::Started);
            trace!(deadline = self.state.next_blink, "blink started");
        }

        if self.state.blinking {
            if self.config.duration > 0.0 {
                self.state.progress += dt / self.config.duration;
            } else {
                self.state.progress = 1.0;
            }

            if self.state.progress >= 1.0 {
                self.state.blinking = false;
                self.state.progress = 0.0;
                self.state.timer = 0.0;
                self.state.next_blink = self.draw_deadline();
                phase = Some(BlinkPhase::Finished);
                trace!(next = self.state.next_blink, "blink finished");
            }
        }

        phase
    }

    /// Eye closure to overlay this frame, if a blink is in progress
    pub fn closure(&self) -> Option<f32> {
        if self.config.enabled && self.state.blinking {
            Some(blink_curve(self.state.progress))
        } else {
            None
        }
    }
}
