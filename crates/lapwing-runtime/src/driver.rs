//! Frame driver for hosts without their own frame callback

use std::time::Duration;

use lapwing_visual::Rig;
use tokio::sync::watch;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::info;

use crate::{AvatarConfig, AvatarRuntime};

const DEFAULT_FRAME_RATE: f32 = 60.0;

/// Runs an `AvatarRuntime` on a fixed tokio interval
pub struct FrameDriver<R: Rig> {
    runtime: AvatarRuntime<R>,
    period: Duration,
}

fn frame_period(frame_rate: f32) -> Duration {
    let rate = if frame_rate.is_finite() && frame_rate > 0.0 {
        frame_rate
    } else {
        DEFAULT_FRAME_RATE
    };
    Duration::try_from_secs_f32(1.0 / rate)
        .unwrap_or_else(|_| Duration::from_secs_f32(1.0 / DEFAULT_FRAME_RATE))
        .max(Duration::from_millis(1))
}

impl<R: Rig> FrameDriver<R> {
    pub fn new(runtime: AvatarRuntime<R>, frame_rate: f32) -> Self {
        Self {
            runtime,
            period: frame_period(frame_rate),
        }
    }

    pub fn from_config(runtime: AvatarRuntime<R>, config: &AvatarConfig) -> Self {
        Self::new(runtime, config.frame_rate)
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn runtime(&self) -> &AvatarRuntime<R> {
        &self.runtime
    }

    /// Tick until `shutdown` becomes true or its sender is dropped, then
    /// hand the runtime back.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> AvatarRuntime<R> {
        if *shutdown.borrow() {
            return self.runtime;
        }

        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last = Instant::now();

        info!(period = ?self.period, "frame driver started");

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                now = ticker.tick() => {
                    let delta = now.saturating_duration_since(last);
                    last = now;
                    self.runtime.frame(delta.as_secs_f32());
                }
            }
        }

        info!(frames = self.runtime.stats().frames, "frame driver stopped");
        self.runtime
    }
}
