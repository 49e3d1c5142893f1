//! Speech - mouth motion while the avatar is talking
//!
//! There is no phoneme data here, only a speaking flag. The mouth follows
//! two superimposed sines on a timer that runs only while speaking and is
//! never rewound, so consecutive utterances continue the same phase.

use lapwing_core::FrameDelta;

/// Speech mouth configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeechConfig {
    /// Overall mouth opening gain
    pub gain: f32,
    /// Main open/close rate in rad/s
    pub cycle_rate: f32,
    /// Secondary jitter rate in rad/s
    pub noise_rate: f32,
    pub noise_amplitude: f32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            gain: 0.7,
            cycle_rate: 8.0,
            noise_rate: 15.7,
            noise_amplitude: 0.2,
        }
    }
}

/// Mouth opening at a given speech timer value
#[inline]
pub fn mouth_opening(timer: f32, config: &SpeechConfig) -> f32 {
    let cycle = (timer * config.cycle_rate).sin() * 0.5 + 0.5;
    let noise = (timer * config.noise_rate).sin() * config.noise_amplitude;
    (cycle + noise) * config.gain
}

/// Speech-synchronized mouth driver
#[derive(Debug, Clone, Default)]
pub struct MouthDriver {
    config: SpeechConfig,
    timer: f32,
}

impl MouthDriver {
    pub fn new(config: SpeechConfig) -> Self {
        Self { config, timer: 0.0 }
    }

    pub fn set_config(&mut self, config: SpeechConfig) {
        self.config = config;
    }

    pub fn timer(&self) -> f32 {
        self.timer
    }

    /// Accumulate time only while speaking
    pub fn advance(&mut self, delta: FrameDelta, speaking: bool) {
        if speaking {
            self.timer += delta.as_secs();
        }
    }

    /// Mouth opening to overlay this frame, if speaking
    pub fn opening(&self, speaking: bool) -> Option<f32> {
        speaking.then(|| mouth_opening(self.timer, &self.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_runs_only_while_speaking() {
        let mut mouth = MouthDriver::default();
        let step = FrameDelta::from_secs(1.0 / 60.0);

        for _ in 0..10 {
            mouth.advance(step, false);
            assert_eq!(mouth.timer(), 0.0);
            assert!(mouth.opening(false).is_none());
        }

        mouth.advance(step, true);
        assert!(mouth.timer() > 0.0);
        assert!(mouth.opening(true).is_some());
    }

    #[test]
    fn test_phase_continues_across_utterances() {
        let mut mouth = MouthDriver::default();
        let step = FrameDelta::from_secs(0.1);

        mouth.advance(step, true);
        mouth.advance(step, true);
        let paused_at = mouth.timer();

        mouth.advance(step, false);
        mouth.advance(step, false);
        assert_eq!(mouth.timer(), paused_at);

        mouth.advance(step, true);
        assert!((mouth.timer() - (paused_at + 0.1)).abs() < 1e-6);
    }

    #[test]
    fn test_opening_at_zero() {
        // cycle = 0.5, noise = 0
        let value = mouth_opening(0.0, &SpeechConfig::default());
        assert!((value - 0.35).abs() < 1e-6);
    }

    #[test]
    fn test_opening_bounds() {
        let config = SpeechConfig::default();
        for i in 0..10_000 {
            let value = mouth_opening(i as f32 * 0.001, &config);
            assert!(value >= -0.2 * 0.7 - 1e-5);
            assert!(value <= 1.2 * 0.7 + 1e-5);
        }
    }
}
