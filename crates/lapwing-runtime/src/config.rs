//! Avatar runtime configuration
//!
//! One serde document covering every engine tunable. Missing fields fall
//! back to the shipped character's defaults.

use std::collections::BTreeMap;

use lapwing_core::{AvatarError, AvatarResult, JointSlot, EYES_CLOSED_CONTROL, MOUTH_OPEN_CONTROL};
use lapwing_visual::{
    BlinkConfig, BreathingConfig, ClockConfig, EngineConfig, PoseConfig, RigBinding, SpeechConfig,
};
use serde::{Deserialize, Serialize};

use crate::{LogConfig, RuntimeError, RuntimeResult};

const MIN_FRAME_RATE: f32 = 1.0;
const MAX_FRAME_RATE: f32 = 1000.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseSettings {
    pub fade_duration: f32,
    pub repeat_count: u32,
    pub pose_suffix: String,
    pub default_pose: String,
}

impl Default for PoseSettings {
    fn default() -> Self {
        let pose = PoseConfig::default();
        Self {
            fade_duration: pose.fade_duration,
            repeat_count: pose.repeat_count,
            pose_suffix: pose.pose_suffix,
            default_pose: pose.default_pose,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreathingSettings {
    pub enabled: bool,
    pub amplitude: f32,
    pub speed: f32,
}

impl Default for BreathingSettings {
    fn default() -> Self {
        let breathing = BreathingConfig::default();
        Self {
            enabled: breathing.enabled,
            amplitude: breathing.amplitude,
            speed: breathing.speed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlinkSettings {
    pub enabled: bool,
    /// Full close-open duration in seconds
    pub duration: f32,
    /// Average seconds between blinks
    pub frequency: f32,
    pub seed: Option<u64>,
}

impl Default for BlinkSettings {
    fn default() -> Self {
        let blink = BlinkConfig::default();
        Self {
            enabled: blink.enabled,
            duration: blink.duration,
            frequency: blink.frequency,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechSettings {
    pub gain: f32,
    pub cycle_rate: f32,
    pub noise_rate: f32,
    pub noise_amplitude: f32,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        let speech = SpeechConfig::default();
        Self {
            gain: speech.gain,
            cycle_rate: speech.cycle_rate,
            noise_rate: speech.noise_rate,
            noise_amplitude: speech.noise_amplitude,
        }
    }
}

/// Skeleton node names; `head` is the node carrying the face mesh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoneSettings {
    pub chest_left: String,
    pub chest_right: String,
    pub shoulder_left: String,
    pub shoulder_right: String,
    pub head: String,
}

impl Default for BoneSettings {
    fn default() -> Self {
        Self {
            chest_left: JointSlot::ChestLeft.default_bone().to_string(),
            chest_right: JointSlot::ChestRight.default_bone().to_string(),
            shoulder_left: JointSlot::ShoulderLeft.default_bone().to_string(),
            shoulder_right: JointSlot::ShoulderRight.default_bone().to_string(),
            head: JointSlot::Head.default_bone().to_string(),
        }
    }
}

impl BoneSettings {
    fn to_map(&self) -> BTreeMap<JointSlot, String> {
        BTreeMap::from([
            (JointSlot::ChestLeft, self.chest_left.clone()),
            (JointSlot::ChestRight, self.chest_right.clone()),
            (JointSlot::ShoulderLeft, self.shoulder_left.clone()),
            (JointSlot::ShoulderRight, self.shoulder_right.clone()),
            (JointSlot::Head, self.head.clone()),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlSettings {
    pub eyes_closed: String,
    pub mouth_open: String,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            eyes_closed: EYES_CLOSED_CONTROL.to_string(),
            mouth_open: MOUTH_OPEN_CONTROL.to_string(),
        }
    }
}

/// Avatar runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvatarConfig {
    /// Take pose and expressions from debug overrides instead of chat
    pub debug_mode: bool,
    /// Largest frame step in seconds (0 disables the cap)
    pub max_frame_delta: f32,
    /// Frame rate for the built-in driver
    pub frame_rate: f32,
    pub pose: PoseSettings,
    pub breathing: BreathingSettings,
    pub blinking: BlinkSettings,
    pub speech: SpeechSettings,
    pub bones: BoneSettings,
    pub controls: ControlSettings,
    pub log: LogConfig,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            debug_mode: false,
            max_frame_delta: ClockConfig::default().max_frame_delta,
            frame_rate: 60.0,
            pose: PoseSettings::default(),
            breathing: BreathingSettings::default(),
            blinking: BlinkSettings::default(),
            speech: SpeechSettings::default(),
            bones: BoneSettings::default(),
            controls: ControlSettings::default(),
            log: LogConfig::default(),
        }
    }
}

fn check(condition: bool, message: &str) -> AvatarResult<()> {
    if condition {
        Ok(())
    } else {
        Err(AvatarError::InvalidConfig(message.to_string()))
    }
}

fn finite_non_negative(value: f32) -> bool {
    value.is_finite() && value >= 0.0
}

fn finite_positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

impl AvatarConfig {
    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> RuntimeResult<Self> {
        let config: AvatarConfig = serde_json::from_str(json).map_err(RuntimeError::ConfigParse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> RuntimeResult<String> {
        serde_json::to_string_pretty(self).map_err(RuntimeError::ConfigParse)
    }

    pub fn validate(&self) -> AvatarResult<()> {
        check(finite_non_negative(self.max_frame_delta), "max_frame_delta must be >= 0")?;
        check(
            (MIN_FRAME_RATE..=MAX_FRAME_RATE).contains(&self.frame_rate),
            "frame_rate must be within [1, 1000]",
        )?;
        check(finite_non_negative(self.pose.fade_duration), "pose.fade_duration must be >= 0")?;
        check(self.pose.repeat_count > 0, "pose.repeat_count must be > 0")?;
        check(!self.pose.default_pose.is_empty(), "pose.default_pose must not be empty")?;
        check(finite_non_negative(self.breathing.amplitude), "breathing.amplitude must be >= 0")?;
        check(self.breathing.speed.is_finite(), "breathing.speed must be finite")?;
        check(finite_positive(self.blinking.duration), "blinking.duration must be > 0")?;
        check(finite_positive(self.blinking.frequency), "blinking.frequency must be > 0")?;
        check(
            self.speech.gain.is_finite()
                && self.speech.cycle_rate.is_finite()
                && self.speech.noise_rate.is_finite()
                && self.speech.noise_amplitude.is_finite(),
            "speech settings must be finite",
        )?;
        check(
            !self.controls.eyes_closed.is_empty() && !self.controls.mouth_open.is_empty(),
            "control names must not be empty",
        )?;
        Ok(())
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            clock: ClockConfig {
                max_frame_delta: self.max_frame_delta,
            },
            pose: PoseConfig {
                fade_duration: self.pose.fade_duration,
                repeat_count: self.pose.repeat_count,
                pose_suffix: self.pose.pose_suffix.clone(),
                default_pose: self.pose.default_pose.clone(),
            },
            breathing: BreathingConfig {
                enabled: self.breathing.enabled,
                amplitude: self.breathing.amplitude,
                speed: self.breathing.speed,
            },
            blink: BlinkConfig {
                enabled: self.blinking.enabled,
                duration: self.blinking.duration,
                frequency: self.blinking.frequency,
            },
            speech: SpeechConfig {
                gain: self.speech.gain,
                cycle_rate: self.speech.cycle_rate,
                noise_rate: self.speech.noise_rate,
                noise_amplitude: self.speech.noise_amplitude,
            },
            rig: RigBinding {
                bones: self.bones.to_map(),
                eyes_closed_control: self.controls.eyes_closed.clone(),
                mouth_open_control: self.controls.mouth_open.clone(),
            },
            blink_seed: self.blinking.seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_engine() {
        let config = AvatarConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.engine_config(), EngineConfig::default());
    }

    #[test]
    fn test_partial_json() {
        let config = AvatarConfig::from_json(
            r#"{
                "debug_mode": true,
                "breathing": { "amplitude": 0.04 },
                "blinking": { "seed": 9 },
                "bones": { "head": "Face" }
            }"#,
        )
        .unwrap();

        assert!(config.debug_mode);
        assert_eq!(config.breathing.amplitude, 0.04);
        assert_eq!(config.breathing.speed, 1.5);
        assert_eq!(config.blinking.seed, Some(9));

        let engine = config.engine_config();
        assert_eq!(engine.rig.bone(JointSlot::Head), "Face");
        assert_eq!(engine.blink_seed, Some(9));
        assert_eq!(engine.pose.fade_duration, 0.35);
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = AvatarConfig::from_json(r#"{ "blinking": { "duration": 0.0 } }"#).unwrap_err();
        assert!(matches!(err, RuntimeError::Avatar(AvatarError::InvalidConfig(_))));

        let err = AvatarConfig::from_json(r#"{ "breathing": { "amplitude": -1.0 } }"#).unwrap_err();
        assert!(matches!(err, RuntimeError::Avatar(AvatarError::InvalidConfig(_))));

        let err = AvatarConfig::from_json(r#"{ "frame_rate": 1e-20 }"#).unwrap_err();
        assert!(matches!(err, RuntimeError::Avatar(AvatarError::InvalidConfig(_))));

        let err = AvatarConfig::from_json(r#"{ "frame_rate": 5000.0 }"#).unwrap_err();
        assert!(matches!(err, RuntimeError::Avatar(AvatarError::InvalidConfig(_))));

        let err = AvatarConfig::from_json(r#"{ "frame_rate": "fast" }"#).unwrap_err();
        assert!(matches!(err, RuntimeError::ConfigParse(_)));
    }

    #[test]
    fn test_json_roundtrip_of_defaults() {
        let json = AvatarConfig::default().to_json().unwrap();
        assert_eq!(AvatarConfig::from_json(&json).unwrap(), AvatarConfig::default());
    }
}
