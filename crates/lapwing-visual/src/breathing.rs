//! Breathing - procedural chest and shoulder scale offsets
//!
//! breath = sin(t * speed) * amplitude, applied against each joint's rest
//! scale. Chest joints stretch mostly vertically, shoulders also widen.

use std::collections::BTreeMap;

use lapwing_core::{AvatarError, AvatarResult, JointSlot};

use crate::{Rig, Vec3};

/// Lateral (X) share of the breath for chest joints
pub const CHEST_LATERAL: f32 = 0.05;

/// Lateral (X) share of the breath for shoulder joints
pub const SHOULDER_LATERAL: f32 = 0.8;

/// Breathing configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreathingConfig {
    pub enabled: bool,
    /// Fractional scale amplitude
    pub amplitude: f32,
    /// Angular speed in rad/s
    pub speed: f32,
}

impl Default for BreathingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            amplitude: 0.02,
            speed: 1.5,
        }
    }
}

/// Breath offset at session time `t`
#[inline]
pub fn breath_offset(t: f32, config: &BreathingConfig) -> f32 {
    (t * config.speed).sin() * config.amplitude
}

/// Named handle into the skeleton with its cached rest scale
#[derive(Debug, Clone, PartialEq)]
pub struct JointRef {
    pub slot: JointSlot,
    pub bone: String,
    /// Captured once at bind time, never re-read from the live skeleton
    rest_scale: Vec3,
}

impl JointRef {
    /// Resolve a joint and capture its rest scale
    pub fn bind<R: Rig>(rig: &R, slot: JointSlot, bone: &str) -> AvatarResult<Self> {
        let rest_scale = rig.joint_scale(bone).ok_or_else(|| AvatarError::MissingJoint {
            slot,
            bone: bone.to_string(),
        })?;
        Ok(Self {
            slot,
            bone: bone.to_string(),
            rest_scale,
        })
    }

    pub fn rest_scale(&self) -> Vec3 {
        self.rest_scale
    }

    /// Scale for a given breath offset
    pub fn breathing_scale(&self, breath: f32) -> Vec3 {
        let lateral = if self.slot.is_chest() {
            CHEST_LATERAL
        } else if self.slot.is_shoulder() {
            SHOULDER_LATERAL
        } else {
            0.0
        };
        self.rest_scale
            .scaled(1.0 + breath * lateral, 1.0 + breath, 1.0)
    }
}

/// Breathing layer bound to the chest and shoulder joints
#[derive(Debug, Clone)]
pub struct BreathingLayer {
    joints: Vec<JointRef>,
}

impl BreathingLayer {
    /// Bind every breathing joint. Any missing joint disables the whole layer.
    pub fn bind<R: Rig>(rig: &R, bones: &BTreeMap<JointSlot, String>) -> AvatarResult<Self> {
        let joints = JointSlot::breathing()
            .iter()
            .map(|&slot| {
                let bone = bones
                    .get(&slot)
                    .map(String::as_str)
                    .unwrap_or_else(|| slot.default_bone());
                JointRef::bind(rig, slot, bone)
            })
            .collect::<AvatarResult<Vec<_>>>()?;
        Ok(Self { joints })
    }

    pub fn joints(&self) -> &[JointRef] {
        &self.joints
    }

    /// Joint scales at session time `t`
    pub fn scales(&self, t: f32, config: &BreathingConfig) -> Vec<(String, Vec3)> {
        let breath = breath_offset(t, config);
        self.joints
            .iter()
            .map(|joint| (joint.bone.clone(), joint.breathing_scale(breath)))
            .collect()
    }
}
