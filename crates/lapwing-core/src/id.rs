//! Identity types for the avatar rig
//!
//! Joints and facial controls are addressed by name on the asset side.
//! The engine only cares about a handful of them, so those get typed slots
//! and constants here.

use std::fmt;

/// Name of the control the blink drives
pub const EYES_CLOSED_CONTROL: &str = "Both Eyes - Closed";

/// Name of the control the speech driver opens
pub const MOUTH_OPEN_CONTROL: &str = "Mouth - A";

/// Pose selected on load and whenever no directive is present
pub const DEFAULT_POSE: &str = "Neutral_A";

/// Clips whose name ends with this suffix are poses (play once, hold)
pub const POSE_SUFFIX: &str = "_A";

/// Expression controls the character asset ships with
pub const DEFAULT_CONTROLS: &[&str] = &[
    "Eyebrows - Angry",
    "Eyebrows - Sad",
    "Right Eye - Closed",
    "Left Eye - Closed",
    EYES_CLOSED_CONTROL,
    "Mouth - Happy",
    "Mouth - Sad",
    MOUTH_OPEN_CONTROL,
];

/// Pose clips the character asset ships with
pub const DEFAULT_POSES: &[&str] = &[
    DEFAULT_POSE,
    "Thinking_A",
    "FlippingOff_A",
    "HandsOnHips_A",
    "ThumbsUp_A",
];

/// Skeleton joints the procedural layer touches
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum JointSlot {
    ChestLeft,
    ChestRight,
    ShoulderLeft,
    ShoulderRight,
    Head,
}

impl JointSlot {
    /// All slots in order
    pub fn all() -> &'static [JointSlot] {
        &[
            JointSlot::ChestLeft,
            JointSlot::ChestRight,
            JointSlot::ShoulderLeft,
            JointSlot::ShoulderRight,
            JointSlot::Head,
        ]
    }

    /// Slots that breathe
    pub fn breathing() -> &'static [JointSlot] {
        &[
            JointSlot::ChestLeft,
            JointSlot::ChestRight,
            JointSlot::ShoulderLeft,
            JointSlot::ShoulderRight,
        ]
    }

    /// Bone name in the shipped character asset
    pub fn default_bone(self) -> &'static str {
        match self {
            JointSlot::ChestLeft => "DEF-breastL",
            JointSlot::ChestRight => "DEF-breastR",
            JointSlot::ShoulderLeft => "DEF-shoulderL",
            JointSlot::ShoulderRight => "DEF-shoulderR",
            JointSlot::Head => "Head",
        }
    }

    #[inline]
    pub fn is_chest(self) -> bool {
        matches!(self, JointSlot::ChestLeft | JointSlot::ChestRight)
    }

    #[inline]
    pub fn is_shoulder(self) -> bool {
        matches!(self, JointSlot::ShoulderLeft | JointSlot::ShoulderRight)
    }
}

impl fmt::Debug for JointSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JointSlot::ChestLeft => "chest-left",
            JointSlot::ChestRight => "chest-right",
            JointSlot::ShoulderLeft => "shoulder-left",
            JointSlot::ShoulderRight => "shoulder-right",
            JointSlot::Head => "head",
        };
        write!(f, "Joint({})", name)
    }
}

/// Does this clip name mark a pose?
#[inline]
pub fn is_pose_clip(name: &str, suffix: &str) -> bool {
    !suffix.is_empty() && name.ends_with(suffix)
}
