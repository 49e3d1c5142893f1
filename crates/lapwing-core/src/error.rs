//! Error types for the avatar engine
//!
//! None of these are fatal. The frame scheduler absorbs every one of them,
//! logs it, and keeps rendering.

use thiserror::Error;

use crate::JointSlot;

/// Core avatar errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AvatarError {
    // Pose errors
    #[error("Unknown pose: {0}")]
    UnknownPose(String),

    #[error("No clips loaded")]
    NoClipsLoaded,

    // Rig errors
    #[error("Missing joint {slot:?} (bone {bone})")]
    MissingJoint { slot: JointSlot, bone: String },

    #[error("Missing face mesh")]
    MissingFaceMesh,

    // Expression errors
    #[error("Unknown expression control: {0}")]
    UnknownControl(String),

    #[error("Malformed expression payload: {0}")]
    MalformedPayload(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for avatar operations
pub type AvatarResult<T> = Result<T, AvatarError>;
