//! Lapwing Core - Fundamental types and primitives
//!
//! This crate defines the core types shared by the avatar engine:
//! - Identifiers (JointSlot, designated control and pose names)
//! - Frame time primitives (FrameDelta, SessionClock)
//! - Error type for non-fatal engine conditions

pub mod error;
pub mod id;
pub mod time;

pub use error::*;
pub use id::*;
pub use time::*;
