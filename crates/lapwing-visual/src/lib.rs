//! Lapwing Visual - avatar animation blending
//!
//! Keeps a chat-driven avatar visually continuous while pose, expression
//! and speech events arrive whenever they like.
//!
//! # Layers
//!
//! - Pose: named skeletal clips with crossfaded transitions
//! - Procedural: breathing on chest and shoulders, randomized blinking
//! - Face: external targets merged with blink and speech overlays
//!
//! Everything is resolved once per display frame by `AvatarState::step`
//! and written to the host's `Rig` by `AvatarState::commit`.

pub mod blink;
pub mod breathing;
pub mod clip;
pub mod face;
pub mod pose;
pub mod rig;
pub mod speech;
pub mod state;

pub use blink::*;
pub use breathing::*;
pub use clip::*;
pub use face::*;
pub use pose::*;
pub use rig::*;
pub use speech::*;
pub use state::*;
