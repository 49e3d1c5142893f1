//! Lapwing Runtime - avatar orchestration and frame loop
//!
//! This crate is the host-facing shell around `lapwing-visual`:
//! 1. Producers (chat transport, audio player, debug tooling) overwrite
//!    latest-value cells in `AvatarInputs`
//! 2. Once per display frame `AvatarRuntime::frame` snapshots those cells
//! 3. The snapshot is resolved by `AvatarState::step`
//! 4. The result is committed into the host rig
//!
//! `FrameDriver` runs the same loop on a tokio interval for hosts without
//! their own frame callback.

pub mod config;
pub mod driver;
pub mod error;
pub mod inputs;
pub mod intake;
pub mod runtime;
pub mod telemetry;

pub use config::*;
pub use driver::*;
pub use error::*;
pub use inputs::*;
pub use intake::*;
pub use runtime::*;
pub use telemetry::*;
