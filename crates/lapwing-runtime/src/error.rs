//! Runtime errors
//!
//! Engine conditions stay `AvatarError`; these cover the host-facing
//! edges (config files, chat payloads, subscriber setup).

use lapwing_core::AvatarError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Config parse error: {0}")]
    ConfigParse(#[source] serde_json::Error),

    #[error("Chat message parse error: {0}")]
    MessageParse(#[source] serde_json::Error),

    #[error(transparent)]
    Avatar(#[from] AvatarError),

    #[error("Telemetry setup failed: {0}")]
    Telemetry(String),
}

/// Result type for runtime operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;
