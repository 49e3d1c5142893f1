//! Latest-value input cells
//!
//! Producers overwrite; the frame loop samples. Nothing is queued, so a
//! burst of updates between two frames collapses to the last one.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use lapwing_visual::{DebugOverrides, ExpressionTargets, InputSnapshot};
use parking_lot::RwLock;

/// Shared input cells for one avatar
#[derive(Debug, Default)]
pub struct AvatarInputs {
    pose: RwLock<Option<String>>,
    expressions: RwLock<Arc<ExpressionTargets>>,
    speaking: AtomicBool,
    debug_mode: AtomicBool,
    debug_pose: RwLock<Option<String>>,
    debug_expressions: RwLock<Arc<ExpressionTargets>>,
}

fn normalize_pose(name: Option<&str>) -> Option<String> {
    name.map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

impl AvatarInputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pose directive from chat; blank or None returns to the default pose
    pub fn set_pose(&self, name: Option<&str>) {
        *self.pose.write() = normalize_pose(name);
    }

    pub fn set_expressions(&self, targets: ExpressionTargets) {
        *self.expressions.write() = Arc::new(targets);
    }

    pub fn clear_expressions(&self) {
        self.set_expressions(ExpressionTargets::new());
    }

    /// Audio playback state
    pub fn set_speaking(&self, speaking: bool) {
        self.speaking.store(speaking, Ordering::Release);
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking.load(Ordering::Acquire)
    }

    pub fn set_debug_mode(&self, enabled: bool) {
        self.debug_mode.store(enabled, Ordering::Release);
    }

    pub fn debug_mode(&self) -> bool {
        self.debug_mode.load(Ordering::Acquire)
    }

    pub fn set_debug_pose(&self, name: Option<&str>) {
        *self.debug_pose.write() = normalize_pose(name);
    }

    pub fn set_debug_expressions(&self, targets: ExpressionTargets) {
        *self.debug_expressions.write() = Arc::new(targets);
    }

    /// Drop chat-driven inputs (pose, expressions, speaking). Debug
    /// overrides stay.
    pub fn clear(&self) {
        self.set_pose(None);
        self.clear_expressions();
        self.set_speaking(false);
    }

    /// Copy every cell. Locks are held only for the clone.
    pub fn snapshot(&self) -> InputSnapshot {
        InputSnapshot {
            pose: self.pose.read().clone(),
            expressions: self.expressions.read().clone(),
            speaking: self.is_speaking(),
            debug_mode: self.debug_mode(),
            debug: DebugOverrides {
                pose: self.debug_pose.read().clone(),
                expressions: self.debug_expressions.read().clone(),
            },
        }
    }
}
