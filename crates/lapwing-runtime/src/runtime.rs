//! Avatar Runtime - one avatar, one rig, one frame loop

use std::sync::Arc;
use std::time::{Duration, Instant};

use lapwing_visual::{
    AvatarState, BlinkConfig, BlinkPhase, BreathingConfig, ClipLibrary, FrameOutput, PoseEvent,
    Rig, SpeechConfig,
};
use tracing::{debug, info};

use crate::{AvatarConfig, AvatarInputs, RuntimeResult};

#[derive(Clone, Debug, Default)]
pub struct RuntimeStats {
    pub frames: u64,
    pub pose_transitions: u64,
    pub ignored_poses: u64,
    pub blinks: u64,
    pub last_frame_duration: Duration,
}

/// Owns the animation state and the rig it drives
pub struct AvatarRuntime<R: Rig> {
    state: AvatarState,
    rig: R,
    inputs: Arc<AvatarInputs>,
    stats: RuntimeStats,
}

impl<R: Rig> AvatarRuntime<R> {
    /// Bind a loaded rig and clip library. Debug mode from the config seeds
    /// the input cell.
    pub fn new(rig: R, clips: &ClipLibrary, config: &AvatarConfig) -> RuntimeResult<Self> {
        config.validate()?;

        let state = AvatarState::load(&rig, clips, config.engine_config());
        let inputs = Arc::new(AvatarInputs::new());
        inputs.set_debug_mode(config.debug_mode);

        info!(
            clips = clips.len(),
            breathing = state.breathing().is_some(),
            face = state.compositor().is_some(),
            pose = ?state.poses().current(),
            "avatar runtime ready"
        );

        Ok(Self {
            state,
            rig,
            inputs,
            stats: RuntimeStats::default(),
        })
    }

    /// Shared input cells for producers
    pub fn inputs(&self) -> Arc<AvatarInputs> {
        Arc::clone(&self.inputs)
    }

    pub fn state(&self) -> &AvatarState {
        &self.state
    }

    pub fn rig(&self) -> &R {
        &self.rig
    }

    pub fn rig_mut(&mut self) -> &mut R {
        &mut self.rig
    }

    pub fn stats(&self) -> &RuntimeStats {
        &self.stats
    }

    pub fn into_rig(self) -> R {
        self.rig
    }

    pub fn set_breathing(&mut self, config: BreathingConfig) {
        self.state.set_breathing(config);
    }

    pub fn set_blink(&mut self, config: BlinkConfig) {
        self.state.set_blink(config);
    }

    pub fn set_speech(&mut self, config: SpeechConfig) {
        self.state.set_speech(config);
    }

    /// Run one display frame: snapshot inputs, resolve, commit
    pub fn frame(&mut self, raw_delta: f32) -> FrameOutput {
        let start = Instant::now();
        self.stats.frames += 1;

        let inputs = self.inputs.snapshot();
        let output = self.state.step(raw_delta, &inputs);
        self.state.commit(&output, &mut self.rig);

        match &output.pose_event {
            Some(PoseEvent::Transition { from, to }) => {
                self.stats.pose_transitions += 1;
                debug!(from = ?from, to = %to, "pose transition");
            }
            Some(PoseEvent::Ignored(name)) => {
                self.stats.ignored_poses += 1;
                debug!(pose = %name, "unknown pose ignored");
            }
            None => {}
        }
        if output.blink == Some(BlinkPhase::Started) {
            self.stats.blinks += 1;
        }

        self.stats.last_frame_duration = start.elapsed();
        output
    }
}
