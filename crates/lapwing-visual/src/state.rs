//! Avatar State - the per-frame scheduler
//!
//! step(delta, inputs) resolves one frame in a fixed order:
//! 1. Pose directive -> pose state machine, then advance clip playback
//! 2. Breathing joint scales and blink state
//! 3. Expression compositing (reads this frame's blink progress)
//!
//! commit(output, rig) writes the result into the live skeleton and mesh.
//! Inputs are latest-value snapshots; nothing here queues events.

use std::collections::BTreeMap;
use std::sync::Arc;

use lapwing_core::{
    AvatarError, FrameDelta, JointSlot, SessionClock, EYES_CLOSED_CONTROL, MOUTH_OPEN_CONTROL,
};
use tracing::{debug, trace, warn};

use crate::{
    BaseSource, BlinkConfig, BlinkController, BlinkPhase, BreathingConfig, BreathingLayer,
    ClipLibrary, ClipSample, ExpressionCompositor, ExpressionSources, ExpressionTargets,
    MouthDriver, PoseConfig, PoseStateMachine, PoseTransition, ResolvedExpression, Rig,
    SpeechConfig, Vec3,
};

/// Clock configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockConfig {
    /// Largest frame step in seconds (0 disables the cap)
    pub max_frame_delta: f32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            max_frame_delta: 0.1,
        }
    }
}

/// Rig binding: which skeleton nodes and controls the engine drives
#[derive(Debug, Clone, PartialEq)]
pub struct RigBinding {
    /// Bone name per joint slot; the head slot names the face mesh node
    pub bones: BTreeMap<JointSlot, String>,
    pub eyes_closed_control: String,
    pub mouth_open_control: String,
}

impl RigBinding {
    pub fn bone(&self, slot: JointSlot) -> &str {
        self.bones
            .get(&slot)
            .map(String::as_str)
            .unwrap_or_else(|| slot.default_bone())
    }
}

impl Default for RigBinding {
    fn default() -> Self {
        Self {
            bones: JointSlot::all()
                .iter()
                .map(|slot| (*slot, slot.default_bone().to_string()))
                .collect(),
            eyes_closed_control: EYES_CLOSED_CONTROL.to_string(),
            mouth_open_control: MOUTH_OPEN_CONTROL.to_string(),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineConfig {
    pub clock: ClockConfig,
    pub pose: PoseConfig,
    pub breathing: BreathingConfig,
    pub blink: BlinkConfig,
    pub speech: SpeechConfig,
    pub rig: RigBinding,
    /// Fixed seed for a reproducible blink schedule
    pub blink_seed: Option<u64>,
}

/// Debug-authored overrides
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DebugOverrides {
    pub pose: Option<String>,
    pub expressions: Arc<ExpressionTargets>,
}

/// Latest-known upstream values, sampled once per frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSnapshot {
    /// Pose directive from chat (None means default pose)
    pub pose: Option<String>,
    /// External expression targets from chat
    pub expressions: Arc<ExpressionTargets>,
    pub speaking: bool,
    /// Use debug overrides instead of chat inputs
    pub debug_mode: bool,
    pub debug: DebugOverrides,
}

/// Pose directive outcome for one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoseEvent {
    Transition { from: Option<String>, to: String },
    Ignored(String),
}

/// Everything a frame produced
#[derive(Debug, Clone, Default)]
pub struct FrameOutput {
    pub frame: u64,
    pub delta: FrameDelta,
    /// Session time in seconds
    pub elapsed: f32,
    pub pose_event: Option<PoseEvent>,
    pub clips: Vec<ClipSample>,
    /// Breathing joint scales (empty when breathing is off)
    pub joint_scales: Vec<(String, Vec3)>,
    pub blink: Option<BlinkPhase>,
    /// Names in a newly arrived expression payload that the face mesh lacks
    pub unknown_controls: Vec<String>,
    /// Resolved controls (None when there is no face mesh)
    pub expression: Option<ResolvedExpression>,
}

/// Complete animation state of one avatar
#[derive(Debug, Clone)]
pub struct AvatarState {
    clock: SessionClock,
    poses: PoseStateMachine,
    breathing: Option<BreathingLayer>,
    breathing_config: BreathingConfig,
    blink: BlinkController,
    mouth: MouthDriver,
    compositor: Option<ExpressionCompositor>,
    face_mesh: String,
    /// Last pose target handed to the state machine
    last_target: Option<String>,
    /// Last expression payload checked for unknown names
    last_payload: Option<Arc<ExpressionTargets>>,
}

impl AvatarState {
    /// Bind to a loaded rig and clip library. Missing joints or face mesh
    /// disable only the feature that needs them.
    pub fn load<R: Rig>(rig: &R, clips: &ClipLibrary, config: EngineConfig) -> Self {
        let mut poses = PoseStateMachine::new(config.pose.clone());
        poses.load(clips);

        let breathing = match BreathingLayer::bind(rig, &config.rig.bones) {
            Ok(layer) => Some(layer),
            Err(err) => {
                warn!(error = %err, "breathing disabled");
                None
            }
        };

        let face_mesh = config.rig.bone(JointSlot::Head).to_string();
        let compositor = match rig.morph_targets(&face_mesh) {
            Some(controls) => Some(ExpressionCompositor::with_designated(
                controls,
                &config.rig.eyes_closed_control,
                &config.rig.mouth_open_control,
            )),
            None => {
                warn!(error = %AvatarError::MissingFaceMesh, mesh = %face_mesh, "blinking and expressions disabled");
                None
            }
        };

        Self {
            clock: SessionClock::new(config.clock.max_frame_delta),
            poses,
            breathing,
            breathing_config: config.breathing,
            blink: BlinkController::new(config.blink, config.blink_seed),
            mouth: MouthDriver::new(config.speech),
            compositor,
            face_mesh,
            last_target: None,
            last_payload: None,
        }
    }

    pub fn poses(&self) -> &PoseStateMachine {
        &self.poses
    }

    pub fn blink(&self) -> &BlinkController {
        &self.blink
    }

    pub fn mouth(&self) -> &MouthDriver {
        &self.mouth
    }

    pub fn compositor(&self) -> Option<&ExpressionCompositor> {
        self.compositor.as_ref()
    }

    pub fn breathing(&self) -> Option<&BreathingLayer> {
        self.breathing.as_ref()
    }

    pub fn elapsed(&self) -> f32 {
        self.clock.elapsed()
    }

    /// Uncapped host time; drives breathing so its phase survives stalls
    pub fn host_elapsed(&self) -> f32 {
        self.clock.host_elapsed()
    }

    pub fn set_breathing(&mut self, config: BreathingConfig) {
        self.breathing_config = config;
    }

    pub fn set_blink(&mut self, config: BlinkConfig) {
        self.blink.set_config(config);
    }

    pub fn set_speech(&mut self, config: SpeechConfig) {
        self.mouth.set_config(config);
    }

    fn pose_target(&self, inputs: &InputSnapshot) -> String {
        let directive = if inputs.debug_mode {
            inputs.debug.pose.as_deref()
        } else {
            inputs.pose.as_deref()
        };
        directive
            .filter(|name| !name.is_empty())
            .unwrap_or(self.poses.config().default_pose.as_str())
            .to_string()
    }

    /// Hand the directive to the state machine when it changed
    fn apply_directive(&mut self, inputs: &InputSnapshot) -> Option<PoseEvent> {
        let target = self.pose_target(inputs);
        if self.last_target.as_deref() == Some(target.as_str()) {
            return None;
        }
        self.last_target = Some(target.clone());

        match self.poses.request(&target) {
            Ok(PoseTransition::Started { from, to }) => Some(PoseEvent::Transition { from, to }),
            Ok(PoseTransition::Unchanged) => None,
            Err(err) => {
                debug!(error = %err, "pose directive ignored");
                Some(PoseEvent::Ignored(target))
            }
        }
    }

    /// Report payload names the face mesh lacks, once per payload
    fn check_payload(&mut self, payload: &Arc<ExpressionTargets>) -> Vec<String> {
        if let Some(last) = &self.last_payload {
            if Arc::ptr_eq(last, payload) {
                return Vec::new();
            }
        }
        self.last_payload = Some(Arc::clone(payload));

        let Some(compositor) = &self.compositor else {
            return Vec::new();
        };
        let unknown: Vec<String> = compositor
            .unknown(payload)
            .into_iter()
            .map(str::to_string)
            .collect();
        for name in &unknown {
            debug!(error = %AvatarError::UnknownControl(name.clone()), "expression target dropped");
        }
        unknown
    }

    /// Resolve one frame
    pub fn step(&mut self, raw_delta: f32, inputs: &InputSnapshot) -> FrameOutput {
        let delta = self.clock.advance(raw_delta);
        let elapsed = self.clock.elapsed();

        // Pose
        let pose_event = self.apply_directive(inputs);
        self.poses.tick(delta);
        let clips = self.poses.samples();

        // Procedural motion
        let joint_scales = match &self.breathing {
            Some(layer) if self.breathing_config.enabled => {
                layer.scales(self.clock.host_elapsed(), &self.breathing_config)
            }
            _ => Vec::new(),
        };

        let blink = if self.compositor.is_some() {
            self.blink.advance(delta)
        } else {
            None
        };
        self.mouth.advance(delta, inputs.speaking);

        // Expression
        let payload = if inputs.debug_mode {
            &inputs.debug.expressions
        } else {
            &inputs.expressions
        };
        let unknown_controls = self.check_payload(payload);
        let expression = self.compositor.as_ref().map(|compositor| {
            let base = if inputs.debug_mode {
                BaseSource::Manual(&inputs.debug.expressions)
            } else {
                BaseSource::External(&inputs.expressions)
            };
            let sources = ExpressionSources {
                base,
                blink: self.blink.closure(),
                speech: self.mouth.opening(inputs.speaking),
            };
            compositor.resolve(&sources)
        });

        trace!(frame = self.clock.frames(), ?delta, elapsed, "frame resolved");

        FrameOutput {
            frame: self.clock.frames(),
            delta,
            elapsed,
            pose_event,
            clips,
            joint_scales,
            blink,
            unknown_controls,
            expression,
        }
    }

    /// Write a frame into the live rig: clips, then joint scales, then morphs
    pub fn commit<R: Rig>(&self, output: &FrameOutput, rig: &mut R) {
        rig.apply_clips(&output.clips);

        for (bone, scale) in &output.joint_scales {
            rig.set_joint_scale(bone, *scale);
        }

        if let Some(expression) = &output.expression {
            for (name, value) in expression.iter() {
                if let Some(index) = rig.morph_index(&self.face_mesh, name) {
                    rig.set_morph_influence(&self.face_mesh, index, value);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SkeletonRig;

    fn library() -> ClipLibrary {
        ClipLibrary::load(
            [("Neutral_A", 2.0), ("Thinking_A", 2.0), ("Wave", 1.0)],
            &PoseConfig::default(),
        )
    }

    fn seeded() -> EngineConfig {
        EngineConfig {
            blink_seed: Some(11),
            ..Default::default()
        }
    }

    const STEP: f32 = 1.0 / 60.0;

    #[test]
    fn test_load_selects_neutral() {
        let rig = SkeletonRig::character();
        let state = AvatarState::load(&rig, &library(), seeded());

        assert_eq!(state.poses().current(), Some("Neutral_A"));
        assert!(state.breathing().is_some());
        assert!(state.compositor().is_some());
    }

    #[test]
    fn test_directive_switches_pose() {
        let rig = SkeletonRig::character();
        let mut state = AvatarState::load(&rig, &library(), seeded());

        let idle = state.step(STEP, &InputSnapshot::default());
        assert!(idle.pose_event.is_none());

        let inputs = InputSnapshot {
            pose: Some("Thinking_A".to_string()),
            ..Default::default()
        };
        let out = state.step(STEP, &inputs);
        assert_eq!(
            out.pose_event,
            Some(PoseEvent::Transition {
                from: Some("Neutral_A".to_string()),
                to: "Thinking_A".to_string(),
            })
        );
        assert_eq!(state.poses().current(), Some("Thinking_A"));

        // Same directive again: nothing new
        assert!(state.step(STEP, &inputs).pose_event.is_none());
    }

    #[test]
    fn test_unknown_directive_ignored() {
        let rig = SkeletonRig::character();
        let mut state = AvatarState::load(&rig, &library(), seeded());

        let inputs = InputSnapshot {
            pose: Some("Moonwalk_A".to_string()),
            ..Default::default()
        };
        let out = state.step(STEP, &inputs);
        assert_eq!(out.pose_event, Some(PoseEvent::Ignored("Moonwalk_A".to_string())));
        assert_eq!(state.poses().current(), Some("Neutral_A"));

        // Reported once, not every frame
        assert!(state.step(STEP, &inputs).pose_event.is_none());
    }

    #[test]
    fn test_empty_directive_means_default() {
        let rig = SkeletonRig::character();
        let mut state = AvatarState::load(&rig, &library(), seeded());

        let thinking = InputSnapshot {
            pose: Some("Thinking_A".to_string()),
            ..Default::default()
        };
        state.step(STEP, &thinking);

        let blank = InputSnapshot {
            pose: Some(String::new()),
            ..Default::default()
        };
        let out = state.step(STEP, &blank);
        assert!(matches!(out.pose_event, Some(PoseEvent::Transition { ref to, .. }) if to == "Neutral_A"));
    }

    #[test]
    fn test_debug_mode_uses_overrides() {
        let rig = SkeletonRig::character();
        let mut state = AvatarState::load(&rig, &library(), seeded());

        let inputs = InputSnapshot {
            pose: Some("Thinking_A".to_string()),
            expressions: Arc::new(ExpressionTargets::new().with("Mouth - Sad", 0.9)),
            debug_mode: true,
            debug: DebugOverrides {
                pose: Some("Neutral_A".to_string()),
                expressions: Arc::new(ExpressionTargets::new().with("Mouth - Happy", 0.6)),
            },
            ..Default::default()
        };

        let out = state.step(STEP, &inputs);
        assert_eq!(state.poses().current(), Some("Neutral_A"));
        let expression = out.expression.unwrap();
        assert_eq!(expression.get("Mouth - Happy"), Some(0.6));
        assert_eq!(expression.get("Mouth - Sad"), Some(0.0));
    }

    #[test]
    fn test_commit_writes_rig() {
        let mut rig = SkeletonRig::character();
        let mut state = AvatarState::load(&rig, &library(), seeded());

        let inputs = InputSnapshot {
            expressions: Arc::new(ExpressionTargets::new().with("Mouth - Happy", 0.4)),
            speaking: true,
            ..Default::default()
        };
        let out = state.step(0.5, &inputs);
        state.commit(&out, &mut rig);

        assert_eq!(rig.morph_influence("Head", "Mouth - Happy"), Some(0.4));
        let mouth = rig.morph_influence("Head", MOUTH_OPEN_CONTROL).unwrap();
        assert!(mouth > 0.0);
        assert_eq!(rig.last_clips().len(), 1);

        let expected_y = 1.0 + (state.host_elapsed() * 1.5).sin() * 0.02;
        let chest = rig.joint_scale("DEF-breastL").unwrap();
        assert!((chest.y - expected_y).abs() < 1e-6);
    }

    #[test]
    fn test_breathing_disabled_leaves_joints() {
        let mut rig = SkeletonRig::character();
        let mut state = AvatarState::load(&rig, &library(), seeded());

        for _ in 0..30 {
            let out = state.step(STEP, &InputSnapshot::default());
            state.commit(&out, &mut rig);
        }
        let stuck = rig.joint_scale("DEF-shoulderL").unwrap();

        state.set_breathing(BreathingConfig {
            enabled: false,
            ..Default::default()
        });
        for _ in 0..30 {
            let out = state.step(STEP, &InputSnapshot::default());
            assert!(out.joint_scales.is_empty());
            state.commit(&out, &mut rig);
        }

        // Last value sticks, no reset to rest
        assert_eq!(rig.joint_scale("DEF-shoulderL").unwrap(), stuck);
    }

    #[test]
    fn test_missing_face_mesh_skips_blink() {
        let mut rig = SkeletonRig::character();
        rig.remove_mesh("Head");
        let mut state = AvatarState::load(&rig, &library(), seeded());

        for _ in 0..600 {
            let out = state.step(STEP, &InputSnapshot::default());
            assert!(out.expression.is_none());
            assert!(out.blink.is_none());
            state.commit(&out, &mut rig);
        }
        assert_eq!(state.blink().state().timer, 0.0);
    }

    #[test]
    fn test_missing_joint_skips_breathing_only() {
        let mut rig = SkeletonRig::character();
        rig.remove_bone("DEF-breastR");
        let mut state = AvatarState::load(&rig, &library(), seeded());

        let out = state.step(STEP, &InputSnapshot::default());
        assert!(state.breathing().is_none());
        assert!(out.joint_scales.is_empty());
        assert!(out.expression.is_some());
    }

    #[test]
    fn test_blink_read_in_same_frame() {
        let rig = SkeletonRig::character();
        let mut state = AvatarState::load(&rig, &library(), seeded());

        let mut saw_blink = false;
        for _ in 0..600 {
            let out = state.step(STEP, &InputSnapshot::default());
            if out.blink == Some(BlinkPhase::Started) {
                let closed = out.expression.unwrap().get(EYES_CLOSED_CONTROL).unwrap();
                assert!(closed > 0.0);
                saw_blink = true;
                break;
            }
        }
        assert!(saw_blink);
    }

    #[test]
    fn test_unknown_controls_reported_once_per_payload() {
        let rig = SkeletonRig::character();
        let mut state = AvatarState::load(&rig, &library(), seeded());

        let inputs = InputSnapshot {
            expressions: Arc::new(
                ExpressionTargets::new()
                    .with("Tongue - Out", 1.0)
                    .with("Mouth - Sad", 0.3),
            ),
            ..Default::default()
        };
        let first = state.step(STEP, &inputs);
        assert_eq!(first.unknown_controls, vec!["Tongue - Out".to_string()]);
        assert!(state.step(STEP, &inputs).unknown_controls.is_empty());

        let next = InputSnapshot {
            expressions: Arc::new(ExpressionTargets::new().with("Ears - Wiggle", 0.5)),
            ..Default::default()
        };
        assert_eq!(state.step(STEP, &next).unknown_controls, vec!["Ears - Wiggle".to_string()]);
    }

    #[test]
    fn test_breathing_follows_host_time_after_stall() {
        let mut rig = SkeletonRig::character();
        let mut state = AvatarState::load(&rig, &library(), seeded());

        let out = state.step(2.0, &InputSnapshot::default());
        state.commit(&out, &mut rig);

        assert!((out.elapsed - 0.1).abs() < 1e-6);
        let expected_y = 1.0 + (2.0f32 * 1.5).sin() * 0.02;
        let chest = rig.joint_scale("DEF-breastL").unwrap();
        assert!((chest.y - expected_y).abs() < 1e-6);
    }

    #[test]
    fn test_negative_delta_is_degenerate() {
        let rig = SkeletonRig::character();
        let mut state = AvatarState::load(&rig, &library(), seeded());

        let out = state.step(-1.0, &InputSnapshot::default());
        assert!(out.delta.is_zero());
        assert_eq!(state.elapsed(), 0.0);
    }
}
