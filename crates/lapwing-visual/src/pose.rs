//! Pose State Machine - which skeletal clip is current, and crossfades between them
//!
//! States are "nothing loaded" or "pose P is current". A request for a
//! different known pose rewinds and fades in the target, fades out the old
//! current (it keeps playing until its weight reaches zero) and moves the
//! current pointer immediately. Fades are never cancelled; a request that
//! lands mid-fade simply starts new ramps from the weights in flight.

use std::collections::BTreeMap;

use lapwing_core::{AvatarError, AvatarResult, FrameDelta, DEFAULT_POSE, POSE_SUFFIX};
use tracing::{debug, warn};

use crate::{AnimationAction, ClipLibrary, ClipSample};

/// Pose configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PoseConfig {
    /// Crossfade duration in seconds
    pub fade_duration: f32,
    /// Cycles played by non-pose clips
    pub repeat_count: u32,
    /// Name suffix marking a clip as a pose
    pub pose_suffix: String,
    /// Pose used on load and when no directive is present
    pub default_pose: String,
}

impl Default for PoseConfig {
    fn default() -> Self {
        Self {
            fade_duration: 0.35,
            repeat_count: 2,
            pose_suffix: POSE_SUFFIX.to_string(),
            default_pose: DEFAULT_POSE.to_string(),
        }
    }
}

/// Outcome of a pose request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoseTransition {
    /// Target is already current
    Unchanged,
    /// Crossfade started
    Started { from: Option<String>, to: String },
}

/// Pose state machine
#[derive(Debug, Clone)]
pub struct PoseStateMachine {
    config: PoseConfig,
    actions: BTreeMap<String, AnimationAction>,
    current: Option<String>,
}

impl PoseStateMachine {
    /// Create an empty machine (no clip loaded)
    pub fn new(config: PoseConfig) -> Self {
        Self {
            config,
            actions: BTreeMap::new(),
            current: None,
        }
    }

    /// Bind an action to every clip and start the default pose without a fade
    pub fn load(&mut self, library: &ClipLibrary) {
        self.actions = library
            .iter()
            .map(|clip| (clip.name.clone(), AnimationAction::new(clip.clone())))
            .collect();
        self.current = None;

        if self.actions.is_empty() {
            warn!(error = %AvatarError::NoClipsLoaded, "pose machine has nothing to play");
            return;
        }

        let default_pose = self.config.default_pose.clone();
        match self.actions.get_mut(&default_pose) {
            Some(action) => {
                action.play();
                self.current = Some(default_pose);
                debug!(pose = %self.config.default_pose, "initial pose selected");
            }
            None => {
                debug!(pose = %default_pose, "default pose missing, no current pose");
            }
        }
    }

    pub fn config(&self) -> &PoseConfig {
        &self.config
    }

    pub fn is_loaded(&self) -> bool {
        !self.actions.is_empty()
    }

    /// Name of the current pose
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn current_action(&self) -> Option<&AnimationAction> {
        self.current.as_ref().and_then(|name| self.actions.get(name))
    }

    pub fn action(&self, name: &str) -> Option<&AnimationAction> {
        self.actions.get(name)
    }

    pub fn clip_names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    /// Request a pose. Unknown names leave everything untouched.
    pub fn request(&mut self, target: &str) -> AvatarResult<PoseTransition> {
        if self.current.as_deref() == Some(target) {
            return Ok(PoseTransition::Unchanged);
        }

        let fade = self.config.fade_duration;
        let next = self
            .actions
            .get_mut(target)
            .ok_or_else(|| AvatarError::UnknownPose(target.to_string()))?;

        next.reset();
        next.fade_in(fade);
        next.play();

        let from = self.current.take();
        if let Some(previous) = from.as_ref().and_then(|name| self.actions.get_mut(name)) {
            previous.fade_out(fade);
        }

        self.current = Some(target.to_string());
        debug!(from = ?from, to = target, fade, "pose transition");

        Ok(PoseTransition::Started {
            from,
            to: target.to_string(),
        })
    }

    /// Advance every active action. The only mutation of clip playback time.
    pub fn tick(&mut self, delta: FrameDelta) {
        for action in self.actions.values_mut() {
            action.tick(delta);
        }
    }

    /// Clips with a non-zero blend weight
    pub fn samples(&self) -> Vec<ClipSample> {
        self.actions.values().filter_map(AnimationAction::sample).collect()
    }
}

impl Default for PoseStateMachine {
    fn default() -> Self {
        Self::new(PoseConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> PoseStateMachine {
        let config = PoseConfig::default();
        let library = ClipLibrary::load([("Neutral_A", 2.0), ("Thinking_A", 2.0)], &config);
        let mut poses = PoseStateMachine::new(config);
        poses.load(&library);
        poses
    }

    #[test]
    fn test_initial_pose_without_fade() {
        let poses = machine();

        assert_eq!(poses.current(), Some("Neutral_A"));
        let neutral = poses.current_action().unwrap();
        assert!(neutral.is_playing());
        assert!(!neutral.is_fading());
        assert_eq!(neutral.effective_weight(), 1.0);
        assert!(!poses.action("Thinking_A").unwrap().is_playing());
    }

    #[test]
    fn test_transition_crossfades() {
        let mut poses = machine();

        let outcome = poses.request("Thinking_A").unwrap();
        assert_eq!(
            outcome,
            PoseTransition::Started {
                from: Some("Neutral_A".to_string()),
                to: "Thinking_A".to_string(),
            }
        );

        // Pointer moves before the fades finish
        assert_eq!(poses.current(), Some("Thinking_A"));

        let thinking = poses.action("Thinking_A").unwrap();
        assert!(thinking.is_playing());
        assert_eq!(thinking.fade().unwrap().to, 1.0);
        assert_eq!(thinking.time(), 0.0);

        let neutral = poses.action("Neutral_A").unwrap();
        assert!(neutral.is_playing());
        assert_eq!(neutral.fade().unwrap().to, 0.0);
    }

    #[test]
    fn test_fades_run_to_completion() {
        let mut poses = machine();
        poses.request("Thinking_A").unwrap();

        for _ in 0..30 {
            poses.tick(FrameDelta::from_secs(1.0 / 60.0));
        }

        assert!(!poses.action("Neutral_A").unwrap().is_playing());
        let thinking = poses.action("Thinking_A").unwrap();
        assert!((thinking.effective_weight() - 1.0).abs() < 1e-5);

        let samples = poses.samples();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].clip, "Thinking_A");
    }

    #[test]
    fn test_request_current_is_noop() {
        let mut poses = machine();
        poses.tick(FrameDelta::from_secs(0.5));
        let before = poses.current_action().unwrap().clone();

        assert_eq!(poses.request("Neutral_A").unwrap(), PoseTransition::Unchanged);
        assert_eq!(poses.current_action().unwrap(), &before);
    }

    #[test]
    fn test_request_unknown_is_noop() {
        let mut poses = machine();
        poses.tick(FrameDelta::from_secs(0.5));
        let before = poses.current_action().unwrap().clone();

        let err = poses.request("Dancing_A").unwrap_err();
        assert_eq!(err, AvatarError::UnknownPose("Dancing_A".to_string()));
        assert_eq!(poses.current(), Some("Neutral_A"));
        assert_eq!(poses.current_action().unwrap(), &before);
    }

    #[test]
    fn test_mid_fade_request_restarts_from_current() {
        let mut poses = machine();
        poses.request("Thinking_A").unwrap();
        poses.tick(FrameDelta::from_secs(0.1));

        poses.request("Neutral_A").unwrap();
        assert_eq!(poses.current(), Some("Neutral_A"));

        // Neutral was fading out; it now ramps back up from where it was
        let neutral = poses.action("Neutral_A").unwrap();
        let fade = neutral.fade().unwrap();
        assert!(fade.from > 0.0 && fade.from < 1.0);
        assert_eq!(fade.to, 1.0);
        assert_eq!(neutral.time(), 0.0);

        let thinking = poses.action("Thinking_A").unwrap();
        assert_eq!(thinking.fade().unwrap().to, 0.0);
    }

    #[test]
    fn test_empty_library() {
        let mut poses = PoseStateMachine::default();
        poses.load(&ClipLibrary::new());

        assert!(!poses.is_loaded());
        assert!(poses.current().is_none());
        assert!(matches!(poses.request("Neutral_A"), Err(AvatarError::UnknownPose(_))));
    }

    #[test]
    fn test_missing_default_pose() {
        let config = PoseConfig::default();
        let library = ClipLibrary::load([("Thinking_A", 2.0)], &config);
        let mut poses = PoseStateMachine::new(config);
        poses.load(&library);

        assert!(poses.is_loaded());
        assert!(poses.current().is_none());

        let outcome = poses.request("Thinking_A").unwrap();
        assert_eq!(
            outcome,
            PoseTransition::Started {
                from: None,
                to: "Thinking_A".to_string(),
            }
        );
    }
}
