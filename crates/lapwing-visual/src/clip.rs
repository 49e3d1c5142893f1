//! Clips and Actions - recorded skeletal sequences and their playback state
//!
//! A Clip is immutable once loaded. An AnimationAction is the mutable
//! playback handle bound to it: local time, weight, loop count and an
//! optional in-flight fade. Track sampling is the render host's job; the
//! engine only decides which clip plays, where, and how strongly.

use std::collections::BTreeMap;

use lapwing_core::{is_pose_clip, FrameDelta};

use crate::PoseConfig;

/// How a clip behaves when it reaches its end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPolicy {
    /// Play a single cycle
    Once,
    /// Play `n` cycles, wrapping time in between
    Repeat(u32),
}

/// Skeletal clip metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    pub name: String,
    /// Duration in seconds
    pub duration: f32,
    pub loop_policy: LoopPolicy,
    /// Hold the final frame instead of stopping
    pub clamp_when_finished: bool,
}

impl Clip {
    /// Configure a clip by name convention: poses play once and hold,
    /// everything else repeats a bounded number of cycles.
    pub fn from_source(name: &str, duration: f32, config: &PoseConfig) -> Self {
        let duration = if duration.is_finite() { duration.max(0.0) } else { 0.0 };

        if is_pose_clip(name, &config.pose_suffix) {
            Clip {
                name: name.to_string(),
                duration,
                loop_policy: LoopPolicy::Once,
                clamp_when_finished: true,
            }
        } else {
            Clip {
                name: name.to_string(),
                duration,
                loop_policy: LoopPolicy::Repeat(config.repeat_count.max(1)),
                clamp_when_finished: false,
            }
        }
    }

    pub fn is_pose(&self) -> bool {
        self.loop_policy == LoopPolicy::Once && self.clamp_when_finished
    }
}

/// Named clip library supplied by the asset provider
#[derive(Debug, Clone, Default)]
pub struct ClipLibrary {
    clips: BTreeMap<String, Clip>,
}

impl ClipLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from (name, duration) pairs, applying loop policy by name
    pub fn load<I, S>(sources: I, config: &PoseConfig) -> Self
    where
        I: IntoIterator<Item = (S, f32)>,
        S: AsRef<str>,
    {
        let clips = sources
            .into_iter()
            .map(|(name, duration)| {
                let clip = Clip::from_source(name.as_ref(), duration, config);
                (clip.name.clone(), clip)
            })
            .collect();
        Self { clips }
    }

    pub fn insert(&mut self, clip: Clip) {
        self.clips.insert(clip.name.clone(), clip);
    }

    pub fn get(&self, name: &str) -> Option<&Clip> {
        self.clips.get(name)
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Clip> {
        self.clips.values()
    }
}

/// One clip's contribution to the blended skeleton this frame
#[derive(Debug, Clone, PartialEq)]
pub struct ClipSample {
    pub clip: String,
    /// Local clip time in seconds
    pub time: f32,
    /// Blend weight [0.0 - 1.0]
    pub weight: f32,
}

/// Linear weight ramp
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fade {
    pub from: f32,
    pub to: f32,
    pub elapsed: f32,
    pub duration: f32,
}

impl Fade {
    fn new(from: f32, to: f32, duration: f32) -> Self {
        Self {
            from,
            to,
            elapsed: 0.0,
            duration: duration.max(0.0),
        }
    }

    fn value(&self) -> f32 {
        if self.duration <= 0.0 {
            return self.to;
        }
        let t = (self.elapsed / self.duration).clamp(0.0, 1.0);
        self.from + (self.to - self.from) * t
    }

    fn is_done(&self) -> bool {
        self.elapsed >= self.duration
    }
}

/// Playback handle bound to a clip
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationAction {
    clip: Clip,
    time: f32,
    weight: f32,
    fade: Option<Fade>,
    loops_completed: u32,
    playing: bool,
    finished: bool,
}

impl AnimationAction {
    pub fn new(clip: Clip) -> Self {
        Self {
            clip,
            time: 0.0,
            weight: 1.0,
            fade: None,
            loops_completed: 0,
            playing: false,
            finished: false,
        }
    }

    pub fn clip(&self) -> &Clip {
        &self.clip
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Ended and holding its last frame (clamped clips only)
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    pub fn fade(&self) -> Option<&Fade> {
        self.fade.as_ref()
    }

    pub fn loops_completed(&self) -> u32 {
        self.loops_completed
    }

    /// Weight this action contributes to the blend (0 when stopped)
    pub fn effective_weight(&self) -> f32 {
        if self.playing {
            self.weight
        } else {
            0.0
        }
    }

    /// Rewind to the start. Weight and fades are left alone.
    pub fn reset(&mut self) {
        self.time = 0.0;
        self.loops_completed = 0;
        self.finished = false;
    }

    /// Start playback at full weight unless a fade is scheduled
    pub fn play(&mut self) {
        if !self.playing && self.fade.is_none() {
            self.weight = 1.0;
        }
        self.playing = true;
    }

    /// Ramp weight up to 1 from wherever the blend currently is
    pub fn fade_in(&mut self, duration: f32) {
        let from = self.effective_weight();
        self.weight = from;
        self.fade = Some(Fade::new(from, 1.0, duration));
    }

    /// Ramp weight down to 0, then stop. Playback continues meanwhile.
    pub fn fade_out(&mut self, duration: f32) {
        let from = self.effective_weight();
        self.weight = from;
        self.fade = Some(Fade::new(from, 0.0, duration));
    }

    pub fn stop(&mut self) {
        self.playing = false;
        self.fade = None;
    }

    /// Advance local time and any fade by one frame
    pub fn tick(&mut self, delta: FrameDelta) {
        if !self.playing {
            return;
        }
        let dt = delta.as_secs();

        if let Some(mut fade) = self.fade.take() {
            fade.elapsed += dt;
            self.weight = fade.value();
            if !fade.is_done() {
                self.fade = Some(fade);
            } else if fade.to <= 0.0 {
                self.stop();
                return;
            }
        }

        if self.finished {
            return;
        }

        self.time += dt;
        let duration = self.clip.duration;

        match self.clip.loop_policy {
            LoopPolicy::Once => {
                if self.time >= duration {
                    self.loops_completed = 1;
                    self.finish();
                }
            }
            LoopPolicy::Repeat(cycles) => {
                if duration <= 0.0 {
                    self.loops_completed = cycles;
                    self.finish();
                    return;
                }
                while self.time >= duration {
                    self.loops_completed += 1;
                    if self.loops_completed >= cycles {
                        self.finish();
                        break;
                    }
                    self.time -= duration;
                }
            }
        }
    }

    fn finish(&mut self) {
        if self.clip.clamp_when_finished {
            self.time = self.clip.duration;
            self.finished = true;
        } else {
            self.time = 0.0;
            self.stop();
        }
    }

    /// Blend contribution, if any
    pub fn sample(&self) -> Option<ClipSample> {
        let weight = self.effective_weight();
        if weight <= 0.0 {
            return None;
        }
        Some(ClipSample {
            clip: self.clip.name.clone(),
            time: self.time,
            weight,
        })
    }
}
