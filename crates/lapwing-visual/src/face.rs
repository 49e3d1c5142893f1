//! Face - expression control compositing
//!
//! Every frame each known control gets one value from four sources:
//! 1. Base: External targets from chat, or Manual targets in debug mode (never both)
//! 2. Blink overlay on the eyes-closed control
//! 3. Speech overlay on the mouth-open control
//!
//! Overlays go through max(), so they only ever raise the base value.
//! Names the face mesh does not know are dropped.

use std::collections::HashMap;

use lapwing_core::{EYES_CLOSED_CONTROL, MOUTH_OPEN_CONTROL};

/// Name -> value mapping for expression controls
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpressionTargets {
    values: HashMap<String, f32>,
}

impl ExpressionTargets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a target; non-finite values are dropped
    pub fn set(&mut self, name: impl Into<String>, value: f32) {
        if value.is_finite() {
            self.values.insert(name.into(), value);
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: f32) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<f32> {
        self.values.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<S: Into<String>> FromIterator<(S, f32)> for ExpressionTargets {
    fn from_iter<I: IntoIterator<Item = (S, f32)>>(iter: I) -> Self {
        let mut targets = ExpressionTargets::new();
        for (name, value) in iter {
            targets.set(name, value);
        }
        targets
    }
}

/// Where the base value comes from this frame
#[derive(Debug, Clone, Copy)]
pub enum BaseSource<'a> {
    /// Chat/backend targets
    External(&'a ExpressionTargets),
    /// Debug-authored targets
    Manual(&'a ExpressionTargets),
}

impl<'a> BaseSource<'a> {
    fn targets(&self) -> &'a ExpressionTargets {
        match *self {
            BaseSource::External(targets) | BaseSource::Manual(targets) => targets,
        }
    }
}

/// Per-frame snapshot of every expression source
#[derive(Debug, Clone, Copy)]
pub struct ExpressionSources<'a> {
    pub base: BaseSource<'a>,
    /// Blink closure, present only while a blink is in progress
    pub blink: Option<f32>,
    /// Mouth opening, present only while speaking
    pub speech: Option<f32>,
}

/// Resolved control values in face mesh order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedExpression {
    values: Vec<(String, f32)>,
}

impl ResolvedExpression {
    pub fn get(&self, name: &str) -> Option<f32> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.values.iter().map(|(n, v)| (n.as_str(), *v))
    }
}

/// Expression compositor
#[derive(Debug, Clone)]
pub struct ExpressionCompositor {
    /// Controls discovered on the face mesh
    controls: Vec<String>,
    eyes_closed: String,
    mouth_open: String,
}

impl ExpressionCompositor {
    pub fn new(controls: Vec<String>) -> Self {
        Self::with_designated(controls, EYES_CLOSED_CONTROL, MOUTH_OPEN_CONTROL)
    }

    /// Use custom names for the blink and speech controls
    pub fn with_designated(controls: Vec<String>, eyes_closed: &str, mouth_open: &str) -> Self {
        Self {
            controls,
            eyes_closed: eyes_closed.to_string(),
            mouth_open: mouth_open.to_string(),
        }
    }

    pub fn controls(&self) -> &[String] {
        &self.controls
    }

    pub fn knows(&self, name: &str) -> bool {
        self.controls.iter().any(|c| c == name)
    }

    /// Target names the face mesh does not have
    pub fn unknown<'t>(&self, targets: &'t ExpressionTargets) -> Vec<&'t str> {
        targets
            .iter()
            .map(|(name, _)| name)
            .filter(|name| !self.knows(name))
            .collect()
    }

    /// Resolve one control
    pub fn resolve_control(&self, name: &str, sources: &ExpressionSources<'_>) -> f32 {
        let mut value = sources.base.targets().get(name).unwrap_or(0.0);

        if name == self.eyes_closed {
            if let Some(closure) = sources.blink {
                value = value.max(closure);
            }
        }

        if name == self.mouth_open {
            if let Some(opening) = sources.speech {
                value = value.max(opening);
            }
        }

        value.clamp(0.0, 1.0)
    }

    /// Resolve every known control
    pub fn resolve(&self, sources: &ExpressionSources<'_>) -> ResolvedExpression {
        ResolvedExpression {
            values: self
                .controls
                .iter()
                .map(|name| (name.clone(), self.resolve_control(name, sources)))
                .collect(),
        }
    }
}
