//! Expression Controller - base expression transitions plus named layers
//!
//! Transitions are never queued. A new target restarts from wherever the face
//! currently is, so an interrupted transition continues smoothly instead of
//! jumping back to its start.

use tracing::trace;
use visage_core::{BlendshapeWeights, ChannelMask, EaseCurve};

use crate::layer::sanitize_opacity;
use crate::{BlendMode, ExpressionLayer, ExpressionPreset};

/// Duration and curve of a transition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionProfile {
    /// Seconds
    pub duration: f32,
    pub curve: EaseCurve,
}

impl TransitionProfile {
    pub const SNAP: TransitionProfile = TransitionProfile {
        duration: 0.0,
        curve: EaseCurve::Linear,
    };
    pub const QUICK: TransitionProfile = TransitionProfile {
        duration: 0.08,
        curve: EaseCurve::EaseOut,
    };
    pub const NORMAL: TransitionProfile = TransitionProfile {
        duration: 0.15,
        curve: EaseCurve::EaseInOut,
    };
    pub const SLOW: TransitionProfile = TransitionProfile {
        duration: 0.4,
        curve: EaseCurve::EaseInOut,
    };

    pub fn new(duration: f32, curve: EaseCurve) -> Self {
        Self { duration, curve }
    }
}

impl Default for TransitionProfile {
    fn default() -> Self {
        Self::NORMAL
    }
}

/// In-flight transition
#[derive(Debug, Clone)]
pub struct Transition {
    pub from: BlendshapeWeights,
    pub to: BlendshapeWeights,
    /// Seconds
    pub duration: f32,
    /// Seconds
    pub elapsed: f32,
    pub curve: EaseCurve,
}

impl Transition {
    /// Linear progress in [0, 1]
    #[inline]
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (self.elapsed / self.duration).clamp(0.0, 1.0)
    }

    #[inline]
    pub fn is_done(&self) -> bool {
        self.progress() >= 1.0
    }

    /// Weights at the current progress
    pub fn sample(&self) -> BlendshapeWeights {
        if self.is_done() {
            return self.to;
        }
        BlendshapeWeights::lerp(&self.from, &self.to, self.curve.evaluate(self.progress()))
    }
}

/// Expression controller
#[derive(Debug)]
pub struct ExpressionController {
    /// Base expression as of the last update (before layers)
    current: BlendshapeWeights,
    target: BlendshapeWeights,
    transition: Option<Transition>,
    layers: Vec<ExpressionLayer>,
}

impl ExpressionController {
    pub fn new() -> Self {
        Self {
            current: BlendshapeWeights::ZERO,
            target: BlendshapeWeights::ZERO,
            transition: None,
            layers: Vec::new(),
        }
    }

    /// Jump to `weights`, cancelling any transition
    pub fn set_immediate(&mut self, weights: BlendshapeWeights) {
        self.current = weights;
        self.target = weights;
        self.transition = None;
    }

    /// Start a transition from the current base toward `weights`.
    /// Replaces any in-flight transition. Non-positive durations are immediate.
    pub fn transition_to(&mut self, weights: BlendshapeWeights, duration: f32, curve: EaseCurve) {
        if !duration.is_finite() || duration <= 0.0 {
            self.set_immediate(weights);
            return;
        }

        self.target = weights;
        self.transition = Some(Transition {
            from: self.current,
            to: weights,
            duration,
            elapsed: 0.0,
            curve,
        });
    }

    pub fn transition_to_preset(&mut self, preset: ExpressionPreset, profile: TransitionProfile) {
        self.transition_to(preset.resolve(), profile.duration, profile.curve);
    }

    /// Insert or replace a layer. A replaced layer keeps its position.
    pub fn add_layer(
        &mut self,
        name: &str,
        weights: BlendshapeWeights,
        opacity: f32,
        mode: BlendMode,
    ) {
        self.upsert(ExpressionLayer::new(name, weights, opacity, mode));
    }

    pub fn add_layer_masked(
        &mut self,
        name: &str,
        weights: BlendshapeWeights,
        mask: ChannelMask,
        opacity: f32,
        mode: BlendMode,
    ) {
        self.upsert(ExpressionLayer::masked(name, weights, mask, opacity, mode));
    }

    fn upsert(&mut self, layer: ExpressionLayer) {
        match self.layers.iter_mut().find(|l| l.name == layer.name) {
            Some(existing) => *existing = layer,
            None => {
                trace!(layer = %layer.name, mode = ?layer.mode, "Expression layer added");
                self.layers.push(layer);
            }
        }
    }

    /// Remove a layer; no-op if absent
    pub fn remove_layer(&mut self, name: &str) {
        let before = self.layers.len();
        self.layers.retain(|l| l.name != name);
        if self.layers.len() != before {
            trace!(layer = name, "Expression layer removed");
        }
    }

    /// Returns false if no layer has that name
    pub fn set_layer_opacity(&mut self, name: &str, opacity: f32) -> bool {
        match self.layers.iter_mut().find(|l| l.name == name) {
            Some(layer) => {
                layer.opacity = sanitize_opacity(opacity);
                true
            }
            None => false,
        }
    }

    pub fn clear_layers(&mut self) {
        self.layers.clear();
    }

    /// Advance the transition and return the base composited with all layers
    pub fn update(&mut self, dt: f32) -> BlendshapeWeights {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        if let Some(transition) = self.transition.as_mut() {
            transition.elapsed += dt;
            self.current = transition.sample();
            if transition.is_done() {
                self.current = self.target;
                self.transition = None;
            }
        }

        let mut out = self.current;
        for layer in &self.layers {
            layer.apply(&mut out);
        }
        out
    }

    /// Base expression before layers
    pub fn current(&self) -> &BlendshapeWeights {
        &self.current
    }

    pub fn target(&self) -> &BlendshapeWeights {
        &self.target
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    pub fn transition(&self) -> Option<&Transition> {
        self.transition.as_ref()
    }

    pub fn layer_names(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().map(|l| l.name.as_str())
    }

    pub fn layer(&self, name: &str) -> Option<&ExpressionLayer> {
        self.layers.iter().find(|l| l.name == name)
    }
}

impl Default for ExpressionController {
    fn default() -> Self {
        Self::new()
    }
}
