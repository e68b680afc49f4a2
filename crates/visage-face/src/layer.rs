//! Expression layers - named overlays composited over the base expression

use serde::{Deserialize, Serialize};
use visage_core::{BlendshapeWeights, ChannelMask};

/// How a layer combines with what is beneath it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// Replace the channel, faded by opacity
    #[default]
    Override,
    /// Clamped sum
    Additive,
    /// Multiply by the layer value, faded by opacity
    Multiply,
}

/// Named overlay
#[derive(Debug, Clone)]
pub struct ExpressionLayer {
    pub name: String,
    pub weights: BlendshapeWeights,
    /// Channels the layer touches. Defaults to the non-zero channels of `weights`.
    pub mask: ChannelMask,
    /// [0.0 - 1.0]
    pub opacity: f32,
    pub mode: BlendMode,
}

impl ExpressionLayer {
    pub fn new(
        name: impl Into<String>,
        weights: BlendshapeWeights,
        opacity: f32,
        mode: BlendMode,
    ) -> Self {
        let mask = weights.nonzero_mask();
        Self::masked(name, weights, mask, opacity, mode)
    }

    /// Layer with an explicit mask, so Override can pin channels to 0
    pub fn masked(
        name: impl Into<String>,
        weights: BlendshapeWeights,
        mask: ChannelMask,
        opacity: f32,
        mode: BlendMode,
    ) -> Self {
        Self {
            name: name.into(),
            weights,
            mask,
            opacity: sanitize_opacity(opacity),
            mode,
        }
    }

    /// Composite this layer onto `base` in place
    pub fn apply(&self, base: &mut BlendshapeWeights) {
        let alpha = self.opacity;
        if alpha <= 0.0 {
            return;
        }

        for channel in self.mask.iter() {
            let below = base.get(channel);
            let layer = self.weights.get(channel);
            let value = match self.mode {
                BlendMode::Override => below + (layer - below) * alpha,
                BlendMode::Additive => below + layer * alpha,
                BlendMode::Multiply => below * (1.0 + (layer - 1.0) * alpha),
            };
            base.set(channel, value);
        }
    }
}

pub(crate) fn sanitize_opacity(opacity: f32) -> f32 {
    if opacity.is_nan() {
        0.0
    } else {
        opacity.clamp(0.0, 1.0)
    }
}
