//! Blendshape weight vector
//!
//! INVARIANT: every stored weight is in [0, 1]. All writes clamp, NaN becomes 0.

use std::collections::HashMap;

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::{Channel, ChannelMask};

#[inline]
fn clamp_weight(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Fixed-channel weight vector
#[derive(Clone, Copy, PartialEq)]
pub struct BlendshapeWeights {
    values: [f32; Channel::COUNT],
}

impl BlendshapeWeights {
    /// All channels at rest
    pub const ZERO: BlendshapeWeights = BlendshapeWeights {
        values: [0.0; Channel::COUNT],
    };

    pub fn new() -> Self {
        Self::ZERO
    }

    /// Build from a partial table; channels not listed stay at 0
    pub fn from_pairs(pairs: &[(Channel, f32)]) -> Self {
        let mut weights = Self::ZERO;
        for &(channel, value) in pairs {
            weights.set(channel, value);
        }
        weights
    }

    /// Build from name/value pairs, skipping names that are not channels
    pub fn from_named<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, f32)>,
    {
        let mut weights = Self::ZERO;
        for (name, value) in pairs {
            if let Some(channel) = Channel::from_name(name) {
                weights.set(channel, value);
            }
        }
        weights
    }

    #[inline]
    pub fn get(&self, channel: Channel) -> f32 {
        self.values[channel.index()]
    }

    #[inline]
    pub fn set(&mut self, channel: Channel, value: f32) {
        self.values[channel.index()] = clamp_weight(value);
    }

    /// Add a signed delta to one channel, clamped
    #[inline]
    pub fn add_to(&mut self, channel: Channel, delta: f32) {
        let i = channel.index();
        self.values[i] = clamp_weight(self.values[i] + delta);
    }

    /// Raise a channel to at least `value`
    #[inline]
    pub fn raise_to(&mut self, channel: Channel, value: f32) {
        let i = channel.index();
        self.values[i] = clamp_weight(self.values[i].max(value));
    }

    /// Interpolate `a` → `b`. `t` is not clamped so spring curves can overshoot,
    /// the per-channel result still is.
    pub fn lerp(a: &BlendshapeWeights, b: &BlendshapeWeights, t: f32) -> BlendshapeWeights {
        let mut out = Self::ZERO;
        for i in 0..Channel::COUNT {
            out.values[i] = clamp_weight(a.values[i] * (1.0 - t) + b.values[i] * t);
        }
        out
    }

    /// Clamped per-channel sum
    pub fn add(a: &BlendshapeWeights, b: &BlendshapeWeights) -> BlendshapeWeights {
        let mut out = Self::ZERO;
        for i in 0..Channel::COUNT {
            out.values[i] = clamp_weight(a.values[i] + b.values[i]);
        }
        out
    }

    /// Clamped per-channel product with a scalar
    pub fn scale(w: &BlendshapeWeights, k: f32) -> BlendshapeWeights {
        let mut out = Self::ZERO;
        for i in 0..Channel::COUNT {
            out.values[i] = clamp_weight(w.values[i] * k);
        }
        out
    }

    /// Copy the masked channels of `source` into `self`
    pub fn overwrite(&mut self, source: &BlendshapeWeights, mask: ChannelMask) {
        for channel in mask.iter() {
            self.values[channel.index()] = source.values[channel.index()];
        }
    }

    /// Channels with a non-zero weight
    pub fn nonzero_mask(&self) -> ChannelMask {
        let mut mask = ChannelMask::EMPTY;
        for channel in Channel::ALL {
            if self.get(channel) > 0.0 {
                mask.insert(channel);
            }
        }
        mask
    }

    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|v| *v == 0.0)
    }

    /// Largest absolute per-channel difference
    pub fn max_difference(&self, other: &BlendshapeWeights) -> f32 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f32::max)
    }

    /// Largest absolute difference restricted to a mask
    pub fn max_difference_in(&self, other: &BlendshapeWeights, mask: ChannelMask) -> f32 {
        mask.iter()
            .map(|c| (self.get(c) - other.get(c)).abs())
            .fold(0.0, f32::max)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Channel, f32)> + '_ {
        Channel::ALL.iter().map(move |c| (*c, self.get(*c)))
    }

    /// Non-zero channels only
    pub fn active(&self) -> impl Iterator<Item = (Channel, f32)> + '_ {
        self.iter().filter(|(_, v)| *v > 0.0)
    }

    /// Raw values in channel index order
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }
}

impl Default for BlendshapeWeights {
    fn default() -> Self {
        Self::ZERO
    }
}

impl std::fmt::Debug for BlendshapeWeights {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.active().map(|(c, v)| (c.name(), v)))
            .finish()
    }
}

impl Serialize for BlendshapeWeights {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Channel::COUNT))?;
        for (channel, value) in self.iter() {
            map.serialize_entry(channel.name(), &value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for BlendshapeWeights {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = HashMap::<String, f32>::deserialize(deserializer)?;
        Ok(BlendshapeWeights::from_named(
            raw.iter().map(|(name, value)| (name.as_str(), *value)),
        ))
    }
}
