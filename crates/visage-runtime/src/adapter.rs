//! Output adapters - renderer naming conventions over the ARKit-52 core

use visage_core::{BlendshapeWeights, Channel, VisageResult};

use crate::OutputFormat;

/// Converts the canonical weights into a renderer's named values
pub trait OutputAdapter: Send {
    fn name(&self) -> &'static str;

    /// Replace `out` with this adapter's named values
    fn write(&self, weights: &BlendshapeWeights, out: &mut Vec<(&'static str, f32)>);
}

/// ARKit-52 names, one entry per channel
#[derive(Debug, Clone, Copy, Default)]
pub struct ArkitAdapter;

impl ArkitAdapter {
    /// Strict parse of named ARKit values. Unknown names are an error.
    pub fn parse<'a, I>(pairs: I) -> VisageResult<BlendshapeWeights>
    where
        I: IntoIterator<Item = (&'a str, f32)>,
    {
        let mut weights = BlendshapeWeights::ZERO;
        for (name, value) in pairs {
            weights.set(Channel::parse(name)?, value);
        }
        Ok(weights)
    }
}

impl OutputAdapter for ArkitAdapter {
    fn name(&self) -> &'static str {
        "arkit"
    }

    fn write(&self, weights: &BlendshapeWeights, out: &mut Vec<(&'static str, f32)>) {
        out.clear();
        out.extend(weights.iter().map(|(channel, value)| (channel.name(), value)));
    }
}

/// VRM 1.0 preset expressions
#[derive(Debug, Clone, Copy, Default)]
pub struct VrmAdapter;

impl VrmAdapter {
    pub const EXPRESSIONS: [&'static str; 16] = [
        "happy",
        "angry",
        "sad",
        "surprised",
        "aa",
        "ih",
        "ou",
        "ee",
        "oh",
        "blink",
        "blinkLeft",
        "blinkRight",
        "lookUp",
        "lookDown",
        "lookLeft",
        "lookRight",
    ];
}

impl OutputAdapter for VrmAdapter {
    fn name(&self) -> &'static str {
        "vrm"
    }

    fn write(&self, w: &BlendshapeWeights, out: &mut Vec<(&'static str, f32)>) {
        use Channel::*;
        let avg = |a: Channel, b: Channel| (w.get(a) + w.get(b)) * 0.5;

        let blink_left = w.get(EyeBlinkLeft);
        let blink_right = w.get(EyeBlinkRight);

        out.clear();
        out.extend([
            ("happy", avg(MouthSmileLeft, MouthSmileRight)),
            ("angry", avg(BrowDownLeft, BrowDownRight)),
            ("sad", avg(MouthFrownLeft, MouthFrownRight)),
            ("surprised", avg(EyeWideLeft, EyeWideRight)),
            ("aa", w.get(JawOpen)),
            ("ih", avg(MouthUpperUpLeft, MouthUpperUpRight)),
            ("ou", w.get(MouthPucker)),
            ("ee", avg(MouthStretchLeft, MouthStretchRight)),
            ("oh", w.get(MouthFunnel)),
            ("blink", blink_left.min(blink_right)),
            ("blinkLeft", blink_left),
            ("blinkRight", blink_right),
            ("lookUp", avg(EyeLookUpLeft, EyeLookUpRight)),
            ("lookDown", avg(EyeLookDownLeft, EyeLookDownRight)),
            ("lookLeft", avg(EyeLookOutLeft, EyeLookInRight)),
            ("lookRight", avg(EyeLookOutRight, EyeLookInLeft)),
        ]);
    }
}

pub fn adapter_for(format: OutputFormat) -> Box<dyn OutputAdapter> {
    match format {
        OutputFormat::Arkit => Box::new(ArkitAdapter),
        OutputFormat::Vrm => Box::new(VrmAdapter),
    }
}
