//! Lip Sync Controller
//!
//! Playback position comes from the injected clock, not from summed frame
//! deltas; `dt` only drives the pose easing and the engagement ramp.

use std::sync::Arc;

use tracing::{debug, info};
use visage_core::{BlendshapeWeights, Clock, EaseCurve};

use crate::{
    CoarticulationConfig, Playhead, SyntheticConfig, SyntheticMouth, Viseme, VisemeShape,
    VisemeTimeline,
};

/// Lip sync configuration
#[derive(Debug, Clone)]
pub struct LipSyncConfig {
    /// Seconds to ease between viseme poses
    pub transition: f32,
    pub curve: EaseCurve,
    /// Seconds for engagement to ramp fully in or out
    pub engagement_ramp: f32,
    pub coarticulation: CoarticulationConfig,
    pub synthetic: SyntheticConfig,
}

impl Default for LipSyncConfig {
    fn default() -> Self {
        Self {
            transition: 0.06,
            curve: EaseCurve::EaseOut,
            engagement_ramp: 0.1,
            coarticulation: CoarticulationConfig::default(),
            synthetic: SyntheticConfig::default(),
        }
    }
}

/// Eased move between two mouth poses
#[derive(Debug, Clone)]
struct PoseTransition {
    from: BlendshapeWeights,
    to: BlendshapeWeights,
    duration: f32,
    elapsed: f32,
    curve: EaseCurve,
}

impl PoseTransition {
    fn at_rest() -> Self {
        Self {
            from: BlendshapeWeights::ZERO,
            to: BlendshapeWeights::ZERO,
            duration: 0.0,
            elapsed: 0.0,
            curve: EaseCurve::Linear,
        }
    }

    fn sample(&self) -> BlendshapeWeights {
        if self.duration <= 0.0 || self.elapsed >= self.duration {
            return self.to;
        }
        let t = self.curve.evaluate(self.elapsed / self.duration);
        BlendshapeWeights::lerp(&self.from, &self.to, t)
    }
}

/// Lip sync controller
pub struct LipSyncController {
    config: LipSyncConfig,
    clock: Arc<dyn Clock>,

    timeline: Option<VisemeTimeline>,
    speaking: bool,
    synthetic: SyntheticMouth,

    /// Target viseme and intensity
    target: (VisemeShape, f32),
    transition: PoseTransition,
    pose: BlendshapeWeights,
    engagement: f32,

    utterances_finished: u64,
}

impl std::fmt::Debug for LipSyncController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LipSyncController")
            .field("target", &self.target)
            .field("speaking", &self.speaking)
            .field("timeline_len", &self.timeline.as_ref().map(VisemeTimeline::len))
            .field("engagement", &self.engagement)
            .finish()
    }
}

const SILENCE: (VisemeShape, f32) = (VisemeShape::Sil, 0.0);

impl LipSyncController {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_config(LipSyncConfig::default(), clock)
    }

    pub fn with_config(config: LipSyncConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            synthetic: SyntheticMouth::new(config.synthetic),
            config,
            clock,
            timeline: None,
            speaking: false,
            target: SILENCE,
            transition: PoseTransition::at_rest(),
            pose: BlendshapeWeights::ZERO,
            engagement: 0.0,
            utterances_finished: 0,
        }
    }

    /// Replace the timeline, anchored to now. An empty list clears.
    pub fn queue_visemes(&mut self, visemes: Vec<Viseme>) {
        if visemes.is_empty() {
            self.clear_queue();
            return;
        }

        let timeline =
            VisemeTimeline::new(visemes, &self.config.coarticulation, self.clock.now());
        debug!(
            visemes = timeline.len(),
            total_ms = timeline.total_ms(),
            replaced = self.timeline.is_some(),
            "Viseme timeline queued"
        );
        self.timeline = Some(timeline);
    }

    /// Cancel playback, including the synthetic cycle, and head for silence.
    /// Idempotent.
    pub fn clear_queue(&mut self) {
        if self.timeline.take().is_some() || self.speaking {
            debug!("Lip sync cleared");
        }
        self.speaking = false;
        self.synthetic.reset();
        if self.target != SILENCE {
            self.transition_to(VisemeShape::Sil, 0.0, None);
        }
    }

    /// Ease toward `shape` at `intensity` over `duration` seconds
    /// (the configured transition when `None`)
    pub fn transition_to(&mut self, shape: VisemeShape, intensity: f32, duration: Option<f32>) {
        let intensity = if shape.is_silence() || intensity.is_nan() {
            0.0
        } else {
            intensity.clamp(0.0, 1.0)
        };
        let duration = duration
            .filter(|d| d.is_finite())
            .unwrap_or(self.config.transition)
            .max(0.0);

        self.target = (shape, intensity);
        self.transition = PoseTransition {
            from: self.pose,
            to: shape.pose(intensity),
            duration,
            elapsed: 0.0,
            curve: self.config.curve,
        };
        if duration == 0.0 {
            self.pose = self.transition.to;
        }
    }

    /// Speaking without a timeline runs the synthetic cycle.
    /// A falling edge clears the queue.
    pub fn set_speaking(&mut self, speaking: bool) {
        if speaking == self.speaking {
            return;
        }
        if speaking {
            self.speaking = true;
            self.synthetic.reset();
        } else {
            self.clear_queue();
        }
    }

    /// Advance one frame and return the target viseme and intensity
    pub fn update(&mut self, dt: f32) -> (VisemeShape, f32) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        let goal = self.playback_target(dt);
        if goal != self.target {
            self.transition_to(goal.0, goal.1, None);
        }

        self.transition.elapsed += dt;
        self.pose = self.transition.sample();

        let engaged = if self.is_active() { 1.0 } else { 0.0 };
        let ramp = self.config.engagement_ramp;
        self.engagement = if ramp <= 0.0 {
            engaged
        } else if engaged > self.engagement {
            (self.engagement + dt / ramp).min(engaged)
        } else {
            (self.engagement - dt / ramp).max(engaged)
        };

        self.target
    }

    fn playback_target(&mut self, dt: f32) -> (VisemeShape, f32) {
        if let Some(timeline) = self.timeline.as_mut() {
            let elapsed = timeline.elapsed_ms(self.clock.now());
            match timeline.locate(elapsed) {
                Playhead::Active(index) => {
                    let v = timeline.visemes()[index];
                    return if v.shape.is_silence() {
                        SILENCE
                    } else {
                        (v.shape, v.weight)
                    };
                }
                Playhead::Gap => return SILENCE,
                Playhead::Finished => {
                    self.utterances_finished += 1;
                    info!(elapsed_ms = elapsed, "Utterance finished");
                    // The utterance ends speech; a late falling edge is a no-op
                    self.clear_queue();
                    return SILENCE;
                }
            }
        }

        if self.speaking {
            return (VisemeShape::Aa, self.synthetic.advance(dt));
        }
        SILENCE
    }

    /// Current eased mouth pose, articulator channels only
    pub fn mouth_pose(&self) -> &BlendshapeWeights {
        &self.pose
    }

    /// How strongly lip sync owns the mouth [0.0 - 1.0]
    pub fn engagement(&self) -> f32 {
        self.engagement
    }

    /// Playing a timeline or running the synthetic cycle
    pub fn is_active(&self) -> bool {
        self.timeline.is_some() || self.speaking
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking
    }

    pub fn target(&self) -> (VisemeShape, f32) {
        self.target
    }

    pub fn timeline(&self) -> Option<&VisemeTimeline> {
        self.timeline.as_ref()
    }

    /// Timelines that ran to their end
    pub fn utterances_finished(&self) -> u64 {
        self.utterances_finished
    }

    pub fn config(&self) -> &LipSyncConfig {
        &self.config
    }
}
