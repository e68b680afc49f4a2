//! Viseme timelines
//!
//! A timeline is immutable after ingest except for its playback cursor, which
//! only moves forward.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{coarticulate, CoarticulationConfig, VisemeShape};

/// Timed viseme
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viseme {
    pub shape: VisemeShape,
    /// [0.0 - 1.0]
    pub weight: f32,
    pub duration_ms: u32,
    /// Start, relative to the timeline start
    pub offset_ms: u32,
}

impl Viseme {
    pub fn new(shape: VisemeShape, weight: f32, offset_ms: u32, duration_ms: u32) -> Self {
        let weight = if weight.is_nan() { 0.0 } else { weight.clamp(0.0, 1.0) };
        Self {
            shape,
            weight,
            duration_ms,
            offset_ms,
        }
    }

    #[inline]
    pub fn end_ms(&self) -> u32 {
        self.offset_ms.saturating_add(self.duration_ms)
    }
}

/// Raw TTS frontend event: a viseme id switching on at `time`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisemeEvent {
    pub viseme_id: u8,
    /// Milliseconds from the start
    #[serde(rename = "time")]
    pub time_ms: f32,
    pub weight: f32,
}

/// Event list with its total duration, as delivered by TTS frontends
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisemeEventTrack {
    pub events: Vec<VisemeEvent>,
    /// Milliseconds
    pub duration: f32,
}

impl VisemeEventTrack {
    pub fn to_visemes(&self) -> Vec<Viseme> {
        events_to_visemes(&self.events, self.duration)
    }
}

fn to_ms(value: f32) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.round() as u32
    } else {
        0
    }
}

/// Convert switch-on events into timed visemes.
///
/// Each event lasts until the next known event; the last one lasts until
/// `total_duration_ms`. Unknown ids are skipped.
pub fn events_to_visemes(events: &[VisemeEvent], total_duration_ms: f32) -> Vec<Viseme> {
    let mut known: Vec<(VisemeShape, u32, f32)> = events
        .iter()
        .filter_map(|e| {
            VisemeShape::from_id(e.viseme_id).map(|shape| (shape, to_ms(e.time_ms), e.weight))
        })
        .collect();
    known.sort_by_key(|&(_, time, _)| time);

    let total = to_ms(total_duration_ms);
    let mut visemes = Vec::with_capacity(known.len());
    for (i, &(shape, start, weight)) in known.iter().enumerate() {
        let end = known.get(i + 1).map_or(total.max(start), |&(_, next, _)| next);
        if end > start {
            visemes.push(Viseme::new(shape, weight, start, end - start));
        }
    }
    visemes
}

/// Result of locating the playback position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Playhead {
    /// Index of the viseme that owns the mouth
    Active(usize),
    /// Between entries (or before the first)
    Gap,
    /// Past the end of the last entry
    Finished,
}

/// Sorted, coarticulated viseme sequence anchored to a clock time
#[derive(Debug, Clone)]
pub struct VisemeTimeline {
    visemes: Vec<Viseme>,
    cursor: usize,
    started_at: Duration,
    anticipation_ms: f32,
}

impl VisemeTimeline {
    /// Sort by offset and coarticulate
    pub fn new(mut visemes: Vec<Viseme>, config: &CoarticulationConfig, started_at: Duration) -> Self {
        visemes.sort_by_key(|v| v.offset_ms);
        coarticulate(&mut visemes, config);
        Self {
            visemes,
            cursor: 0,
            started_at,
            anticipation_ms: config.anticipation_ms.max(0.0),
        }
    }

    pub fn visemes(&self) -> &[Viseme] {
        &self.visemes
    }

    pub fn len(&self) -> usize {
        self.visemes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visemes.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn started_at(&self) -> Duration {
        self.started_at
    }

    /// End of the latest-ending entry
    pub fn total_ms(&self) -> u32 {
        self.visemes.iter().map(Viseme::end_ms).max().unwrap_or(0)
    }

    /// Milliseconds since the anchor, never negative
    pub fn elapsed_ms(&self, now: Duration) -> f32 {
        now.saturating_sub(self.started_at).as_secs_f32() * 1000.0
    }

    /// Advance the cursor to `elapsed_ms` and report what owns the mouth.
    ///
    /// An entry owns `[offset - anticipation, end)`. When windows overlap the
    /// later entry wins. The cursor never moves backwards.
    pub fn locate(&mut self, elapsed_ms: f32) -> Playhead {
        let lead = self.anticipation_ms;
        while let Some(current) = self.visemes.get(self.cursor) {
            let past = elapsed_ms >= current.end_ms() as f32;
            let next_due = self
                .visemes
                .get(self.cursor + 1)
                .is_some_and(|next| elapsed_ms + lead >= next.offset_ms as f32);
            if past || next_due {
                self.cursor += 1;
            } else {
                break;
            }
        }

        match self.visemes.get(self.cursor) {
            Some(v) if elapsed_ms + lead >= v.offset_ms as f32 => Playhead::Active(self.cursor),
            Some(_) => Playhead::Gap,
            None => Playhead::Finished,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_coart() -> CoarticulationConfig {
        CoarticulationConfig {
            articulation_floor_ms: 0.0,
            repeat_factor: 1.0,
            anticipation_ms: 30.0,
        }
    }

    fn timeline() -> VisemeTimeline {
        VisemeTimeline::new(
            vec![
                Viseme::new(VisemeShape::O, 0.9, 200, 100),
                Viseme::new(VisemeShape::Aa, 1.0, 0, 100),
                Viseme::new(VisemeShape::SS, 0.5, 100, 100),
            ],
            &no_coart(),
            Duration::from_secs(1),
        )
    }

    #[test]
    fn test_ingest_sorts() {
        let tl = timeline();
        let shapes: Vec<_> = tl.visemes().iter().map(|v| v.shape).collect();
        assert_eq!(shapes, vec![VisemeShape::Aa, VisemeShape::SS, VisemeShape::O]);
        assert_eq!(tl.total_ms(), 300);
    }

    #[test]
    fn test_locate_with_anticipation() {
        let mut tl = timeline();
        assert_eq!(tl.locate(10.0), Playhead::Active(0));
        assert_eq!(tl.locate(69.0), Playhead::Active(0));
        // 30 ms before SS starts
        assert_eq!(tl.locate(70.0), Playhead::Active(1));
        assert_eq!(tl.locate(250.0), Playhead::Active(2));
        assert_eq!(tl.locate(300.0), Playhead::Finished);
    }

    #[test]
    fn test_cursor_is_monotonic() {
        let mut tl = timeline();
        assert_eq!(tl.locate(150.0), Playhead::Active(1));
        // Going back in time never rewinds; the entry's window has not opened
        assert_eq!(tl.locate(10.0), Playhead::Gap);
        assert_eq!(tl.cursor(), 1);
    }

    #[test]
    fn test_gap_before_first_entry() {
        let mut tl = VisemeTimeline::new(
            vec![Viseme::new(VisemeShape::E, 1.0, 500, 100)],
            &no_coart(),
            Duration::ZERO,
        );
        assert_eq!(tl.locate(0.0), Playhead::Gap);
        assert_eq!(tl.locate(480.0), Playhead::Active(0));
    }

    #[test]
    fn test_elapsed_is_anchored() {
        let tl = timeline();
        assert_eq!(tl.elapsed_ms(Duration::from_millis(500)), 0.0);
        assert!((tl.elapsed_ms(Duration::from_millis(1250)) - 250.0).abs() < 1e-3);
    }

    #[test]
    fn test_events_to_visemes_skips_unknown_ids() {
        let events = [
            VisemeEvent { viseme_id: 0, time_ms: 0.0, weight: 1.0 },
            VisemeEvent { viseme_id: 10, time_ms: 50.0, weight: 0.8 },
            VisemeEvent { viseme_id: 99, time_ms: 120.0, weight: 0.8 },
            VisemeEvent { viseme_id: 1, time_ms: 150.0, weight: 0.8 },
        ];
        let visemes = events_to_visemes(&events, 250.0);
        assert_eq!(visemes.len(), 3);
        assert_eq!(visemes[1].shape, VisemeShape::Aa);
        assert_eq!(visemes[1].duration_ms, 100);
        assert_eq!(visemes[2].shape, VisemeShape::PP);
        assert_eq!(visemes[2].end_ms(), 250);
    }

    #[test]
    fn test_event_track_from_json() {
        let json = r#"{"events":[{"visemeId":10,"time":0,"weight":0.8},{"visemeId":14,"time":80,"weight":0.6}],"duration":200}"#;
        let track: VisemeEventTrack = serde_json::from_str(json).unwrap();
        let visemes = track.to_visemes();
        assert_eq!(visemes.len(), 2);
        assert_eq!(visemes[1].shape, VisemeShape::U);
        assert_eq!(visemes[1].duration_ms, 120);
    }
}
