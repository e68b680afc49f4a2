//! Timeline generation
//!
//! Builds viseme lists from whatever timing a TTS provider hands back:
//! phoneme timings, word timestamps, or just the text and its audio length.

use serde::{Deserialize, Serialize};

use crate::{digraph_to_viseme, letter_to_viseme, phoneme_to_viseme, Viseme, VisemeShape};

/// Weight given to generated speech visemes
pub const SPEECH_WEIGHT: f32 = 0.8;

/// One phoneme with its timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhonemeTiming {
    pub symbol: String,
    pub start_ms: u32,
    pub end_ms: u32,
}

impl PhonemeTiming {
    pub fn new(symbol: impl Into<String>, start_ms: u32, end_ms: u32) -> Self {
        Self {
            symbol: symbol.into(),
            start_ms,
            end_ms,
        }
    }
}

/// Visemes from phoneme timings. Unknown symbols are skipped.
pub fn from_phonemes(phonemes: &[PhonemeTiming]) -> Vec<Viseme> {
    phonemes
        .iter()
        .filter(|p| p.end_ms > p.start_ms)
        .filter_map(|p| {
            let shape = phoneme_to_viseme(&p.symbol)?;
            Some(Viseme::new(shape, SPEECH_WEIGHT, p.start_ms, p.end_ms - p.start_ms))
        })
        .collect()
}

/// Durations used when only text is available (milliseconds)
#[derive(Debug, Clone)]
pub struct TextTiming {
    pub vowel_ms: f32,
    pub fricative_ms: f32,
    pub consonant_ms: f32,
    pub word_pause_ms: f32,
    pub clause_pause_ms: f32,
    pub sentence_pause_ms: f32,
    /// Silence before the first sound and after the last
    pub lead_ms: f32,
}

impl Default for TextTiming {
    fn default() -> Self {
        Self {
            vowel_ms: 100.0,
            fricative_ms: 80.0,
            consonant_ms: 60.0,
            word_pause_ms: 80.0,
            clause_pause_ms: 100.0,
            sentence_pause_ms: 150.0,
            lead_ms: 50.0,
        }
    }
}

impl TextTiming {
    fn letter_ms(&self, letter: char) -> f32 {
        match letter.to_ascii_lowercase() {
            'a' | 'e' | 'i' | 'o' | 'u' => self.vowel_ms,
            's' | 'z' | 'f' | 'v' => self.fricative_ms,
            _ => self.consonant_ms,
        }
    }
}

/// Contiguous spans in fractional milliseconds, rounded on output
struct SpanBuilder {
    spans: Vec<(VisemeShape, f32, f32, f32)>,
}

impl SpanBuilder {
    fn new() -> Self {
        Self { spans: Vec::new() }
    }

    fn push(&mut self, shape: VisemeShape, weight: f32, start: f32, duration: f32) {
        self.spans.push((shape, weight, start, duration));
    }

    fn build(self, scale: f32) -> Vec<Viseme> {
        self.spans
            .into_iter()
            .filter_map(|(shape, weight, start, duration)| {
                let from = (start * scale).round().max(0.0) as u32;
                let to = ((start + duration) * scale).round().max(0.0) as u32;
                (to > from).then(|| Viseme::new(shape, weight, from, to - from))
            })
            .collect()
    }
}

/// Approximate visemes from raw text
///
/// Timings come from `TextTiming`. When the audio is longer than the natural
/// length, timings are stretched to span it; they are never compressed.
pub fn from_text(text: &str, target_duration_ms: u32) -> Vec<Viseme> {
    from_text_with(text, target_duration_ms, &TextTiming::default())
}

pub fn from_text_with(text: &str, target_duration_ms: u32, timing: &TextTiming) -> Vec<Viseme> {
    let chars: Vec<char> = text.trim().chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }

    let mut spans = SpanBuilder::new();
    spans.push(VisemeShape::Sil, 1.0, 0.0, timing.lead_ms);
    let mut at = timing.lead_ms;

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        i += 1;

        let pause = match c {
            c if c.is_whitespace() => Some((0.5, timing.word_pause_ms)),
            '.' | '!' | '?' => Some((1.0, timing.sentence_pause_ms)),
            ',' | ';' | ':' => Some((0.7, timing.clause_pause_ms)),
            _ => None,
        };
        if let Some((weight, duration)) = pause {
            spans.push(VisemeShape::Sil, weight, at, duration);
            at += duration;
            continue;
        }

        let digraph = chars.get(i).and_then(|&next| digraph_to_viseme(c, next));
        let shape = match digraph {
            Some(shape) => {
                i += 1;
                shape
            }
            None => match letter_to_viseme(c) {
                Some(shape) => shape,
                None => continue,
            },
        };

        let duration = timing.letter_ms(c);
        spans.push(shape, SPEECH_WEIGHT, at, duration);
        at += duration;
    }

    let natural = at + timing.lead_ms;
    let target = target_duration_ms as f32;
    let scale = if natural > 0.0 && target > natural {
        target / natural
    } else {
        1.0
    };
    spans.build(scale)
}

/// Viseme sequence for one spelled word, consecutive duplicates collapsed
pub fn word_to_visemes(word: &str) -> Vec<VisemeShape> {
    let chars: Vec<char> = word
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_lowercase())
        .collect();

    let mut out: Vec<VisemeShape> = Vec::with_capacity(chars.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        i += 1;
        let shape = match chars.get(i).and_then(|&next| digraph_to_viseme(c, next)) {
            Some(shape) => {
                i += 1;
                shape
            }
            None => letter_to_viseme(c).unwrap_or(VisemeShape::Aa),
        };
        if out.last() != Some(&shape) {
            out.push(shape);
        }
    }
    out
}

/// Silence weight at word ends
const WORD_END_WEIGHT: f32 = 0.3;
/// Silence after the last word, and at a word end with no following word
const WORD_END_MS: f32 = 50.0;

/// Visemes from word-level timestamps (seconds)
///
/// Each word's visemes are spread evenly across the word, followed by a
/// brief silence. Words past the shortest of the three slices are ignored.
pub fn from_word_timestamps<S: AsRef<str>>(
    words: &[S],
    starts_s: &[f32],
    ends_s: &[f32],
) -> Vec<Viseme> {
    let count = words.len().min(starts_s.len()).min(ends_s.len());
    let mut spans = SpanBuilder::new();

    for i in 0..count {
        let start = starts_s[i] * 1000.0;
        let end = ends_s[i] * 1000.0;
        if !start.is_finite() || !end.is_finite() || end <= start {
            continue;
        }

        let sequence = word_to_visemes(words[i].as_ref());
        if sequence.is_empty() {
            continue;
        }

        let step = (end - start) / sequence.len() as f32;
        for (j, shape) in sequence.into_iter().enumerate() {
            spans.push(shape, SPEECH_WEIGHT, start + j as f32 * step, step);
        }

        let gap = match starts_s.get(i + 1).filter(|_| i + 1 < count) {
            Some(next) if next * 1000.0 > end => next * 1000.0 - end,
            Some(_) => 0.0,
            None => WORD_END_MS,
        };
        spans.push(VisemeShape::Sil, WORD_END_WEIGHT, end, gap);
    }

    spans.build(1.0)
}
