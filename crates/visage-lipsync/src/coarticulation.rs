//! Coarticulation - neighbouring sounds reshape each other
//!
//! Applied once when a timeline is ingested, never per frame.

use crate::Viseme;

/// Coarticulation tuning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoarticulationConfig {
    /// Entries shorter than this cannot reach full articulation
    pub articulation_floor_ms: f32,
    /// Weight multiplier for an entry repeating the previous shape
    pub repeat_factor: f32,
    /// How early the mouth starts moving toward the next entry
    pub anticipation_ms: f32,
}

impl Default for CoarticulationConfig {
    fn default() -> Self {
        Self {
            articulation_floor_ms: 60.0,
            repeat_factor: 0.7,
            anticipation_ms: 30.0,
        }
    }
}

/// Rewrite weights of a time-sorted viseme list in place
pub fn coarticulate(visemes: &mut [Viseme], config: &CoarticulationConfig) {
    let floor = config.articulation_floor_ms.max(0.0);

    for i in 0..visemes.len() {
        let shape = visemes[i].shape;
        let mut weight = visemes[i].weight;

        if floor > 0.0 && (visemes[i].duration_ms as f32) < floor {
            weight *= visemes[i].duration_ms as f32 / floor;
        }

        if i > 0 && !shape.is_silence() && visemes[i - 1].shape == shape {
            weight *= config.repeat_factor;
        }

        // Lips must fully close before a vowel releases them
        if shape.is_bilabial() && visemes.get(i + 1).is_some_and(|next| next.shape.is_vowel()) {
            weight = 1.0;
        }

        visemes[i].weight = weight.clamp(0.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VisemeShape;

    fn v(shape: VisemeShape, offset_ms: u32, duration_ms: u32) -> Viseme {
        Viseme::new(shape, 0.8, offset_ms, duration_ms)
    }

    #[test]
    fn test_short_entries_are_scaled() {
        let mut list = vec![v(VisemeShape::DD, 0, 30), v(VisemeShape::Aa, 30, 120)];
        coarticulate(&mut list, &CoarticulationConfig::default());
        assert!((list[0].weight - 0.4).abs() < 1e-6);
        assert!((list[1].weight - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_repeated_shape_is_reduced() {
        let mut list = vec![v(VisemeShape::Aa, 0, 100), v(VisemeShape::Aa, 100, 100)];
        coarticulate(&mut list, &CoarticulationConfig::default());
        assert!((list[1].weight - 0.56).abs() < 1e-6);
    }

    #[test]
    fn test_bilabial_before_vowel_is_full() {
        let mut list = vec![v(VisemeShape::PP, 0, 20), v(VisemeShape::O, 20, 100)];
        coarticulate(&mut list, &CoarticulationConfig::default());
        assert_eq!(list[0].weight, 1.0);

        let mut list = vec![v(VisemeShape::PP, 0, 100), v(VisemeShape::SS, 100, 100)];
        coarticulate(&mut list, &CoarticulationConfig::default());
        assert!((list[0].weight - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_silence_repeats_untouched() {
        let mut list = vec![v(VisemeShape::Sil, 0, 100), v(VisemeShape::Sil, 100, 100)];
        coarticulate(&mut list, &CoarticulationConfig::default());
        assert!((list[1].weight - 0.8).abs() < 1e-6);
    }
}
