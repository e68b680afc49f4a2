//! Benchmarks for viseme generation and timeline playback

use std::sync::Arc;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use visage_core::ManualClock;
use visage_lipsync::{
    from_phonemes, from_text, from_word_timestamps, phoneme_to_viseme, CoarticulationConfig,
    LipSyncController, PhonemeTiming, VisemeTimeline,
};

const SENTENCE: &str = "She sells sea shells by the sea shore, and the shells she sells are sea shells for sure.";

fn bench_from_text(c: &mut Criterion) {
    let mut group = c.benchmark_group("from_text");
    for repeat in [1usize, 4, 16] {
        let text = SENTENCE.repeat(repeat);
        group.bench_with_input(BenchmarkId::from_parameter(repeat), &text, |b, text| {
            b.iter(|| black_box(from_text(black_box(text), 0)))
        });
    }
    group.finish();
}

fn bench_from_word_timestamps(c: &mut Criterion) {
    let words: Vec<&str> = SENTENCE.split_whitespace().collect();
    let starts: Vec<f32> = (0..words.len()).map(|i| i as f32 * 0.3).collect();
    let ends: Vec<f32> = starts.iter().map(|s| s + 0.25).collect();

    c.bench_function("from_word_timestamps", |b| {
        b.iter(|| black_box(from_word_timestamps(&words, &starts, &ends)))
    });
}

fn bench_from_phonemes(c: &mut Criterion) {
    let symbols = ["HH", "AH0", "L", "OW1", "W", "ER1", "L", "D"];
    let phonemes: Vec<PhonemeTiming> = symbols
        .iter()
        .enumerate()
        .map(|(i, s)| PhonemeTiming::new(*s, i as u32 * 80, (i as u32 + 1) * 80))
        .collect();

    c.bench_function("from_phonemes", |b| {
        b.iter(|| black_box(from_phonemes(black_box(&phonemes))))
    });

    c.bench_function("phoneme_to_viseme", |b| {
        b.iter(|| black_box(phoneme_to_viseme(black_box("AY1"))))
    });
}

fn bench_timeline_locate(c: &mut Criterion) {
    let visemes = from_text(&SENTENCE.repeat(8), 0);
    let config = CoarticulationConfig::default();

    c.bench_function("timeline_sweep", |b| {
        b.iter(|| {
            let mut timeline = VisemeTimeline::new(visemes.clone(), &config, Duration::ZERO);
            let total = timeline.total_ms();
            let mut t = 0;
            while t <= total {
                black_box(timeline.locate(t as f32));
                t += 16;
            }
        })
    });
}

fn bench_controller_update(c: &mut Criterion) {
    let clock = ManualClock::new();
    let mut lipsync = LipSyncController::new(Arc::new(clock.clone()));
    let visemes = from_text(SENTENCE, 0);
    lipsync.set_speaking(true);

    c.bench_function("lipsync_update", |b| {
        b.iter(|| {
            if lipsync.timeline().is_none() {
                lipsync.queue_visemes(visemes.clone());
            }
            clock.advance(Duration::from_millis(16));
            black_box(lipsync.update(0.016))
        })
    });
}

criterion_group!(
    benches,
    bench_from_text,
    bench_from_word_timestamps,
    bench_from_phonemes,
    bench_timeline_locate,
    bench_controller_update,
);
criterion_main!(benches);
