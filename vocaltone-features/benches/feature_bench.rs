//! Benchmark for feature extraction on a 3 s clip

use std::f32::consts::PI;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use vocaltone_audio::AudioClip;
use vocaltone_features::{FeatureExtractor, Stft};

fn clip() -> AudioClip {
    let samples: Vec<f32> = (0..66150)
        .map(|i| (2.0 * PI * 220.0 * i as f32 / 22050.0).sin() * 0.5)
        .collect();
    AudioClip::new(samples, 22050)
}

fn bench_extract(c: &mut Criterion) {
    let extractor = FeatureExtractor::default();
    let clip = clip();

    c.bench_function("extract_3s", |b| {
        b.iter(|| extractor.extract(black_box(&clip)))
    });

    c.bench_function("descriptors_3s", |b| {
        b.iter(|| extractor.descriptors(black_box(&clip)))
    });
}

fn bench_stft(c: &mut Criterion) {
    let stft = Stft::new(2048, 512);
    let clip = clip();

    c.bench_function("power_spectrogram_3s", |b| {
        b.iter(|| stft.power_spectrogram(black_box(clip.samples())))
    });
}

criterion_group!(benches, bench_extract, bench_stft);
criterion_main!(benches);
