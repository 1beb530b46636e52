//! Integration tests for byte-level normalization with synthesized WAV input

use std::io::Cursor;

use approx::assert_abs_diff_eq;
use hound::{SampleFormat, WavSpec, WavWriter};
use vocaltone_audio::{AudioError, AudioFormat, AudioNormalizer, NormalizerConfig};

fn sine(freq: f32, sample_rate: u32, secs: f32, amplitude: f32) -> Vec<f32> {
    let n = (sample_rate as f32 * secs) as usize;
    (0..n)
        .map(|i| (i as f32 * freq * 2.0 * std::f32::consts::PI / sample_rate as f32).sin() * amplitude)
        .collect()
}

/// Encode interleaved samples as 16-bit PCM WAV bytes
fn wav_bytes(samples: &[f32], sample_rate: u32, channels: u16) -> Vec<u8> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec).expect("Failed to create writer");
        for &s in samples {
            writer
                .write_sample((s.clamp(-1.0, 1.0) * 32767.0) as i16)
                .expect("Failed to write sample");
        }
        writer.finalize().expect("Failed to finalize WAV");
    }
    cursor.into_inner()
}

#[test]
fn test_short_clip_is_padded() {
    let normalizer = AudioNormalizer::default();
    let bytes = wav_bytes(&sine(220.0, 22050, 1.0, 0.3), 22050, 1);

    let clip = normalizer.normalize(&bytes, "short.wav").unwrap();

    assert_eq!(clip.len(), 66150);
    assert_eq!(clip.sample_rate(), 22050);
    assert!(clip.samples()[22050..].iter().all(|&s| s == 0.0));

    let peak = clip.samples().iter().fold(0.0f32, |a, &b| a.max(b.abs()));
    assert_abs_diff_eq!(peak, 1.0, epsilon = 1e-4);
}

#[test]
fn test_long_clip_is_truncated() {
    let normalizer = AudioNormalizer::default();
    let bytes = wav_bytes(&sine(330.0, 22050, 5.0, 0.5), 22050, 1);

    let clip = normalizer.normalize(&bytes, "wav").unwrap();

    assert_eq!(clip.len(), 66150);
    // Truncation keeps the head, so the tail is still signal
    assert!(clip.samples()[66000..].iter().any(|&s| s.abs() > 0.1));
}

#[test]
fn test_stereo_44k_is_downmixed_and_resampled() {
    let normalizer = AudioNormalizer::default();
    let left = sine(440.0, 44100, 2.0, 0.6);
    let interleaved: Vec<f32> = left.iter().flat_map(|&s| [s, s]).collect();
    let bytes = wav_bytes(&interleaved, 44100, 2);

    let clip = normalizer.normalize(&bytes, "audio/wav").unwrap();

    assert_eq!(clip.len(), 66150);
    assert_eq!(clip.sample_rate(), 22050);
    assert!(clip.samples().iter().all(|s| s.abs() <= 1.0));
    // Two seconds of signal followed by one second of padding
    assert!(clip.samples()[1000..43000].iter().any(|&s| s.abs() > 0.5));
    assert!(clip.samples()[44200..].iter().all(|&s| s == 0.0));
}

#[test]
fn test_silence_stays_silent() {
    let normalizer = AudioNormalizer::default();
    let bytes = wav_bytes(&vec![0.0; 22050 * 2], 22050, 1);

    let clip = normalizer.normalize(&bytes, ".wav").unwrap();

    assert_eq!(clip.len(), 66150);
    assert!(clip.is_silent());
}

#[test]
fn test_custom_duration() {
    let config = NormalizerConfig::default().sample_rate(16000).duration(1.5);
    let normalizer = AudioNormalizer::new(config).unwrap();
    let bytes = wav_bytes(&sine(200.0, 16000, 3.0, 0.4), 16000, 1);

    let clip = normalizer.normalize_format(&bytes, AudioFormat::Wav).unwrap();
    assert_eq!(clip.len(), 24000);
    assert_abs_diff_eq!(clip.duration(), 1.5, epsilon = 1e-6);
}

#[test]
fn test_unsupported_extension() {
    let normalizer = AudioNormalizer::default();
    let bytes = wav_bytes(&sine(220.0, 22050, 0.5, 0.3), 22050, 1);

    let err = normalizer.normalize(&bytes, "speech.aac").unwrap_err();
    assert!(matches!(err, AudioError::UnsupportedFormat(_)));
}

#[test]
fn test_corrupt_bytes_rejected() {
    let normalizer = AudioNormalizer::default();
    let err = normalizer
        .normalize(b"RIFF....WAVEjunkjunkjunk", "broken.wav")
        .unwrap_err();
    assert!(matches!(err, AudioError::UnsupportedFormat(_)));
}

#[test]
fn test_empty_inputs() {
    let normalizer = AudioNormalizer::default();

    let err = normalizer.normalize(&[], "empty.wav").unwrap_err();
    assert!(matches!(err, AudioError::EmptyAudio));

    let header_only = wav_bytes(&[], 22050, 1);
    let err = normalizer.normalize(&header_only, "empty.wav").unwrap_err();
    assert!(matches!(err, AudioError::EmptyAudio));
}

#[test]
fn test_normalize_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("KL_sa03.wav");
    std::fs::write(&path, wav_bytes(&sine(180.0, 48000, 1.0, 0.2), 48000, 1)).unwrap();

    let normalizer = AudioNormalizer::default();
    let clip = normalizer.normalize_file(&path).unwrap();
    assert_eq!(clip.len(), 66150);
    assert!(!clip.is_silent());

    let missing = normalizer.normalize_file(dir.path().join("missing.wav"));
    assert!(matches!(missing, Err(AudioError::Io(_))));
}
