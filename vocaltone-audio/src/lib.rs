//! vocaltone audio normalization
//!
//! Decodes uploaded speech recordings into the canonical clip the emotion
//! model was trained on.
//!
//! ## Pipeline
//!
//! ```text
//! bytes + declared format
//!   │
//!   ├─> decode (hound for WAV, symphonia for MP3/FLAC/OGG)
//!   ├─> downmix to mono (channel average)
//!   ├─> resample to 22.05kHz (rubato sinc)
//!   ├─> pad with trailing zeros / truncate from the end to 3.0s
//!   └─> divide by (peak + 1e-6)
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use vocaltone_audio::AudioNormalizer;
//!
//! let normalizer = AudioNormalizer::default();
//! let bytes = std::fs::read("JE_h12.wav")?;
//! let clip = normalizer.normalize(&bytes, "JE_h12.wav")?;
//! assert_eq!(clip.len(), 66150);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod decode;
pub mod error;
pub mod format;
pub mod normalizer;
pub mod resampler;

pub use decode::DecodedAudio;
pub use error::{AudioError, Result};
pub use format::AudioFormat;
pub use normalizer::{AudioClip, AudioNormalizer, NormalizerConfig};
pub use resampler::Resampler;

/// Canonical sample rate for every clip handed to feature extraction
pub const TARGET_SAMPLE_RATE: u32 = 22050;

/// Canonical clip duration in seconds
pub const TARGET_DURATION_SECS: f32 = 3.0;
