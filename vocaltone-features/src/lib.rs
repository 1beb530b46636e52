//! vocaltone feature extraction
//!
//! Turns a normalized 3 s clip into the (126 × 168) matrix the emotion
//! classifier consumes: 40 cepstral coefficients followed by 128 log-mel
//! energies per 2048-sample frame (hop 512), standardized per column.
//!
//! ```no_run
//! use vocaltone_audio::AudioNormalizer;
//! use vocaltone_features::FeatureExtractor;
//!
//! let clip = AudioNormalizer::default().normalize_file("JE_a01.wav")?;
//! let features = FeatureExtractor::default().extract(&clip)?;
//! assert_eq!(features.shape(), (126, 168));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod dct;
pub mod descriptors;
pub mod error;
pub mod extractor;
pub mod matrix;
pub mod mel;
pub mod stft;

pub use config::FeatureConfig;
pub use dct::dct_matrix;
pub use descriptors::AcousticDescriptors;
pub use error::{FeatureError, Result};
pub use extractor::FeatureExtractor;
pub use matrix::FeatureMatrix;
pub use mel::{hz_to_mel, mel_to_hz, power_to_db, MelFilterbank};
pub use stft::Stft;
