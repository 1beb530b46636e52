//! vocaltone emotion model
//!
//! CNN-LSTM classifier over standardized feature matrices, the fixed
//! seven-emotion label space and the satisfaction score derived from a
//! prediction.
//!
//! ## Architecture
//!
//! ```text
//! FeatureMatrix (T × 168)
//!   │
//!   ├─> EmotionClassifier (Arc<ClassifierWeights> behind a RwLock)
//!   │     └─> EmotionNetwork: conv ×3 → LSTM ×2 → dense head → softmax
//!   ├─> PredictionResult (arg-max emotion, confidence, 7 probabilities)
//!   └─> SatisfactionScorer: base·confidence + 5·(1 − confidence)
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use vocaltone_features::FeatureExtractor;
//! use vocaltone_audio::AudioNormalizer;
//! use vocaltone_model::{ClassifierWeights, EmotionClassifier, LabelSpace, SatisfactionScorer};
//!
//! let labels = LabelSpace::load_json("labels.json")?;
//! let weights = ClassifierWeights::load_json("emotion_model.json")?;
//! let classifier = EmotionClassifier::with_weights(labels, weights)?;
//!
//! let clip = AudioNormalizer::default().normalize_file("JE_h12.wav")?;
//! let features = FeatureExtractor::default().extract(&clip)?;
//! let prediction = classifier.predict(&features)?;
//! let score = SatisfactionScorer::new().score(&prediction)?;
//! println!("{} ({:.2}) -> {:.2}", prediction.emotion(), prediction.confidence(), score);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod architecture;
pub mod classifier;
pub mod emotion;
pub mod error;
pub mod layers;
pub mod network;
pub mod prediction;
pub mod satisfaction;
pub mod weights;

pub use architecture::ArchitectureConfig;
pub use classifier::EmotionClassifier;
pub use emotion::{Emotion, LabelSpace};
pub use error::{ModelError, Result};
pub use network::{EmotionNetwork, ForwardCache, ForwardPass, NetworkGradients};
pub use prediction::{PredictionResult, PROBABILITY_SUM_TOLERANCE};
pub use satisfaction::{SatisfactionScorer, SatisfactionTable, NEUTRAL_MIDPOINT};
pub use weights::{ClassifierWeights, WeightsMetadata};
