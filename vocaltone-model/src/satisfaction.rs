//! Confidence-weighted satisfaction scoring
//!
//! `score = base(emotion)·confidence + 5·(1 − confidence)`: a confident
//! prediction approaches the emotion's base score, an uncertain one drifts
//! towards the neutral midpoint 5.

use once_cell::sync::Lazy;

use crate::emotion::Emotion;
use crate::error::{ModelError, Result};
use crate::prediction::{validate_probabilities, PredictionResult};

/// Score an uncertain prediction collapses to
pub const NEUTRAL_MIDPOINT: f32 = 5.0;

/// Allowed gap between the confidence and the primary emotion's probability
const CONFIDENCE_TOLERANCE: f32 = 1e-6;

static STANDARD: Lazy<SatisfactionTable> = Lazy::new(|| SatisfactionTable {
    scores: [1.0, 2.0, 2.5, 9.0, 6.0, 3.0, 7.0],
});

/// Base satisfaction per emotion on a 0–10 scale
#[derive(Debug, Clone, PartialEq)]
pub struct SatisfactionTable {
    /// Indexed by position in [`Emotion::ALL`]
    scores: [f32; 7],
}

impl SatisfactionTable {
    /// happiness 9, surprise 7, neutral 6, sadness 3, fear 2.5, disgust 2, anger 1
    pub fn standard() -> &'static SatisfactionTable {
        &STANDARD
    }

    pub fn base(&self, emotion: Emotion) -> f32 {
        let index = Emotion::ALL
            .iter()
            .position(|&e| e == emotion)
            .unwrap_or_default();
        self.scores[index]
    }
}

/// Maps predictions to a satisfaction score in [0, 10]
#[derive(Debug, Clone, Copy)]
pub struct SatisfactionScorer {
    table: &'static SatisfactionTable,
}

impl Default for SatisfactionScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl SatisfactionScorer {
    pub fn new() -> Self {
        Self {
            table: SatisfactionTable::standard(),
        }
    }

    pub fn table(&self) -> &SatisfactionTable {
        self.table
    }

    /// Score a prediction after checking it is well formed
    pub fn score(&self, prediction: &PredictionResult) -> Result<f32> {
        validate_probabilities(prediction.probabilities(), prediction.labels().len())?;

        let confidence = prediction.confidence();
        if !(0.0..=1.0).contains(&confidence) {
            return Err(ModelError::invalid_prediction(format!(
                "confidence {} outside [0, 1]",
                confidence
            )));
        }

        let primary = prediction.probability_of(prediction.emotion()).ok_or_else(|| {
            ModelError::invalid_prediction(format!(
                "'{}' is not in the prediction's label space",
                prediction.emotion()
            ))
        })?;
        if (primary - confidence).abs() > CONFIDENCE_TOLERANCE {
            return Err(ModelError::invalid_prediction(format!(
                "confidence {} does not match P({}) = {}",
                confidence,
                prediction.emotion(),
                primary
            )));
        }

        Ok(self.blend(prediction.emotion(), confidence))
    }

    /// The blending rule itself, for an already-validated confidence
    pub fn blend(&self, emotion: Emotion, confidence: f32) -> f32 {
        self.table.base(emotion) * confidence + NEUTRAL_MIDPOINT * (1.0 - confidence)
    }

    /// Mean of a batch of scores; 0 for an empty batch
    pub fn average(scores: &[f32]) -> f32 {
        if scores.is_empty() {
            return 0.0;
        }
        scores.iter().sum::<f32>() / scores.len() as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::LabelSpace;
    use approx::assert_abs_diff_eq;

    fn prediction(probs: Vec<f32>) -> PredictionResult {
        PredictionResult::from_probabilities(probs, LabelSpace::standard()).unwrap()
    }

    #[test]
    fn test_base_table() {
        let table = SatisfactionTable::standard();
        assert_eq!(table.base(Emotion::Happiness), 9.0);
        assert_eq!(table.base(Emotion::Surprise), 7.0);
        assert_eq!(table.base(Emotion::Neutral), 6.0);
        assert_eq!(table.base(Emotion::Sadness), 3.0);
        assert_eq!(table.base(Emotion::Fear), 2.5);
        assert_eq!(table.base(Emotion::Disgust), 2.0);
        assert_eq!(table.base(Emotion::Anger), 1.0);
    }

    #[test]
    fn test_confident_happiness() {
        let scorer = SatisfactionScorer::new();
        let p = prediction(vec![0.02, 0.01, 0.03, 0.89, 0.01, 0.01, 0.03]);
        let score = scorer.score(&p).unwrap();
        assert_abs_diff_eq!(score, 8.56, epsilon = 1e-4);
    }

    #[test]
    fn test_zero_confidence_is_midpoint() {
        let scorer = SatisfactionScorer::new();
        for emotion in Emotion::ALL {
            assert_eq!(scorer.blend(emotion, 0.0), 5.0);
        }
    }

    #[test]
    fn test_monotonic_in_confidence() {
        let scorer = SatisfactionScorer::new();
        for emotion in Emotion::ALL {
            let base = scorer.table().base(emotion);
            let mut previous = scorer.blend(emotion, 0.0);
            for step in 1..=20 {
                let current = scorer.blend(emotion, step as f32 / 20.0);
                if base >= NEUTRAL_MIDPOINT {
                    assert!(current >= previous);
                } else {
                    assert!(current <= previous);
                }
                assert!((0.0..=10.0).contains(&current));
                previous = current;
            }
            assert_abs_diff_eq!(previous, base, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_malformed_predictions() {
        let scorer = SatisfactionScorer::new();
        let labels = LabelSpace::standard().clone();

        let short = PredictionResult::from_parts(Emotion::Anger, 1.0, vec![1.0], labels.clone());
        assert!(matches!(scorer.score(&short), Err(ModelError::InvalidPrediction(_))));

        let bad_sum =
            PredictionResult::from_parts(Emotion::Anger, 0.5, vec![0.5; 7], labels.clone());
        assert!(matches!(scorer.score(&bad_sum), Err(ModelError::InvalidPrediction(_))));

        let mut probs = vec![0.0; 7];
        probs[0] = 1.0;
        let wrong_conf =
            PredictionResult::from_parts(Emotion::Anger, 0.7, probs.clone(), labels.clone());
        assert!(matches!(scorer.score(&wrong_conf), Err(ModelError::InvalidPrediction(_))));

        let out_of_range = PredictionResult::from_parts(Emotion::Anger, 1.5, probs, labels);
        assert!(matches!(scorer.score(&out_of_range), Err(ModelError::InvalidPrediction(_))));
    }

    #[test]
    fn test_average() {
        assert_eq!(SatisfactionScorer::average(&[]), 0.0);
        assert_abs_diff_eq!(SatisfactionScorer::average(&[8.56, 1.0, 5.0]), 4.8533335, epsilon = 1e-5);
    }
}
