//! Classifier output: arg-max emotion, its probability and the full vector

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::emotion::{Emotion, LabelSpace};
use crate::error::{ModelError, Result};

/// Allowed deviation of a probability vector's sum from 1
pub const PROBABILITY_SUM_TOLERANCE: f32 = 1e-3;

/// Immutable prediction built from a probability vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    emotion: Emotion,
    confidence: f32,
    probabilities: Vec<f32>,
    labels: LabelSpace,
}

impl PredictionResult {
    /// Pick the arg-max of a validated probability vector
    ///
    /// Ties resolve to the lowest class index.
    pub fn from_probabilities(probabilities: Vec<f32>, labels: &LabelSpace) -> Result<Self> {
        validate_probabilities(&probabilities, labels.len())?;

        let (index, confidence) = probabilities.iter().copied().enumerate().fold(
            (0, f32::NEG_INFINITY),
            |best, (i, p)| if p > best.1 { (i, p) } else { best },
        );

        let emotion = labels
            .emotion_at(index)
            .ok_or_else(|| ModelError::invalid_prediction("arg-max outside label space"))?;

        Ok(Self {
            emotion,
            confidence,
            probabilities,
            labels: labels.clone(),
        })
    }

    /// Assemble a prediction without validation
    ///
    /// For callers that received a prediction from elsewhere; the scorer
    /// validates it before use.
    pub fn from_parts(
        emotion: Emotion,
        confidence: f32,
        probabilities: Vec<f32>,
        labels: LabelSpace,
    ) -> Self {
        Self {
            emotion,
            confidence,
            probabilities,
            labels,
        }
    }

    pub fn emotion(&self) -> Emotion {
        self.emotion
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    /// Probabilities ordered by the label space
    pub fn probabilities(&self) -> &[f32] {
        &self.probabilities
    }

    pub fn labels(&self) -> &LabelSpace {
        &self.labels
    }

    /// Probability of a given emotion
    pub fn probability_of(&self, emotion: Emotion) -> Option<f32> {
        self.labels
            .index_of(emotion)
            .and_then(|i| self.probabilities.get(i).copied())
    }

    /// Name → probability map
    pub fn probability_map(&self) -> BTreeMap<String, f32> {
        self.labels
            .emotions()
            .iter()
            .zip(&self.probabilities)
            .map(|(e, &p)| (e.name().to_string(), p))
            .collect()
    }
}

/// Length, range and sum checks shared by construction and scoring
pub fn validate_probabilities(probabilities: &[f32], expected_len: usize) -> Result<()> {
    if probabilities.len() != expected_len {
        return Err(ModelError::invalid_prediction(format!(
            "expected {} probabilities, got {}",
            expected_len,
            probabilities.len()
        )));
    }
    if let Some(p) = probabilities
        .iter()
        .find(|p| !p.is_finite() || **p < 0.0 || **p > 1.0)
    {
        return Err(ModelError::invalid_prediction(format!(
            "probability {} outside [0, 1]",
            p
        )));
    }
    let sum: f32 = probabilities.iter().sum();
    if (sum - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
        return Err(ModelError::invalid_prediction(format!(
            "probabilities sum to {}, not 1",
            sum
        )));
    }
    Ok(())
}
