//! Serializable analysis output

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vocaltone_features::AcousticDescriptors;
use vocaltone_model::{Emotion, PredictionResult, SatisfactionScorer};

fn round_to(value: f32, decimals: i32) -> f32 {
    let scale = 10f32.powi(decimals);
    (value * scale).round() / scale
}

/// Result of analyzing one recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionReport {
    pub emotion: Emotion,
    pub confidence: f32,
    pub probabilities: BTreeMap<String, f32>,
    /// 0–10, two decimals
    pub satisfaction_score: f32,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descriptors: Option<AcousticDescriptors>,
}

impl EmotionReport {
    pub fn new(prediction: &PredictionResult, satisfaction_score: f32) -> Self {
        Self {
            emotion: prediction.emotion(),
            confidence: round_to(prediction.confidence(), 4),
            probabilities: prediction
                .probability_map()
                .into_iter()
                .map(|(name, p)| (name, round_to(p, 4)))
                .collect(),
            satisfaction_score: round_to(satisfaction_score, 2),
            timestamp: Utc::now(),
            descriptors: None,
        }
    }

    pub fn with_descriptors(mut self, descriptors: AcousticDescriptors) -> Self {
        self.descriptors = Some(descriptors);
        self
    }
}

/// One analyzed file inside a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItem {
    pub file: String,
    #[serde(flatten)]
    pub report: EmotionReport,
}

/// One file a batch had to skip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchFailure {
    pub file: String,
    pub kind: String,
    pub message: String,
}

/// How often each emotion came up across a batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmotionStatistics {
    pub total: usize,
    pub counts: BTreeMap<String, usize>,
    /// 0–100
    pub percentages: BTreeMap<String, f32>,
    pub most_common: Option<Emotion>,
    pub most_common_count: usize,
}

impl EmotionStatistics {
    /// Ties go to the emotion seen first
    pub fn from_emotions(emotions: &[Emotion]) -> Self {
        let mut order: Vec<(Emotion, usize)> = Vec::new();
        for &emotion in emotions {
            match order.iter_mut().find(|(e, _)| *e == emotion) {
                Some((_, count)) => *count += 1,
                None => order.push((emotion, 1)),
            }
        }

        let total = emotions.len();
        let mut most_common: Option<(Emotion, usize)> = None;
        for &(emotion, count) in &order {
            if most_common.map_or(true, |(_, best)| count > best) {
                most_common = Some((emotion, count));
            }
        }

        Self {
            total,
            counts: order
                .iter()
                .map(|(e, c)| (e.name().to_string(), *c))
                .collect(),
            percentages: order
                .iter()
                .map(|(e, c)| (e.name().to_string(), *c as f32 / total as f32 * 100.0))
                .collect(),
            most_common: most_common.map(|(e, _)| e),
            most_common_count: most_common.map_or(0, |(_, c)| c),
        }
    }
}

/// Outcome of a batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub results: Vec<BatchItem>,
    pub failures: Vec<BatchFailure>,
    /// Mean satisfaction of the successful items, two decimals; 0 if none
    pub average_satisfaction: f32,
    pub statistics: EmotionStatistics,
}

impl BatchReport {
    pub fn new(results: Vec<BatchItem>, failures: Vec<BatchFailure>) -> Self {
        let scores: Vec<f32> = results.iter().map(|r| r.report.satisfaction_score).collect();
        let emotions: Vec<Emotion> = results.iter().map(|r| r.report.emotion).collect();
        Self {
            average_satisfaction: round_to(SatisfactionScorer::average(&scores), 2),
            statistics: EmotionStatistics::from_emotions(&emotions),
            results,
            failures,
        }
    }
}
