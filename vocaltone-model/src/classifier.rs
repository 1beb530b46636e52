//! Inference front end holding the currently loaded weights

use std::sync::Arc;

use ndarray::Axis;
use parking_lot::RwLock;
use tracing::{debug, info};
use vocaltone_features::FeatureMatrix;

use crate::emotion::LabelSpace;
use crate::error::{ModelError, Result};
use crate::prediction::PredictionResult;
use crate::weights::ClassifierWeights;

/// Emotion classifier over a swappable weight snapshot
///
/// Inference clones the `Arc` under a short read lock and runs without
/// holding it, so `load` never waits on a running prediction.
pub struct EmotionClassifier {
    labels: LabelSpace,
    weights: RwLock<Option<Arc<ClassifierWeights>>>,
}

impl EmotionClassifier {
    /// Empty classifier bound to a label space
    pub fn new(labels: LabelSpace) -> Self {
        Self {
            labels,
            weights: RwLock::new(None),
        }
    }

    /// Classifier with weights already in place
    pub fn with_weights(labels: LabelSpace, weights: ClassifierWeights) -> Result<Self> {
        let classifier = Self::new(labels);
        classifier.load(weights)?;
        Ok(classifier)
    }

    pub fn labels(&self) -> &LabelSpace {
        &self.labels
    }

    /// Swap in a new snapshot
    ///
    /// The previous snapshot stays alive for any inference still using it.
    pub fn load(&self, weights: ClassifierWeights) -> Result<()> {
        if weights.labels() != &self.labels {
            return Err(ModelError::label_mismatch(format!(
                "weights trained on {:?}, classifier expects {:?}",
                weights.labels().names(),
                self.labels.names()
            )));
        }
        weights.validate()?;

        let run_id = weights.metadata.run_id;
        *self.weights.write() = Some(Arc::new(weights));
        info!("Classifier weights {} loaded", run_id);
        Ok(())
    }

    pub fn unload(&self) {
        *self.weights.write() = None;
    }

    pub fn is_loaded(&self) -> bool {
        self.weights.read().is_some()
    }

    /// Current snapshot, if any
    pub fn weights(&self) -> Option<Arc<ClassifierWeights>> {
        self.weights.read().clone()
    }

    /// Class probabilities for one standardized feature matrix
    pub fn infer(&self, features: &FeatureMatrix) -> Result<Vec<f32>> {
        let weights = self.weights().ok_or(ModelError::ModelNotLoaded)?;

        let expected = weights.input_dim();
        if features.feature_dim() != expected {
            return Err(ModelError::shape_mismatch(format!(
                "model expects {} features per frame, got {}",
                expected,
                features.feature_dim()
            )));
        }

        let batch = features.view().to_owned().insert_axis(Axis(0));
        let probabilities = weights.network().infer(&batch)?;
        debug!(
            "Inferred over {} frames: {:?}",
            features.time_steps(),
            probabilities.row(0)
        );
        Ok(probabilities.row(0).to_vec())
    }

    /// Arg-max prediction with the full probability vector
    pub fn predict(&self, features: &FeatureMatrix) -> Result<PredictionResult> {
        let probabilities = self.infer(features)?;
        PredictionResult::from_probabilities(probabilities, &self.labels)
    }
}
