//! Labeled feature matrices and mini-batch assembly

use ndarray::{Array3, Axis};
use vocaltone_features::FeatureMatrix;
use vocaltone_model::{Emotion, LabelSpace};

use crate::error::{Result, TrainError};

/// One training example
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledFeatures {
    pub features: FeatureMatrix,
    pub emotion: Emotion,
}

impl LabeledFeatures {
    pub fn new(features: FeatureMatrix, emotion: Emotion) -> Self {
        Self { features, emotion }
    }
}

/// Check that every matrix has the same shape, and return it
pub fn common_shape(corpus: &[LabeledFeatures]) -> Result<(usize, usize)> {
    let first = corpus.first().ok_or(TrainError::EmptyCorpus)?.features.shape();
    if let Some((i, other)) = corpus
        .iter()
        .enumerate()
        .find(|(_, sample)| sample.features.shape() != first)
    {
        return Err(TrainError::shape_mismatch(format!(
            "sample {} has shape {:?}, expected {:?}",
            i,
            other.features.shape(),
            first
        )));
    }
    Ok(first)
}

/// Class index of every sample under `labels`
pub fn class_indices(corpus: &[LabeledFeatures], labels: &LabelSpace) -> Result<Vec<usize>> {
    corpus
        .iter()
        .map(|sample| {
            labels.index_of(sample.emotion).ok_or_else(|| {
                TrainError::invalid_config(format!(
                    "'{}' is not in the label space",
                    sample.emotion
                ))
            })
        })
        .collect()
}

/// Stack the selected samples into a (batch, time, features) tensor
///
/// Callers guarantee a common shape via [`common_shape`].
pub fn stack_batch(
    corpus: &[LabeledFeatures],
    targets: &[usize],
    indices: &[usize],
) -> (Array3<f32>, Vec<usize>) {
    let (steps, dim) = corpus
        .first()
        .map(|s| s.features.shape())
        .unwrap_or((0, 0));
    let mut batch = Array3::zeros((indices.len(), steps, dim));
    for (mut slot, &i) in batch.axis_iter_mut(Axis(0)).zip(indices) {
        slot.assign(&corpus[i].features.view());
    }
    let labels = indices.iter().map(|&i| targets[i]).collect();
    (batch, labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn sample(value: f32, steps: usize, emotion: Emotion) -> LabeledFeatures {
        LabeledFeatures::new(
            FeatureMatrix::new(Array2::from_elem((steps, 3), value)),
            emotion,
        )
    }

    #[test]
    fn test_common_shape() {
        let corpus = vec![sample(0.0, 8, Emotion::Anger), sample(1.0, 8, Emotion::Fear)];
        assert_eq!(common_shape(&corpus).unwrap(), (8, 3));

        let ragged = vec![sample(0.0, 8, Emotion::Anger), sample(1.0, 9, Emotion::Fear)];
        assert!(matches!(common_shape(&ragged), Err(TrainError::ShapeMismatch(_))));
        assert!(matches!(common_shape(&[]), Err(TrainError::EmptyCorpus)));
    }

    #[test]
    fn test_stack_batch_selects_rows() {
        let corpus = vec![
            sample(0.0, 4, Emotion::Anger),
            sample(1.0, 4, Emotion::Fear),
            sample(2.0, 4, Emotion::Surprise),
        ];
        let targets = class_indices(&corpus, LabelSpace::standard()).unwrap();
        assert_eq!(targets, vec![0, 2, 6]);

        let (x, y) = stack_batch(&corpus, &targets, &[2, 0]);
        assert_eq!(x.dim(), (2, 4, 3));
        assert_eq!(x[[0, 0, 0]], 2.0);
        assert_eq!(x[[1, 3, 2]], 0.0);
        assert_eq!(y, vec![6, 0]);
    }
}
