//! Inference-mode loss, accuracy and confusion matrix over a partition

use ndarray::{ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use vocaltone_model::layers::activation::cross_entropy;
use vocaltone_model::{EmotionNetwork, LabelSpace};

use crate::dataset::{stack_batch, LabeledFeatures};
use crate::error::Result;

/// Metrics of one evaluated partition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub loss: f32,
    pub accuracy: f32,
    pub samples: usize,
    /// `confusion[actual][predicted]`
    pub confusion: Vec<Vec<usize>>,
    /// Class names in index order
    pub labels: Vec<String>,
}

impl EvaluationReport {
    /// Recall of every class, `None` for classes absent from the partition
    pub fn per_class_accuracy(&self) -> Vec<Option<f32>> {
        self.confusion
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let total: usize = row.iter().sum();
                (total > 0).then(|| row[i] as f32 / total as f32)
            })
            .collect()
    }
}

/// Index of the largest entry; ties go to the lowest index
pub(crate) fn argmax(row: ArrayView1<'_, f32>) -> usize {
    row.iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |best, (i, &p)| {
            if p > best.1 {
                (i, p)
            } else {
                best
            }
        })
        .0
}

/// Evaluate `network` in inference mode over `indices`
pub fn evaluate(
    network: &EmotionNetwork,
    corpus: &[LabeledFeatures],
    targets: &[usize],
    indices: &[usize],
    batch_size: usize,
    labels: &LabelSpace,
) -> Result<EvaluationReport> {
    let classes = labels.len();
    let mut confusion = vec![vec![0usize; classes]; classes];
    let mut loss_sum = 0.0f32;
    let mut correct = 0usize;

    for chunk in indices.chunks(batch_size.max(1)) {
        let (x, y) = stack_batch(corpus, targets, chunk);
        let probabilities = network.infer(&x)?;
        loss_sum += cross_entropy(&probabilities, &y) * y.len() as f32;

        for (row, &actual) in probabilities.axis_iter(Axis(0)).zip(&y) {
            let predicted = argmax(row);
            if predicted == actual {
                correct += 1;
            }
            if let Some(cell) = confusion.get_mut(actual).and_then(|r| r.get_mut(predicted)) {
                *cell += 1;
            }
        }
    }

    let samples = indices.len();
    let (loss, accuracy) = if samples == 0 {
        (0.0, 0.0)
    } else {
        (loss_sum / samples as f32, correct as f32 / samples as f32)
    };

    Ok(EvaluationReport {
        loss,
        accuracy,
        samples,
        confusion,
        labels: labels.names(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_argmax_ties() {
        assert_eq!(argmax(array![0.1f32, 0.7, 0.2].view()), 1);
        assert_eq!(argmax(array![0.4f32, 0.4, 0.2].view()), 0);
    }

    #[test]
    fn test_per_class_accuracy() {
        let report = EvaluationReport {
            loss: 0.0,
            accuracy: 0.0,
            samples: 4,
            confusion: vec![vec![3, 1], vec![0, 0]],
            labels: vec!["a".into(), "b".into()],
        };
        assert_eq!(report.per_class_accuracy(), vec![Some(0.75), None]);
    }
}
