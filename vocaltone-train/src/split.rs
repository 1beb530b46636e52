//! Stratified train/validation/test partitioning

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;
use vocaltone_model::LabelSpace;

use crate::error::{Result, TrainError};

/// Fewest samples a class needs to put one in every partition
pub const MIN_SAMPLES_PER_CLASS: usize = 3;

/// Disjoint sample indices covering the whole corpus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSplit {
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
    pub test: Vec<usize>,
}

impl DataSplit {
    pub fn len(&self) -> usize {
        self.train.len() + self.validation.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Split per class so every partition keeps the class proportions
///
/// `targets[i]` is the class index of sample `i`. Each class is shuffled
/// with `rng` in label-space order, then `round(fraction·n)` samples (at
/// least one) go to validation and test; training keeps the rest.
pub fn stratified_split<R: Rng + ?Sized>(
    targets: &[usize],
    labels: &LabelSpace,
    validation_fraction: f32,
    test_fraction: f32,
    rng: &mut R,
) -> Result<DataSplit> {
    let mut split = DataSplit {
        train: Vec::new(),
        validation: Vec::new(),
        test: Vec::new(),
    };

    for (class, emotion) in labels.emotions().iter().enumerate() {
        let mut members: Vec<usize> = targets
            .iter()
            .enumerate()
            .filter(|(_, &t)| t == class)
            .map(|(i, _)| i)
            .collect();
        let n = members.len();
        if n < MIN_SAMPLES_PER_CLASS {
            return Err(TrainError::insufficient_data(
                emotion.name(),
                n,
                MIN_SAMPLES_PER_CLASS,
            ));
        }

        members.shuffle(rng);
        let n_val = ((validation_fraction * n as f32).round() as usize).max(1);
        let n_test = ((test_fraction * n as f32).round() as usize).max(1);
        if n_val + n_test >= n {
            return Err(TrainError::insufficient_data(
                emotion.name(),
                n,
                n_val + n_test + 1,
            ));
        }

        split.validation.extend_from_slice(&members[..n_val]);
        split.test.extend_from_slice(&members[n_val..n_val + n_test]);
        split.train.extend_from_slice(&members[n_val + n_test..]);
        debug!(
            "{}: {} train / {} validation / {} test",
            emotion,
            n - n_val - n_test,
            n_val,
            n_test
        );
    }

    Ok(split)
}
