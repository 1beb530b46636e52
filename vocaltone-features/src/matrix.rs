//! Time × feature matrix handed to the classifier

use ndarray::{Array2, ArrayView2, Axis};

/// 2D feature array of shape (time_steps, feature_dim)
///
/// Each row concatenates the cepstral and mel-spectral representations of
/// one analysis frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    data: Array2<f32>,
}

impl FeatureMatrix {
    pub fn new(data: Array2<f32>) -> Self {
        Self { data }
    }

    pub fn time_steps(&self) -> usize {
        self.data.nrows()
    }

    pub fn feature_dim(&self) -> usize {
        self.data.ncols()
    }

    /// (time_steps, feature_dim)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn view(&self) -> ArrayView2<'_, f32> {
        self.data.view()
    }

    pub fn as_array(&self) -> &Array2<f32> {
        &self.data
    }

    pub fn into_inner(self) -> Array2<f32> {
        self.data
    }

    /// Z-score every column in place
    ///
    /// Subtracts the column mean and divides by the population standard
    /// deviation when it exceeds `epsilon`. Columns at or below `epsilon`
    /// are only mean-centred, so a constant column becomes all zeros.
    pub fn standardize(&mut self, epsilon: f32) {
        let rows = self.data.nrows();
        if rows == 0 {
            return;
        }

        for mut column in self.data.axis_iter_mut(Axis(1)) {
            // Shifted sum keeps constant columns exactly constant
            let shift = column[0];
            let mean = shift + column.iter().map(|&v| v - shift).sum::<f32>() / rows as f32;
            let variance = column.iter().map(|&v| (v - mean).powi(2)).sum::<f32>() / rows as f32;
            let std = variance.sqrt();

            if std > epsilon {
                column.mapv_inplace(|v| (v - mean) / std);
            } else {
                column.mapv_inplace(|v| v - mean);
            }
        }
    }

    /// Consuming variant of [`standardize`](Self::standardize)
    pub fn standardized(mut self, epsilon: f32) -> Self {
        self.standardize(epsilon);
        self
    }
}

impl From<Array2<f32>> for FeatureMatrix {
    fn from(data: Array2<f32>) -> Self {
        Self::new(data)
    }
}
