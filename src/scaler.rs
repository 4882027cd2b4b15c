//! Column-wise z-score standardization

use crate::error::{Result, SegmentError};
use ndarray::{Array1, Array2, Axis};

/// Per-column statistics used to standardize a feature matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    /// Column means of the fitted data
    pub means: Array1<f64>,
    /// Divisors applied per column: the population standard deviation,
    /// or `1.0` where the column was constant
    pub stds: Array1<f64>,
}

impl StandardScaler {
    /// Fit the scaler on a feature matrix of shape (n_rows, n_features)
    pub fn fit(features: &Array2<f64>) -> Self {
        let n_features = features.ncols();
        if features.nrows() == 0 {
            return StandardScaler {
                means: Array1::zeros(n_features),
                stds: Array1::ones(n_features),
            };
        }

        let n = features.nrows() as f64;
        let mut means = Array1::<f64>::zeros(n_features);
        let mut stds = Array1::<f64>::ones(n_features);

        for (j, column) in features.axis_iter(Axis(1)).enumerate() {
            // The averaged mean of a repeated value can miss it by an ulp,
            // so constant columns are detected on the raw values.
            let first = column[0];
            if column.iter().all(|&x| x == first) {
                means[j] = first;
                continue;
            }

            let mean = column.sum() / n;
            let variance = column.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / n;
            let std = variance.sqrt();
            means[j] = mean;
            if std > 0.0 {
                stds[j] = std;
            }
        }

        StandardScaler { means, stds }
    }

    pub fn n_features(&self) -> usize {
        self.means.len()
    }

    /// Standardize a matrix with the fitted statistics
    pub fn transform(&self, features: &Array2<f64>) -> Result<Array2<f64>> {
        if features.ncols() != self.n_features() {
            return Err(SegmentError::shape(
                format!("{} columns", self.n_features()),
                format!("{} columns", features.ncols()),
            ));
        }

        Ok((features - &self.means) / &self.stds)
    }

    /// Standardize a single raw record, e.g. a customer to classify
    pub fn transform_row(&self, record: &[f64]) -> Result<Array1<f64>> {
        if record.len() != self.n_features() {
            return Err(SegmentError::shape(
                format!("{} values", self.n_features()),
                format!("{} values", record.len()),
            ));
        }

        Ok(record
            .iter()
            .zip(self.means.iter().zip(self.stds.iter()))
            .map(|(&x, (&mean, &std))| (x - mean) / std)
            .collect())
    }
}

/// Z-score every column of `features`.
///
/// Returns the standardized matrix together with the statistics used.
/// Constant columns become all zeros; an empty matrix stays empty.
pub fn standardize(features: &Array2<f64>) -> (Array2<f64>, StandardScaler) {
    let scaler = StandardScaler::fit(features);
    let standardized = (features - &scaler.means) / &scaler.stds;
    (standardized, scaler)
}
