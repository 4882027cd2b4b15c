//! Two-component PCA projection via power iteration with deflation

use crate::error::{Result, SegmentError};
use ndarray::{Array1, Array2, Axis};
use rand::Rng;
use tracing::debug;

/// Fixed number of power-iteration steps per component
pub const POWER_ITERATIONS: usize = 200;

/// Guards the explained-variance ratio when both eigenvalues vanish
const VARIANCE_EPSILON: f64 = 1e-10;

/// Norms below this are treated as a zero vector during power iteration
const ZERO_NORM: f64 = 1e-300;

/// Approximate eigenvalue/eigenvector pair of a covariance matrix
#[derive(Debug, Clone, PartialEq)]
pub struct EigenPair {
    pub value: f64,
    /// Unit-length eigenvector
    pub vector: Array1<f64>,
}

/// 2-D coordinates for every input row plus the components that produced them
#[derive(Debug, Clone)]
pub struct Projection {
    /// Scores on the first two components, shape (n_rows, 2)
    pub coords: Array2<f64>,
    /// Share of `λ1 + λ2` captured by each component
    pub explained_variance_ratio: [f64; 2],
    /// First and second principal components; empty for an empty input
    pub components: Vec<EigenPair>,
}

impl Projection {
    fn empty() -> Self {
        Projection {
            coords: Array2::zeros((0, 2)),
            explained_variance_ratio: [0.0, 0.0],
            components: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.coords.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.nrows() == 0
    }

    /// (x, y) of one row
    pub fn point(&self, row: usize) -> (f64, f64) {
        (self.coords[[row, 0]], self.coords[[row, 1]])
    }

    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.coords.outer_iter().map(|p| (p[0], p[1]))
    }
}

/// Project a matrix onto its first two principal components.
///
/// The input is re-centered even when already standardized. Matrices with
/// fewer than two columns are rejected; an input without rows projects to
/// an empty result.
pub fn project_2d<R: Rng + ?Sized>(features: &Array2<f64>, rng: &mut R) -> Result<Projection> {
    if features.nrows() == 0 {
        return Ok(Projection::empty());
    }
    if features.ncols() < 2 {
        return Err(SegmentError::invalid(format!(
            "2-D projection needs at least 2 features, got {}",
            features.ncols()
        )));
    }

    let centered = center_columns(features);
    let covariance = covariance_matrix(&centered);

    let first = power_iteration(&covariance, POWER_ITERATIONS, rng);
    let deflated = deflate(&covariance, &first);
    let second = power_iteration(&deflated, POWER_ITERATIONS, rng);

    let mut basis = Array2::<f64>::zeros((features.ncols(), 2));
    basis.column_mut(0).assign(&first.vector);
    basis.column_mut(1).assign(&second.vector);
    let coords = centered.dot(&basis);

    let lambda1 = first.value.max(0.0);
    let lambda2 = second.value.max(0.0);
    let total = lambda1 + lambda2 + VARIANCE_EPSILON;
    let explained_variance_ratio = [lambda1 / total, lambda2 / total];

    debug!(
        lambda1,
        lambda2,
        ratio1 = explained_variance_ratio[0],
        ratio2 = explained_variance_ratio[1],
        "pca projection"
    );

    Ok(Projection {
        coords,
        explained_variance_ratio,
        components: vec![first, second],
    })
}

/// Subtract each column's mean
pub fn center_columns(features: &Array2<f64>) -> Array2<f64> {
    match features.mean_axis(Axis(0)) {
        Some(means) => features - &means,
        None => features.clone(),
    }
}

/// Sample covariance `XᵀX / (n - 1)` of a centered matrix (divisor 1 for a single row)
pub fn covariance_matrix(centered: &Array2<f64>) -> Array2<f64> {
    let divisor = centered.nrows().saturating_sub(1).max(1) as f64;
    centered.t().dot(centered) / divisor
}

/// Dominant eigenpair of a symmetric matrix.
///
/// Runs exactly `iterations` multiply-and-normalize steps from a random
/// start, then takes the Rayleigh quotient `vᵀCv` as the eigenvalue.
pub fn power_iteration<R: Rng + ?Sized>(
    matrix: &Array2<f64>,
    iterations: usize,
    rng: &mut R,
) -> EigenPair {
    let dim = matrix.nrows();
    if dim == 0 {
        return EigenPair {
            value: 0.0,
            vector: Array1::zeros(0),
        };
    }

    let mut vector: Array1<f64> = (0..dim).map(|_| rng.gen_range(-1.0..1.0)).collect();
    if !normalize(&mut vector) {
        vector = Array1::zeros(dim);
        vector[0] = 1.0;
    }

    for _ in 0..iterations {
        let mut next = matrix.dot(&vector);
        // A vanishing product means the matrix annihilates v; keep v as is
        if normalize(&mut next) {
            vector = next;
        }
    }

    orient(&mut vector);
    let value = vector.dot(&matrix.dot(&vector));
    EigenPair { value, vector }
}

/// `C - λ vvᵀ`
pub fn deflate(matrix: &Array2<f64>, pair: &EigenPair) -> Array2<f64> {
    let v = pair.vector.view().insert_axis(Axis(1));
    let outer = v.dot(&v.t());
    matrix - &(outer * pair.value)
}

fn normalize(vector: &mut Array1<f64>) -> bool {
    let norm = vector.dot(vector).sqrt();
    if !norm.is_finite() || norm < ZERO_NORM {
        return false;
    }
    vector.mapv_inplace(|x| x / norm);
    true
}

/// Flip the sign so the largest-magnitude entry is positive
fn orient(vector: &mut Array1<f64>) {
    let pivot = vector
        .iter()
        .copied()
        .fold(0.0_f64, |best, x| if x.abs() > best.abs() { x } else { best });
    if pivot < 0.0 {
        vector.mapv_inplace(|x| -x);
    }
}
