//! K-Means partitioning of a standardized feature matrix

use crate::error::{Result, SegmentError};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::seq::index;
use rand::Rng;
use tracing::{debug, info, warn};

/// Hyperparameters for a K-Means run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KMeansParams {
    /// Number of clusters `k`
    pub n_clusters: usize,
    /// Upper bound on assignment passes
    pub max_iters: usize,
}

impl Default for KMeansParams {
    fn default() -> Self {
        KMeansParams {
            n_clusters: 4,
            max_iters: 100,
        }
    }
}

impl KMeansParams {
    /// Check the parameters against a dataset of `n_rows` rows.
    ///
    /// An empty dataset accepts any parameters, it simply yields an empty model.
    pub fn validate(&self, n_rows: usize) -> Result<()> {
        if n_rows == 0 {
            return Ok(());
        }
        if self.n_clusters == 0 {
            return Err(SegmentError::invalid("number of clusters must be at least 1"));
        }
        if self.n_clusters > n_rows {
            return Err(SegmentError::invalid(format!(
                "number of clusters ({}) exceeds number of rows ({})",
                self.n_clusters, n_rows
            )));
        }
        if self.max_iters == 0 {
            return Err(SegmentError::invalid("max_iters must be at least 1"));
        }
        Ok(())
    }
}

/// Mutable state owned by a single K-Means invocation
#[derive(Debug, Clone)]
pub struct KMeansState {
    pub labels: Array1<usize>,
    pub centroids: Array2<f64>,
    /// Assignment passes run so far
    pub iterations: usize,
}

impl KMeansState {
    /// Seed centroids from `k` distinct rows drawn without replacement
    fn initialize<R: Rng + ?Sized>(features: &Array2<f64>, n_clusters: usize, rng: &mut R) -> Self {
        let picks = index::sample(rng, features.nrows(), n_clusters).into_vec();
        let centroids = features.select(Axis(0), &picks);

        KMeansState {
            // usize::MAX never matches a real label, so the first pass always counts as a change
            labels: Array1::from_elem(features.nrows(), usize::MAX),
            centroids,
            iterations: 0,
        }
    }

    /// Assign each row to its nearest centroid; returns how many labels changed
    fn assign(&mut self, features: &Array2<f64>) -> usize {
        let mut changed = 0;
        for (row, label) in features.outer_iter().zip(self.labels.iter_mut()) {
            let nearest = nearest_centroid(&row, &self.centroids);
            if *label != nearest {
                *label = nearest;
                changed += 1;
            }
        }
        self.iterations += 1;
        changed
    }

    /// Move every centroid to the mean of its rows; returns the reseeded clusters
    fn update<R: Rng + ?Sized>(&mut self, features: &Array2<f64>, rng: &mut R) -> Vec<usize> {
        let n_clusters = self.centroids.nrows();
        let mut sums = Array2::<f64>::zeros(self.centroids.raw_dim());
        let mut counts = vec![0usize; n_clusters];

        for (row, &label) in features.outer_iter().zip(self.labels.iter()) {
            sums.row_mut(label).scaled_add(1.0, &row);
            counts[label] += 1;
        }

        let mut reseeded = Vec::new();
        for (cluster, &count) in counts.iter().enumerate() {
            if count == 0 {
                let pick = rng.gen_range(0..features.nrows());
                self.centroids.row_mut(cluster).assign(&features.row(pick));
                reseeded.push(cluster);
            } else {
                let mean = &sums.row(cluster) / count as f64;
                self.centroids.row_mut(cluster).assign(&mean);
            }
        }
        reseeded
    }
}

/// Result of a K-Means run
#[derive(Debug, Clone)]
pub struct KMeansModel {
    /// Number of clusters
    pub n_clusters: usize,
    /// Cluster assignment per input row, each in `[0, n_clusters)`
    pub labels: Array1<usize>,
    /// Cluster centroids in standardized space, shape (n_clusters, n_features)
    pub centroids: Array2<f64>,
    /// Within-cluster sum of squares (inertia)
    pub inertia: f64,
    /// Assignment passes performed
    pub iterations: usize,
    /// Whether the run stopped because labels stabilized
    pub converged: bool,
}

impl KMeansModel {
    fn empty(n_clusters: usize, n_features: usize) -> Self {
        KMeansModel {
            n_clusters,
            labels: Array1::from_elem(0, 0),
            centroids: Array2::zeros((0, n_features)),
            inertia: 0.0,
            iterations: 0,
            converged: true,
        }
    }

    /// Predict the cluster of a standardized record
    pub fn predict(&self, features: &Array1<f64>) -> Result<usize> {
        if self.centroids.nrows() == 0 {
            return Err(SegmentError::invalid("model has no centroids"));
        }
        if features.len() != self.centroids.ncols() {
            return Err(SegmentError::shape(
                format!("{} features", self.centroids.ncols()),
                format!("{} features", features.len()),
            ));
        }

        Ok(nearest_centroid(&features.view(), &self.centroids))
    }

    /// Get cluster sizes
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.n_clusters];
        for &label in self.labels.iter() {
            if label < self.n_clusters {
                sizes[label] += 1;
            }
        }
        sizes
    }

    /// Compute basic silhouette coefficient for a subset of points (for efficiency)
    pub fn compute_silhouette_sample(&self, features: &Array2<f64>, sample_size: usize) -> f64 {
        let n_samples = features.nrows().min(sample_size).min(self.labels.len());
        if n_samples < 2 {
            return 0.0;
        }

        let mut silhouette_sum = 0.0;

        for i in 0..n_samples {
            let point = features.row(i);
            let cluster_label = self.labels[i];

            let mut same_cluster = (0.0, 0usize);
            let mut other_clusters = vec![(0.0, 0usize); self.n_clusters];

            for j in (0..n_samples).filter(|&j| j != i) {
                let distance = euclidean_distance(&point, &features.row(j));
                let other_label = self.labels[j];

                let slot = if other_label == cluster_label {
                    &mut same_cluster
                } else {
                    &mut other_clusters[other_label]
                };
                slot.0 += distance;
                slot.1 += 1;
            }

            // a(i): mean distance within own cluster
            let a_i = if same_cluster.1 == 0 {
                0.0
            } else {
                same_cluster.0 / same_cluster.1 as f64
            };

            // b(i): smallest mean distance to another cluster
            let b_i = other_clusters
                .iter()
                .filter(|(_, count)| *count > 0)
                .map(|(sum, count)| sum / *count as f64)
                .fold(f64::INFINITY, f64::min);

            let silhouette_i = if b_i.is_infinite() || (a_i == 0.0 && b_i == 0.0) {
                0.0
            } else {
                (b_i - a_i) / a_i.max(b_i)
            };

            silhouette_sum += silhouette_i;
        }

        silhouette_sum / n_samples as f64
    }
}

/// Fit K-Means on a standardized feature matrix
///
/// # Arguments
/// * `features` - Standardized features, shape (n_rows, n_features)
/// * `n_clusters` - Number of clusters, `1 <= n_clusters <= n_rows`
/// * `max_iters` - Maximum number of assignment passes
/// * `rng` - Randomness source for initialization and empty-cluster reseeding
///
/// # Returns
/// * Fitted `KMeansModel`; an empty input yields an empty model
pub fn fit_kmeans<R: Rng + ?Sized>(
    features: &Array2<f64>,
    n_clusters: usize,
    max_iters: usize,
    rng: &mut R,
) -> Result<KMeansModel> {
    let params = KMeansParams {
        n_clusters,
        max_iters,
    };
    params.validate(features.nrows())?;

    if features.nrows() == 0 {
        return Ok(KMeansModel::empty(n_clusters, features.ncols()));
    }

    let mut state = KMeansState::initialize(features, n_clusters, rng);
    let mut converged = false;

    // Every update, reseeds included, is followed by a fresh assignment pass
    // before convergence is judged.
    while state.iterations < max_iters {
        let changed = state.assign(features);
        if changed == 0 {
            converged = true;
            break;
        }

        let reseeded = state.update(features, rng);
        debug!(
            iteration = state.iterations,
            changed,
            reseeded = reseeded.len(),
            "k-means pass"
        );
    }

    if !converged {
        warn!(max_iters, "k-means stopped at iteration limit before labels stabilized");
    }

    let inertia = compute_inertia(features, &state.labels, &state.centroids);
    info!(
        n_clusters,
        iterations = state.iterations,
        converged,
        inertia,
        "k-means finished"
    );

    Ok(KMeansModel {
        n_clusters,
        labels: state.labels,
        centroids: state.centroids,
        inertia,
        iterations: state.iterations,
        converged,
    })
}

/// Index of the closest centroid; ties resolve to the lowest index
fn nearest_centroid(point: &ArrayView1<f64>, centroids: &Array2<f64>) -> usize {
    let mut min_distance = f64::INFINITY;
    let mut closest_cluster = 0;

    for (cluster_idx, centroid) in centroids.outer_iter().enumerate() {
        let distance = squared_distance(point, &centroid);
        if distance < min_distance {
            min_distance = distance;
            closest_cluster = cluster_idx;
        }
    }

    closest_cluster
}

/// Compute within-cluster sum of squares (inertia)
fn compute_inertia(features: &Array2<f64>, labels: &Array1<usize>, centroids: &Array2<f64>) -> f64 {
    features
        .outer_iter()
        .zip(labels.iter())
        .map(|(point, &cluster)| squared_distance(&point, &centroids.row(cluster)))
        .sum()
}

fn squared_distance(a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Calculate Euclidean distance between two points
fn euclidean_distance(a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> f64 {
    squared_distance(a, b).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn two_groups() -> Array2<f64> {
        array![
            [0.0, 0.0],
            [0.0, 1.0],
            [1.0, 0.0],
            [10.0, 10.0],
            [10.0, 11.0],
            [11.0, 10.0]
        ]
    }

    #[test]
    fn test_fit_kmeans() {
        let mut rng = StdRng::seed_from_u64(7);
        let model = fit_kmeans(&two_groups(), 2, 100, &mut rng).unwrap();

        assert_eq!(model.n_clusters, 2);
        assert_eq!(model.labels.len(), 6);
        assert_eq!(model.centroids.shape(), &[2, 2]);
        assert!(model.converged);
        assert!(model.iterations <= 100);
    }

    #[test]
    fn test_separated_groups_recovered() {
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let model = fit_kmeans(&two_groups(), 2, 100, &mut rng).unwrap();
            let labels = &model.labels;

            assert_eq!(labels[0], labels[1]);
            assert_eq!(labels[0], labels[2]);
            assert_eq!(labels[3], labels[4]);
            assert_eq!(labels[3], labels[5]);
            assert_ne!(labels[0], labels[3]);
        }
    }

    #[test]
    fn test_cluster_sizes() {
        let mut rng = StdRng::seed_from_u64(3);
        let model = fit_kmeans(&two_groups(), 3, 100, &mut rng).unwrap();

        let sizes = model.cluster_sizes();
        assert_eq!(sizes.len(), 3);
        assert_eq!(sizes.iter().sum::<usize>(), 6);
    }

    #[test]
    fn test_invalid_cluster_count() {
        let mut rng = StdRng::seed_from_u64(1);

        let result = fit_kmeans(&two_groups(), 0, 100, &mut rng);
        assert!(matches!(result, Err(SegmentError::InvalidConfiguration(_))));

        let result = fit_kmeans(&two_groups(), 7, 100, &mut rng);
        assert!(matches!(result, Err(SegmentError::InvalidConfiguration(_))));

        let result = fit_kmeans(&two_groups(), 2, 0, &mut rng);
        assert!(matches!(result, Err(SegmentError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_empty_input() {
        let mut rng = StdRng::seed_from_u64(1);
        let features = Array2::<f64>::zeros((0, 2));
        let model = fit_kmeans(&features, 3, 100, &mut rng).unwrap();

        assert!(model.labels.is_empty());
        assert_eq!(model.centroids.nrows(), 0);
    }

    #[test]
    fn test_identical_rows_keep_every_label_in_range() {
        // All rows coincide, so extra clusters end up empty and get reseeded
        let features = Array2::<f64>::ones((5, 3));
        let mut rng = StdRng::seed_from_u64(11);
        let model = fit_kmeans(&features, 4, 50, &mut rng).unwrap();

        assert_eq!(model.centroids.nrows(), 4);
        assert!(model.labels.iter().all(|&l| l < 4));
        assert_eq!(model.inertia, 0.0);
    }

    #[test]
    fn test_iteration_bound() {
        let mut rng = StdRng::seed_from_u64(5);
        let model = fit_kmeans(&two_groups(), 2, 1, &mut rng).unwrap();

        assert_eq!(model.iterations, 1);
        assert!(!model.converged);
    }

    #[test]
    fn test_ties_go_to_lowest_centroid_index() {
        let point = array![1.0, 1.0];

        let identical = array![[0.0, 0.0], [0.0, 0.0]];
        assert_eq!(nearest_centroid(&point.view(), &identical), 0);

        // (1, 1) is sqrt(2) away from both the second and third centroid
        let equidistant = array![[10.0, 10.0], [0.0, 2.0], [2.0, 0.0]];
        assert_eq!(nearest_centroid(&point.view(), &equidistant), 1);
    }

    #[test]
    fn test_identical_rows_all_join_first_cluster() {
        let features = Array2::<f64>::ones((5, 3));
        let mut rng = StdRng::seed_from_u64(4);
        let model = fit_kmeans(&features, 3, 50, &mut rng).unwrap();

        assert!(model.labels.iter().all(|&l| l == 0));
        assert_eq!(model.cluster_sizes(), vec![5, 0, 0]);
    }

    #[test]
    fn test_predict() {
        let mut rng = StdRng::seed_from_u64(9);
        let model = fit_kmeans(&two_groups(), 2, 100, &mut rng).unwrap();

        let low = model.predict(&array![0.5, 0.5]).unwrap();
        let high = model.predict(&array![10.5, 10.5]).unwrap();
        assert_eq!(low, model.labels[0]);
        assert_eq!(high, model.labels[3]);

        assert!(model.predict(&array![1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn test_silhouette_well_separated() {
        let mut rng = StdRng::seed_from_u64(2);
        let model = fit_kmeans(&two_groups(), 2, 100, &mut rng).unwrap();

        let score = model.compute_silhouette_sample(&two_groups(), 100);
        assert!(score > 0.8);
    }
}
