//! End-to-end engine run: standardize, partition, project, profile

use crate::data::FeatureTable;
use crate::error::{Result, SegmentError};
use crate::model::{fit_kmeans, KMeansModel, KMeansParams};
use crate::profile::{profile_segments, SegmentProfile};
use crate::projection::{project_2d, Projection};
use crate::scaler::{standardize, StandardScaler};
use ndarray::Array2;
use rand::Rng;
use tracing::info;

/// Parameters of one segmentation run
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentationConfig {
    pub n_clusters: usize,
    pub max_iters: usize,
    /// Features to summarize per segment; `None` profiles every feature
    pub profile_features: Option<Vec<String>>,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        let params = KMeansParams::default();
        SegmentationConfig {
            n_clusters: params.n_clusters,
            max_iters: params.max_iters,
            profile_features: None,
        }
    }
}

impl SegmentationConfig {
    pub fn with_clusters(mut self, n_clusters: usize) -> Self {
        self.n_clusters = n_clusters;
        self
    }

    pub fn with_max_iters(mut self, max_iters: usize) -> Self {
        self.max_iters = max_iters;
        self
    }

    pub fn with_profile_features(mut self, features: Vec<String>) -> Self {
        self.profile_features = Some(features);
        self
    }

    /// Reject configurations the engine cannot run on `table`
    pub fn validate(&self, table: &FeatureTable) -> Result<()> {
        KMeansParams {
            n_clusters: self.n_clusters,
            max_iters: self.max_iters,
        }
        .validate(table.n_rows())?;

        if table.n_rows() > 0 && table.n_features() < 2 {
            return Err(SegmentError::invalid(format!(
                "at least 2 numeric features are required, got {}",
                table.n_features()
            )));
        }

        if let Some(features) = &self.profile_features {
            if let Some(missing) = features.iter().find(|f| table.column_index(f).is_none()) {
                return Err(SegmentError::invalid(format!("unknown profile feature '{missing}'")));
            }
        }

        Ok(())
    }
}

/// Everything one engine run produces
#[derive(Debug, Clone)]
pub struct SegmentationReport {
    pub scaler: StandardScaler,
    pub standardized: Array2<f64>,
    pub model: KMeansModel,
    pub projection: Projection,
    pub profiles: Vec<SegmentProfile>,
}

impl SegmentationReport {
    /// Segment assigned to input row `row`
    pub fn segment_of(&self, row: usize) -> Option<usize> {
        self.model.labels.get(row).copied()
    }

    /// Classify a new raw record with the fitted scaler and centroids
    pub fn predict(&self, record: &[f64]) -> Result<usize> {
        let scaled = self.scaler.transform_row(record)?;
        self.model.predict(&scaled)
    }
}

/// Run the full segmentation engine on `table`.
///
/// Validation happens before any computation. The same `rng` drives K-Means
/// initialization and the power-iteration start vectors.
pub fn run_segmentation<R: Rng + ?Sized>(
    table: &FeatureTable,
    config: &SegmentationConfig,
    rng: &mut R,
) -> Result<SegmentationReport> {
    config.validate(table)?;

    let (standardized, scaler) = standardize(&table.values);
    let model = fit_kmeans(&standardized, config.n_clusters, config.max_iters, rng)?;
    let projection = project_2d(&standardized, rng)?;

    let profiles = match &config.profile_features {
        Some(features) => profile_segments(table, &model.labels, features.as_slice())?,
        None => profile_segments(table, &model.labels, table.names.as_slice())?,
    };

    info!(
        rows = table.n_rows(),
        features = table.n_features(),
        segments = profiles.len(),
        "segmentation complete"
    );

    Ok(SegmentationReport {
        scaler,
        standardized,
        model,
        projection,
        profiles,
    })
}
