//! SegmentForge: customer segmentation on numeric tabular data
//!
//! The engine standardizes each feature column, partitions rows with K-Means,
//! projects them onto two principal components found by power iteration and
//! summarizes every segment. CSV loading, sample data and SVG charts sit
//! around the engine for the command-line tool.

pub mod cli;
pub mod data;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod profile;
pub mod projection;
pub mod sample;
pub mod scaler;
pub mod viz;

// Re-export public items for easier access
pub use cli::Args;
pub use data::{load_feature_table, write_profiles_csv, write_segmented_csv, FeatureTable};
pub use error::SegmentError;
pub use model::{fit_kmeans, KMeansModel, KMeansParams};
pub use pipeline::{run_segmentation, SegmentationConfig, SegmentationReport};
pub use profile::{profile_segments, FeatureMean, SegmentProfile};
pub use projection::{project_2d, EigenPair, Projection};
pub use scaler::{standardize, StandardScaler};
pub use viz::generate_visualization_report;

/// Common result type used by the application layer
pub type Result<T> = anyhow::Result<T>;
