//! Command-line interface definitions and argument parsing

use clap::Parser;

/// Customer segmentation CLI: z-score scaling, K-Means and a 2-D PCA view
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input CSV file
    #[arg(short, long, default_value = "customers.csv")]
    pub input: String,

    /// Number of segments for K-Means
    #[arg(short = 'k', long, default_value = "4")]
    pub clusters: usize,

    /// Comma-separated feature columns; defaults to every numeric column
    #[arg(short, long)]
    pub features: Option<String>,

    /// Comma-separated columns to summarize per segment; defaults to the features
    #[arg(long)]
    pub profile_features: Option<String>,

    /// Output path for the input rows annotated with their segment
    #[arg(short, long, default_value = "segments.csv")]
    pub output: String,

    /// Output path for the per-segment summary
    #[arg(long, default_value = "segment_profiles.csv")]
    pub profile_output: String,

    /// Output path for the projection plot (SVG)
    #[arg(short, long, default_value = "segments.svg")]
    pub plot: String,

    /// Prediction mode: raw feature values as a comma-separated string
    /// Example: --predict "34,72000,65" for three selected features
    #[arg(long)]
    pub predict: Option<String>,

    /// Maximum iterations for K-Means algorithm
    #[arg(long, default_value = "100")]
    pub max_iters: usize,

    /// Seed for reproducible runs; omitted means a fresh random seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Write N synthetic customers to the input path and exit
    #[arg(long, value_name = "N")]
    pub generate_sample: Option<usize>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Split a comma-separated list of column names, dropping blanks
fn parse_name_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Args {
    /// Feature columns requested with `--features`
    pub fn feature_columns(&self) -> Option<Vec<String>> {
        self.features.as_deref().map(parse_name_list)
    }

    /// Profile columns requested with `--profile-features`
    pub fn profile_columns(&self) -> Option<Vec<String>> {
        self.profile_features.as_deref().map(parse_name_list)
    }

    /// Parse the raw record given to `--predict`
    /// Expected format: "v1,v2,...", one value per selected feature
    pub fn parse_predict_values(&self) -> crate::Result<Option<Vec<f64>>> {
        let Some(ref predict_str) = self.predict else {
            return Ok(None);
        };

        let values = predict_str
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<f64>()
                    .map_err(|_| anyhow::anyhow!("Invalid predict value: {}", part))
            })
            .collect::<crate::Result<Vec<f64>>>()?;

        if values.is_empty() {
            anyhow::bail!("Predict values must be in format 'v1,v2,...'");
        }

        Ok(Some(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> Args {
        Args::parse_from(["segmentforge", "--input", "test.csv", "-k", "3"])
    }

    #[test]
    fn test_defaults() {
        let args = args();
        assert_eq!(args.clusters, 3);
        assert_eq!(args.max_iters, 100);
        assert_eq!(args.seed, None);
        assert_eq!(args.feature_columns(), None);
    }

    #[test]
    fn test_parse_predict_values() {
        let mut args = args();
        args.predict = Some("30, 10,500.0".to_string());

        let result = args.parse_predict_values().unwrap();
        assert_eq!(result, Some(vec![30.0, 10.0, 500.0]));

        args.predict = None;
        let result = args.parse_predict_values().unwrap();
        assert_eq!(result, None);

        args.predict = Some("invalid".to_string());
        assert!(args.parse_predict_values().is_err());
    }

    #[test]
    fn test_feature_columns() {
        let args = Args::parse_from(["segmentforge", "-f", "Age, AnnualIncome,,SpendingScore"]);
        assert_eq!(
            args.feature_columns(),
            Some(vec![
                "Age".to_string(),
                "AnnualIncome".to_string(),
                "SpendingScore".to_string()
            ])
        );
    }
}
