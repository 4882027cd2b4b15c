//! CSV input adapter and output writers using Polars

use crate::error::SegmentError;
use crate::profile::SegmentProfile;
use ndarray::{Array1, Array2, ArrayView1};
use polars::prelude::*;
use std::fs::File;
use std::path::PathBuf;
use tracing::debug;

/// Name of the column appended to segmented output
pub const SEGMENT_COLUMN: &str = "Segment";

/// Named numeric features, one row per record
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    /// Column names, in matrix column order
    pub names: Vec<String>,
    /// Raw feature values, shape (n_rows, names.len())
    pub values: Array2<f64>,
}

impl FeatureTable {
    pub fn new(names: Vec<String>, values: Array2<f64>) -> crate::error::Result<Self> {
        if names.len() != values.ncols() {
            return Err(SegmentError::shape(
                format!("{} columns", names.len()),
                format!("{} columns", values.ncols()),
            ));
        }
        Ok(FeatureTable { names, values })
    }

    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.values.ncols()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        self.column_index(name).map(|j| self.values.column(j))
    }
}

/// Load a CSV file and build a feature table from its numeric columns
///
/// # Arguments
/// * `file_path` - Path to the CSV file (header row required)
/// * `columns` - Columns to use; `None` selects every numeric column
///
/// # Returns
/// * `FeatureTable` with missing or non-numeric cells coerced to 0
pub fn load_feature_table(file_path: &str, columns: Option<&[String]>) -> crate::Result<FeatureTable> {
    let df = read_csv(file_path)?;
    let table = feature_table_from_frame(&df, columns)?;

    debug!(
        path = file_path,
        rows = table.n_rows(),
        features = ?table.names,
        "loaded feature table"
    );

    Ok(table)
}

/// Narrow a DataFrame to a fixed-width numeric table
pub fn feature_table_from_frame(df: &DataFrame, columns: Option<&[String]>) -> crate::Result<FeatureTable> {
    let names: Vec<String> = match columns {
        Some(requested) => {
            for name in requested {
                if df.column(name).is_err() {
                    anyhow::bail!("Column '{}' not found in input", name);
                }
            }
            requested.to_vec()
        }
        None => df
            .get_columns()
            .iter()
            .filter(|s| s.dtype().is_numeric())
            .map(|s| s.name().to_string())
            .collect(),
    };

    if names.is_empty() {
        anyhow::bail!("No numeric columns found in input");
    }

    let n_rows = df.height();
    let mut values = Array2::<f64>::zeros((n_rows, names.len()));
    for (j, name) in names.iter().enumerate() {
        let column = numeric_column(df.column(name)?)?;
        values.column_mut(j).assign(&column);
    }

    Ok(FeatureTable::new(names, values)?)
}

/// Cast a column to f64, treating nulls and unparsable cells as 0
fn numeric_column(series: &Series) -> crate::Result<Array1<f64>> {
    let casted = series.cast(&DataType::Float64)?;
    let values: Array1<f64> = casted
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| x.is_finite()).unwrap_or(0.0))
        .collect();
    Ok(values)
}

pub(crate) fn read_csv(file_path: &str) -> crate::Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(PathBuf::from(file_path)))?
        .finish()?;
    Ok(df)
}

fn write_csv(df: &mut DataFrame, output_path: &str) -> crate::Result<()> {
    let mut file = File::create(output_path)?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    Ok(())
}

/// Copy the input CSV with a `Segment` column appended
pub fn write_segmented_csv(input_path: &str, labels: &Array1<usize>, output_path: &str) -> crate::Result<()> {
    let mut df = read_csv(input_path)?;
    if df.height() != labels.len() {
        anyhow::bail!(
            "Input has {} rows but {} segment labels were given",
            df.height(),
            labels.len()
        );
    }

    let segments: Vec<u32> = labels.iter().map(|&l| l as u32).collect();
    df.with_column(Series::new(SEGMENT_COLUMN, segments))?;
    write_csv(&mut df, output_path)
}

/// Write one row per segment: `Segment,Count,<feature means>...`
pub fn write_profiles_csv(profiles: &[SegmentProfile], output_path: &str) -> crate::Result<()> {
    let mut columns = vec![
        Series::new(
            SEGMENT_COLUMN,
            profiles.iter().map(|p| p.segment as u32).collect::<Vec<_>>(),
        ),
        Series::new("Count", profiles.iter().map(|p| p.count as u32).collect::<Vec<_>>()),
    ];

    if let Some(first) = profiles.first() {
        for (j, feature) in first.means.iter().enumerate() {
            let means: Vec<f64> = profiles.iter().map(|p| p.means[j].mean).collect();
            columns.push(Series::new(&feature.feature, means));
        }
    }

    let mut df = DataFrame::new(columns)?;
    write_csv(&mut df, output_path)
}
