//! Per-segment descriptive statistics

use crate::data::FeatureTable;
use crate::error::{Result, SegmentError};
use ndarray::Array1;

/// Mean of one feature within a segment
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMean {
    pub feature: String,
    pub mean: f64,
}

/// Summary of one segment: its size and the mean of each requested feature
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentProfile {
    pub segment: usize,
    pub count: usize,
    pub means: Vec<FeatureMean>,
}

impl SegmentProfile {
    /// Mean of `feature` in this segment, if it was profiled
    pub fn mean(&self, feature: &str) -> Option<f64> {
        self.means
            .iter()
            .find(|m| m.feature == feature)
            .map(|m| m.mean)
    }
}

/// Summarize every segment `0..=max(label)`.
///
/// Segments without rows still get an entry, with a count of 0 and means
/// of 0. `features` names the table columns to average, in output order.
pub fn profile_segments<S: AsRef<str>>(
    table: &FeatureTable,
    labels: &Array1<usize>,
    features: &[S],
) -> Result<Vec<SegmentProfile>> {
    if labels.len() != table.n_rows() {
        return Err(SegmentError::shape(
            format!("{} labels", table.n_rows()),
            format!("{} labels", labels.len()),
        ));
    }

    let columns = features
        .iter()
        .map(|name| {
            let name = name.as_ref();
            table
                .column_index(name)
                .ok_or_else(|| SegmentError::invalid(format!("unknown feature '{name}'")))
        })
        .collect::<Result<Vec<usize>>>()?;

    let Some(&max_label) = labels.iter().max() else {
        return Ok(Vec::new());
    };

    let n_segments = max_label + 1;
    let mut counts = vec![0usize; n_segments];
    let mut sums = vec![vec![0.0; columns.len()]; n_segments];

    for (row, &label) in table.values.outer_iter().zip(labels.iter()) {
        counts[label] += 1;
        for (sum, &column) in sums[label].iter_mut().zip(columns.iter()) {
            *sum += row[column];
        }
    }

    let profiles = counts
        .into_iter()
        .zip(sums)
        .enumerate()
        .map(|(segment, (count, sums))| SegmentProfile {
            segment,
            count,
            means: features
                .iter()
                .zip(sums)
                .map(|(name, sum)| FeatureMean {
                    feature: name.as_ref().to_string(),
                    mean: if count == 0 { 0.0 } else { sum / count as f64 },
                })
                .collect(),
        })
        .collect();

    Ok(profiles)
}
