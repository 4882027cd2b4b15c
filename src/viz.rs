//! Visualization functions using Plotters for segment analysis

use crate::data::FeatureTable;
use crate::pipeline::SegmentationReport;
use plotters::prelude::*;

/// Color palette for different segments
const SEGMENT_COLORS: [RGBColor; 8] = [
    RED,
    BLUE,
    GREEN,
    MAGENTA,
    CYAN,
    RGBColor(255, 140, 0),
    RGBColor(128, 0, 128),
    RGBColor(128, 128, 0),
];

fn segment_color(segment: usize) -> RGBColor {
    SEGMENT_COLORS[segment % SEGMENT_COLORS.len()]
}

/// Axis range covering `values` with some padding
fn padded_range(values: impl Iterator<Item = f64>) -> std::ops::Range<f64> {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() || !max.is_finite() {
        return -1.0..1.0;
    }
    let pad = ((max - min) * 0.05).max(0.5);
    (min - pad)..(max + pad)
}

/// Create scatter plot of the 2-D projection, colored by segment
///
/// # Arguments
/// * `report` - Finished segmentation run
/// * `output_path` - Path to save the SVG plot
/// * `plot_title` - Title for the plot
pub fn create_projection_plot(
    report: &SegmentationReport,
    output_path: &str,
    plot_title: Option<&str>,
) -> crate::Result<()> {
    let title = plot_title.unwrap_or("Customer Segments (PCA projection)");
    let projection = &report.projection;
    let labels = &report.model.labels;
    let [ratio1, ratio2] = projection.explained_variance_ratio;

    let x_range = padded_range(projection.points().map(|(x, _)| x));
    let y_range = padded_range(projection.points().map(|(_, y)| y));

    let root = SVGBackend::new(output_path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .x_desc(format!("PC1 ({:.1}%)", ratio1 * 100.0))
        .y_desc(format!("PC2 ({:.1}%)", ratio2 * 100.0))
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    for segment in 0..report.model.n_clusters {
        let color = segment_color(segment);
        let points: Vec<(f64, f64)> = projection
            .points()
            .zip(labels.iter())
            .filter(|(_, &label)| label == segment)
            .map(|(point, _)| point)
            .collect();
        if points.is_empty() {
            continue;
        }

        chart
            .draw_series(points.into_iter().map(|p| Circle::new(p, 4, color.filled())))?
            .label(format!("Segment {}", segment))
            .legend(move |(x, y)| Circle::new((x + 5, y), 4, color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Create a bar chart of segment sizes
pub fn create_segment_size_chart(report: &SegmentationReport, output_path: &str) -> crate::Result<()> {
    let sizes = report.model.cluster_sizes();
    let max_size = sizes.iter().copied().max().unwrap_or(1).max(1) as f64;
    let n_segments = sizes.len().max(1) as f64;

    let root = SVGBackend::new(output_path, (600, 400)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Segment Sizes", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(-0.5f64..(n_segments - 0.5), 0f64..(max_size * 1.1))?;

    chart
        .configure_mesh()
        .x_desc("Segment")
        .y_desc("Number of Customers")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    chart.draw_series(sizes.iter().enumerate().map(|(segment, &size)| {
        Rectangle::new(
            [(segment as f64 - 0.4, 0.0), (segment as f64 + 0.4, size as f64)],
            segment_color(segment).filled(),
        )
    }))?;

    root.present()?;
    Ok(())
}

/// Print segment statistics to console
pub fn print_segment_statistics(report: &SegmentationReport, table: &FeatureTable) {
    let model = &report.model;
    let total = table.n_rows().max(1);

    println!("\n=== Segment Statistics ===");
    println!("Number of segments: {}", model.n_clusters);
    println!("Total customers: {}", table.n_rows());
    println!(
        "K-Means iterations: {} ({})",
        model.iterations,
        if model.converged { "converged" } else { "iteration limit" }
    );
    println!("Within-cluster sum of squares (Inertia): {:.2}", model.inertia);

    let silhouette_score = model.compute_silhouette_sample(&report.standardized, 100);
    println!("Silhouette score (sample): {:.3}", silhouette_score);

    let [ratio1, ratio2] = report.projection.explained_variance_ratio;
    println!("Explained variance: PC1 {:.1}%, PC2 {:.1}%", ratio1 * 100.0, ratio2 * 100.0);

    let Some(first) = report.profiles.first() else {
        return;
    };

    println!("\nSegment profiles (feature means):");
    let header: Vec<String> = first.means.iter().map(|m| format!("{:>14}", m.feature)).collect();
    println!("  Segment |  Count | Share | {}", header.join(" "));
    for profile in &report.profiles {
        let share = profile.count as f64 / total as f64 * 100.0;
        let means: Vec<String> = profile.means.iter().map(|m| format!("{:>14.2}", m.mean)).collect();
        println!(
            "  {:7} | {:6} | {:4.1}% | {}",
            profile.segment,
            profile.count,
            share,
            means.join(" ")
        );
    }
}

/// Generate the projection plot, the size chart and the console summary
pub fn generate_visualization_report(
    report: &SegmentationReport,
    table: &FeatureTable,
    base_output_path: &str,
) -> crate::Result<()> {
    create_projection_plot(report, base_output_path, None)?;
    create_segment_size_chart(report, &sizes_chart_path(base_output_path))?;
    print_segment_statistics(report, table);
    Ok(())
}

/// Path of the size chart written next to the main plot
pub fn sizes_chart_path(base_output_path: &str) -> String {
    match base_output_path.strip_suffix(".svg") {
        Some(stem) => format!("{stem}_sizes.svg"),
        None => format!("{base_output_path}_sizes.svg"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{run_segmentation, SegmentationConfig};
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::path::Path;
    use tempfile::tempdir;

    fn create_test_data() -> (FeatureTable, SegmentationReport) {
        let table = FeatureTable::new(
            vec!["Recency".to_string(), "Frequency".to_string(), "Monetary".to_string()],
            array![
                [-1.0, -1.0, -1.0],
                [1.0, 1.0, 1.0],
                [-0.5, 0.5, -0.5],
                [0.5, -0.5, 0.5],
                [0.0, 0.0, 0.0],
                [-0.2, 0.8, -0.8]
            ],
        )
        .unwrap();

        let mut rng = StdRng::seed_from_u64(17);
        let config = SegmentationConfig::default().with_clusters(3);
        let report = run_segmentation(&table, &config, &mut rng).unwrap();
        (table, report)
    }

    #[test]
    fn test_create_projection_plot() {
        let (_table, report) = create_test_data();
        let temp_dir = tempdir().unwrap();
        let output_path = temp_dir.path().join("test_plot.svg");
        let output_str = output_path.to_str().unwrap();

        let result = create_projection_plot(&report, output_str, None);
        assert!(result.is_ok());
        assert!(Path::new(output_str).exists());
    }

    #[test]
    fn test_create_segment_size_chart() {
        let (_table, report) = create_test_data();
        let temp_dir = tempdir().unwrap();
        let output_path = temp_dir.path().join("test_sizes.svg");
        let output_str = output_path.to_str().unwrap();

        let result = create_segment_size_chart(&report, output_str);
        assert!(result.is_ok());
        assert!(Path::new(output_str).exists());
    }

    #[test]
    fn test_generate_visualization_report() {
        let (table, report) = create_test_data();
        let temp_dir = tempdir().unwrap();
        let output_path = temp_dir.path().join("test_report.svg");
        let output_str = output_path.to_str().unwrap();

        let result = generate_visualization_report(&report, &table, output_str);
        assert!(result.is_ok());
        assert!(Path::new(output_str).exists());
        assert!(Path::new(&sizes_chart_path(output_str)).exists());
    }

    #[test]
    fn test_sizes_chart_path() {
        assert_eq!(sizes_chart_path("out/plot.svg"), "out/plot_sizes.svg");
        assert_eq!(sizes_chart_path("plot"), "plot_sizes.svg");
    }

    #[test]
    fn test_padded_range() {
        let range = padded_range([1.0, 3.0].into_iter());
        assert!(range.start < 1.0 && range.end > 3.0);
        assert_eq!(padded_range(std::iter::empty()), -1.0..1.0);
    }
}
