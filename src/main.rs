//! SegmentForge: customer segmentation CLI
//!
//! This is the main entrypoint that orchestrates data loading, the
//! segmentation engine, output files, visualization, and prediction.

use anyhow::Result;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use segmentforge::{
    load_feature_table, run_segmentation, sample, viz, write_profiles_csv, write_segmented_csv,
    Args, FeatureTable, SegmentationConfig, SegmentationReport,
};
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    if let Some(n_customers) = args.generate_sample {
        sample::write_sample_csv(&args.input, n_customers, &mut rng)?;
        println!("✓ Wrote {} sample customers to {}", n_customers, args.input);
        return Ok(());
    }

    let start_time = Instant::now();
    let (table, report) = run_engine(&args, &mut rng)?;

    // Check if in prediction mode
    if let Some(record) = args.parse_predict_values()? {
        run_prediction_mode(&table, &report, &record)?;
    } else {
        write_outputs(&args, &table, &report)?;
    }

    println!("\nTotal processing time: {:.2}s", start_time.elapsed().as_secs_f64());
    Ok(())
}

/// Load the input and run the segmentation engine
fn run_engine(args: &Args, rng: &mut StdRng) -> Result<(FeatureTable, SegmentationReport)> {
    let feature_columns = args.feature_columns();
    let table = load_feature_table(&args.input, feature_columns.as_deref())?;
    println!(
        "✓ Data loaded: {} customers, features: {}",
        table.n_rows(),
        table.names.join(", ")
    );

    let mut config = SegmentationConfig::default()
        .with_clusters(args.clusters)
        .with_max_iters(args.max_iters);
    if let Some(columns) = args.profile_columns() {
        config = config.with_profile_features(columns);
    }

    info!(
        clusters = config.n_clusters,
        max_iters = config.max_iters,
        seed = ?args.seed,
        "running segmentation"
    );

    let engine_start = Instant::now();
    let report = run_segmentation(&table, &config, rng)?;
    println!(
        "✓ Segmentation finished in {:.2}s",
        engine_start.elapsed().as_secs_f64()
    );

    Ok((table, report))
}

/// Report the segment of a single new customer
fn run_prediction_mode(table: &FeatureTable, report: &SegmentationReport, record: &[f64]) -> Result<()> {
    println!("\n=== Prediction Mode ===");
    let described: Vec<String> = table
        .names
        .iter()
        .zip(record.iter())
        .map(|(name, value)| format!("{}={}", name, value))
        .collect();
    println!("Input values: {}", described.join(", "));

    let segment = report.predict(record)?;
    println!("\n✓ Predicted Segment: {}", segment);

    let sizes = report.model.cluster_sizes();
    let share = sizes[segment] as f64 / table.n_rows().max(1) as f64 * 100.0;
    println!("  Size: {} customers ({:.1}% of total)", sizes[segment], share);

    if let Some(profile) = report.profiles.get(segment) {
        for mean in &profile.means {
            println!("  Mean {}: {:.2}", mean.feature, mean.mean);
        }
    }

    Ok(())
}

/// Write the segmented CSV, the profile CSV and the charts
fn write_outputs(args: &Args, table: &FeatureTable, report: &SegmentationReport) -> Result<()> {
    write_segmented_csv(&args.input, &report.model.labels, &args.output)?;
    println!("✓ Segmented rows saved to: {}", args.output);

    write_profiles_csv(&report.profiles, &args.profile_output)?;
    println!("✓ Segment profiles saved to: {}", args.profile_output);

    viz::generate_visualization_report(report, table, &args.plot)?;
    println!("\n✓ Projection plot saved to: {}", args.plot);
    println!("  Segment sizes saved to: {}", viz::sizes_chart_path(&args.plot));

    Ok(())
}
