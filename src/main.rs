//! PizzaMetrics: sales forecasting and category segmentation CLI
//!
//! This is the main entrypoint that orchestrates loading, modelling,
//! report writing and chart rendering for both pipelines.

use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use pizzametrics::{
    aggregate_monthly, calculate_rfm, load_category_orders, load_monthly_sales, viz,
    write_forecast, write_segments, AdditiveModel, Cli, Command, ForecastArgs, Forecaster,
    SegmentArgs,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Forecast(args) => run_forecast(&args, cli.verbose),
        Command::Segment(args) => run_segment(&args, cli.verbose),
    }
}

/// Run the monthly demand forecasting pipeline
fn run_forecast(args: &ForecastArgs, verbose: bool) -> Result<()> {
    println!("=== Monthly Sales Forecast ===\n");

    let start_time = Instant::now();

    // Step 1: Load and aggregate
    if verbose {
        println!("Step 1: Loading sales data");
        println!("  Input file: {}", args.input.display());
        println!("  Date policy: {:?}", args.date_policy);
    }

    let outcome = load_monthly_sales(&args.input, args.date_policy)?;
    println!(
        "✓ Data loaded: {} rows ({} dropped)",
        outcome.rows_read, outcome.rows_dropped
    );

    let series = aggregate_monthly(&outcome.records);
    println!("✓ Aggregated into {} monthly totals", series.len());
    if verbose {
        if let (Some(first), Some(last)) = (series.first(), series.last()) {
            println!("  History: {} to {}", first.month, last.month);
        }
    }

    // Step 2: Fit the model
    if verbose {
        println!("\nStep 2: Fitting additive model");
        println!("  Confidence level: {}", args.confidence);
        println!("  Forecast periods: {}", args.periods);
    }

    let model_start = Instant::now();
    let mut model = AdditiveModel::new(args.confidence);
    model.fit(&series)?;
    let model_time = model_start.elapsed();

    println!("✓ Model fitted successfully");
    if verbose {
        println!("  Fitting time: {:.2}s", model_time.as_secs_f64());
        println!("  Trend: {:+.2} per month", model.slope);
        println!(
            "  Seasonality: {}",
            if model.seasonal_enabled {
                "enabled"
            } else {
                "disabled (needs two full years)"
            }
        );
        println!("  Residual sigma: {:.2}", model.sigma);
    }

    // Step 3: Write outputs
    let forecast = model.forecast(args.periods)?;
    write_forecast(&forecast, args.periods, &args.output)?;

    if let Some(plot_path) = &args.plot {
        viz::plot_forecast(&series, &forecast, plot_path)?;
    }

    let total_time = start_time.elapsed();
    println!("\n=== Pipeline Complete ===");
    println!("Total processing time: {:.2}s", total_time.as_secs_f64());

    Ok(())
}

/// Run the category segmentation pipeline
fn run_segment(args: &SegmentArgs, verbose: bool) -> Result<()> {
    println!("=== Pizza Category Segmentation ===\n");

    let start_time = Instant::now();

    // Step 1: Load orders
    if verbose {
        println!("Step 1: Loading order data");
        println!("  Input file: {}", args.input.display());
        println!("  Date policy: {:?}", args.date_policy);
    }

    let outcome = load_category_orders(&args.input, args.date_policy)?;
    println!(
        "✓ Data loaded: {} rows ({} dropped)",
        outcome.rows_read, outcome.rows_dropped
    );

    // Step 2: Score categories
    if verbose {
        println!("\nStep 2: Scoring categories");
    }

    let records = calculate_rfm(&outcome.records)?;
    println!("✓ Scored {} categories", records.len());
    if verbose {
        for record in &records {
            println!(
                "  {}: R={} F={} M={} (RFM {})",
                record.category, record.r_score, record.f_score, record.m_score, record.rfm_score
            );
        }
    }

    // Step 3: Write outputs
    write_segments(&records, &args.output)?;

    if let Some(plot_path) = &args.plot {
        viz::plot_segment_scores(&records, plot_path)?;
    }

    let total_time = start_time.elapsed();
    println!("\n=== Pipeline Complete ===");
    println!("Total processing time: {:.2}s", total_time.as_secs_f64());

    Ok(())
}
