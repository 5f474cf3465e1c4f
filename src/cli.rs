//! Command-line interface definitions and argument parsing

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::data::DatePolicy;

/// Pizza sales analytics: monthly demand forecasting and category RFM scoring
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Forecast monthly sales quantities with uncertainty bounds
    Forecast(ForecastArgs),
    /// Score pizza categories into recency/frequency/monetary quartiles
    Segment(SegmentArgs),
}

/// Arguments for the forecasting pipeline
#[derive(Args, Debug)]
pub struct ForecastArgs {
    /// Path to the input CSV file
    #[arg(short, long, default_value = "pizza_sales.csv")]
    pub input: PathBuf,

    /// Output path for the forecast CSV
    #[arg(short, long, default_value = "monthly_sales_forecast_2016.csv")]
    pub output: PathBuf,

    /// Number of future months to forecast
    #[arg(short, long, default_value = "12")]
    pub periods: usize,

    /// Confidence level for the uncertainty band, strictly between 0 and 1
    #[arg(long, default_value = "0.80", value_parser = parse_confidence)]
    pub confidence: f64,

    /// How to treat rows with unparseable order dates
    #[arg(long, value_enum, default_value = "lenient")]
    pub date_policy: DatePolicy,

    /// Optional output path for a PNG forecast chart
    #[arg(long)]
    pub plot: Option<PathBuf>,
}

/// Arguments for the segmentation pipeline
#[derive(Args, Debug)]
pub struct SegmentArgs {
    /// Path to the input CSV file
    #[arg(short, long, default_value = "pizza_sales.csv")]
    pub input: PathBuf,

    /// Output path for the segmentation CSV
    #[arg(short, long, default_value = "pizza_category_rfm_segment.csv")]
    pub output: PathBuf,

    /// How to treat rows with unparseable order dates
    #[arg(long, value_enum, default_value = "strict")]
    pub date_policy: DatePolicy,

    /// Optional output path for a PNG score chart
    #[arg(long)]
    pub plot: Option<PathBuf>,
}

/// Parse a confidence level, rejecting values outside (0, 1).
fn parse_confidence(raw: &str) -> Result<f64, String> {
    let value: f64 = raw.parse().map_err(|_| format!("`{raw}` is not a number"))?;
    if value <= 0.0 || value >= 1.0 {
        return Err(format!(
            "confidence must be strictly between 0 and 1, got {value}"
        ));
    }
    Ok(value)
}
