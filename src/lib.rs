//! PizzaMetrics: pizza sales analytics over transaction CSV exports
//!
//! This library provides two batch pipelines over the same sales data: a
//! monthly demand forecast with uncertainty bounds, and per-category
//! RFM (Recency, Frequency, Monetary) quartile scoring.

pub mod cli;
pub mod data;
pub mod error;
pub mod model;
pub mod report;
pub mod rfm;
pub mod series;
pub mod viz;

// Re-export public items for easier access
pub use cli::{Cli, Command, ForecastArgs, SegmentArgs};
pub use data::{
    load_category_orders, load_monthly_sales, DatePolicy, LoadOutcome, OrderRecord, SaleRecord,
};
pub use error::{PipelineError, Result};
pub use model::{AdditiveModel, Forecast, ForecastPoint, Forecaster};
pub use report::{write_forecast, write_segments};
pub use rfm::{calculate_rfm, RfmRecord};
pub use series::{aggregate_monthly, MonthlyPoint, MonthlySeries};
pub use viz::{plot_forecast, plot_segment_scores};
