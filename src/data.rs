//! CSV loading and cleaning using Polars

use std::path::Path;

use chrono::NaiveDate;
use clap::ValueEnum;
use polars::prelude::*;

use crate::error::{PipelineError, Result};

/// Days between 0001-01-01 (chrono's day 1) and the Unix epoch. Polars
/// stores dates as days since the epoch.
const EPOCH_CE_DAYS: i32 = 719_163;

/// How to treat order dates that fail to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DatePolicy {
    /// Drop unparseable rows and report how many were dropped.
    Lenient,
    /// Fail the whole load if any row has an unparseable date.
    Strict,
}

/// One cleaned sales row, as needed by the forecasting pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleRecord {
    pub order_date: NaiveDate,
    pub quantity: i64,
}

/// One cleaned order row, as needed by the segmentation pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub order_date: NaiveDate,
    pub category: String,
    pub total_price: f64,
}

/// Result of a load: the cleaned records plus row accounting.
#[derive(Debug)]
pub struct LoadOutcome<T> {
    pub records: Vec<T>,
    /// Rows in the file, excluding the header.
    pub rows_read: usize,
    /// Rows removed because a date or required field was unusable.
    pub rows_dropped: usize,
}

/// Load the sales CSV for the forecasting pipeline.
///
/// Requires `order_date` and `quantity` columns. Dates are day-first
/// (`13-01-2015`); unparseable ones are handled per `policy`.
///
/// # Arguments
/// * `path` - Path to the CSV file
/// * `policy` - Whether bad dates drop rows or fail the load
///
/// # Returns
/// * `LoadOutcome<SaleRecord>` with cleaned rows and drop counts
pub fn load_monthly_sales(path: &Path, policy: DatePolicy) -> Result<LoadOutcome<SaleRecord>> {
    let df = read_csv(path, &["order_date", "quantity"])?;
    let rows_read = df.height();
    let clean = parse_order_dates(df, path, policy)?;

    let days = clean
        .column("order_date")
        .and_then(|s| s.cast(&DataType::Int32))
        .map_err(|e| schema_mismatch(path, &e))?;
    let quantities = clean
        .column("quantity")
        .and_then(|s| s.cast(&DataType::Int64))
        .map_err(|e| schema_mismatch(path, &e))?;

    let mut records = Vec::with_capacity(clean.height());
    let mut incomplete = 0usize;
    for (day, qty) in days
        .i32()
        .map_err(|e| schema_mismatch(path, &e))?
        .into_iter()
        .zip(quantities.i64().map_err(|e| schema_mismatch(path, &e))?)
    {
        match (day.and_then(date_from_days), qty) {
            (Some(order_date), Some(quantity)) => records.push(SaleRecord {
                order_date,
                quantity,
            }),
            _ => incomplete += 1,
        }
    }

    Ok(LoadOutcome {
        rows_dropped: rows_read - clean.height() + incomplete,
        rows_read,
        records,
    })
}

/// Load the orders CSV for the segmentation pipeline.
///
/// Requires `order_id`, `order_date`, `pizza_category` and `total_price`
/// columns. Dates are day-first; unparseable ones are handled per `policy`.
///
/// # Arguments
/// * `path` - Path to the CSV file
/// * `policy` - Whether bad dates drop rows or fail the load
///
/// # Returns
/// * `LoadOutcome<OrderRecord>` with cleaned rows and drop counts
pub fn load_category_orders(path: &Path, policy: DatePolicy) -> Result<LoadOutcome<OrderRecord>> {
    let df = read_csv(
        path,
        &["order_id", "order_date", "pizza_category", "total_price"],
    )?;
    let rows_read = df.height();
    let clean = parse_order_dates(df, path, policy)?;

    let days = clean
        .column("order_date")
        .and_then(|s| s.cast(&DataType::Int32))
        .map_err(|e| schema_mismatch(path, &e))?;
    let categories = clean
        .column("pizza_category")
        .map_err(|e| schema_mismatch(path, &e))?;
    let prices = clean
        .column("total_price")
        .and_then(|s| s.cast(&DataType::Float64))
        .map_err(|e| schema_mismatch(path, &e))?;

    let mut records = Vec::with_capacity(clean.height());
    let mut incomplete = 0usize;
    for ((day, category), price) in days
        .i32()
        .map_err(|e| schema_mismatch(path, &e))?
        .into_iter()
        .zip(categories.str().map_err(|e| schema_mismatch(path, &e))?)
        .zip(prices.f64().map_err(|e| schema_mismatch(path, &e))?)
    {
        match (day.and_then(date_from_days), category, price) {
            (Some(order_date), Some(category), Some(total_price)) => records.push(OrderRecord {
                order_date,
                category: category.to_string(),
                total_price,
            }),
            _ => incomplete += 1,
        }
    }

    Ok(LoadOutcome {
        rows_dropped: rows_read - clean.height() + incomplete,
        rows_read,
        records,
    })
}

/// Read a CSV into a DataFrame and verify the required columns exist.
fn read_csv(path: &Path, required: &[&str]) -> Result<DataFrame> {
    if !path.is_file() {
        return Err(PipelineError::InputNotFound {
            path: path.to_path_buf(),
        });
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .map_err(|e| schema_mismatch(path, &e))?;

    for column in required {
        if df.column(column).is_err() {
            return Err(PipelineError::SchemaMismatch {
                path: path.to_path_buf(),
                detail: format!("missing required column `{column}`"),
            });
        }
    }

    Ok(df)
}

/// Parse `order_date` as a day-first date, then apply the date policy.
///
/// Parsing is non-strict at the Polars level so failures surface as nulls;
/// the policy then decides whether nulls drop rows or abort the load.
fn parse_order_dates(df: DataFrame, path: &Path, policy: DatePolicy) -> Result<DataFrame> {
    let options = StrptimeOptions {
        format: Some("%d-%m-%Y".into()),
        strict: false,
        ..Default::default()
    };

    let parsed = df
        .lazy()
        .with_columns([col("order_date").str().to_date(options)])
        .collect()
        .map_err(|e| schema_mismatch(path, &e))?;

    let bad_rows = parsed
        .column("order_date")
        .map_err(|e| schema_mismatch(path, &e))?
        .null_count();

    if policy == DatePolicy::Strict && bad_rows > 0 {
        return Err(PipelineError::DateParseFailure {
            column: "order_date".to_string(),
            bad_rows,
        });
    }

    parsed
        .lazy()
        .drop_nulls(Some(vec![col("order_date")]))
        .collect()
        .map_err(|e| schema_mismatch(path, &e))
}

fn schema_mismatch(path: &Path, e: &PolarsError) -> PipelineError {
    PipelineError::SchemaMismatch {
        path: path.to_path_buf(),
        detail: e.to_string(),
    }
}

fn date_from_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(EPOCH_CE_DAYS + days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_sales_csv() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "order_id,order_date,pizza_category,quantity,total_price"
        )
        .unwrap();
        writeln!(file, "1,13-01-2015,Classic,2,24.50").unwrap();
        writeln!(file, "2,14-01-2015,Veggie,1,13.25").unwrap();
        writeln!(file, "3,not-a-date,Classic,3,41.00").unwrap();
        writeln!(file, "4,05-03-2015,Supreme,1,17.50").unwrap();
        writeln!(file, "5,28-02-2015,Veggie,2,26.50").unwrap();
        file
    }

    #[test]
    fn test_load_monthly_sales_lenient_drops_bad_dates() {
        let file = create_sales_csv();
        let outcome = load_monthly_sales(file.path(), DatePolicy::Lenient).unwrap();

        assert_eq!(outcome.rows_read, 5);
        assert_eq!(outcome.rows_dropped, 1);
        assert_eq!(outcome.records.len(), 4);
        assert_eq!(
            outcome.records[0],
            SaleRecord {
                order_date: NaiveDate::from_ymd_opt(2015, 1, 13).unwrap(),
                quantity: 2,
            }
        );
    }

    #[test]
    fn test_load_monthly_sales_strict_rejects_bad_dates() {
        let file = create_sales_csv();
        let err = load_monthly_sales(file.path(), DatePolicy::Strict).unwrap_err();

        assert!(matches!(
            err,
            PipelineError::DateParseFailure { bad_rows: 1, .. }
        ));
    }

    #[test]
    fn test_dates_parse_day_first() {
        let file = create_sales_csv();
        let outcome = load_category_orders(file.path(), DatePolicy::Lenient).unwrap();

        // 05-03-2015 is the 5th of March, not the 3rd of May.
        let supreme = outcome
            .records
            .iter()
            .find(|r| r.category == "Supreme")
            .unwrap();
        assert_eq!(
            supreme.order_date,
            NaiveDate::from_ymd_opt(2015, 3, 5).unwrap()
        );
        assert!((supreme.total_price - 17.50).abs() < 1e-9);
    }

    #[test]
    fn test_missing_column_is_schema_mismatch() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "order_id,order_date,quantity").unwrap();
        writeln!(file, "1,13-01-2015,2").unwrap();

        let err = load_category_orders(file.path(), DatePolicy::Lenient).unwrap_err();
        match err {
            PipelineError::SchemaMismatch { detail, .. } => {
                assert!(detail.contains("pizza_category"))
            }
            other => panic!("expected SchemaMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_file_is_input_not_found() {
        let err = load_monthly_sales(Path::new("no_such_file.csv"), DatePolicy::Lenient)
            .unwrap_err();
        assert!(matches!(err, PipelineError::InputNotFound { .. }));
    }

    #[test]
    fn test_date_from_days_matches_epoch() {
        assert_eq!(
            date_from_days(0),
            Some(NaiveDate::from_ymd_opt(1970, 1, 1).unwrap())
        );
        assert_eq!(
            date_from_days(16_448),
            Some(NaiveDate::from_ymd_opt(2015, 1, 13).unwrap())
        );
    }
}
