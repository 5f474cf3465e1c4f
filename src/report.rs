//! CSV report writers for the forecast and segmentation outputs

use std::fs::File;
use std::path::Path;

use polars::prelude::*;

use crate::error::{PipelineError, Result};
use crate::model::Forecast;
use crate::rfm::RfmRecord;

/// Write the trailing `periods` forecast rows to `path`.
///
/// Columns are `Forecast_Month` (ISO month-end date), the predicted
/// quantity and the lower and upper band bounds. Rows keep the model's
/// chronological order, so the file reads January to December.
pub fn write_forecast(forecast: &Forecast, periods: usize, path: &Path) -> Result<()> {
    let start = forecast.points.len().saturating_sub(periods);
    let tail = &forecast.points[start..];

    let months: Vec<String> = tail
        .iter()
        .map(|p| p.month.format("%Y-%m-%d").to_string())
        .collect();
    let predicted: Vec<f64> = tail.iter().map(|p| p.predicted).collect();
    let lower: Vec<f64> = tail.iter().map(|p| p.lower).collect();
    let upper: Vec<f64> = tail.iter().map(|p| p.upper).collect();

    let mut df = df!(
        "Forecast_Month" => months,
        "Predicted_Sales_Quantity" => predicted,
        "Lower_Bound" => lower,
        "Upper_Bound" => upper,
    )
    .map_err(|e| write_failure(path, &e.to_string()))?;

    write_csv(&mut df, path)?;
    println!("Forecast saved to {}", path.display());
    Ok(())
}

/// Write one scored row per category to `path`.
///
/// Rows arrive already sorted by category name, which keeps repeated runs
/// byte-identical.
pub fn write_segments(records: &[RfmRecord], path: &Path) -> Result<()> {
    let categories: Vec<&str> = records.iter().map(|r| r.category.as_str()).collect();
    let recency: Vec<i64> = records.iter().map(|r| r.recency).collect();
    let frequency: Vec<u32> = records.iter().map(|r| r.frequency).collect();
    let monetary: Vec<f64> = records.iter().map(|r| r.monetary).collect();
    let r_scores: Vec<u32> = records.iter().map(|r| r.r_score).collect();
    let f_scores: Vec<u32> = records.iter().map(|r| r.f_score).collect();
    let m_scores: Vec<u32> = records.iter().map(|r| r.m_score).collect();
    let rfm_scores: Vec<u32> = records.iter().map(|r| r.rfm_score).collect();

    let mut df = df!(
        "Pizza_Category" => categories,
        "Recency" => recency,
        "Frequency" => frequency,
        "Monetary" => monetary,
        "R_Score" => r_scores,
        "F_Score" => f_scores,
        "M_Score" => m_scores,
        "RFM_Score" => rfm_scores,
    )
    .map_err(|e| write_failure(path, &e.to_string()))?;

    write_csv(&mut df, path)?;
    println!("RFM segmentation saved to: {}", path.display());
    Ok(())
}

fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = File::create(path).map_err(|e| write_failure(path, &e.to_string()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .map_err(|e| write_failure(path, &e.to_string()))
}

fn write_failure(path: &Path, reason: &str) -> PipelineError {
    PipelineError::OutputWriteFailure {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ForecastPoint;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn point(date: (i32, u32, u32), predicted: f64) -> ForecastPoint {
        ForecastPoint {
            month: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            predicted,
            lower: predicted - 1.0,
            upper: predicted + 1.0,
        }
    }

    #[test]
    fn test_write_forecast_keeps_trailing_rows() {
        let forecast = Forecast {
            points: vec![
                point((2015, 12, 1), 90.0),
                point((2016, 1, 31), 100.0),
                point((2016, 2, 29), 110.0),
            ],
            horizon: 2,
        };

        let dir = tempdir().unwrap();
        let path = dir.path().join("forecast.csv");
        write_forecast(&forecast, 2, &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(
            lines[0],
            "Forecast_Month,Predicted_Sales_Quantity,Lower_Bound,Upper_Bound"
        );
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("2016-01-31,"));
        assert!(lines[2].starts_with("2016-02-29,"));
    }

    #[test]
    fn test_write_segments_schema() {
        let records = vec![RfmRecord {
            category: "Classic".to_string(),
            recency: 3,
            frequency: 12,
            monetary: 150.5,
            r_score: 4,
            f_score: 3,
            m_score: 2,
            rfm_score: 9,
        }];

        let dir = tempdir().unwrap();
        let path = dir.path().join("segments.csv");
        write_segments(&records, &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(
            lines[0],
            "Pizza_Category,Recency,Frequency,Monetary,R_Score,F_Score,M_Score,RFM_Score"
        );
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("Classic,3,12,150.5,4,3,2,9"));
    }

    #[test]
    fn test_unwritable_path_is_output_failure() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("out.csv");
        let err = write_segments(&[], &path).unwrap_err();
        assert!(matches!(err, PipelineError::OutputWriteFailure { .. }));
    }
}
