use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the loading, modelling and reporting stages.
///
/// Every fallible operation in this crate returns one of these kinds, so a
/// caller can match on the failure without parsing message strings.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The input CSV does not exist or could not be opened.
    #[error("input file not found: {}", .path.display())]
    InputNotFound { path: PathBuf },

    /// The input CSV is unreadable or is missing a required column.
    #[error("schema mismatch in {}: {detail}", .path.display())]
    SchemaMismatch { path: PathBuf, detail: String },

    /// Strict date handling rejected rows whose order date failed to parse.
    #[error("{bad_rows} row(s) in column `{column}` are not valid day-first dates")]
    DateParseFailure { column: String, bad_rows: usize },

    /// Not enough usable observations to fit a model or form quartiles.
    #[error("insufficient data: need at least {required} usable points, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// The forecast model could not be fitted or queried.
    #[error("model fit failed: {reason}")]
    ModelFitFailure { reason: String },

    /// An output CSV or chart could not be written.
    #[error("failed to write {}: {reason}", .path.display())]
    OutputWriteFailure { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_offender() {
        let err = PipelineError::InputNotFound {
            path: PathBuf::from("missing.csv"),
        };
        assert_eq!(err.to_string(), "input file not found: missing.csv");

        let err = PipelineError::DateParseFailure {
            column: "order_date".to_string(),
            bad_rows: 3,
        };
        assert!(err.to_string().contains("order_date"));
        assert!(err.to_string().contains('3'));
    }

    #[test]
    fn test_insufficient_data_reports_counts() {
        let err = PipelineError::InsufficientData {
            required: 4,
            actual: 1,
        };
        assert_eq!(
            err.to_string(),
            "insufficient data: need at least 4 usable points, got 1"
        );
    }
}
