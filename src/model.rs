//! Additive trend plus seasonality forecasting model

use chrono::{Datelike, NaiveDate};
use linfa::prelude::*;
use linfa_linear::LinearRegression;
use ndarray::{Array1, Array2};

use crate::error::{PipelineError, Result};
use crate::series::{add_months, month_end, month_index, MonthlySeries};

/// Months of history span required before monthly seasonality is estimated.
const SEASONALITY_MIN_SPAN: i64 = 24;
/// Distinct months required to fit a trend at all.
const MIN_POINTS: usize = 2;

/// One forecast row with its uncertainty band.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastPoint {
    /// History rows keep their first-of-month date; projected rows carry
    /// the month-end date they describe.
    pub month: NaiveDate,
    pub predicted: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Model output: fitted history rows followed by projected rows.
#[derive(Debug, Clone)]
pub struct Forecast {
    pub points: Vec<ForecastPoint>,
    /// Number of trailing points that are projections.
    pub horizon: usize,
}

/// Common interface for monthly demand models.
pub trait Forecaster {
    /// Learn model parameters from a chronologically ordered series.
    fn fit(&mut self, series: &MonthlySeries) -> Result<()>;

    /// Produce fitted history plus `periods` projected months.
    fn forecast(&self, periods: usize) -> Result<Forecast>;

    fn is_fitted(&self) -> bool;
}

/// Additive demand model.
///
/// A linear trend is fitted over a continuous month index (so gaps in the
/// history do not compress time), a per-calendar-month offset is added once
/// the history spans two full years, and the residual spread provides the
/// uncertainty band, widened by the square root of the forecast step.
#[derive(Debug, Clone)]
pub struct AdditiveModel {
    /// Confidence level for the uncertainty band, e.g. 0.80.
    pub confidence: f64,
    /// Trend value at the first history month.
    pub intercept: f64,
    /// Trend increment per month.
    pub slope: f64,
    /// Additive offset per calendar month, January first. All zero while
    /// seasonality is disabled.
    pub seasonal: [f64; 12],
    /// Whether the history spanned enough months to estimate seasonality.
    pub seasonal_enabled: bool,
    /// Residual standard deviation about the fitted values.
    pub sigma: f64,
    base_index: i64,
    history: MonthlySeries,
    fitted: bool,
}

impl AdditiveModel {
    /// Create an unfitted model with the given confidence level.
    pub fn new(confidence: f64) -> Self {
        AdditiveModel {
            confidence,
            intercept: 0.0,
            slope: 0.0,
            seasonal: [0.0; 12],
            seasonal_enabled: false,
            sigma: 0.0,
            base_index: 0,
            history: Vec::new(),
            fitted: false,
        }
    }

    fn predict_at(&self, index: i64, month0: usize) -> f64 {
        self.intercept + self.slope * (index - self.base_index) as f64 + self.seasonal[month0]
    }
}

impl Forecaster for AdditiveModel {
    fn fit(&mut self, series: &MonthlySeries) -> Result<()> {
        let indices: Vec<i64> = series.iter().map(|p| month_index(p.month)).collect();
        let mut distinct = indices.clone();
        distinct.dedup();
        if distinct.len() < MIN_POINTS {
            return Err(PipelineError::InsufficientData {
                required: MIN_POINTS,
                actual: distinct.len(),
            });
        }

        let base = indices[0];
        let t: Vec<f64> = indices.iter().map(|&i| (i - base) as f64).collect();
        let y: Vec<f64> = series.iter().map(|p| p.quantity).collect();

        let (mut intercept, mut slope) = fit_trend(&t, &y)?;

        // Seasonality needs two full years, otherwise a partial year of
        // offsets would leak trend into the seasonal component.
        let span = indices[indices.len() - 1] - base + 1;
        let seasonal_enabled = span >= SEASONALITY_MIN_SPAN;
        let mut seasonal = [0.0f64; 12];
        if seasonal_enabled {
            let mut sums = [0.0f64; 12];
            let mut counts = [0usize; 12];
            for ((point, &ti), &yi) in series.iter().zip(t.iter()).zip(y.iter()) {
                let m = point.month.month0() as usize;
                sums[m] += yi - (intercept + slope * ti);
                counts[m] += 1;
            }
            for m in 0..12 {
                if counts[m] > 0 {
                    seasonal[m] = sums[m] / counts[m] as f64;
                }
            }

            // Centre the offsets so they sum to zero over the year.
            let centre = seasonal.iter().sum::<f64>() / 12.0;
            for offset in seasonal.iter_mut() {
                *offset -= centre;
            }

            // Refit the trend on deseasonalised values.
            let adjusted: Vec<f64> = series
                .iter()
                .zip(y.iter())
                .map(|(point, &yi)| yi - seasonal[point.month.month0() as usize])
                .collect();
            (intercept, slope) = fit_trend(&t, &adjusted)?;
        }

        // Residual spread about the full model drives the band width.
        let residuals: Vec<f64> = series
            .iter()
            .zip(t.iter())
            .zip(y.iter())
            .map(|((point, &ti), &yi)| {
                yi - (intercept + slope * ti + seasonal[point.month.month0() as usize])
            })
            .collect();
        let mean = residuals.iter().sum::<f64>() / residuals.len() as f64;
        let sigma = (residuals.iter().map(|r| (r - mean).powi(2)).sum::<f64>()
            / residuals.len() as f64)
            .sqrt();

        self.intercept = intercept;
        self.slope = slope;
        self.seasonal = seasonal;
        self.seasonal_enabled = seasonal_enabled;
        self.sigma = sigma;
        self.base_index = base;
        self.history = series.clone();
        self.fitted = true;
        Ok(())
    }

    fn forecast(&self, periods: usize) -> Result<Forecast> {
        if !self.fitted {
            return Err(PipelineError::ModelFitFailure {
                reason: "forecast requested before fit".to_string(),
            });
        }

        let z = z_score(self.confidence);
        let mut points = Vec::with_capacity(self.history.len() + periods);

        for point in &self.history {
            let predicted = self.predict_at(month_index(point.month), point.month.month0() as usize);
            points.push(ForecastPoint {
                month: point.month,
                predicted,
                lower: predicted - z * self.sigma,
                upper: predicted + z * self.sigma,
            });
        }

        let last = self.history[self.history.len() - 1].month;
        for step in 1..=periods {
            let month = add_months(last, step as u32);
            let predicted = self.predict_at(month_index(month), month.month0() as usize);
            let spread = z * self.sigma * (step as f64).sqrt();
            points.push(ForecastPoint {
                month: month_end(month),
                predicted,
                lower: predicted - spread,
                upper: predicted + spread,
            });
        }

        Ok(Forecast {
            points,
            horizon: periods,
        })
    }

    fn is_fitted(&self) -> bool {
        self.fitted
    }
}

/// Ordinary least squares of `y` against a single regressor `t`.
fn fit_trend(t: &[f64], y: &[f64]) -> Result<(f64, f64)> {
    let x = Array2::from_shape_vec((t.len(), 1), t.to_vec()).map_err(|e| {
        PipelineError::ModelFitFailure {
            reason: e.to_string(),
        }
    })?;
    let dataset = Dataset::new(x, Array1::from_vec(y.to_vec()));

    let fitted = LinearRegression::new()
        .fit(&dataset)
        .map_err(|e| PipelineError::ModelFitFailure {
            reason: e.to_string(),
        })?;

    Ok((fitted.intercept(), fitted.params()[0]))
}

/// Two-sided z value for the supported confidence levels.
fn z_score(confidence: f64) -> f64 {
    match confidence {
        c if c >= 0.99 => 2.576,
        c if c >= 0.95 => 1.96,
        c if c >= 0.90 => 1.645,
        c if c >= 0.80 => 1.282,
        _ => 1.96,
    }
}
