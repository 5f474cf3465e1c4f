//! Chart rendering using Plotters for the two pipelines

use std::path::Path;

use plotters::prelude::*;

use crate::error::{PipelineError, Result};
use crate::model::Forecast;
use crate::rfm::RfmRecord;
use crate::series::MonthlySeries;

/// Color palette for category bars
const CATEGORY_COLORS: [RGBColor; 5] = [RED, BLUE, GREEN, YELLOW, MAGENTA];

/// Render the history, the projected months and their uncertainty band.
///
/// # Arguments
/// * `series` - The monthly history the model was fitted on
/// * `forecast` - Model output whose trailing rows are the projection
/// * `output_path` - Path to save the PNG plot
///
/// # Returns
/// * Result indicating success or failure
pub fn plot_forecast(series: &MonthlySeries, forecast: &Forecast, output_path: &Path) -> Result<()> {
    render_forecast(series, forecast, output_path).map_err(|e| {
        PipelineError::OutputWriteFailure {
            path: output_path.to_path_buf(),
            reason: e.to_string(),
        }
    })?;
    println!("Forecast chart saved to: {}", output_path.display());
    Ok(())
}

/// Render one bar per category showing its combined RFM score.
///
/// # Arguments
/// * `records` - Scored categories in their output order
/// * `output_path` - Path to save the PNG plot
///
/// # Returns
/// * Result indicating success or failure
pub fn plot_segment_scores(records: &[RfmRecord], output_path: &Path) -> Result<()> {
    render_segment_scores(records, output_path).map_err(|e| {
        PipelineError::OutputWriteFailure {
            path: output_path.to_path_buf(),
            reason: e.to_string(),
        }
    })?;
    println!("Segment score chart saved to: {}", output_path.display());
    Ok(())
}

fn render_forecast(
    series: &MonthlySeries,
    forecast: &Forecast,
    output_path: &Path,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    if series.is_empty() || forecast.points.is_empty() {
        return Err("nothing to plot".into());
    }

    let split = forecast.points.len() - forecast.horizon;
    let future = &forecast.points[split..];

    // One x slot per month, history first.
    let months: Vec<String> = series
        .iter()
        .map(|p| p.month.format("%Y-%m").to_string())
        .chain(future.iter().map(|p| p.month.format("%Y-%m").to_string()))
        .collect();
    let total = months.len();

    // Plot bounds padded around both the history and the band.
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for point in series {
        y_min = y_min.min(point.quantity);
        y_max = y_max.max(point.quantity);
    }
    for point in future {
        y_min = y_min.min(point.lower);
        y_max = y_max.max(point.upper);
    }
    let pad = ((y_max - y_min) * 0.1).max(1.0);

    let root = BitMapBackend::new(output_path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Monthly Sales Forecast", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5f64..(total as f64 - 0.5), (y_min - pad)..(y_max + pad))?;

    let label_for = |x: &f64| -> String {
        let index = x.round();
        if index < 0.0 {
            return String::new();
        }
        months.get(index as usize).cloned().unwrap_or_default()
    };

    chart
        .configure_mesh()
        .x_desc("Month")
        .y_desc("Sales Quantity")
        .axis_desc_style(("sans-serif", 15))
        .x_labels(12)
        .x_label_formatter(&label_for)
        .draw()?;

    // Uncertainty band under the forecast line.
    let band: Vec<(f64, f64)> = future
        .iter()
        .enumerate()
        .map(|(k, p)| ((split + k) as f64, p.upper))
        .chain(
            future
                .iter()
                .enumerate()
                .rev()
                .map(|(k, p)| ((split + k) as f64, p.lower)),
        )
        .collect();
    chart.draw_series(std::iter::once(Polygon::new(band, RED.mix(0.15))))?;

    chart
        .draw_series(LineSeries::new(
            series
                .iter()
                .enumerate()
                .map(|(i, p)| (i as f64, p.quantity)),
            &BLUE,
        ))?
        .label("History")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

    chart.draw_series(
        series
            .iter()
            .enumerate()
            .map(|(i, p)| Circle::new((i as f64, p.quantity), 3, BLUE.filled())),
    )?;

    // Bridge the last history month so the forecast line connects.
    let bridge = ((split - 1) as f64, series[series.len() - 1].quantity);
    chart
        .draw_series(LineSeries::new(
            std::iter::once(bridge).chain(
                future
                    .iter()
                    .enumerate()
                    .map(|(k, p)| ((split + k) as f64, p.predicted)),
            ),
            &RED,
        ))?
        .label("Forecast")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));

    chart.configure_series_labels().draw()?;

    root.present()?;
    Ok(())
}

fn render_segment_scores(
    records: &[RfmRecord],
    output_path: &Path,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    if records.is_empty() {
        return Err("nothing to plot".into());
    }

    let max_score = records.iter().map(|r| r.rfm_score).max().unwrap_or(12) as f64;

    let root = BitMapBackend::new(output_path, (600, 400)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Pizza Category RFM Scores", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(
            -0.5f64..(records.len() as f64 - 0.5),
            0f64..(max_score * 1.1),
        )?;

    let label_for = |x: &f64| -> String {
        let index = x.round();
        if index < 0.0 {
            return String::new();
        }
        records
            .get(index as usize)
            .map(|r| r.category.clone())
            .unwrap_or_default()
    };

    chart
        .configure_mesh()
        .x_desc("Category")
        .y_desc("RFM Score")
        .axis_desc_style(("sans-serif", 15))
        .x_labels(records.len())
        .x_label_formatter(&label_for)
        .draw()?;

    for (i, record) in records.iter().enumerate() {
        let color = CATEGORY_COLORS[i % CATEGORY_COLORS.len()];
        chart.draw_series(std::iter::once(Rectangle::new(
            [
                (i as f64 - 0.4, 0.0),
                (i as f64 + 0.4, record.rfm_score as f64),
            ],
            color.filled(),
        )))?;
    }

    root.present()?;
    Ok(())
}
