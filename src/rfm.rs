//! Per-category recency, frequency and monetary quartile scoring

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::data::OrderRecord;
use crate::error::{PipelineError, Result};

const QUARTILES: usize = 4;

/// One scored pizza category.
#[derive(Debug, Clone, PartialEq)]
pub struct RfmRecord {
    pub category: String,
    /// Days between the category's last order and the day after the
    /// newest order in the whole dataset, so the most recent category
    /// scores 1.
    pub recency: i64,
    /// Number of orders for the category.
    pub frequency: u32,
    /// Total revenue for the category.
    pub monetary: f64,
    pub r_score: u32,
    pub f_score: u32,
    pub m_score: u32,
    /// Sum of the three scores, 3..=12.
    pub rfm_score: u32,
}

/// Compute per-category RFM quartile scores.
///
/// Categories are scored against each other: recency quartiles directly on
/// the day counts (most recent quartile scores 4), frequency and monetary
/// quartiles on first-occurrence ranks so ties cannot collapse the bin
/// edges. When every category shares the same recency, all recency scores
/// are 1 instead of failing.
///
/// # Arguments
/// * `orders` - Cleaned order rows from the segmentation loader
///
/// # Returns
/// * One `RfmRecord` per category, sorted by category name
pub fn calculate_rfm(orders: &[OrderRecord]) -> Result<Vec<RfmRecord>> {
    if orders.is_empty() {
        return Err(PipelineError::InsufficientData {
            required: 1,
            actual: 0,
        });
    }

    // Aggregate last order date, order count and revenue per category.
    // BTreeMap keeps categories in name order, which fixes rank ties.
    let mut groups: BTreeMap<&str, (NaiveDate, u32, f64)> = BTreeMap::new();
    for order in orders {
        let entry = groups
            .entry(order.category.as_str())
            .or_insert((order.order_date, 0, 0.0));
        entry.0 = entry.0.max(order.order_date);
        entry.1 += 1;
        entry.2 += order.total_price;
    }

    let newest = groups
        .values()
        .map(|(last, _, _)| *last)
        .max()
        .unwrap_or(orders[0].order_date);

    let categories: Vec<String> = groups.keys().map(|c| c.to_string()).collect();
    let recencies: Vec<i64> = groups
        .values()
        .map(|(last, _, _)| newest.signed_duration_since(*last).num_days() + 1)
        .collect();
    let frequencies: Vec<u32> = groups.values().map(|(_, count, _)| *count).collect();
    let monetaries: Vec<f64> = groups.values().map(|(_, _, revenue)| *revenue).collect();

    let recency_f: Vec<f64> = recencies.iter().map(|&r| r as f64).collect();
    let frequency_f: Vec<f64> = frequencies.iter().map(|&f| f as f64).collect();

    // A single shared recency cannot be split into quartiles; everyone
    // is equally stale, so everyone scores 1.
    let r_scores = if recency_f.windows(2).all(|w| w[0] == w[1]) {
        vec![1; categories.len()]
    } else {
        quantile_bin(&recency_f, QUARTILES, false)?
    };

    let f_scores = quantile_bin(&rank_first(&frequency_f), QUARTILES, true)?;
    let m_scores = quantile_bin(&rank_first(&monetaries), QUARTILES, true)?;

    Ok(categories
        .into_iter()
        .enumerate()
        .map(|(i, category)| RfmRecord {
            category,
            recency: recencies[i],
            frequency: frequencies[i],
            monetary: monetaries[i],
            r_score: r_scores[i],
            f_score: f_scores[i],
            m_score: m_scores[i],
            rfm_score: r_scores[i] + f_scores[i] + m_scores[i],
        })
        .collect())
}

/// Rank values 1..=n, breaking ties by input position.
pub fn rank_first(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    for (position, &index) in order.iter().enumerate() {
        ranks[index] = (position + 1) as f64;
    }
    ranks
}

/// Assign each value to one of `bins` equal-frequency bins.
///
/// Bin edges are the linearly interpolated quantiles of the values; the
/// intervals are right-closed, with the minimum falling into the first
/// bin. Labels run 1..=bins from the smallest values up when `ascending`,
/// and from the largest values up otherwise.
///
/// Fails with `InsufficientData` when the values are too concentrated to
/// produce distinct edges.
pub fn quantile_bin(values: &[f64], bins: usize, ascending: bool) -> Result<Vec<u32>> {
    if values.is_empty() {
        return Err(PipelineError::InsufficientData {
            required: bins,
            actual: 0,
        });
    }

    let mut sorted: Vec<f64> = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let edges: Vec<f64> = (0..=bins)
        .map(|j| quantile(&sorted, j as f64 / bins as f64))
        .collect();

    if edges.windows(2).any(|w| w[1] <= w[0]) {
        let mut distinct = sorted.clone();
        distinct.dedup();
        return Err(PipelineError::InsufficientData {
            required: bins,
            actual: distinct.len(),
        });
    }

    Ok(values
        .iter()
        .map(|&value| {
            let bin = (1..=bins)
                .find(|&j| value <= edges[j])
                .unwrap_or(bins) as u32;
            if ascending {
                bin
            } else {
                bins as u32 + 1 - bin
            }
        })
        .collect())
}

/// Linearly interpolated quantile of already sorted values.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = (sorted.len() - 1) as f64 * q;
    let below = position.floor() as usize;
    let fraction = position - position.floor();
    if below + 1 < sorted.len() {
        sorted[below] + fraction * (sorted[below + 1] - sorted[below])
    } else {
        sorted[sorted.len() - 1]
    }
}
