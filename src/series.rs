//! Monthly aggregation and calendar-month arithmetic

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::data::SaleRecord;

/// One month of aggregated sales.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyPoint {
    /// First day of the month.
    pub month: NaiveDate,
    /// Total quantity sold in that month.
    pub quantity: f64,
}

/// Chronologically ordered monthly totals.
pub type MonthlySeries = Vec<MonthlyPoint>;

/// Sum quantities per calendar month.
///
/// Months with no sales simply do not appear; the output is sorted
/// chronologically regardless of input order.
pub fn aggregate_monthly(records: &[SaleRecord]) -> MonthlySeries {
    let mut totals: BTreeMap<(i32, u32), i64> = BTreeMap::new();
    for record in records {
        let key = (record.order_date.year(), record.order_date.month());
        *totals.entry(key).or_insert(0) += record.quantity;
    }

    totals
        .into_iter()
        .map(|((year, month), quantity)| MonthlyPoint {
            month: first_of_month(year, month),
            quantity: quantity as f64,
        })
        .collect()
}

/// Continuous month counter (year * 12 + month), so that consecutive
/// calendar months differ by exactly 1 even across year boundaries.
pub fn month_index(date: NaiveDate) -> i64 {
    date.year() as i64 * 12 + (date.month() as i64 - 1)
}

/// First day of the month `n` months after `date`'s month.
pub fn add_months(date: NaiveDate, n: u32) -> NaiveDate {
    let index = month_index(date) + n as i64;
    let year = index.div_euclid(12) as i32;
    let month = (index.rem_euclid(12) + 1) as u32;
    first_of_month(year, month)
}

/// Last day of `date`'s month.
pub fn month_end(date: NaiveDate) -> NaiveDate {
    add_months(date, 1)
        .pred_opt()
        .expect("month start has a predecessor")
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).expect("valid year and month")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sale(date: (i32, u32, u32), quantity: i64) -> SaleRecord {
        SaleRecord {
            order_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            quantity,
        }
    }

    #[test]
    fn test_aggregate_sums_per_month_in_order() {
        // Deliberately out of order, spanning a year boundary.
        let records = vec![
            sale((2015, 12, 3), 5),
            sale((2015, 1, 13), 2),
            sale((2015, 12, 20), 1),
            sale((2015, 1, 2), 4),
            sale((2016, 1, 1), 7),
        ];

        let series = aggregate_monthly(&records);
        assert_eq!(series.len(), 3);
        assert_eq!(series[0].month, NaiveDate::from_ymd_opt(2015, 1, 1).unwrap());
        assert_eq!(series[0].quantity, 6.0);
        assert_eq!(series[1].month, NaiveDate::from_ymd_opt(2015, 12, 1).unwrap());
        assert_eq!(series[1].quantity, 6.0);
        assert_eq!(series[2].month, NaiveDate::from_ymd_opt(2016, 1, 1).unwrap());
        assert_eq!(series[2].quantity, 7.0);
    }

    #[test]
    fn test_aggregate_empty_input() {
        assert!(aggregate_monthly(&[]).is_empty());
    }

    #[test]
    fn test_month_index_is_continuous_across_years() {
        let dec = NaiveDate::from_ymd_opt(2014, 12, 1).unwrap();
        let jan = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap();
        assert_eq!(month_index(jan) - month_index(dec), 1);
    }

    #[test]
    fn test_add_months_rolls_over_year() {
        let nov = NaiveDate::from_ymd_opt(2015, 11, 1).unwrap();
        assert_eq!(
            add_months(nov, 3),
            NaiveDate::from_ymd_opt(2016, 2, 1).unwrap()
        );
    }

    #[test]
    fn test_month_end_handles_leap_years() {
        let feb16 = NaiveDate::from_ymd_opt(2016, 2, 1).unwrap();
        assert_eq!(
            month_end(feb16),
            NaiveDate::from_ymd_opt(2016, 2, 29).unwrap()
        );
        let jan = NaiveDate::from_ymd_opt(2016, 1, 15).unwrap();
        assert_eq!(
            month_end(jan),
            NaiveDate::from_ymd_opt(2016, 1, 31).unwrap()
        );
    }
}
