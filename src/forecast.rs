use chrono::{Datelike, NaiveDateTime};
use serde::Serialize;

use crate::timeframe;

/// Ordinary least-squares fit of `values` against x = 0..n-1, predicting the
/// next `horizon` points. Predictions are clamped to non-negative whole
/// counts. With no history everything is 0; with a single point the series
/// is treated as flat.
pub fn linear_regression_predict(values: &[u64], horizon: usize) -> Vec<u64> {
    let n = values.len();
    if n == 0 {
        return vec![0; horizon];
    }
    if n == 1 {
        return vec![values[0]; horizon];
    }

    let nf = n as f64;
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_xy = 0.0;
    let mut sum_xx = 0.0;
    for (i, &y) in values.iter().enumerate() {
        let x = i as f64;
        let y = y as f64;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_xx += x * x;
    }

    let denom = nf * sum_xx - sum_x * sum_x;
    let slope = if denom == 0.0 {
        0.0
    } else {
        (nf * sum_xy - sum_x * sum_y) / denom
    };
    let intercept = (sum_y - slope * sum_x) / nf;

    (0..horizon)
        .map(|i| {
            let future_x = (n + i) as f64;
            let predicted = slope * future_x + intercept;
            predicted.round().max(0.0) as u64
        })
        .collect()
}

/// Sample standard deviation (Bessel-corrected). Zero for fewer than two
/// points.
pub fn std_dev(values: &[u64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
    let variance = values
        .iter()
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / (n - 1.0);
    variance.sqrt()
}

/// Symmetric uncertainty band around a prediction. z is fixed at 1.0: a
/// deliberately conservative band, not a 95% confidence interval.
pub fn forecast_bounds(predicted: u64, residual_std: f64) -> (u64, u64) {
    let z = 1.0;
    let lower = (predicted as f64 - z * residual_std).round().max(0.0) as u64;
    let upper = ((predicted as f64 + z * residual_std).round().max(0.0) as u64).max(lower);
    (lower, upper)
}

/// One Monday-aligned 7-day window. `end` is exclusive.
#[derive(Clone, Debug)]
pub struct WeekBucket {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub label: String,
}

/// `weeks` contiguous Monday-aligned buckets, the last one being the week
/// containing `now`.
pub fn week_buckets(now: NaiveDateTime, weeks: usize) -> Vec<WeekBucket> {
    let this_week_start = timeframe::start_of_week_monday(now);
    (0..weeks)
        .map(|idx| {
            let start = timeframe::add_days(this_week_start, -(((weeks - 1 - idx) as i64) * 7));
            let end = timeframe::add_days(start, 7);
            WeekBucket {
                start,
                end,
                label: timeframe::week_label(start),
            }
        })
        .collect()
}

/// Monthly series point for the analytics time series, with predictions
/// appended by `project_monthly`.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyPoint {
    pub date: String,
    pub month: u32,
    pub year: i32,
    pub cases: u64,
    pub is_prediction: bool,
}

/// Monthly linear-trend variant: fit the observed series and project the
/// next `horizon` calendar months.
pub fn project_monthly(series: &[(NaiveDateTime, u64)], horizon: usize) -> Vec<MonthlyPoint> {
    let values: Vec<u64> = series.iter().map(|(_, cases)| *cases).collect();
    let predicted = linear_regression_predict(&values, horizon);

    let last = match series.last() {
        Some((ts, _)) => *ts,
        None => return Vec::new(),
    };

    predicted
        .into_iter()
        .enumerate()
        .map(|(i, cases)| {
            let (mut year, mut month) = (last.year(), last.month());
            for _ in 0..=i {
                if month == 12 {
                    year += 1;
                    month = 1;
                } else {
                    month += 1;
                }
            }
            let (start, _) = timeframe::month_bounds(year, month);
            MonthlyPoint {
                date: start.date().format("%Y-%m-%d").to_string(),
                month,
                year,
                cases,
                is_prediction: true,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn empty_series_predicts_zero() {
        assert_eq!(linear_regression_predict(&[], 4), vec![0, 0, 0, 0]);
        assert_eq!(std_dev(&[]), 0.0);
        assert_eq!(forecast_bounds(0, 0.0), (0, 0));
    }

    #[test]
    fn single_point_predicts_flat() {
        assert_eq!(linear_regression_predict(&[7], 4), vec![7, 7, 7, 7]);
        assert_eq!(std_dev(&[7]), 0.0);
        assert_eq!(forecast_bounds(7, 0.0), (7, 7));
    }

    #[test]
    fn perfect_linear_trend_extrapolates() {
        let series = [10, 20, 30];
        assert_eq!(linear_regression_predict(&series, 4), vec![40, 50, 60, 70]);

        // Bessel-corrected sample stddev of 10/20/30 is exactly 10.
        let sd = std_dev(&series);
        assert!((sd - 10.0).abs() < 1e-9);
        assert_eq!(forecast_bounds(40, sd), (30, 50));
    }

    #[test]
    fn declining_trend_clamps_at_zero() {
        let series = [9, 6, 3];
        assert_eq!(linear_regression_predict(&series, 3), vec![0, 0, 0]);
    }

    #[test]
    fn bounds_keep_upper_at_or_above_lower() {
        // Prediction already at zero with a wide band: lower clamps to 0 and
        // upper stays above it.
        let (lower, upper) = forecast_bounds(1, 5.0);
        assert_eq!(lower, 0);
        assert_eq!(upper, 6);
    }

    #[test]
    fn week_buckets_are_contiguous_and_monday_aligned() {
        let now = NaiveDate::from_ymd_opt(2026, 9, 2)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        let buckets = week_buckets(now, 12);
        assert_eq!(buckets.len(), 12);

        // Last bucket is the week of `now`, starting Monday 2026-08-31.
        let last = buckets.last().unwrap();
        assert_eq!(
            last.start.date(),
            NaiveDate::from_ymd_opt(2026, 8, 31).unwrap()
        );
        assert_eq!(last.label, "Aug 31–Sep 6");

        for pair in buckets.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn monthly_projection_advances_the_calendar() {
        let series = vec![
            (
                NaiveDate::from_ymd_opt(2026, 10, 1)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap(),
                10,
            ),
            (
                NaiveDate::from_ymd_opt(2026, 11, 1)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap(),
                20,
            ),
            (
                NaiveDate::from_ymd_opt(2026, 12, 1)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap(),
                30,
            ),
        ];
        let projected = project_monthly(&series, 3);
        assert_eq!(projected.len(), 3);
        assert_eq!(projected[0].cases, 40);
        assert_eq!((projected[0].year, projected[0].month), (2027, 1));
        assert_eq!((projected[2].year, projected[2].month), (2027, 3));
        assert!(projected.iter().all(|p| p.is_prediction));
    }
}
