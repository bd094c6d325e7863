use chrono::{DateTime, Datelike, Duration, NaiveDateTime, Utc};
use sea_orm::DbErr;
use serde::Serialize;
use uuid::Uuid;

use crate::forecast;
use crate::risk_rank::{self, BarangayRisk, PublicRiskLevel};
use crate::store::SurveillanceStore;
use crate::timeframe;

pub const DEFAULT_WEEKS: u32 = 12;
const FORECAST_HORIZON_WEEKS: usize = 4;
const TOP_REGIONS: usize = 6;
const ALERT_FEED_LIMIT: u64 = 5;

/// Requested history length, clamped to something the regression can
/// reasonably work with.
pub fn clamp_weeks(requested: Option<u32>) -> usize {
    requested.unwrap_or(DEFAULT_WEEKS).clamp(4, 52) as usize
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryMeta {
    pub last_updated: String,
    pub system_active: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    pub active_cases: u64,
    pub total_cases_this_month: u64,
    pub forecast_next_week: u64,
    pub critical_regions: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyTrend {
    pub week: String,
    pub cases: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastWeek {
    pub week: String,
    pub cases: u64,
    pub lower: u64,
    pub upper: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertBarangayView {
    pub id: Uuid,
    pub name: String,
    pub municipality: String,
    pub province: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveAlertView {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    pub risk_level: String,
    pub status: String,
    pub triggered_at: NaiveDateTime,
    pub barangay: Option<AlertBarangayView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastSummary {
    pub meta: SummaryMeta,
    pub stats: SummaryStats,
    pub weekly_trends: Vec<WeeklyTrend>,
    pub forecast_next4_weeks: Vec<ForecastWeek>,
    pub regional_risk_assessment: Vec<BarangayRisk>,
    pub active_alerts: Vec<ActiveAlertView>,
}

/// Read-only aggregation behind the public forecast endpoint: weekly
/// history, a 4-week projection with bounds, the regional risk ranking and
/// the latest active alerts. Data-access errors propagate to the caller.
pub async fn forecast_summary<S: SurveillanceStore>(
    store: &S,
    weeks_requested: Option<u32>,
    now: NaiveDateTime,
) -> Result<ForecastSummary, DbErr> {
    let weeks = clamp_weeks(weeks_requested);

    let buckets = forecast::week_buckets(now, weeks);
    let mut weekly_cases = Vec::with_capacity(buckets.len());
    for bucket in &buckets {
        let count = store
            .count_cases(None, bucket.start, bucket.end - Duration::seconds(1))
            .await?;
        weekly_cases.push(count);
    }

    let predictions = forecast::linear_regression_predict(&weekly_cases, FORECAST_HORIZON_WEEKS);
    let residual_std = forecast::std_dev(&weekly_cases);

    let this_week_start = timeframe::start_of_week_monday(now);
    let forecast_start = timeframe::add_days(this_week_start, 7);
    let forecast_next4_weeks: Vec<ForecastWeek> = predictions
        .iter()
        .enumerate()
        .map(|(i, &cases)| {
            let start = timeframe::add_days(forecast_start, i as i64 * 7);
            let (lower, upper) = forecast::forecast_bounds(cases, residual_std);
            ForecastWeek {
                week: timeframe::week_label(start),
                cases,
                lower,
                upper,
            }
        })
        .collect();

    let (month_start, _) = timeframe::month_bounds(now.year(), now.month());
    let seven_days_ago = now - Duration::days(7);
    let active_cases = store.count_cases(None, seven_days_ago, now).await?;
    let total_cases_this_month = store.count_cases(None, month_start, now).await?;

    let ranked = risk_rank::regional_risk_assessment(store, now).await?;
    let critical_regions = ranked
        .iter()
        .filter(|r| {
            r.risk_level == PublicRiskLevel::Critical || r.risk_level == PublicRiskLevel::High
        })
        .count();
    let mut regional_risk_assessment = ranked;
    regional_risk_assessment.truncate(TOP_REGIONS);

    let active_alerts = store
        .recent_active_alerts(ALERT_FEED_LIMIT)
        .await?
        .into_iter()
        .map(|(alert, barangay)| ActiveAlertView {
            id: alert.id,
            title: alert.title,
            message: alert.message,
            risk_level: alert.risk_level,
            status: alert.status,
            triggered_at: alert.triggered_at,
            barangay: barangay.map(|b| AlertBarangayView {
                id: b.id,
                name: b.name,
                municipality: b.municipality,
                province: b.province,
            }),
        })
        .collect();

    let last_updated = store.last_activity_at().await?.unwrap_or(now);

    Ok(ForecastSummary {
        meta: SummaryMeta {
            last_updated: DateTime::<Utc>::from_naive_utc_and_offset(last_updated, Utc)
                .to_rfc3339(),
            system_active: true,
        },
        stats: SummaryStats {
            active_cases,
            total_cases_this_month,
            forecast_next_week: forecast_next4_weeks.first().map(|f| f.cases).unwrap_or(0),
            critical_regions,
        },
        weekly_trends: buckets
            .iter()
            .zip(weekly_cases.iter())
            .map(|(bucket, &cases)| WeeklyTrend {
                week: bucket.label.clone(),
                cases,
            })
            .collect(),
        forecast_next4_weeks,
        regional_risk_assessment,
        active_alerts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn dt(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn empty_store_yields_flat_zero_forecast() {
        let store = Arc::new(MemoryStore::new());
        let summary = forecast_summary(store.as_ref(), None, dt(2026, 8, 31))
            .await
            .unwrap();

        assert_eq!(summary.weekly_trends.len(), 12);
        assert_eq!(summary.forecast_next4_weeks.len(), 4);
        for week in &summary.forecast_next4_weeks {
            assert_eq!((week.cases, week.lower, week.upper), (0, 0, 0));
        }
        assert_eq!(summary.stats.active_cases, 0);
        assert_eq!(summary.stats.forecast_next_week, 0);
        assert_eq!(summary.stats.critical_regions, 0);
        assert!(summary.meta.system_active);
    }

    #[tokio::test]
    async fn rising_weeks_project_forward() {
        let store = Arc::new(MemoryStore::new());
        let barangay = store.add_barangay("Centro");
        // now is Monday 2026-08-31; weekly buckets at weeks=4 cover the
        // Mondays of Aug 10, 17, 24 and 31.
        store.add_cases(barangay, dt(2026, 8, 18), 10);
        store.add_cases(barangay, dt(2026, 8, 25), 20);
        store.add_cases(barangay, dt(2026, 8, 31), 30);

        let now = dt(2026, 8, 31);
        let summary = forecast_summary(store.as_ref(), Some(4), now).await.unwrap();

        let weekly: Vec<u64> = summary.weekly_trends.iter().map(|w| w.cases).collect();
        assert_eq!(weekly, vec![0, 10, 20, 30]);
        // Slope 10 through (0,0): next week predicts 40.
        assert_eq!(summary.forecast_next4_weeks[0].cases, 40);
        assert_eq!(summary.stats.forecast_next_week, 40);
        assert_eq!(summary.forecast_next4_weeks[3].cases, 70);
        // First forecast week starts the Monday after `now`.
        assert_eq!(summary.forecast_next4_weeks[0].week, "Sep 7–Sep 13");

        assert_eq!(summary.stats.total_cases_this_month, 60);
        assert_eq!(summary.stats.active_cases, 50);
        // 60 cases in the 30-day window pushes the score past 40.
        assert_eq!(summary.stats.critical_regions, 1);
        assert_eq!(summary.regional_risk_assessment.len(), 1);
    }

    #[tokio::test]
    async fn weeks_parameter_is_clamped() {
        assert_eq!(clamp_weeks(Some(1)), 4);
        assert_eq!(clamp_weeks(Some(99)), 52);
        assert_eq!(clamp_weeks(None), 12);

        let store = Arc::new(MemoryStore::new());
        let summary = forecast_summary(store.as_ref(), Some(1), dt(2026, 8, 31))
            .await
            .unwrap();
        assert_eq!(summary.weekly_trends.len(), 4);
    }
}
