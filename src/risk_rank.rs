use chrono::{Duration, NaiveDateTime};
use sea_orm::DbErr;
use serde::Serialize;
use uuid::Uuid;

use crate::store::{RiskLevel, SurveillanceStore};
use crate::timeframe;

/// Display-only scale for the public dashboard. Computed from a 30-day
/// rolling window, independent of the three-tier scale persisted on alerts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PublicRiskLevel {
    Low,
    Moderate,
    High,
    Critical,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

/// Weighted composite used by both ranking variants: cases count double,
/// active alerts five-fold.
pub fn risk_score(cases: u64, reports: u64, active_alerts: u64) -> u64 {
    cases * 2 + reports + active_alerts * 5
}

pub fn classify_public_risk(
    active_alerts: u64,
    most_recent_alert_is_high: bool,
    risk_score: u64,
) -> PublicRiskLevel {
    if active_alerts > 0 && most_recent_alert_is_high {
        PublicRiskLevel::Critical
    } else if active_alerts > 0 || risk_score >= 40 {
        PublicRiskLevel::High
    } else if risk_score >= 15 {
        PublicRiskLevel::Moderate
    } else {
        PublicRiskLevel::Low
    }
}

/// Week-over-week case movement for a barangay.
pub fn classify_trend(this_week: u64, previous_week: u64) -> Trend {
    if this_week > previous_week {
        Trend::Increasing
    } else if this_week < previous_week {
        Trend::Decreasing
    } else {
        Trend::Stable
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BarangayRisk {
    pub id: Uuid,
    pub name: String,
    pub municipality: String,
    pub province: String,
    pub cases_reported: u64,
    pub risk_score: u64,
    pub risk_level: PublicRiskLevel,
    pub trend: Trend,
}

/// Scores every barangay over the trailing 30 days and returns the full
/// list sorted by risk score, highest first. Callers truncate for display.
pub async fn regional_risk_assessment<S: SurveillanceStore>(
    store: &S,
    now: NaiveDateTime,
) -> Result<Vec<BarangayRisk>, DbErr> {
    let window_start = now - Duration::days(30);

    let week_start = timeframe::start_of_week_monday(now);
    let week_end = timeframe::add_days(week_start, 7) - Duration::seconds(1);
    let prev_week_start = timeframe::add_days(week_start, -7);
    let prev_week_end = week_start - Duration::seconds(1);

    let mut ranked = Vec::new();
    for barangay in store.list_barangays().await? {
        let cases_30 = store
            .count_cases(Some(barangay.id), window_start, now)
            .await?;
        let reports_30 = store
            .count_qualifying_reports(Some(barangay.id), window_start, now)
            .await?;
        let active_alerts = store.count_active_alerts(Some(barangay.id)).await?;
        let score = risk_score(cases_30, reports_30, active_alerts);

        let this_week = store
            .count_cases(Some(barangay.id), week_start, week_end)
            .await?;
        let previous_week = store
            .count_cases(Some(barangay.id), prev_week_start, prev_week_end)
            .await?;

        let most_recent_is_high = store
            .most_recent_active_alert(barangay.id)
            .await?
            .map(|a| a.risk_level == RiskLevel::High.as_str())
            .unwrap_or(false);

        ranked.push(BarangayRisk {
            id: barangay.id,
            name: barangay.name,
            municipality: barangay.municipality,
            province: barangay.province,
            cases_reported: cases_30,
            risk_score: score,
            risk_level: classify_public_risk(active_alerts, most_recent_is_high, score),
            trend: classify_trend(this_week, previous_week),
        });
    }

    ranked.sort_by(|a, b| b.risk_score.cmp(&a.risk_score));
    Ok(ranked)
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BarangayRanking {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub municipality: String,
    pub province: String,
    pub case_count: u64,
    pub report_count: u64,
    pub active_alerts: u64,
    pub risk_score: u64,
}

/// Calendar-year ranking used by the authenticated dashboard. Unlike the
/// 30-day assessment it counts all environmental reports, not just
/// qualifying ones.
pub async fn barangay_rankings<S: SurveillanceStore>(
    store: &S,
    year: i32,
    limit: usize,
) -> Result<Vec<BarangayRanking>, DbErr> {
    let (year_start, _) = timeframe::month_bounds(year, 1);
    let (_, year_end) = timeframe::month_bounds(year, 12);

    let mut rankings = Vec::new();
    for barangay in store.list_barangays().await? {
        let case_count = store
            .count_cases(Some(barangay.id), year_start, year_end)
            .await?;
        let report_count = store
            .count_reports(Some(barangay.id), year_start, year_end)
            .await?;
        let active_alerts = store.count_active_alerts(Some(barangay.id)).await?;

        rankings.push(BarangayRanking {
            id: barangay.id,
            name: barangay.name,
            code: barangay.code,
            municipality: barangay.municipality,
            province: barangay.province,
            case_count,
            report_count,
            active_alerts,
            risk_score: risk_score(case_count, report_count, active_alerts),
        });
    }

    rankings.sort_by(|a, b| b.risk_score.cmp(&a.risk_score));
    rankings.truncate(limit);
    Ok(rankings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::store::{NewAlert, RiskLevel};
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn dt(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn weighted_score() {
        assert_eq!(risk_score(20, 5, 2), 55);
        assert_eq!(risk_score(0, 0, 0), 0);
    }

    #[test]
    fn score_alone_can_reach_high() {
        // No active alert at all, but score >= 40.
        assert_eq!(
            classify_public_risk(0, false, 55),
            PublicRiskLevel::High
        );
    }

    #[test]
    fn four_tier_classification() {
        assert_eq!(classify_public_risk(1, true, 0), PublicRiskLevel::Critical);
        assert_eq!(classify_public_risk(1, false, 0), PublicRiskLevel::High);
        assert_eq!(classify_public_risk(0, false, 40), PublicRiskLevel::High);
        assert_eq!(classify_public_risk(0, false, 15), PublicRiskLevel::Moderate);
        assert_eq!(classify_public_risk(0, false, 14), PublicRiskLevel::Low);
    }

    #[test]
    fn trend_compares_weeks() {
        assert_eq!(classify_trend(3, 1), Trend::Increasing);
        assert_eq!(classify_trend(1, 3), Trend::Decreasing);
        assert_eq!(classify_trend(2, 2), Trend::Stable);
    }

    #[tokio::test]
    async fn assessment_ranks_by_score_and_flags_critical() {
        let store = Arc::new(MemoryStore::new());
        let quiet = store.add_barangay("Quiet");
        let busy = store.add_barangay("Busy");
        let now = dt(2026, 8, 31);

        // Busy: 10 cases in the window, this week heavier than last.
        store.add_cases(busy, dt(2026, 8, 20), 7);
        store.add_cases(busy, dt(2026, 8, 31), 3);
        store
            .create_alert(NewAlert {
                barangay_id: busy,
                title: "Early Warning Alert - Busy".into(),
                message: "test".into(),
                risk_level: RiskLevel::High,
                metadata: serde_json::json!({}),
            })
            .await
            .unwrap();

        store.add_cases(quiet, dt(2026, 8, 25), 1);

        let ranked = regional_risk_assessment(store.as_ref(), now).await.unwrap();
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].name, "Busy");
        // 10 cases * 2 + 0 reports + 1 alert * 5
        assert_eq!(ranked[0].risk_score, 25);
        assert_eq!(ranked[0].risk_level, PublicRiskLevel::Critical);
        assert_eq!(ranked[0].trend, Trend::Increasing);
        assert_eq!(ranked[1].risk_level, PublicRiskLevel::Low);
    }

    #[tokio::test]
    async fn year_ranking_counts_all_reports() {
        let store = Arc::new(MemoryStore::new());
        let barangay = store.add_barangay("Riverside");
        store.add_cases(barangay, dt(2026, 3, 1), 4);
        // Non-qualifying reports still count in the year-scoped variant.
        store.add_reports(barangay, dt(2026, 4, 1), false, 3);
        store.add_reports(barangay, dt(2026, 5, 1), true, 2);
        // Outside the requested year.
        store.add_cases(barangay, dt(2025, 12, 31), 9);

        let rankings = barangay_rankings(store.as_ref(), 2026, 10).await.unwrap();
        assert_eq!(rankings.len(), 1);
        assert_eq!(rankings[0].case_count, 4);
        assert_eq!(rankings[0].report_count, 5);
        assert_eq!(rankings[0].risk_score, 4 * 2 + 5);
    }
}
