use std::sync::Arc;

use chrono::{Datelike, NaiveDateTime, Utc};
use sea_orm::DbErr;
use serde_json::json;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::store::{AlertUpdate, NewAlert, RiskLevel, SurveillanceStore};
use crate::timeframe;

// Thresholds for early warning
const CASE_INCREASE_PERCENTAGE_THRESHOLD: f64 = 50.0;
const ENVIRONMENTAL_RISK_COUNT_THRESHOLD: u64 = 5;
const CASE_COUNT_HIGH_THRESHOLD: u64 = 10;

/// Rainy season months in the Philippines (June to November).
pub fn is_rainy_season(month: u32) -> bool {
    (6..=11).contains(&month)
}

/// Percentage increase between two counts. Going from zero to anything is
/// treated as a 100% increase; staying at zero is 0%.
pub fn percent_increase(current: u64, previous: u64) -> f64 {
    if previous == 0 {
        if current > 0 {
            100.0
        } else {
            0.0
        }
    } else {
        (current as f64 - previous as f64) / previous as f64 * 100.0
    }
}

/// Inputs to the risk evaluation for one barangay and month.
#[derive(Clone, Copy, Debug)]
pub struct RiskSignals {
    pub current_month_cases: u64,
    pub previous_month_cases: u64,
    pub increase_percentage: f64,
    pub environmental_risks: u64,
    pub is_rainy: bool,
}

/// Threshold evaluation. HIGH conditions are checked before MEDIUM ones;
/// the first match wins.
pub fn determine_risk_level(signals: &RiskSignals) -> RiskLevel {
    let RiskSignals {
        current_month_cases,
        increase_percentage,
        environmental_risks,
        is_rainy,
        ..
    } = *signals;

    if (current_month_cases >= CASE_COUNT_HIGH_THRESHOLD && is_rainy)
        || (increase_percentage >= CASE_INCREASE_PERCENTAGE_THRESHOLD
            && is_rainy
            && environmental_risks >= ENVIRONMENTAL_RISK_COUNT_THRESHOLD)
        || (current_month_cases >= CASE_COUNT_HIGH_THRESHOLD
            && environmental_risks >= ENVIRONMENTAL_RISK_COUNT_THRESHOLD)
    {
        return RiskLevel::High;
    }

    if (increase_percentage >= CASE_INCREASE_PERCENTAGE_THRESHOLD && is_rainy)
        || (current_month_cases >= 5 && environmental_risks >= 3)
        || (environmental_risks >= ENVIRONMENTAL_RISK_COUNT_THRESHOLD && is_rainy)
    {
        return RiskLevel::Medium;
    }

    RiskLevel::Low
}

/// Runs the early-warning check for a barangay and applies the resulting
/// alert transitions against the injected store.
pub struct EarlyWarningService<S> {
    store: Arc<S>,
}

impl<S: SurveillanceStore> EarlyWarningService<S> {
    pub fn new(store: Arc<S>) -> Self {
        EarlyWarningService { store }
    }

    /// Fire-and-forget entry point. Early warning is best-effort telemetry:
    /// any failure is logged and swallowed so it can never surface to the
    /// case or report submission that triggered it.
    pub async fn run_check(&self, barangay_id: Uuid) {
        if let Err(e) = self.check(barangay_id, Utc::now().naive_utc()).await {
            tracing::error!("Early warning check failed for barangay {}: {}", barangay_id, e);
            metrics::counter!("denguewatch_early_warning_failures_total").increment(1);
        }
    }

    pub async fn check(&self, barangay_id: Uuid, now: NaiveDateTime) -> Result<(), DbErr> {
        let current_year = now.year();
        let current_month = now.month();
        let (previous_year, previous_month) =
            timeframe::previous_month(current_year, current_month);
        let (two_ago_year, two_ago_month) =
            timeframe::previous_month(previous_year, previous_month);

        let (current_start, current_end) = timeframe::month_bounds(current_year, current_month);
        let (prev_start, prev_end) = timeframe::month_bounds(previous_year, previous_month);
        let (two_ago_start, two_ago_end) = timeframe::month_bounds(two_ago_year, two_ago_month);

        let current_month_cases = self
            .store
            .count_cases(Some(barangay_id), current_start, current_end)
            .await?;
        let previous_month_cases = self
            .store
            .count_cases(Some(barangay_id), prev_start, prev_end)
            .await?;
        let two_months_ago_cases = self
            .store
            .count_cases(Some(barangay_id), two_ago_start, two_ago_end)
            .await?;

        let environmental_risks = self
            .store
            .count_qualifying_reports(Some(barangay_id), current_start, current_end)
            .await?;

        let current_increase = percent_increase(current_month_cases, previous_month_cases);
        let previous_increase = percent_increase(previous_month_cases, two_months_ago_cases);
        let is_rainy = is_rainy_season(current_month);

        let signals = RiskSignals {
            current_month_cases,
            previous_month_cases,
            increase_percentage: current_increase,
            environmental_risks,
            is_rainy,
        };
        let risk_level = determine_risk_level(&signals);

        // HIGH always alerts; MEDIUM only on a sustained two-month increase
        // during rainy season.
        let should_alert = risk_level == RiskLevel::High
            || (risk_level == RiskLevel::Medium
                && current_increase >= CASE_INCREASE_PERCENTAGE_THRESHOLD
                && previous_increase >= CASE_INCREASE_PERCENTAGE_THRESHOLD
                && is_rainy);

        if should_alert {
            let message = alert_message(current_month_cases, current_increase, environmental_risks, is_rainy);
            let metadata = json!({
                "currentMonthCases": current_month_cases,
                "previousMonthCases": previous_month_cases,
                "currentIncrease": format!("{:.2}", current_increase),
                "previousIncrease": format!("{:.2}", previous_increase),
                "environmentalRisks": environmental_risks,
                "isRainySeason": is_rainy,
                "month": current_month,
                "year": current_year,
            });

            match self.store.find_active_alert(barangay_id, risk_level).await? {
                None => {
                    let name = self
                        .store
                        .barangay_name(barangay_id)
                        .await?
                        .unwrap_or_else(|| "Barangay".to_string());
                    let created = self
                        .store
                        .create_alert(NewAlert {
                            barangay_id,
                            title: format!("Early Warning Alert - {}", name),
                            message,
                            risk_level,
                            metadata,
                        })
                        .await?;
                    tracing::info!(
                        "Raised {} early warning alert {} for barangay {}",
                        risk_level.as_str(),
                        created.id,
                        barangay_id
                    );
                    metrics::counter!("denguewatch_alerts_raised_total", "risk_level" => risk_level.as_str())
                        .increment(1);
                }
                Some(existing) => {
                    // Title, status and triggered_at stay as they were.
                    self.store
                        .update_alert(
                            existing.id,
                            AlertUpdate {
                                message,
                                risk_level,
                                metadata,
                            },
                        )
                        .await?;
                    tracing::info!(
                        "Refreshed active alert {} for barangay {}",
                        existing.id,
                        barangay_id
                    );
                }
            }
        } else {
            // Conditions fell back to low: resolve any elevated active alerts.
            // LOW-risk active alerts are never created by this path, and are
            // deliberately left untouched here.
            let active = self
                .store
                .active_alerts_by_levels(barangay_id, &[RiskLevel::High, RiskLevel::Medium])
                .await?;
            for alert in active {
                self.store.resolve_alert(alert.id, now).await?;
                tracing::info!("Resolved alert {} for barangay {}", alert.id, barangay_id);
                metrics::counter!("denguewatch_alerts_resolved_total").increment(1);
            }
        }

        Ok(())
    }
}

fn alert_message(cases: u64, increase: f64, environmental_risks: u64, is_rainy: bool) -> String {
    format!(
        "High dengue risk detected. Current month: {} cases ({:.1}% increase). Environmental risks: {}. {}",
        cases,
        increase,
        environmental_risks,
        if is_rainy { "Rainy season active." } else { "" }
    )
}

/// Handle for submitting barangays to the early-warning worker. Cloned into
/// the case and report handlers; sending never blocks and never fails the
/// request.
#[derive(Clone)]
pub struct EarlyWarningQueue {
    tx: mpsc::UnboundedSender<Uuid>,
}

impl EarlyWarningQueue {
    pub fn trigger(&self, barangay_id: Uuid) {
        metrics::counter!("denguewatch_early_warning_triggers_total").increment(1);
        metrics::gauge!("denguewatch_early_warning_queue_depth").increment(1.0);
        if self.tx.send(barangay_id).is_err() {
            tracing::error!(
                "Early warning worker is gone; dropping check for barangay {}",
                barangay_id
            );
        }
    }
}

/// Spawns the background task that drains the trigger channel and runs one
/// check at a time.
pub fn start_early_warning_worker<S: SurveillanceStore + 'static>(
    store: Arc<S>,
) -> EarlyWarningQueue {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let service = EarlyWarningService::new(store);
    tokio::spawn(async move {
        tracing::info!("Early warning worker started");
        while let Some(barangay_id) = rx.recv().await {
            metrics::gauge!("denguewatch_early_warning_queue_depth").decrement(1.0);
            service.run_check(barangay_id).await;
        }
    });
    EarlyWarningQueue { tx }
}
