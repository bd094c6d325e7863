use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Datelike, Utc};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::early_warning::percent_increase;
use crate::entities::{alert, barangay};
use crate::forecast;
use crate::store::{AlertStatus, DbStore, SurveillanceStore};
use crate::summary;
use crate::timeframe;

/// Headline numbers for the public landing page.
pub async fn get_stats(Extension(store): Extension<DbStore>) -> Response {
    let now = Utc::now().naive_utc();
    let (current_start, _) = timeframe::month_bounds(now.year(), now.month());
    let (prev_year, prev_month) = timeframe::previous_month(now.year(), now.month());
    let (prev_start, prev_end) = timeframe::month_bounds(prev_year, prev_month);

    let (all_start, all_end) = timeframe::all_time();
    let result: Result<serde_json::Value, sea_orm::DbErr> = async {
        let total_cases = store.count_cases(None, all_start, all_end).await?;
        let current_month_cases = store.count_cases(None, current_start, now).await?;
        let previous_month_cases = store.count_cases(None, prev_start, prev_end).await?;
        let total_barangays = store.list_barangays().await?.len();
        let active_alerts = store.count_active_alerts(None).await?;
        let total_reports = store.count_reports(None, current_start, now).await?;

        let case_increase = percent_increase(current_month_cases, previous_month_cases);

        Ok(json!({
            "totalCases": total_cases,
            "currentMonthCases": current_month_cases,
            "previousMonthCases": previous_month_cases,
            "caseIncrease": (case_increase * 100.0).round() / 100.0,
            "totalBarangays": total_barangays,
            "activeAlerts": active_alerts,
            "totalReports": total_reports,
        }))
    }
    .await;

    match result {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(e) => {
            error!("Failed to compute public stats: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Failed to compute stats"})),
            )
                .into_response()
        }
    }
}

/// Per-barangay all-time case counts for the public map.
pub async fn get_barangay_case_data(Extension(store): Extension<DbStore>) -> Response {
    let (all_start, all_end) = timeframe::all_time();
    let result: Result<Vec<serde_json::Value>, sea_orm::DbErr> = async {
        let mut data = Vec::new();
        for b in store.list_barangays().await? {
            let case_count = store.count_cases(Some(b.id), all_start, all_end).await?;
            data.push(json!({
                "id": b.id,
                "name": b.name,
                "code": b.code,
                "municipality": b.municipality,
                "province": b.province,
                "caseCount": case_count,
                "population": b.population.unwrap_or(0),
            }));
        }
        Ok(data)
    }
    .await;

    match result {
        Ok(data) => (StatusCode::OK, Json(data)).into_response(),
        Err(e) => {
            error!("Failed to fetch barangay case data: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Failed to fetch barangay data"})),
            )
                .into_response()
        }
    }
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesParams {
    barangay_id: Option<Uuid>,
    months: Option<u32>,
}

/// Monthly case counts, oldest first, with a 3-month linear projection
/// appended once there is enough history to fit a trend.
pub async fn get_time_series(
    Extension(store): Extension<DbStore>,
    Query(params): Query<TimeSeriesParams>,
) -> Response {
    let months = params.months.unwrap_or(12).clamp(1, 60);
    let now = Utc::now().naive_utc();

    let result: Result<serde_json::Value, sea_orm::DbErr> = async {
        let mut series = Vec::new();
        let total_months = now.year() * 12 + now.month() as i32 - 1;
        for i in (0..months as i32).rev() {
            let shifted = total_months - i;
            let (year, month) = (shifted.div_euclid(12), shifted.rem_euclid(12) as u32 + 1);
            let (start, end) = timeframe::month_bounds(year, month);
            let cases = store.count_cases(params.barangay_id, start, end).await?;
            series.push((start, cases));
        }

        let points: Vec<forecast::MonthlyPoint> = series
            .iter()
            .map(|(start, cases)| forecast::MonthlyPoint {
                date: start.date().format("%Y-%m-%d").to_string(),
                month: start.month(),
                year: start.year(),
                cases: *cases,
                is_prediction: false,
            })
            .collect();

        let predictions = if series.len() >= 3 {
            forecast::project_monthly(&series, 3)
        } else {
            Vec::new()
        };

        Ok(json!({
            "timeSeries": points,
            "predictions": predictions,
        }))
    }
    .await;

    match result {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(e) => {
            error!("Failed to build time series: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Failed to build time series"})),
            )
                .into_response()
        }
    }
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicAlertsParams {
    status: Option<String>,
    risk_level: Option<String>,
    limit: Option<u64>,
}

pub async fn get_alerts(
    Extension(db): Extension<DatabaseConnection>,
    Query(params): Query<PublicAlertsParams>,
) -> Response {
    let take = params.limit.unwrap_or(5).clamp(1, 50);
    let status = params
        .status
        .unwrap_or_else(|| AlertStatus::Active.as_str().to_string());

    let mut query = alert::Entity::find()
        .filter(alert::Column::Status.eq(status))
        .order_by_desc(alert::Column::TriggeredAt)
        .limit(take);
    if let Some(level) = params.risk_level {
        query = query.filter(alert::Column::RiskLevel.eq(level));
    }

    match query.find_also_related(barangay::Entity).all(&db).await {
        Ok(rows) => {
            let alerts: Vec<serde_json::Value> = rows
                .into_iter()
                .map(|(a, b)| {
                    json!({
                        "id": a.id,
                        "title": a.title,
                        "message": a.message,
                        "riskLevel": a.risk_level,
                        "status": a.status,
                        "triggeredAt": a.triggered_at,
                        "barangay": b.map(|b| json!({
                            "id": b.id,
                            "name": b.name,
                            "municipality": b.municipality,
                            "province": b.province,
                        })),
                    })
                })
                .collect();
            (StatusCode::OK, Json(alerts)).into_response()
        }
        Err(e) => {
            error!("Failed to fetch public alerts: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Failed to fetch alerts"})),
            )
                .into_response()
        }
    }
}

#[derive(serde::Deserialize)]
pub struct ForecastParams {
    weeks: Option<u32>,
}

pub async fn get_forecast_summary(
    Extension(store): Extension<DbStore>,
    Query(params): Query<ForecastParams>,
) -> Response {
    let now = Utc::now().naive_utc();
    match summary::forecast_summary(&store, params.weeks, now).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => {
            error!("Failed to compute forecast summary: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Failed to compute forecast summary"})),
            )
                .into_response()
        }
    }
}
