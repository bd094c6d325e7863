use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde_json::json;
use uuid::Uuid;

use crate::entities::alert;
use crate::store::{AlertStatus, RiskLevel};

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAlertsParams {
    status: Option<String>,
    risk_level: Option<String>,
    limit: Option<u64>,
}

pub async fn list_alerts(
    Extension(db): Extension<DatabaseConnection>,
    Query(params): Query<ListAlertsParams>,
) -> Response {
    if let Some(status) = &params.status {
        if AlertStatus::parse(status).is_none() {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "status must be ACTIVE, RESOLVED or DISMISSED"})),
            )
                .into_response();
        }
    }
    if let Some(level) = &params.risk_level {
        if RiskLevel::parse(level).is_none() {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "riskLevel must be LOW, MEDIUM or HIGH"})),
            )
                .into_response();
        }
    }

    let mut query = alert::Entity::find()
        .order_by_desc(alert::Column::TriggeredAt)
        .limit(params.limit.unwrap_or(50).min(500));
    if let Some(status) = params.status {
        query = query.filter(alert::Column::Status.eq(status));
    }
    if let Some(level) = params.risk_level {
        query = query.filter(alert::Column::RiskLevel.eq(level));
    }

    match query.all(&db).await {
        Ok(alerts) => (StatusCode::OK, Json(alerts)).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

#[derive(serde::Deserialize)]
pub struct UpdateStatusRequest {
    status: String,
}

/// Manual status transition. The first move to RESOLVED stamps resolved_at;
/// later transitions leave it as the historical record.
pub async fn update_alert_status(
    Extension(db): Extension<DatabaseConnection>,
    Path(alert_id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Response {
    let status = match AlertStatus::parse(&payload.status) {
        Some(s) => s,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "status must be ACTIVE, RESOLVED or DISMISSED"})),
            )
                .into_response()
        }
    };

    let alert = match alert::Entity::find_by_id(alert_id).one(&db).await {
        Ok(Some(a)) => a,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({"error": "Alert not found"})),
            )
                .into_response()
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            )
                .into_response()
        }
    };

    let needs_resolved_at = status == AlertStatus::Resolved && alert.resolved_at.is_none();
    let mut active = alert.into_active_model();
    active.status = Set(status.as_str().to_string());
    if needs_resolved_at {
        active.resolved_at = Set(Some(chrono::Utc::now().naive_utc()));
    }
    active.updated_at = Set(chrono::Utc::now().naive_utc());

    match active.update(&db).await {
        Ok(alert) => (StatusCode::OK, Json(alert)).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

pub async fn resolve_alert(
    Extension(db): Extension<DatabaseConnection>,
    Path(alert_id): Path<Uuid>,
) -> Response {
    let alert = match alert::Entity::find_by_id(alert_id).one(&db).await {
        Ok(Some(a)) => a,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({"error": "Alert not found"})),
            )
                .into_response()
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            )
                .into_response()
        }
    };

    let already_resolved = alert.resolved_at.is_some();
    let mut active = alert.into_active_model();
    active.status = Set(AlertStatus::Resolved.as_str().to_string());
    if !already_resolved {
        active.resolved_at = Set(Some(chrono::Utc::now().naive_utc()));
    }
    active.updated_at = Set(chrono::Utc::now().naive_utc());

    match active.update(&db).await {
        Ok(alert) => (StatusCode::OK, Json(alert)).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}
