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

use crate::early_warning::EarlyWarningQueue;
use crate::entities::{barangay, environmental_report};

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportRequest {
    barangay_id: Uuid,
    date_reported: chrono::NaiveDateTime,
    #[serde(default)]
    stagnant_water: bool,
    #[serde(default)]
    poor_waste_disposal: bool,
    #[serde(default)]
    clogged_drainage: bool,
    #[serde(default)]
    housing_congestion: bool,
}

pub async fn create_report(
    Extension(db): Extension<DatabaseConnection>,
    Extension(queue): Extension<EarlyWarningQueue>,
    Json(payload): Json<CreateReportRequest>,
) -> Response {
    match barangay::Entity::find_by_id(payload.barangay_id).one(&db).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({"error": "Barangay not found"})),
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
    }

    let now = chrono::Utc::now().naive_utc();
    let new_report = environmental_report::ActiveModel {
        id: Set(Uuid::new_v4()),
        barangay_id: Set(payload.barangay_id),
        date_reported: Set(payload.date_reported),
        stagnant_water: Set(payload.stagnant_water),
        poor_waste_disposal: Set(payload.poor_waste_disposal),
        clogged_drainage: Set(payload.clogged_drainage),
        housing_congestion: Set(payload.housing_congestion),
        created_at: Set(now),
        updated_at: Set(now),
    };

    match new_report.insert(&db).await {
        Ok(report) => {
            queue.trigger(report.barangay_id);
            (StatusCode::CREATED, Json(report)).into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListReportsParams {
    barangay_id: Option<Uuid>,
    limit: Option<u64>,
}

pub async fn list_reports(
    Extension(db): Extension<DatabaseConnection>,
    Query(params): Query<ListReportsParams>,
) -> Response {
    let mut query = environmental_report::Entity::find()
        .order_by_desc(environmental_report::Column::DateReported)
        .limit(params.limit.unwrap_or(50).min(500));
    if let Some(id) = params.barangay_id {
        query = query.filter(environmental_report::Column::BarangayId.eq(id));
    }

    match query.all(&db).await {
        Ok(reports) => (StatusCode::OK, Json(reports)).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReportRequest {
    date_reported: Option<chrono::NaiveDateTime>,
    stagnant_water: Option<bool>,
    poor_waste_disposal: Option<bool>,
    clogged_drainage: Option<bool>,
    housing_congestion: Option<bool>,
}

pub async fn update_report(
    Extension(db): Extension<DatabaseConnection>,
    Extension(queue): Extension<EarlyWarningQueue>,
    Path(report_id): Path<Uuid>,
    Json(payload): Json<UpdateReportRequest>,
) -> Response {
    let report = match environmental_report::Entity::find_by_id(report_id).one(&db).await {
        Ok(Some(r)) => r,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({"error": "Report not found"})),
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

    let mut active = report.into_active_model();
    if let Some(date_reported) = payload.date_reported {
        active.date_reported = Set(date_reported);
    }
    if let Some(v) = payload.stagnant_water {
        active.stagnant_water = Set(v);
    }
    if let Some(v) = payload.poor_waste_disposal {
        active.poor_waste_disposal = Set(v);
    }
    if let Some(v) = payload.clogged_drainage {
        active.clogged_drainage = Set(v);
    }
    if let Some(v) = payload.housing_congestion {
        active.housing_congestion = Set(v);
    }
    active.updated_at = Set(chrono::Utc::now().naive_utc());

    match active.update(&db).await {
        Ok(report) => {
            queue.trigger(report.barangay_id);
            (StatusCode::OK, Json(report)).into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}
