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
use crate::entities::{barangay, dengue_case};

const CASE_STATUSES: [&str; 2] = ["SUSPECTED", "CONFIRMED"];

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCaseRequest {
    barangay_id: Uuid,
    date_reported: chrono::NaiveDateTime,
    status: Option<String>,
    source: Option<String>,
}

pub async fn create_case(
    Extension(db): Extension<DatabaseConnection>,
    Extension(queue): Extension<EarlyWarningQueue>,
    Json(payload): Json<CreateCaseRequest>,
) -> Response {
    let status = payload.status.unwrap_or_else(|| "SUSPECTED".to_string());
    if !CASE_STATUSES.contains(&status.as_str()) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "status must be SUSPECTED or CONFIRMED"})),
        )
            .into_response();
    }

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
    let new_case = dengue_case::ActiveModel {
        id: Set(Uuid::new_v4()),
        barangay_id: Set(payload.barangay_id),
        date_reported: Set(payload.date_reported),
        status: Set(status),
        source: Set(payload.source.unwrap_or_else(|| "COMMUNITY".to_string())),
        created_at: Set(now),
        updated_at: Set(now),
    };

    match new_case.insert(&db).await {
        Ok(case) => {
            // Best-effort side effect; never influences the response.
            queue.trigger(case.barangay_id);
            (StatusCode::CREATED, Json(case)).into_response()
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
pub struct ListCasesParams {
    barangay_id: Option<Uuid>,
    limit: Option<u64>,
}

pub async fn list_cases(
    Extension(db): Extension<DatabaseConnection>,
    Query(params): Query<ListCasesParams>,
) -> Response {
    let mut query = dengue_case::Entity::find()
        .order_by_desc(dengue_case::Column::DateReported)
        .limit(params.limit.unwrap_or(50).min(500));
    if let Some(id) = params.barangay_id {
        query = query.filter(dengue_case::Column::BarangayId.eq(id));
    }

    match query.all(&db).await {
        Ok(cases) => (StatusCode::OK, Json(cases)).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCaseRequest {
    date_reported: Option<chrono::NaiveDateTime>,
    status: Option<String>,
    source: Option<String>,
}

pub async fn update_case(
    Extension(db): Extension<DatabaseConnection>,
    Extension(queue): Extension<EarlyWarningQueue>,
    Path(case_id): Path<Uuid>,
    Json(payload): Json<UpdateCaseRequest>,
) -> Response {
    if let Some(status) = &payload.status {
        if !CASE_STATUSES.contains(&status.as_str()) {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "status must be SUSPECTED or CONFIRMED"})),
            )
                .into_response();
        }
    }

    let case = match dengue_case::Entity::find_by_id(case_id).one(&db).await {
        Ok(Some(c)) => c,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({"error": "Case not found"})),
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

    let mut active = case.into_active_model();
    if let Some(date_reported) = payload.date_reported {
        active.date_reported = Set(date_reported);
    }
    if let Some(status) = payload.status {
        active.status = Set(status);
    }
    if let Some(source) = payload.source {
        active.source = Set(source);
    }
    active.updated_at = Set(chrono::Utc::now().naive_utc());

    match active.update(&db).await {
        Ok(case) => {
            queue.trigger(case.barangay_id);
            (StatusCode::OK, Json(case)).into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}
