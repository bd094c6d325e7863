use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Datelike, Utc};
use serde_json::json;
use tracing::error;

use crate::risk_rank;
use crate::store::DbStore;

#[derive(serde::Deserialize)]
pub struct RankingsParams {
    year: Option<i32>,
    limit: Option<usize>,
}

const MIN_RANKING_YEAR: i32 = 1900;
const MAX_RANKING_YEAR: i32 = 9999;

/// Years the ranking window accepts. Anything outside cannot form a valid
/// calendar range.
fn year_in_range(year: i32) -> bool {
    (MIN_RANKING_YEAR..=MAX_RANKING_YEAR).contains(&year)
}

/// Year-scoped barangay risk ranking for the staff dashboard.
pub async fn get_barangay_rankings(
    Extension(store): Extension<DbStore>,
    Query(params): Query<RankingsParams>,
) -> Response {
    let year = params.year.unwrap_or_else(|| Utc::now().year());
    if !year_in_range(year) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "year must be between 1900 and 9999"})),
        )
            .into_response();
    }
    let limit = params.limit.unwrap_or(10).min(100);

    match risk_rank::barangay_rankings(&store, year, limit).await {
        Ok(rankings) => (StatusCode::OK, Json(rankings)).into_response(),
        Err(e) => {
            error!("Failed to compute barangay rankings: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Failed to compute rankings"})),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeframe;

    #[test]
    fn year_bounds_reject_values_the_calendar_cannot_hold() {
        assert!(year_in_range(2026));
        assert!(!year_in_range(300_000));
        assert!(!year_in_range(-300_000));
        assert!(!year_in_range(0));
    }

    #[test]
    fn accepted_boundary_years_form_valid_ranges() {
        for year in [MIN_RANKING_YEAR, MAX_RANKING_YEAR] {
            assert!(year_in_range(year));
            let (start, _) = timeframe::month_bounds(year, 1);
            let (_, end) = timeframe::month_bounds(year, 12);
            assert!(start < end);
        }
    }
}
