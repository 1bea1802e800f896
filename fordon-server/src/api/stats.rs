//! Registry statistics endpoint

use axum::{extract::State, Json};
use serde::Serialize;

use crate::db;
use crate::error::ApiResult;
use crate::AppState;

/// Response for GET /api/stats
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total: i64,
}

/// GET /api/stats
pub async fn get_stats(State(state): State<AppState>) -> ApiResult<Json<StatsResponse>> {
    let total = db::count_vehicles(&state.db).await?;
    Ok(Json(StatsResponse { total }))
}
