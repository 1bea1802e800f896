//! Vehicle listing endpoint

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::{self, VehicleSummary};
use crate::error::ApiResult;
use crate::AppState;

/// Query parameters for the listing
#[derive(Debug, Deserialize)]
pub struct VehiclesQuery {
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

/// Response for GET /api/vehicles
#[derive(Debug, Serialize)]
pub struct VehiclesResponse {
    pub vehicles: Vec<VehicleSummary>,
}

/// GET /api/vehicles?sort_by=&sort_order=
///
/// Returns all vehicle summaries. Sort column outside the allow-list
/// falls back to creation time, newest first.
pub async fn get_vehicles(
    State(state): State<AppState>,
    Query(query): Query<VehiclesQuery>,
) -> ApiResult<Json<VehiclesResponse>> {
    let vehicles = db::list_vehicles(
        &state.db,
        query.sort_by.as_deref(),
        query.sort_order.as_deref(),
    )
    .await?;

    Ok(Json(VehiclesResponse { vehicles }))
}
