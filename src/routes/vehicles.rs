use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::vehicles::VehicleList,
    error::AppResult,
    models::Vehicle,
    response::ApiResponse,
    routes::params::VehicleQuery,
    services::vehicle_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_vehicles))
        .route("/{id}", get(get_vehicle))
}

#[utoipa::path(
    get,
    path = "/api/vehicles",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("vehicle_type_id" = Option<Uuid>, Query, description = "Filter by vehicle type"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("q" = Option<String>, Query, description = "Search make, model or license plate")
    ),
    responses(
        (status = 200, description = "List active vehicles", body = ApiResponse<VehicleList>)
    ),
    tag = "Vehicles"
)]
pub async fn list_vehicles(
    State(state): State<AppState>,
    Query(query): Query<VehicleQuery>,
) -> AppResult<Json<ApiResponse<VehicleList>>> {
    let resp = vehicle_service::list_vehicles(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/vehicles/{id}",
    params(
        ("id" = Uuid, Path, description = "Vehicle ID")
    ),
    responses(
        (status = 200, description = "Get vehicle", body = ApiResponse<Vehicle>),
        (status = 404, description = "Vehicle not found"),
    ),
    tag = "Vehicles"
)]
pub async fn get_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vehicle>>> {
    let resp = vehicle_service::get_vehicle(&state, id).await?;
    Ok(Json(resp))
}
