use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::vehicle_types::VehicleTypeList,
    error::AppResult,
    response::ApiResponse,
    services::vehicle_type_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_vehicle_types))
}

#[utoipa::path(
    get,
    path = "/api/vehicle-types",
    responses(
        (status = 200, description = "List active vehicle types", body = ApiResponse<VehicleTypeList>)
    ),
    tag = "Vehicle Types"
)]
pub async fn list_vehicle_types(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<VehicleTypeList>>> {
    let resp = vehicle_type_service::list_active(&state).await?;
    Ok(Json(resp))
}
