use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::{get, patch, post, put},
};
use uuid::Uuid;

use crate::{
    dto::bookings::{
        BookingBulkRequest, BookingDetail, BookingList, BulkActionResult,
        UpdateBookingStatusRequest,
    },
    dto::dashboard::DashboardStats,
    dto::vehicle_types::{
        CreateVehicleTypeRequest, UpdateVehicleTypeRequest, VehicleTypeCountList,
    },
    dto::vehicles::{CreateVehicleRequest, UpdateVehicleRequest, VehicleBulkRequest, VehicleList},
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Booking, Vehicle, VehicleType},
    response::ApiResponse,
    routes::params::{AdminBookingQuery, BookingExportQuery, Pagination, VehicleQuery},
    services::{admin_service, vehicle_service, vehicle_type_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/bookings", get(list_all_bookings))
        .route("/bookings/export", get(export_bookings))
        .route("/bookings/bulk", post(bookings_bulk))
        .route("/bookings/{id}", get(get_booking_admin))
        .route("/bookings/{id}/confirm", post(confirm_booking))
        .route("/bookings/{id}/complete", post(complete_booking))
        .route("/bookings/{id}/cancel", post(cancel_booking))
        .route("/bookings/{id}/status", patch(update_booking_status))
        .route("/vehicles", get(list_all_vehicles).post(create_vehicle))
        .route("/vehicles/bulk", post(vehicles_bulk))
        .route("/vehicles/{id}", put(update_vehicle).delete(delete_vehicle))
        .route("/vehicles/{id}/toggle-status", post(toggle_vehicle_status))
        .route("/vehicles/{id}/toggle-active", post(toggle_vehicle_active))
        .route("/vehicle-types", get(list_vehicle_types).post(create_vehicle_type))
        .route(
            "/vehicle-types/{id}",
            put(update_vehicle_type).delete(delete_vehicle_type),
        )
}

#[utoipa::path(
    get,
    path = "/api/admin/dashboard",
    responses(
        (status = 200, description = "Aggregate statistics", body = ApiResponse<DashboardStats>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn dashboard(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<DashboardStats>>> {
    let resp = admin_service::dashboard_stats(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/bookings",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("start_date" = Option<String>, Query, description = "Bookings starting on or after"),
        ("end_date" = Option<String>, Query, description = "Bookings ending on or before"),
        ("search" = Option<String>, Query, description = "Booking number or customer name/email"),
        ("sort_order" = Option<String>, Query, description = "Sort order: asc, desc")
    ),
    responses(
        (status = 200, description = "All bookings (admin only)", body = ApiResponse<BookingList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_all_bookings(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<AdminBookingQuery>,
) -> AppResult<Json<ApiResponse<BookingList>>> {
    let resp = admin_service::list_all_bookings(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/bookings/export",
    params(
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("start_date" = Option<String>, Query, description = "Bookings starting on or after"),
        ("end_date" = Option<String>, Query, description = "Bookings ending on or before")
    ),
    responses(
        (status = 200, description = "CSV export of bookings"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn export_bookings(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<BookingExportQuery>,
) -> AppResult<impl IntoResponse> {
    let (filename, bytes) = admin_service::export_bookings(&state, &user, query).await?;
    let headers = [
        (header::CONTENT_TYPE, "text/csv".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ),
    ];
    Ok((headers, bytes))
}

#[utoipa::path(
    post,
    path = "/api/admin/bookings/bulk",
    request_body = BookingBulkRequest,
    responses(
        (status = 200, description = "Bulk confirm/cancel/delete with per-item eligibility", body = ApiResponse<BulkActionResult>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn bookings_bulk(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<BookingBulkRequest>,
) -> AppResult<Json<ApiResponse<BulkActionResult>>> {
    let resp = admin_service::bulk_action(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/bookings/{id}",
    params(
        ("id" = Uuid, Path, description = "Booking ID")
    ),
    responses(
        (status = 200, description = "Any booking with customer and vehicle", body = ApiResponse<BookingDetail>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn get_booking_admin(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<BookingDetail>>> {
    let resp = admin_service::get_booking_admin(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/bookings/{id}/confirm",
    params(("id" = Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Confirm a pending booking", body = ApiResponse<Booking>),
        (status = 422, description = "Only pending bookings can be confirmed"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn confirm_booking(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Booking>>> {
    let resp = admin_service::confirm_booking(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/bookings/{id}/complete",
    params(("id" = Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Complete a confirmed booking", body = ApiResponse<Booking>),
        (status = 422, description = "Only confirmed bookings can be completed"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn complete_booking(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Booking>>> {
    let resp = admin_service::complete_booking(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/bookings/{id}/cancel",
    params(("id" = Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Cancel an active booking", body = ApiResponse<Booking>),
        (status = 422, description = "Booking can no longer be cancelled"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn cancel_booking(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Booking>>> {
    let resp = admin_service::cancel_booking(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/bookings/{id}/status",
    params(("id" = Uuid, Path, description = "Booking ID")),
    request_body = UpdateBookingStatusRequest,
    responses(
        (status = 200, description = "Update booking status", body = ApiResponse<Booking>),
        (status = 400, description = "Invalid status"),
        (status = 422, description = "Invalid status transition"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_booking_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBookingStatusRequest>,
) -> AppResult<Json<ApiResponse<Booking>>> {
    let resp = admin_service::update_booking_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/vehicles",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("vehicle_type_id" = Option<Uuid>, Query, description = "Filter by vehicle type"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("q" = Option<String>, Query, description = "Search make, model or license plate")
    ),
    responses(
        (status = 200, description = "All vehicles incl. inactive", body = ApiResponse<VehicleList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_all_vehicles(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<VehicleQuery>,
) -> AppResult<Json<ApiResponse<VehicleList>>> {
    let resp = vehicle_service::list_all_vehicles(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/vehicles",
    request_body = CreateVehicleRequest,
    responses(
        (status = 200, description = "Create vehicle", body = ApiResponse<Vehicle>),
        (status = 409, description = "License plate already registered"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_vehicle(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateVehicleRequest>,
) -> AppResult<Json<ApiResponse<Vehicle>>> {
    let resp = vehicle_service::create_vehicle(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/vehicles/bulk",
    request_body = VehicleBulkRequest,
    responses(
        (status = 200, description = "Bulk activate/deactivate/delete vehicles", body = ApiResponse<BulkActionResult>),
        (status = 409, description = "Selected vehicles have active bookings"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn vehicles_bulk(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<VehicleBulkRequest>,
) -> AppResult<Json<ApiResponse<BulkActionResult>>> {
    let resp = vehicle_service::bulk_action(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/admin/vehicles/{id}",
    params(("id" = Uuid, Path, description = "Vehicle ID")),
    request_body = UpdateVehicleRequest,
    responses(
        (status = 200, description = "Update vehicle", body = ApiResponse<Vehicle>),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_vehicle(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateVehicleRequest>,
) -> AppResult<Json<ApiResponse<Vehicle>>> {
    let resp = vehicle_service::update_vehicle(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/vehicles/{id}",
    params(("id" = Uuid, Path, description = "Vehicle ID")),
    responses(
        (status = 200, description = "Delete vehicle", body = ApiResponse<Vehicle>),
        (status = 409, description = "Vehicle has active bookings"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_vehicle(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vehicle>>> {
    let resp = vehicle_service::delete_vehicle(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/vehicles/{id}/toggle-status",
    params(("id" = Uuid, Path, description = "Vehicle ID")),
    responses(
        (status = 200, description = "Toggle available/maintenance", body = ApiResponse<Vehicle>),
        (status = 409, description = "Vehicle has active bookings"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn toggle_vehicle_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vehicle>>> {
    let resp = vehicle_service::toggle_status(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/vehicles/{id}/toggle-active",
    params(("id" = Uuid, Path, description = "Vehicle ID")),
    responses(
        (status = 200, description = "Toggle the active flag", body = ApiResponse<Vehicle>),
        (status = 409, description = "Vehicle has active bookings"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn toggle_vehicle_active(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vehicle>>> {
    let resp = vehicle_service::toggle_active(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/vehicle-types",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "Vehicle types with fleet counts", body = ApiResponse<VehicleTypeCountList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_vehicle_types(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<VehicleTypeCountList>>> {
    let resp = vehicle_type_service::list_with_counts(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/vehicle-types",
    request_body = CreateVehicleTypeRequest,
    responses(
        (status = 200, description = "Create vehicle type", body = ApiResponse<VehicleType>),
        (status = 409, description = "Name already exists"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_vehicle_type(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateVehicleTypeRequest>,
) -> AppResult<Json<ApiResponse<VehicleType>>> {
    let resp = vehicle_type_service::create_type(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/admin/vehicle-types/{id}",
    params(("id" = Uuid, Path, description = "Vehicle type ID")),
    request_body = UpdateVehicleTypeRequest,
    responses(
        (status = 200, description = "Update vehicle type", body = ApiResponse<VehicleType>),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_vehicle_type(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateVehicleTypeRequest>,
) -> AppResult<Json<ApiResponse<VehicleType>>> {
    let resp = vehicle_type_service::update_type(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/vehicle-types/{id}",
    params(("id" = Uuid, Path, description = "Vehicle type ID")),
    responses(
        (status = 200, description = "Delete vehicle type", body = ApiResponse<VehicleType>),
        (status = 409, description = "Type still has vehicles"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_vehicle_type(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<VehicleType>>> {
    let resp = vehicle_type_service::delete_type(&state, &user, id).await?;
    Ok(Json(resp))
}
