use chrono::{Datelike, Utc};
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::bookings::BulkActionResult,
    dto::vehicles::{
        CreateVehicleRequest, UpdateVehicleRequest, VehicleBulkAction, VehicleBulkRequest,
        VehicleList,
    },
    entity::{
        bookings::{Column as BookingCol, Entity as Bookings},
        vehicle_types::Entity as VehicleTypes,
        vehicles::{
            ActiveModel as VehicleActive, Column as VehicleCol, Entity as Vehicles,
            Model as VehicleModel,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Vehicle,
    response::{ApiResponse, Meta},
    routes::params::VehicleQuery,
    rules::VehicleStatus,
    services::booking_service::has_active_bookings,
    state::AppState,
};

const ACTIVE_STATUSES: [&str; 2] = ["pending", "confirmed"];

/// Public catalogue: active vehicles only, filterable by type, status and a
/// free-text search over make/model/plate.
pub async fn list_vehicles(
    state: &AppState,
    query: VehicleQuery,
) -> AppResult<ApiResponse<VehicleList>> {
    let finder = Vehicles::find().filter(VehicleCol::IsActive.eq(true));
    list_filtered(state, finder, query).await
}

/// Admin listing: same filters, inactive vehicles included.
pub async fn list_all_vehicles(
    state: &AppState,
    user: &AuthUser,
    query: VehicleQuery,
) -> AppResult<ApiResponse<VehicleList>> {
    ensure_admin(user)?;
    list_filtered(state, Vehicles::find(), query).await
}

async fn list_filtered(
    state: &AppState,
    finder: sea_orm::Select<Vehicles>,
    query: VehicleQuery,
) -> AppResult<ApiResponse<VehicleList>> {
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if let Some(type_id) = query.vehicle_type_id {
        condition = condition.add(VehicleCol::VehicleTypeId.eq(type_id));
    }
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(VehicleCol::Status.eq(status.clone()));
    }
    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(
            Condition::any()
                .add(VehicleCol::Make.contains(search))
                .add(VehicleCol::Model.contains(search))
                .add(VehicleCol::LicensePlate.contains(search)),
        );
    }

    let finder = finder
        .filter(condition)
        .order_by_desc(VehicleCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(vehicle_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Vehicles",
        VehicleList { items },
        Some(meta),
    ))
}

pub async fn get_vehicle(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Vehicle>> {
    let vehicle = Vehicles::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success(
        "Vehicle",
        vehicle_from_entity(vehicle),
        Some(Meta::empty()),
    ))
}

pub async fn create_vehicle(
    state: &AppState,
    user: &AuthUser,
    payload: CreateVehicleRequest,
) -> AppResult<ApiResponse<Vehicle>> {
    ensure_admin(user)?;
    let now = Utc::now();
    validate_vehicle_fields(payload.year, payload.seats, payload.price_per_day, now.year())?;

    let status = match payload.status.as_deref() {
        None => VehicleStatus::Available,
        Some(s) => VehicleStatus::parse(s)
            .ok_or_else(|| AppError::BadRequest("Invalid vehicle status".into()))?,
    };

    VehicleTypes::find_by_id(payload.vehicle_type_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::BadRequest("Unknown vehicle type".into()))?;

    ensure_plate_free(state, &payload.license_plate, None).await?;

    let vehicle = VehicleActive {
        id: Set(Uuid::new_v4()),
        vehicle_type_id: Set(payload.vehicle_type_id),
        make: Set(payload.make),
        model: Set(payload.model),
        year: Set(payload.year),
        license_plate: Set(payload.license_plate),
        color: Set(payload.color),
        seats: Set(payload.seats),
        price_per_day: Set(payload.price_per_day),
        status: Set(status.as_str().into()),
        is_active: Set(payload.is_active.unwrap_or(true)),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "vehicle_create",
        Some("vehicles"),
        Some(serde_json::json!({ "vehicle_id": vehicle.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Vehicle created successfully!",
        vehicle_from_entity(vehicle),
        Some(Meta::empty()),
    ))
}

pub async fn update_vehicle(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateVehicleRequest,
) -> AppResult<ApiResponse<Vehicle>> {
    ensure_admin(user)?;
    let now = Utc::now();

    let existing = Vehicles::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let year = payload.year.unwrap_or(existing.year);
    let seats = payload.seats.unwrap_or(existing.seats);
    let price_per_day = payload.price_per_day.unwrap_or(existing.price_per_day);
    validate_vehicle_fields(year, seats, price_per_day, now.year())?;

    if let Some(type_id) = payload.vehicle_type_id {
        VehicleTypes::find_by_id(type_id)
            .one(&state.orm)
            .await?
            .ok_or_else(|| AppError::BadRequest("Unknown vehicle type".into()))?;
    }
    if let Some(plate) = payload.license_plate.as_ref() {
        if *plate != existing.license_plate {
            ensure_plate_free(state, plate, Some(id)).await?;
        }
    }

    let mut active: VehicleActive = existing.clone().into();
    active.vehicle_type_id = Set(payload.vehicle_type_id.unwrap_or(existing.vehicle_type_id));
    active.make = Set(payload.make.unwrap_or(existing.make));
    active.model = Set(payload.model.unwrap_or(existing.model));
    active.year = Set(year);
    active.license_plate = Set(payload.license_plate.unwrap_or(existing.license_plate));
    active.color = Set(payload.color.unwrap_or(existing.color));
    active.seats = Set(seats);
    active.price_per_day = Set(price_per_day);
    active.updated_at = Set(now.into());
    let vehicle = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Vehicle updated successfully!",
        vehicle_from_entity(vehicle),
        Some(Meta::empty()),
    ))
}

pub async fn delete_vehicle(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Vehicle>> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;
    let vehicle = Vehicles::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    if has_active_bookings(&txn, vehicle.id, None).await? {
        return Err(AppError::Conflict(
            "Cannot delete vehicle with active bookings!".into(),
        ));
    }

    Vehicles::delete_by_id(vehicle.id).exec(&txn).await?;
    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "vehicle_delete",
        Some("vehicles"),
        Some(serde_json::json!({ "vehicle_id": vehicle.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Vehicle deleted successfully!",
        vehicle_from_entity(vehicle),
        Some(Meta::empty()),
    ))
}

/// Flip a vehicle between `available` and `maintenance`. A vehicle with
/// active bookings can never be put back to `available` by hand.
pub async fn toggle_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Vehicle>> {
    ensure_admin(user)?;
    let now = Utc::now();

    let txn = state.orm.begin().await?;
    let vehicle = Vehicles::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let new_status = if vehicle.status == VehicleStatus::Available.as_str() {
        VehicleStatus::Maintenance
    } else {
        VehicleStatus::Available
    };

    if new_status == VehicleStatus::Available && has_active_bookings(&txn, vehicle.id, None).await?
    {
        return Err(AppError::Conflict(
            "Cannot set vehicle to available while it has active bookings!".into(),
        ));
    }

    let mut active: VehicleActive = vehicle.into();
    active.status = Set(new_status.as_str().into());
    active.updated_at = Set(now.into());
    let vehicle = active.update(&txn).await?;
    txn.commit().await?;

    Ok(ApiResponse::success(
        "Vehicle status updated successfully!",
        vehicle_from_entity(vehicle),
        Some(Meta::empty()),
    ))
}

pub async fn toggle_active(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Vehicle>> {
    ensure_admin(user)?;
    let now = Utc::now();

    let txn = state.orm.begin().await?;
    let vehicle = Vehicles::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    if vehicle.is_active && has_active_bookings(&txn, vehicle.id, None).await? {
        return Err(AppError::Conflict(
            "Cannot deactivate vehicle with active bookings!".into(),
        ));
    }

    let was_active = vehicle.is_active;
    let mut active: VehicleActive = vehicle.into();
    active.is_active = Set(!was_active);
    active.updated_at = Set(now.into());
    let vehicle = active.update(&txn).await?;
    txn.commit().await?;

    Ok(ApiResponse::success(
        "Vehicle status updated successfully!",
        vehicle_from_entity(vehicle),
        Some(Meta::empty()),
    ))
}

/// Bulk activate/deactivate/delete. Deactivation and deletion are refused
/// outright when any selected vehicle still has active bookings, matching the
/// single-vehicle guards.
pub async fn bulk_action(
    state: &AppState,
    user: &AuthUser,
    payload: VehicleBulkRequest,
) -> AppResult<ApiResponse<BulkActionResult>> {
    ensure_admin(user)?;
    if payload.vehicle_ids.is_empty() {
        return Err(AppError::BadRequest("vehicle_ids must not be empty".into()));
    }
    let now = Utc::now();
    let requested = payload.vehicle_ids.len();

    let txn = state.orm.begin().await?;

    if matches!(
        payload.action,
        VehicleBulkAction::Deactivate | VehicleBulkAction::Delete
    ) {
        let blocked = Bookings::find()
            .filter(
                Condition::all()
                    .add(BookingCol::VehicleId.is_in(payload.vehicle_ids.clone()))
                    .add(BookingCol::Status.is_in(ACTIVE_STATUSES)),
            )
            .count(&txn)
            .await?;
        if blocked > 0 {
            return Err(AppError::Conflict(
                "Cannot deactivate or delete vehicles with active bookings!".into(),
            ));
        }
    }

    let affected = match payload.action {
        VehicleBulkAction::Activate => {
            Vehicles::update_many()
                .col_expr(VehicleCol::IsActive, sea_orm::sea_query::Expr::value(true))
                .col_expr(VehicleCol::UpdatedAt, sea_orm::sea_query::Expr::value(now))
                .filter(VehicleCol::Id.is_in(payload.vehicle_ids.clone()))
                .exec(&txn)
                .await?
                .rows_affected
        }
        VehicleBulkAction::Deactivate => {
            Vehicles::update_many()
                .col_expr(VehicleCol::IsActive, sea_orm::sea_query::Expr::value(false))
                .col_expr(VehicleCol::UpdatedAt, sea_orm::sea_query::Expr::value(now))
                .filter(VehicleCol::Id.is_in(payload.vehicle_ids.clone()))
                .exec(&txn)
                .await?
                .rows_affected
        }
        VehicleBulkAction::Delete => {
            Vehicles::delete_many()
                .filter(VehicleCol::Id.is_in(payload.vehicle_ids.clone()))
                .exec(&txn)
                .await?
                .rows_affected
        }
    };

    txn.commit().await?;

    let data = BulkActionResult {
        requested,
        affected: affected as usize,
    };
    Ok(ApiResponse::success(
        "Vehicles updated successfully!",
        data,
        Some(Meta::empty()),
    ))
}

fn validate_vehicle_fields(
    year: i32,
    seats: i32,
    price_per_day: Decimal,
    current_year: i32,
) -> AppResult<()> {
    if !(1900..=current_year + 1).contains(&year) {
        return Err(AppError::BadRequest(format!(
            "year must be between 1900 and {}",
            current_year + 1
        )));
    }
    if !(1..=50).contains(&seats) {
        return Err(AppError::BadRequest("seats must be between 1 and 50".into()));
    }
    if price_per_day < Decimal::ZERO {
        return Err(AppError::BadRequest(
            "price_per_day must not be negative".into(),
        ));
    }
    Ok(())
}

async fn ensure_plate_free(
    state: &AppState,
    license_plate: &str,
    exclude: Option<Uuid>,
) -> AppResult<()> {
    let mut condition = Condition::all().add(VehicleCol::LicensePlate.eq(license_plate));
    if let Some(id) = exclude {
        condition = condition.add(VehicleCol::Id.ne(id));
    }
    let taken = Vehicles::find().filter(condition).count(&state.orm).await?;
    if taken > 0 {
        return Err(AppError::Conflict(
            "License plate is already registered".into(),
        ));
    }
    Ok(())
}

pub(crate) fn vehicle_from_entity(model: VehicleModel) -> Vehicle {
    Vehicle {
        id: model.id,
        vehicle_type_id: model.vehicle_type_id,
        make: model.make,
        model: model.model,
        year: model.year,
        license_plate: model.license_plate,
        color: model.color,
        seats: model.seats,
        price_per_day: model.price_per_day,
        status: model.status,
        is_active: model.is_active,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
