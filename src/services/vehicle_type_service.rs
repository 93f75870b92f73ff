use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    dto::vehicle_types::{
        CreateVehicleTypeRequest, UpdateVehicleTypeRequest, VehicleTypeCountList,
        VehicleTypeList, VehicleTypeWithCount,
    },
    entity::{
        vehicle_types::{
            ActiveModel as TypeActive, Column as TypeCol, Entity as VehicleTypes,
            Model as TypeModel,
        },
        vehicles::{Column as VehicleCol, Entity as Vehicles},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::VehicleType,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

/// Public list of active vehicle types for the catalogue.
pub async fn list_active(state: &AppState) -> AppResult<ApiResponse<VehicleTypeList>> {
    let items = VehicleTypes::find()
        .filter(TypeCol::IsActive.eq(true))
        .order_by_asc(TypeCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(type_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Vehicle types",
        VehicleTypeList { items },
        Some(Meta::empty()),
    ))
}

/// Admin listing with a fleet count per type.
pub async fn list_with_counts(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<VehicleTypeCountList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = pagination.normalize();

    let finder = VehicleTypes::find().order_by_desc(TypeCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;

    let types = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let mut items = Vec::with_capacity(types.len());
    for vehicle_type in types {
        let vehicle_count = Vehicles::find()
            .filter(VehicleCol::VehicleTypeId.eq(vehicle_type.id))
            .count(&state.orm)
            .await? as i64;
        items.push(VehicleTypeWithCount {
            vehicle_type: type_from_entity(vehicle_type),
            vehicle_count,
        });
    }

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Vehicle types",
        VehicleTypeCountList { items },
        Some(meta),
    ))
}

pub async fn create_type(
    state: &AppState,
    user: &AuthUser,
    payload: CreateVehicleTypeRequest,
) -> AppResult<ApiResponse<VehicleType>> {
    ensure_admin(user)?;
    if payload.base_price_per_day < Decimal::ZERO {
        return Err(AppError::BadRequest(
            "base_price_per_day must not be negative".into(),
        ));
    }
    ensure_name_free(state, &payload.name, None).await?;

    let vehicle_type = TypeActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        description: Set(payload.description),
        base_price_per_day: Set(payload.base_price_per_day),
        is_active: Set(payload.is_active.unwrap_or(true)),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Vehicle type created successfully!",
        type_from_entity(vehicle_type),
        Some(Meta::empty()),
    ))
}

pub async fn update_type(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateVehicleTypeRequest,
) -> AppResult<ApiResponse<VehicleType>> {
    ensure_admin(user)?;

    let existing = VehicleTypes::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if let Some(price) = payload.base_price_per_day {
        if price < Decimal::ZERO {
            return Err(AppError::BadRequest(
                "base_price_per_day must not be negative".into(),
            ));
        }
    }
    if let Some(name) = payload.name.as_ref() {
        if *name != existing.name {
            ensure_name_free(state, name, Some(id)).await?;
        }
    }

    let mut active: TypeActive = existing.clone().into();
    active.name = Set(payload.name.unwrap_or(existing.name));
    active.description = Set(payload.description.or(existing.description));
    active.base_price_per_day = Set(payload
        .base_price_per_day
        .unwrap_or(existing.base_price_per_day));
    active.is_active = Set(payload.is_active.unwrap_or(existing.is_active));
    let vehicle_type = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Vehicle type updated successfully!",
        type_from_entity(vehicle_type),
        Some(Meta::empty()),
    ))
}

pub async fn delete_type(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<VehicleType>> {
    ensure_admin(user)?;

    let vehicle_type = VehicleTypes::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let in_use = Vehicles::find()
        .filter(VehicleCol::VehicleTypeId.eq(id))
        .count(&state.orm)
        .await?;
    if in_use > 0 {
        return Err(AppError::Conflict(
            "Cannot delete a vehicle type that still has vehicles!".into(),
        ));
    }

    VehicleTypes::delete_by_id(id).exec(&state.orm).await?;

    Ok(ApiResponse::success(
        "Vehicle type deleted successfully!",
        type_from_entity(vehicle_type),
        Some(Meta::empty()),
    ))
}

async fn ensure_name_free(state: &AppState, name: &str, exclude: Option<Uuid>) -> AppResult<()> {
    let mut condition = Condition::all().add(TypeCol::Name.eq(name));
    if let Some(id) = exclude {
        condition = condition.add(TypeCol::Id.ne(id));
    }
    let taken = VehicleTypes::find()
        .filter(condition)
        .count(&state.orm)
        .await?;
    if taken > 0 {
        return Err(AppError::Conflict(
            "A vehicle type with this name already exists".into(),
        ));
    }
    Ok(())
}

fn type_from_entity(model: TypeModel) -> VehicleType {
    VehicleType {
        id: model.id,
        name: model.name,
        description: model.description,
        base_price_per_day: model.base_price_per_day,
        is_active: model.is_active,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
