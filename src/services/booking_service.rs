use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rand::Rng;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::bookings::{
        AvailabilityRequest, AvailabilityResponse, BookingList, BookingWithVehicle,
        CreateBookingRequest, UpdateBookingRequest,
    },
    entity::{
        bookings::{
            ActiveModel as BookingActive, Column as BookingCol, Entity as Bookings,
            Model as BookingModel,
        },
        vehicles::{Column as VehicleCol, Entity as Vehicles, Model as VehicleModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Booking,
    response::{ApiResponse, Meta},
    routes::params::{BookingListQuery, SortOrder},
    rules::{self, BookingAction, BookingStatus, VehicleStatus},
    state::AppState,
};

const ACTIVE_STATUSES: [&str; 2] = ["pending", "confirmed"];

/// The three-clause inclusive overlap test, expressed as a query: an existing
/// booking conflicts when its start or end falls inside the requested range,
/// or when it spans the whole range.
fn overlap_condition(start_date: NaiveDate, end_date: NaiveDate) -> Condition {
    Condition::any()
        .add(BookingCol::StartDate.between(start_date, end_date))
        .add(BookingCol::EndDate.between(start_date, end_date))
        .add(
            Condition::all()
                .add(BookingCol::StartDate.lte(start_date))
                .add(BookingCol::EndDate.gte(end_date)),
        )
}

/// Does any pending/confirmed booking on the vehicle overlap the range?
/// `exclude` drops a booking from the search so a modification does not
/// conflict with itself.
pub async fn has_conflicting_booking<C: ConnectionTrait>(
    conn: &C,
    vehicle_id: Uuid,
    start_date: NaiveDate,
    end_date: NaiveDate,
    exclude: Option<Uuid>,
) -> AppResult<bool> {
    let mut condition = Condition::all()
        .add(BookingCol::VehicleId.eq(vehicle_id))
        .add(BookingCol::Status.is_in(ACTIVE_STATUSES))
        .add(overlap_condition(start_date, end_date));
    if let Some(id) = exclude {
        condition = condition.add(BookingCol::Id.ne(id));
    }

    let conflicts = Bookings::find().filter(condition).count(conn).await?;
    Ok(conflicts > 0)
}

/// Whether the vehicle still has any active booking. Inventory management
/// uses this to refuse deactivation/deletion; the lifecycle manager uses it
/// to decide when a vehicle returns to `available`.
pub async fn has_active_bookings<C: ConnectionTrait>(
    conn: &C,
    vehicle_id: Uuid,
    exclude: Option<Uuid>,
) -> AppResult<bool> {
    let mut condition = Condition::all()
        .add(BookingCol::VehicleId.eq(vehicle_id))
        .add(BookingCol::Status.is_in(ACTIVE_STATUSES));
    if let Some(id) = exclude {
        condition = condition.add(BookingCol::Id.ne(id));
    }
    let active = Bookings::find().filter(condition).count(conn).await?;
    Ok(active > 0)
}

async fn is_vehicle_available<C: ConnectionTrait>(
    conn: &C,
    vehicle: &VehicleModel,
    start_date: NaiveDate,
    end_date: NaiveDate,
    exclude: Option<Uuid>,
) -> AppResult<bool> {
    if !vehicle.is_active || vehicle.status != VehicleStatus::Available.as_str() {
        return Ok(false);
    }
    let conflict = has_conflicting_booking(conn, vehicle.id, start_date, end_date, exclude).await?;
    Ok(!conflict)
}

pub async fn check_availability(
    state: &AppState,
    payload: AvailabilityRequest,
) -> AppResult<ApiResponse<AvailabilityResponse>> {
    rules::validate_date_range(payload.start_date, payload.end_date)?;

    let vehicle = Vehicles::find_by_id(payload.vehicle_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let available = is_vehicle_available(
        &state.orm,
        &vehicle,
        payload.start_date,
        payload.end_date,
        None,
    )
    .await?;
    let (total_days, total_amount) =
        rules::rental_total(payload.start_date, payload.end_date, vehicle.price_per_day);

    let data = AvailabilityResponse {
        available,
        total_days,
        price_per_day: vehicle.price_per_day,
        total_amount,
    };
    Ok(ApiResponse::success(
        "Availability checked",
        data,
        Some(Meta::empty()),
    ))
}

pub async fn list_bookings(
    state: &AppState,
    user: &AuthUser,
    query: BookingListQuery,
) -> AppResult<ApiResponse<BookingList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all().add(BookingCol::UserId.eq(user.user_id));
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(BookingCol::Status.eq(status.clone()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let mut finder = Bookings::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(BookingCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(BookingCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let bookings = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(booking_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        BookingList { items: bookings },
        Some(meta),
    ))
}

pub async fn create_booking(
    state: &AppState,
    user: &AuthUser,
    payload: CreateBookingRequest,
) -> AppResult<ApiResponse<Booking>> {
    let now = Utc::now();
    rules::validate_date_range(payload.start_date, payload.end_date)?;
    if payload.start_date < now.date_naive() {
        return Err(AppError::BadRequest(
            "start_date must not be in the past".into(),
        ));
    }

    let txn = state.orm.begin().await?;

    // Lock the vehicle row so two concurrent requests cannot both observe
    // "available" and insert overlapping bookings.
    let vehicle = Vehicles::find_by_id(payload.vehicle_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    if !vehicle.is_active || vehicle.status != VehicleStatus::Available.as_str() {
        return Err(AppError::Conflict(
            "This vehicle is not available for booking".into(),
        ));
    }

    if has_conflicting_booking(&txn, vehicle.id, payload.start_date, payload.end_date, None).await?
    {
        return Err(AppError::Conflict(
            "Vehicle is not available for the selected dates".into(),
        ));
    }

    let (total_days, total_amount) =
        rules::rental_total(payload.start_date, payload.end_date, vehicle.price_per_day);
    let booking_number = generate_booking_number(&txn, now.year()).await?;

    let booking = BookingActive {
        id: Set(Uuid::new_v4()),
        booking_number: Set(booking_number),
        user_id: Set(user.user_id),
        vehicle_id: Set(vehicle.id),
        start_date: Set(payload.start_date),
        end_date: Set(payload.end_date),
        total_days: Set(total_days),
        // snapshot: later price changes on the vehicle do not touch this booking
        price_per_day: Set(vehicle.price_per_day),
        total_amount: Set(total_amount),
        status: Set(BookingStatus::Pending.as_str().into()),
        pickup_location: Set(payload.pickup_location),
        dropoff_location: Set(payload.dropoff_location),
        notes: Set(payload.notes),
        confirmed_at: Set(None),
        cancelled_at: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "booking_create",
        Some("bookings"),
        Some(serde_json::json!({
            "booking_id": booking.id,
            "booking_number": booking.booking_number,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let message = format!(
        "Booking created successfully! Booking number: {}",
        booking.booking_number
    );
    Ok(ApiResponse::success(
        message,
        booking_from_entity(booking),
        Some(Meta::empty()),
    ))
}

pub async fn get_booking(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<BookingWithVehicle>> {
    let booking = Bookings::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if booking.user_id != user.user_id && user.role != "admin" {
        return Err(AppError::Forbidden);
    }

    let vehicle = Vehicles::find_by_id(booking.vehicle_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let data = BookingWithVehicle {
        booking: booking_from_entity(booking),
        vehicle: crate::services::vehicle_service::vehicle_from_entity(vehicle),
    };
    Ok(ApiResponse::success("OK", data, Some(Meta::empty())))
}

pub async fn update_booking(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateBookingRequest,
) -> AppResult<ApiResponse<Booking>> {
    let now = Utc::now();
    rules::validate_date_range(payload.start_date, payload.end_date)?;
    if payload.start_date < now.date_naive() {
        return Err(AppError::BadRequest(
            "start_date must not be in the past".into(),
        ));
    }

    let txn = state.orm.begin().await?;

    let booking = Bookings::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    if booking.user_id != user.user_id {
        return Err(AppError::Forbidden);
    }

    let status = parse_status(&booking.status)?;
    rules::check_modifiable(status, booking.start_date, now.date_naive())?;

    // Serialize against concurrent creates and modifies on the same vehicle:
    // every writer takes the vehicle row lock before re-checking conflicts.
    Vehicles::find_by_id(booking.vehicle_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    if has_conflicting_booking(
        &txn,
        booking.vehicle_id,
        payload.start_date,
        payload.end_date,
        Some(booking.id),
    )
    .await?
    {
        return Err(AppError::Conflict(
            "Vehicle is not available for the selected dates".into(),
        ));
    }

    // Totals are recomputed from the snapshotted price, never re-fetched
    // from the vehicle.
    let (total_days, total_amount) =
        rules::rental_total(payload.start_date, payload.end_date, booking.price_per_day);

    let mut active: BookingActive = booking.into();
    active.start_date = Set(payload.start_date);
    active.end_date = Set(payload.end_date);
    active.total_days = Set(total_days);
    active.total_amount = Set(total_amount);
    active.pickup_location = Set(payload.pickup_location);
    active.dropoff_location = Set(payload.dropoff_location);
    active.notes = Set(payload.notes);
    active.updated_at = Set(now.into());
    let booking = active.update(&txn).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "booking_update",
        Some("bookings"),
        Some(serde_json::json!({ "booking_id": booking.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Booking updated successfully!",
        booking_from_entity(booking),
        Some(Meta::empty()),
    ))
}

pub async fn cancel_booking(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Booking>> {
    let now = Utc::now();
    let txn = state.orm.begin().await?;

    let booking = Bookings::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    if booking.user_id != user.user_id {
        return Err(AppError::Forbidden);
    }

    let booking = apply_transition(&txn, booking, BookingAction::Cancel, now).await?;
    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "booking_cancel",
        Some("bookings"),
        Some(serde_json::json!({ "booking_id": booking.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Booking cancelled successfully!",
        booking_from_entity(booking),
        Some(Meta::empty()),
    ))
}

/// Run one lifecycle transition plus its vehicle side effect. The caller owns
/// the transaction, so either the whole status + vehicle update lands or
/// nothing does.
pub(crate) async fn apply_transition<C: ConnectionTrait>(
    conn: &C,
    booking: BookingModel,
    action: BookingAction,
    now: DateTime<Utc>,
) -> AppResult<BookingModel> {
    let current = parse_status(&booking.status)?;
    let next = rules::check_transition(current, action, booking.start_date, now.date_naive())?;

    let vehicle_id = booking.vehicle_id;
    let booking_id = booking.id;

    let mut active: BookingActive = booking.into();
    active.status = Set(next.as_str().into());
    match action {
        BookingAction::Confirm => active.confirmed_at = Set(Some(now.into())),
        BookingAction::Cancel => active.cancelled_at = Set(Some(now.into())),
        BookingAction::Complete => {}
    }
    active.updated_at = Set(now.into());
    let updated = active.update(conn).await?;

    match action {
        BookingAction::Confirm => {
            set_vehicle_status(conn, vehicle_id, VehicleStatus::Booked, now).await?;
        }
        BookingAction::Cancel | BookingAction::Complete => {
            // The vehicle only frees up once its last active booking is gone.
            if !has_active_bookings(conn, vehicle_id, Some(booking_id)).await? {
                set_vehicle_status(conn, vehicle_id, VehicleStatus::Available, now).await?;
            }
        }
    }

    Ok(updated)
}

async fn set_vehicle_status<C: ConnectionTrait>(
    conn: &C,
    vehicle_id: Uuid,
    status: VehicleStatus,
    now: DateTime<Utc>,
) -> AppResult<()> {
    Vehicles::update_many()
        .col_expr(VehicleCol::Status, Expr::value(status.as_str()))
        .col_expr(VehicleCol::UpdatedAt, Expr::value(now))
        .filter(VehicleCol::Id.eq(vehicle_id))
        .exec(conn)
        .await?;
    Ok(())
}

/// Draw `BK<year><5-digit>` candidates until one is unused. The unique index
/// on booking_number remains the authoritative guard under concurrent writers.
async fn generate_booking_number<C: ConnectionTrait>(conn: &C, year: i32) -> AppResult<String> {
    loop {
        let n = rand::thread_rng().gen_range(1..=99_999u32);
        let candidate = rules::booking_number(year, n);
        let taken = Bookings::find()
            .filter(BookingCol::BookingNumber.eq(&candidate))
            .count(conn)
            .await?;
        if taken == 0 {
            return Ok(candidate);
        }
    }
}

pub(crate) fn parse_status(status: &str) -> AppResult<BookingStatus> {
    BookingStatus::parse(status)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("unknown booking status: {status}")))
}

pub(crate) fn booking_from_entity(model: BookingModel) -> Booking {
    Booking {
        id: model.id,
        booking_number: model.booking_number,
        user_id: model.user_id,
        vehicle_id: model.vehicle_id,
        start_date: model.start_date,
        end_date: model.end_date,
        total_days: model.total_days,
        price_per_day: model.price_per_day,
        total_amount: model.total_amount,
        status: model.status,
        pickup_location: model.pickup_location,
        dropoff_location: model.dropoff_location,
        notes: model.notes,
        confirmed_at: model.confirmed_at.map(|dt| dt.with_timezone(&Utc)),
        cancelled_at: model.cancelled_at.map(|dt| dt.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
