use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, FromQueryResult, JoinType, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::bookings::{
        BookingBulkAction, BookingBulkRequest, BookingDetail, BookingList, BulkActionResult,
        UpdateBookingStatusRequest,
    },
    dto::dashboard::{BookingStatusCounts, DashboardStats},
    entity::{
        bookings::{self, Column as BookingCol, Entity as Bookings},
        users::{Column as UserCol, Entity as Users, Model as UserModel},
        vehicle_types::Entity as VehicleTypes,
        vehicles::{Column as VehicleCol, Entity as Vehicles},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Booking, User},
    response::{ApiResponse, Meta},
    routes::params::{AdminBookingQuery, BookingExportQuery, SortOrder},
    rules::{BookingAction, BookingStatus},
    services::booking_service::{apply_transition, booking_from_entity},
    services::vehicle_service::vehicle_from_entity,
    state::AppState,
};
use sea_orm::TransactionTrait;

fn booking_filter_condition(
    status: Option<&String>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Condition {
    let mut condition = Condition::all();
    if let Some(status) = status.filter(|s| !s.is_empty()) {
        condition = condition.add(BookingCol::Status.eq(status.clone()));
    }
    if let Some(from) = start_date {
        condition = condition.add(BookingCol::StartDate.gte(from));
    }
    if let Some(to) = end_date {
        condition = condition.add(BookingCol::EndDate.lte(to));
    }
    condition
}

pub async fn list_all_bookings(
    state: &AppState,
    user: &AuthUser,
    query: AdminBookingQuery,
) -> AppResult<ApiResponse<BookingList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition =
        booking_filter_condition(query.status.as_ref(), query.start_date, query.end_date);

    let mut finder = Bookings::find();
    if let Some(search) = query.search.as_ref().filter(|s| !s.is_empty()) {
        finder = finder.join(JoinType::InnerJoin, bookings::Relation::Users.def());
        condition = condition.add(
            Condition::any()
                .add(BookingCol::BookingNumber.contains(search))
                .add(UserCol::Name.contains(search))
                .add(UserCol::Email.contains(search)),
        );
    }
    finder = finder.filter(condition);

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(BookingCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(BookingCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(booking_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Bookings",
        BookingList { items },
        Some(meta),
    ))
}

pub async fn get_booking_admin(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<BookingDetail>> {
    ensure_admin(user)?;

    let booking = Bookings::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let vehicle = Vehicles::find_by_id(booking.vehicle_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let customer = Users::find_by_id(booking.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let data = BookingDetail {
        booking: booking_from_entity(booking),
        vehicle: vehicle_from_entity(vehicle),
        customer: user_from_entity(customer),
    };
    Ok(ApiResponse::success(
        "Booking found",
        data,
        Some(Meta::empty()),
    ))
}

pub async fn confirm_booking(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Booking>> {
    transition_booking(
        state,
        user,
        id,
        BookingAction::Confirm,
        "Booking confirmed successfully!",
    )
    .await
}

pub async fn complete_booking(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Booking>> {
    transition_booking(
        state,
        user,
        id,
        BookingAction::Complete,
        "Booking completed successfully!",
    )
    .await
}

pub async fn cancel_booking(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Booking>> {
    transition_booking(
        state,
        user,
        id,
        BookingAction::Cancel,
        "Booking cancelled successfully!",
    )
    .await
}

/// Map an admin-supplied target status onto the transition table. There is no
/// path back to pending.
pub async fn update_booking_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateBookingStatusRequest,
) -> AppResult<ApiResponse<Booking>> {
    let target = BookingStatus::parse(&payload.status)
        .ok_or_else(|| AppError::BadRequest("Invalid booking status".into()))?;

    let action = match target {
        BookingStatus::Confirmed => BookingAction::Confirm,
        BookingStatus::Completed => BookingAction::Complete,
        BookingStatus::Cancelled => BookingAction::Cancel,
        BookingStatus::Pending => {
            return Err(AppError::InvalidTransition(
                "A booking cannot be moved back to pending".into(),
            ));
        }
    };

    transition_booking(state, user, id, action, "Booking status updated successfully!").await
}

async fn transition_booking(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    action: BookingAction,
    message: &str,
) -> AppResult<ApiResponse<Booking>> {
    ensure_admin(user)?;
    let now = Utc::now();

    let txn = state.orm.begin().await?;
    let booking = Bookings::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let booking = apply_transition(&txn, booking, action, now).await?;
    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "booking_status_update",
        Some("bookings"),
        Some(serde_json::json!({ "booking_id": booking.id, "status": booking.status })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        message,
        booking_from_entity(booking),
        Some(Meta::empty()),
    ))
}

/// Bulk confirm/cancel/delete. Each booking is checked against the same
/// per-item guards as the single-item operations; ineligible items are
/// skipped and only the mutated count is reported.
pub async fn bulk_action(
    state: &AppState,
    user: &AuthUser,
    payload: BookingBulkRequest,
) -> AppResult<ApiResponse<BulkActionResult>> {
    ensure_admin(user)?;
    if payload.booking_ids.is_empty() {
        return Err(AppError::BadRequest("booking_ids must not be empty".into()));
    }
    let now = Utc::now();
    let requested = payload.booking_ids.len();

    let txn = state.orm.begin().await?;

    let (affected, message) = match payload.action {
        BookingBulkAction::Confirm | BookingBulkAction::Cancel => {
            let action = match payload.action {
                BookingBulkAction::Confirm => BookingAction::Confirm,
                _ => BookingAction::Cancel,
            };
            let bookings = Bookings::find()
                .filter(BookingCol::Id.is_in(payload.booking_ids.clone()))
                .lock(LockType::Update)
                .all(&txn)
                .await?;

            let mut count = 0usize;
            for booking in bookings {
                match apply_transition(&txn, booking, action, now).await {
                    Ok(_) => count += 1,
                    // Ineligible items are skipped, not treated as hard errors.
                    Err(AppError::InvalidTransition(_)) => {}
                    Err(err) => return Err(err),
                }
            }
            let verb = match action {
                BookingAction::Confirm => "confirmed",
                _ => "cancelled",
            };
            (count, format!("{count} bookings {verb} successfully!"))
        }
        BookingBulkAction::Delete => {
            // Hard deletion is reserved for bookings already cancelled.
            let deleted = Bookings::delete_many()
                .filter(
                    Condition::all()
                        .add(BookingCol::Id.is_in(payload.booking_ids.clone()))
                        .add(BookingCol::Status.eq(BookingStatus::Cancelled.as_str())),
                )
                .exec(&txn)
                .await?
                .rows_affected as usize;
            (deleted, format!("{deleted} bookings deleted successfully!"))
        }
    };

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "booking_bulk_action",
        Some("bookings"),
        Some(serde_json::json!({ "requested": requested, "affected": affected })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        message,
        BulkActionResult {
            requested,
            affected,
        },
        Some(Meta::empty()),
    ))
}

#[derive(Debug, FromQueryResult)]
struct ExportRow {
    booking_number: String,
    customer_name: String,
    customer_email: String,
    vehicle_year: i32,
    vehicle_make: String,
    vehicle_model: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    total_days: i32,
    price_per_day: Decimal,
    total_amount: Decimal,
    status: String,
    created_at: chrono::DateTime<chrono::FixedOffset>,
}

/// Serialize bookings (same filters as the listing) as CSV. Read-only; the
/// export never touches the lifecycle.
pub async fn export_bookings(
    state: &AppState,
    user: &AuthUser,
    query: BookingExportQuery,
) -> AppResult<(String, Vec<u8>)> {
    ensure_admin(user)?;

    let condition =
        booking_filter_condition(query.status.as_ref(), query.start_date, query.end_date);

    let rows = Bookings::find()
        .join(JoinType::InnerJoin, bookings::Relation::Users.def())
        .join(JoinType::InnerJoin, bookings::Relation::Vehicles.def())
        .select_only()
        .column(BookingCol::BookingNumber)
        .column_as(UserCol::Name, "customer_name")
        .column_as(UserCol::Email, "customer_email")
        .column_as(VehicleCol::Year, "vehicle_year")
        .column_as(VehicleCol::Make, "vehicle_make")
        .column_as(VehicleCol::Model, "vehicle_model")
        .column(BookingCol::StartDate)
        .column(BookingCol::EndDate)
        .column(BookingCol::TotalDays)
        .column(BookingCol::PricePerDay)
        .column(BookingCol::TotalAmount)
        .column(BookingCol::Status)
        .column(BookingCol::CreatedAt)
        .filter(condition)
        .order_by_desc(BookingCol::CreatedAt)
        .into_model::<ExportRow>()
        .all(&state.orm)
        .await?;

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record([
            "Booking Number",
            "Customer Name",
            "Customer Email",
            "Vehicle",
            "Start Date",
            "End Date",
            "Total Days",
            "Price Per Day",
            "Total Amount",
            "Status",
            "Created At",
        ])
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;

    for row in rows {
        writer
            .write_record([
                row.booking_number,
                row.customer_name,
                row.customer_email,
                format!("{} {} {}", row.vehicle_year, row.vehicle_make, row.vehicle_model),
                row.start_date.format("%Y-%m-%d").to_string(),
                row.end_date.format("%Y-%m-%d").to_string(),
                row.total_days.to_string(),
                row.price_per_day.to_string(),
                row.total_amount.to_string(),
                capitalize(&row.status),
                row.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ])
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
    let filename = format!("bookings_{}.csv", Utc::now().format("%Y-%m-%d_%H-%M-%S"));
    Ok((filename, bytes))
}

pub async fn dashboard_stats(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<DashboardStats>> {
    ensure_admin(user)?;

    let total_customers = Users::find()
        .filter(UserCol::Role.eq("user"))
        .count(&state.orm)
        .await? as i64;
    let total_vehicles = Vehicles::find().count(&state.orm).await? as i64;
    let total_bookings = Bookings::find().count(&state.orm).await? as i64;
    let vehicle_types = VehicleTypes::find().count(&state.orm).await? as i64;

    let available_vehicles = Vehicles::find()
        .filter(
            Condition::all()
                .add(VehicleCol::Status.eq("available"))
                .add(VehicleCol::IsActive.eq(true)),
        )
        .count(&state.orm)
        .await? as i64;

    let mut by_status = BookingStatusCounts {
        pending: 0,
        confirmed: 0,
        completed: 0,
        cancelled: 0,
    };
    for status in BookingStatus::ALL {
        let count = Bookings::find()
            .filter(BookingCol::Status.eq(status.as_str()))
            .count(&state.orm)
            .await? as i64;
        match status {
            BookingStatus::Pending => by_status.pending = count,
            BookingStatus::Confirmed => by_status.confirmed = count,
            BookingStatus::Completed => by_status.completed = count,
            BookingStatus::Cancelled => by_status.cancelled = count,
        }
    }

    let total_revenue: Decimal = sqlx::query_scalar(
        "SELECT COALESCE(SUM(total_amount), 0) FROM bookings WHERE status IN ('confirmed', 'completed')",
    )
    .fetch_one(&state.pool)
    .await?;

    let data = DashboardStats {
        total_customers,
        total_vehicles,
        total_bookings,
        total_revenue,
        active_bookings: by_status.pending + by_status.confirmed,
        pending_bookings: by_status.pending,
        available_vehicles,
        vehicle_types,
        bookings_by_status: by_status,
    };

    Ok(ApiResponse::success(
        "Dashboard",
        data,
        Some(Meta::empty()),
    ))
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

pub(crate) fn user_from_entity(model: UserModel) -> User {
    User {
        id: model.id,
        name: model.name,
        email: model.email,
        password_hash: model.password_hash,
        created_at: model.created_at.with_timezone(&Utc),
        role: model.role,
    }
}
