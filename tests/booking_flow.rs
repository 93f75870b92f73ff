use axum_rental_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    dto::bookings::{
        AvailabilityRequest, BookingBulkAction, BookingBulkRequest, CreateBookingRequest,
        UpdateBookingRequest,
    },
    entity::{
        bookings, users::ActiveModel as UserActive, vehicle_types::ActiveModel as TypeActive,
        vehicles, vehicles::ActiveModel as VehicleActive,
    },
    error::AppError,
    middleware::auth::AuthUser,
    services::{admin_service, booking_service, vehicle_service},
    state::AppState,
};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, Set, Statement};
use uuid::Uuid;

// Integration flow: customer books a vehicle -> admin confirms -> vehicle is
// marked booked -> overlapping request is rejected -> completion frees the
// vehicle again.
#[tokio::test]
async fn booking_lifecycle_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;

    let user_id = create_user(&state, "user", "user@example.com").await?;
    let other_id = create_user(&state, "user", "other@example.com").await?;
    let admin_id = create_user(&state, "admin", "admin@example.com").await?;

    let vehicle_id = create_vehicle(&state, "AB-123-CD", Decimal::from(40)).await?;

    let auth_user = AuthUser {
        user_id,
        role: "user".into(),
    };
    let auth_other = AuthUser {
        user_id: other_id,
        role: "user".into(),
    };
    let auth_admin = AuthUser {
        user_id: admin_id,
        role: "admin".into(),
    };

    let start = Utc::now().date_naive() + Duration::days(7);
    let end = start + Duration::days(2);

    // Quote: 3 rental days inclusive at 40/day.
    let quote = booking_service::check_availability(
        &state,
        AvailabilityRequest {
            vehicle_id,
            start_date: start,
            end_date: end,
        },
    )
    .await?;
    let quote = quote.data.unwrap();
    assert!(quote.available);
    assert_eq!(quote.total_days, 3);
    assert_eq!(quote.total_amount, Decimal::new(12000, 2));

    // Book
    let created = booking_service::create_booking(
        &state,
        &auth_user,
        CreateBookingRequest {
            vehicle_id,
            start_date: start,
            end_date: end,
            pickup_location: Some("Airport".into()),
            dropoff_location: None,
            notes: None,
        },
    )
    .await?;
    let booking = created.data.unwrap();
    assert_eq!(booking.status, "pending");
    assert_eq!(booking.total_days, 3);
    assert_eq!(booking.total_amount, Decimal::new(12000, 2));
    assert!(booking.booking_number.starts_with("BK"));
    assert_eq!(booking.booking_number.len(), 11);

    // A second customer touching the last rental day must be rejected.
    let overlap = booking_service::create_booking(
        &state,
        &auth_other,
        CreateBookingRequest {
            vehicle_id,
            start_date: end,
            end_date: end + Duration::days(2),
            pickup_location: None,
            dropoff_location: None,
            notes: None,
        },
    )
    .await;
    assert!(matches!(overlap, Err(AppError::Conflict(_))));

    // Admin confirms; the vehicle flips to booked.
    let confirmed = admin_service::confirm_booking(&state, &auth_admin, booking.id).await?;
    assert_eq!(confirmed.data.unwrap().status, "confirmed");
    assert_eq!(vehicle_status(&state, vehicle_id).await?, "booked");

    // Confirming twice is an invalid transition.
    let again = admin_service::confirm_booking(&state, &auth_admin, booking.id).await;
    assert!(matches!(again, Err(AppError::InvalidTransition(_))));

    // Deactivating the vehicle while it has an active booking is refused.
    let deactivate = vehicle_service::toggle_active(&state, &auth_admin, vehicle_id).await;
    assert!(matches!(deactivate, Err(AppError::Conflict(_))));

    // Completion frees the vehicle.
    let completed = admin_service::complete_booking(&state, &auth_admin, booking.id).await?;
    assert_eq!(completed.data.unwrap().status, "completed");
    assert_eq!(vehicle_status(&state, vehicle_id).await?, "available");

    Ok(())
}

#[tokio::test]
async fn customer_cancel_and_bulk_confirm() -> anyhow::Result<()> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;

    let user_id = create_user(&state, "user", "user@example.com").await?;
    let admin_id = create_user(&state, "admin", "admin@example.com").await?;

    let first_vehicle = create_vehicle(&state, "EF-456-GH", Decimal::from(60)).await?;
    let second_vehicle = create_vehicle(&state, "IJ-789-KL", Decimal::from(60)).await?;

    let auth_user = AuthUser {
        user_id,
        role: "user".into(),
    };
    let auth_admin = AuthUser {
        user_id: admin_id,
        role: "admin".into(),
    };

    let start = Utc::now().date_naive() + Duration::days(10);

    let first = book(&state, &auth_user, first_vehicle, start, start + Duration::days(1)).await?;
    let second = book(&state, &auth_user, second_vehicle, start, start + Duration::days(1)).await?;

    // Customer cancels the first booking while it is still pending.
    let cancelled = booking_service::cancel_booking(&state, &auth_user, first).await?;
    assert_eq!(cancelled.data.unwrap().status, "cancelled");

    // Bulk confirm over a mixed set only affects the eligible booking.
    let result = admin_service::bulk_action(
        &state,
        &auth_admin,
        BookingBulkRequest {
            action: BookingBulkAction::Confirm,
            booking_ids: vec![first, second],
        },
    )
    .await?;
    let result = result.data.unwrap();
    assert_eq!(result.requested, 2);
    assert_eq!(result.affected, 1);

    let second_row = bookings::Entity::find_by_id(second)
        .one(&state.orm)
        .await?
        .expect("booking row");
    assert_eq!(second_row.status, "confirmed");

    // Bulk delete only removes cancelled bookings.
    let removed = admin_service::bulk_action(
        &state,
        &auth_admin,
        BookingBulkRequest {
            action: BookingBulkAction::Delete,
            booking_ids: vec![first, second],
        },
    )
    .await?;
    assert_eq!(removed.data.unwrap().affected, 1);

    Ok(())
}

#[tokio::test]
async fn modify_booking_and_cancel_side_effects() -> anyhow::Result<()> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;

    let user_id = create_user(&state, "user", "user@example.com").await?;
    let other_id = create_user(&state, "user", "other@example.com").await?;
    let admin_id = create_user(&state, "admin", "admin@example.com").await?;

    let first_vehicle = create_vehicle(&state, "MN-135-OP", Decimal::from(50)).await?;
    let second_vehicle = create_vehicle(&state, "QR-246-ST", Decimal::from(50)).await?;

    let auth_user = AuthUser {
        user_id,
        role: "user".into(),
    };
    let auth_other = AuthUser {
        user_id: other_id,
        role: "user".into(),
    };
    let auth_admin = AuthUser {
        user_id: admin_id,
        role: "admin".into(),
    };

    let start = Utc::now().date_naive() + Duration::days(7);
    let booking_id = book(&state, &auth_user, first_vehicle, start, start + Duration::days(2)).await?;

    // Shifting a pending booking onto a range that overlaps only itself must
    // succeed: the conflict check excludes the booking being modified.
    let moved = booking_service::update_booking(
        &state,
        &auth_user,
        booking_id,
        UpdateBookingRequest {
            start_date: start + Duration::days(1),
            end_date: start + Duration::days(3),
            pickup_location: Some("Downtown".into()),
            dropoff_location: None,
            notes: None,
        },
    )
    .await?;
    let moved = moved.data.unwrap();
    assert_eq!(moved.total_days, 3);
    assert_eq!(moved.total_amount, Decimal::new(15000, 2));

    // A second customer's booking on the same vehicle still blocks the move.
    let other_start = start + Duration::days(20);
    book(&state, &auth_other, first_vehicle, other_start, other_start + Duration::days(2)).await?;
    let clash = booking_service::update_booking(
        &state,
        &auth_user,
        booking_id,
        UpdateBookingRequest {
            start_date: other_start + Duration::days(1),
            end_date: other_start + Duration::days(3),
            pickup_location: None,
            dropoff_location: None,
            notes: None,
        },
    )
    .await;
    assert!(matches!(clash, Err(AppError::Conflict(_))));

    // Cancelling a confirmed booking frees its vehicle again.
    let confirmed_id = book(&state, &auth_user, second_vehicle, start, start + Duration::days(2)).await?;
    admin_service::confirm_booking(&state, &auth_admin, confirmed_id).await?;
    assert_eq!(vehicle_status(&state, second_vehicle).await?, "booked");

    let cancelled = booking_service::cancel_booking(&state, &auth_user, confirmed_id).await?;
    assert_eq!(cancelled.data.unwrap().status, "cancelled");
    assert_eq!(vehicle_status(&state, second_vehicle).await?, "available");

    Ok(())
}

async fn book(
    state: &AppState,
    user: &AuthUser,
    vehicle_id: Uuid,
    start: chrono::NaiveDate,
    end: chrono::NaiveDate,
) -> anyhow::Result<Uuid> {
    let resp = booking_service::create_booking(
        state,
        user,
        CreateBookingRequest {
            vehicle_id,
            start_date: start,
            end_date: end,
            pickup_location: None,
            dropoff_location: None,
            notes: None,
        },
    )
    .await?;
    Ok(resp.data.unwrap().id)
}

async fn vehicle_status(state: &AppState, id: Uuid) -> anyhow::Result<String> {
    let vehicle = vehicles::Entity::find_by_id(id)
        .one(&state.orm)
        .await?
        .expect("vehicle row");
    Ok(vehicle.status)
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE bookings, audit_logs, vehicles, vehicle_types, users RESTART IDENTITY CASCADE",
    ))
    .await?;

    Ok(AppState { pool, orm })
}

async fn create_user(state: &AppState, role: &str, email: &str) -> anyhow::Result<Uuid> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set("Test User".into()),
        email: Set(email.to_string()),
        password_hash: Set("dummy".into()),
        role: Set(role.into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(user.id)
}

async fn create_vehicle(
    state: &AppState,
    plate: &str,
    price_per_day: Decimal,
) -> anyhow::Result<Uuid> {
    let vehicle_type = TypeActive {
        id: Set(Uuid::new_v4()),
        name: Set(format!("Type {plate}")),
        description: Set(None),
        base_price_per_day: Set(price_per_day),
        is_active: Set(true),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let vehicle = VehicleActive {
        id: Set(Uuid::new_v4()),
        vehicle_type_id: Set(vehicle_type.id),
        make: Set("Toyota".into()),
        model: Set("Corolla".into()),
        year: Set(2022),
        license_plate: Set(plate.to_string()),
        color: Set("White".into()),
        seats: Set(5),
        price_per_day: Set(price_per_day),
        status: Set("available".into()),
        is_active: Set(true),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(vehicle.id)
}
