use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Booking, User, Vehicle};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBookingRequest {
    pub vehicle_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub pickup_location: Option<String>,
    pub dropoff_location: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateBookingRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub pickup_location: Option<String>,
    pub dropoff_location: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AvailabilityRequest {
    pub vehicle_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Availability flag plus a price quote for the requested range.
#[derive(Debug, Serialize, ToSchema)]
pub struct AvailabilityResponse {
    pub available: bool,
    pub total_days: i32,
    pub price_per_day: Decimal,
    pub total_amount: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingList {
    pub items: Vec<Booking>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingWithVehicle {
    pub booking: Booking,
    pub vehicle: Vehicle,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingDetail {
    pub booking: Booking,
    pub vehicle: Vehicle,
    pub customer: User,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BookingBulkAction {
    Confirm,
    Cancel,
    Delete,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BookingBulkRequest {
    pub action: BookingBulkAction,
    pub booking_ids: Vec<Uuid>,
}

/// Partial-success report for bulk operations: ineligible items are skipped,
/// never treated as a hard error.
#[derive(Debug, Serialize, ToSchema)]
pub struct BulkActionResult {
    pub requested: usize,
    pub affected: usize,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateBookingStatusRequest {
    pub status: String,
}
