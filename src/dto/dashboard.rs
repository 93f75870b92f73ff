use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingStatusCounts {
    pub pending: i64,
    pub confirmed: i64,
    pub completed: i64,
    pub cancelled: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardStats {
    pub total_customers: i64,
    pub total_vehicles: i64,
    pub total_bookings: i64,
    /// Revenue over confirmed and completed bookings.
    pub total_revenue: Decimal,
    pub active_bookings: i64,
    pub pending_bookings: i64,
    pub available_vehicles: i64,
    pub vehicle_types: i64,
    pub bookings_by_status: BookingStatusCounts,
}
