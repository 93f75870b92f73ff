pub mod auth;
pub mod bookings;
pub mod dashboard;
pub mod vehicle_types;
pub mod vehicles;
