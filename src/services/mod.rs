pub mod admin_service;
pub mod auth_service;
pub mod booking_service;
pub mod vehicle_service;
pub mod vehicle_type_service;
