pub mod audit_logs;
pub mod bookings;
pub mod users;
pub mod vehicle_types;
pub mod vehicles;

pub use audit_logs::Entity as AuditLogs;
pub use bookings::Entity as Bookings;
pub use users::Entity as Users;
pub use vehicle_types::Entity as VehicleTypes;
pub use vehicles::Entity as Vehicles;
