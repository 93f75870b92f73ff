use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        bookings::{
            AvailabilityRequest, AvailabilityResponse, BookingBulkRequest, BookingDetail,
            BookingList, BookingWithVehicle, BulkActionResult, CreateBookingRequest,
            UpdateBookingRequest, UpdateBookingStatusRequest,
        },
        dashboard::{BookingStatusCounts, DashboardStats},
        vehicle_types::{
            CreateVehicleTypeRequest, UpdateVehicleTypeRequest, VehicleTypeCountList,
            VehicleTypeList, VehicleTypeWithCount,
        },
        vehicles::{CreateVehicleRequest, UpdateVehicleRequest, VehicleBulkRequest, VehicleList},
    },
    models::{Booking, User, Vehicle, VehicleType},
    response::{ApiResponse, Meta},
    routes::{admin, auth, bookings, health, params, vehicle_types, vehicles},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::register,
        vehicles::list_vehicles,
        vehicles::get_vehicle,
        vehicle_types::list_vehicle_types,
        bookings::list_bookings,
        bookings::create_booking,
        bookings::check_availability,
        bookings::get_booking,
        bookings::update_booking,
        bookings::cancel_booking,
        admin::dashboard,
        admin::list_all_bookings,
        admin::export_bookings,
        admin::bookings_bulk,
        admin::get_booking_admin,
        admin::confirm_booking,
        admin::complete_booking,
        admin::cancel_booking,
        admin::update_booking_status,
        admin::list_all_vehicles,
        admin::create_vehicle,
        admin::vehicles_bulk,
        admin::update_vehicle,
        admin::delete_vehicle,
        admin::toggle_vehicle_status,
        admin::toggle_vehicle_active,
        admin::list_vehicle_types,
        admin::create_vehicle_type,
        admin::update_vehicle_type,
        admin::delete_vehicle_type
    ),
    components(
        schemas(
            User,
            Vehicle,
            VehicleType,
            Booking,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            CreateBookingRequest,
            UpdateBookingRequest,
            UpdateBookingStatusRequest,
            AvailabilityRequest,
            AvailabilityResponse,
            BookingList,
            BookingWithVehicle,
            BookingDetail,
            BookingBulkRequest,
            BulkActionResult,
            CreateVehicleRequest,
            UpdateVehicleRequest,
            VehicleBulkRequest,
            VehicleList,
            CreateVehicleTypeRequest,
            UpdateVehicleTypeRequest,
            VehicleTypeList,
            VehicleTypeWithCount,
            VehicleTypeCountList,
            BookingStatusCounts,
            DashboardStats,
            params::Pagination,
            params::VehicleQuery,
            params::BookingListQuery,
            Meta,
            ApiResponse<Booking>,
            ApiResponse<BookingList>,
            ApiResponse<BookingDetail>,
            ApiResponse<VehicleList>,
            ApiResponse<DashboardStats>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Vehicles", description = "Public vehicle catalogue"),
        (name = "Vehicle Types", description = "Vehicle type endpoints"),
        (name = "Bookings", description = "Customer booking endpoints"),
        (name = "Admin", description = "Admin endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
