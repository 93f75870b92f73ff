use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::VehicleType;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateVehicleTypeRequest {
    pub name: String,
    pub description: Option<String>,
    pub base_price_per_day: Decimal,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateVehicleTypeRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub base_price_per_day: Option<Decimal>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VehicleTypeList {
    pub items: Vec<VehicleType>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VehicleTypeWithCount {
    #[serde(flatten)]
    pub vehicle_type: VehicleType,
    pub vehicle_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VehicleTypeCountList {
    pub items: Vec<VehicleTypeWithCount>,
}
