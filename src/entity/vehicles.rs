use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "vehicles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub vehicle_type_id: Uuid,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub license_plate: String,
    pub color: String,
    pub seats: i32,
    pub price_per_day: Decimal,
    pub status: String,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::vehicle_types::Entity",
        from = "Column::VehicleTypeId",
        to = "super::vehicle_types::Column::Id"
    )]
    VehicleTypes,
    #[sea_orm(has_many = "super::bookings::Entity")]
    Bookings,
}

impl Related<super::vehicle_types::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VehicleTypes.def()
    }
}

impl Related<super::bookings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
