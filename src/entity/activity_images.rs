use sea_orm::entity::prelude::*;

/// Promotional banner slot.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "activity_images")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub image: Option<String>,
    pub status: String,
    pub online_time: Option<DateTimeWithTimeZone>,
    pub offline_time: Option<DateTimeWithTimeZone>,
    /// Comma separated commodity ids.
    pub commodities: String,
    pub category: String,
    pub notes: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
