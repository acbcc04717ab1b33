use sea_orm::entity::prelude::*;

/// Listing status of a single commodity, derived at creation time.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "commodity_situations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub commodity_id: String,
    pub status: String,
    pub online_time: Option<DateTimeWithTimeZone>,
    pub offline_time: Option<DateTimeWithTimeZone>,
    pub sales_volume: i32,
    pub remarks: String,
    pub style_code: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::commodities::Entity",
        from = "Column::CommodityId",
        to = "super::commodities::Column::CommodityId"
    )]
    Commodities,
}

impl Related<super::commodities::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Commodities.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
