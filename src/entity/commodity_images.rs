use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "commodity_images")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub commodity_id: String,
    pub image: String,
    pub is_main: bool,
    pub created_at: DateTimeWithTimeZone,
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
