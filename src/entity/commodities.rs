use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "commodities")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub commodity_id: String,
    pub name: String,
    pub style_code: String,
    pub category: String,
    pub category_detail: String,
    /// Minor currency units.
    pub price: i64,
    pub image: Option<String>,
    pub promo_image: Option<String>,
    pub size: String,
    pub color: String,
    pub height: String,
    pub spec_code: String,
    pub color_image: Option<String>,
    pub notes: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::commodity_images::Entity")]
    CommodityImages,
    #[sea_orm(has_one = "super::commodity_situations::Entity")]
    CommoditySituations,
}

impl Related<super::commodity_images::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CommodityImages.def()
    }
}

impl Related<super::commodity_situations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CommoditySituations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
