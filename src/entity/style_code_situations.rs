use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "style_code_situations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub style_code: String,
    pub status: String,
    pub online_time: Option<DateTimeWithTimeZone>,
    pub offline_time: Option<DateTimeWithTimeZone>,
    pub sync_data_count: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
