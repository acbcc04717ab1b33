use sea_orm::entity::prelude::*;
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub order_id: String,
    pub user_id: i32,
    pub receiver_name: String,
    pub receiver_phone: String,
    pub express_company: String,
    pub express_number: String,
    pub logistics_process: Option<Value>,
    pub province: String,
    pub city: String,
    pub county: String,
    pub detailed_address: String,
    pub order_amount: i64,
    pub product_list: Value,
    pub status: String,
    pub order_time: DateTimeWithTimeZone,
    pub remarks: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
