use sea_orm::entity::prelude::*;

/// Back-office staff account, either an operator or a customer service agent.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "operation_users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    pub nickname: String,
    pub mobile: String,
    pub password_hash: String,
    /// `operation` or `customer_service`.
    pub kind: String,
    pub level: i32,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
