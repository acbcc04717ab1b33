use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    models::{LogisticsEvent, Order, OrderStatus},
    routes::params::Pagination,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub user_id: i32,
    pub receiver_name: String,
    #[serde(default)]
    pub receiver_phone: String,
    pub province: String,
    pub city: String,
    pub county: String,
    pub detailed_address: String,
    /// Minor currency units.
    pub order_amount: i64,
    /// Must be a JSON array of order lines.
    #[schema(value_type = Vec<crate::models::OrderLine>)]
    pub product_list: serde_json::Value,
    #[serde(default)]
    pub express_company: String,
    #[serde(default)]
    pub express_number: String,
    pub remarks: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderCreated {
    pub order_id: String,
    pub user_id: i32,
    pub receiver_name: String,
    pub receiver_phone: String,
    pub express_company: String,
    pub express_number: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderLookup {
    pub order_id: String,
    /// When present the order must belong to this user.
    pub user_id: Option<i32>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateReceiverRequest {
    pub order_id: String,
    pub receiver_name: Option<String>,
    pub receiver_phone: Option<String>,
    pub province: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,
    pub detailed_address: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangeStatusRequest {
    pub order_id: String,
    pub status: OrderStatus,
    pub express_company: Option<String>,
    pub express_number: Option<String>,
    pub logistics_process: Option<Vec<LogisticsEvent>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusChanged {
    pub old_status: String,
    pub order: Order,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateExpressRequest {
    pub order_id: String,
    pub express_company: Option<String>,
    pub express_number: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SyncLogisticsRequest {
    pub order_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LogisticsSyncResult {
    pub order_id: String,
    pub express_company: String,
    pub express_number: String,
    pub logistics_process: Vec<LogisticsEvent>,
    /// False when the carrier could not be reached; the stored trace is unchanged.
    pub synced: bool,
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct OrderListQuery {
    pub shopname: String,
    pub user_id: Option<i32>,
    pub status: Option<OrderStatus>,
    /// `YYYY-MM-DD`, inclusive, China Standard Time.
    pub begin_date: Option<String>,
    /// `YYYY-MM-DD`, inclusive, China Standard Time.
    pub end_date: Option<String>,
    #[serde(flatten)]
    pub pagination: Pagination,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}
