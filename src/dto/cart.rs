use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub user_id: i32,
    pub commodity_code: String,
    /// Defaults to 1.
    pub quantity: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CartItemRequest {
    pub user_id: i32,
    pub commodity_code: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateQuantityRequest {
    pub user_id: i32,
    pub commodity_code: String,
    pub quantity: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct IncreaseQuantityRequest {
    pub user_id: i32,
    pub commodity_code: String,
    /// Defaults to 1.
    pub quantity: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BatchDeleteRequest {
    pub user_id: i32,
    pub commodity_codes: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct CartQuery {
    pub user_id: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartItemQuantity {
    pub commodity_code: String,
    pub quantity: u32,
    pub total_quantity: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartItemView {
    pub commodity_code: String,
    pub quantity: u32,
    pub added_time: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartView {
    pub cart_items: Vec<CartItemView>,
    pub items_count: usize,
    pub total_quantity: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BatchDeleteResult {
    pub deleted_count: usize,
    pub deleted_codes: Vec<String>,
    pub not_exist_codes: Vec<String>,
    pub remaining_items_count: usize,
    pub total_quantity: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClearCartResult {
    pub cleared_items_count: usize,
}
