use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Address;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddAddressRequest {
    pub user_id: i32,
    pub province: String,
    pub city: String,
    pub county: String,
    pub detailed_address: String,
    pub receiver_name: String,
    pub phone_number: String,
    #[serde(default)]
    pub is_default: bool,
    pub remark: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddressRef {
    pub user_id: i32,
    pub address_id: i32,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateAddressRequest {
    pub user_id: i32,
    pub address_id: i32,
    pub province: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,
    pub detailed_address: Option<String>,
    pub receiver_name: Option<String>,
    pub phone_number: Option<String>,
    pub is_default: Option<bool>,
    pub remark: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AddressList {
    pub items: Vec<Address>,
}
