use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{entity, response::display_time};

/// Listing status shared by commodities, style families and activity slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Pending,
    Online,
    Offline,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Pending => "pending",
            ListingStatus::Online => "online",
            ListingStatus::Offline => "offline",
        }
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ListingStatus::Pending),
            "online" => Ok(ListingStatus::Online),
            "offline" => Ok(ListingStatus::Offline),
            other => Err(format!("unknown status '{other}'")),
        }
    }
}

/// Target of an online/offline transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Online,
    Offline,
}

impl From<Visibility> for ListingStatus {
    fn from(v: Visibility) -> Self {
        match v {
            Visibility::Online => ListingStatus::Online,
            Visibility::Offline => ListingStatus::Offline,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Canceled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Canceled => "canceled",
        }
    }

    /// Only orders handed to a carrier have anything to track.
    pub fn is_trackable(&self) -> bool {
        matches!(self, OrderStatus::Shipped | OrderStatus::Delivered)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "canceled" => Ok(OrderStatus::Canceled),
            other => Err(format!("unknown order status '{other}'")),
        }
    }
}

fn fmt_opt(at: Option<DateTime<Utc>>) -> Option<String> {
    at.as_ref().map(display_time)
}

fn utc(at: &chrono::DateTime<chrono::FixedOffset>) -> DateTime<Utc> {
    at.with_timezone(&Utc)
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserProfile {
    pub user_id: i32,
    pub mobile: Option<String>,
    pub nickname: String,
    pub avatar_url: Option<String>,
    pub default_receiver: Option<String>,
    pub province: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,
    pub detailed_address: Option<String>,
    pub membership_level: i32,
    pub total_spending: i64,
    pub registered_at: String,
    pub last_login_at: Option<String>,
}

impl From<entity::users::Model> for UserProfile {
    fn from(m: entity::users::Model) -> Self {
        Self {
            user_id: m.user_id,
            mobile: m.mobile,
            nickname: m.nickname,
            avatar_url: m.avatar_url,
            default_receiver: m.default_receiver,
            province: m.province,
            city: m.city,
            county: m.county,
            detailed_address: m.detailed_address,
            membership_level: m.membership_level,
            total_spending: m.total_spending,
            registered_at: display_time(&utc(&m.registered_at)),
            last_login_at: fmt_opt(m.last_login_at.as_ref().map(utc)),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Address {
    pub address_id: i32,
    pub user_id: i32,
    pub province: String,
    pub city: String,
    pub county: String,
    pub detailed_address: String,
    pub receiver_name: String,
    pub phone_number: String,
    pub is_default: bool,
    pub remark: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<entity::addresses::Model> for Address {
    fn from(m: entity::addresses::Model) -> Self {
        Self {
            address_id: m.address_id,
            user_id: m.user_id,
            province: m.province,
            city: m.city,
            county: m.county,
            detailed_address: m.detailed_address,
            receiver_name: m.receiver_name,
            phone_number: m.phone_number,
            is_default: m.is_default,
            remark: m.remark,
            created_at: display_time(&utc(&m.created_at)),
            updated_at: display_time(&utc(&m.updated_at)),
        }
    }
}

/// One carrier scan event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LogisticsEvent {
    pub time: String,
    pub location: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderLine {
    pub commodity_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub color: String,
    pub quantity: u32,
    /// Unit price in minor units.
    pub price: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Order {
    pub order_id: String,
    pub user_id: i32,
    pub receiver_name: String,
    pub receiver_phone: String,
    pub express_company: String,
    pub express_number: String,
    pub logistics_process: Vec<LogisticsEvent>,
    pub province: String,
    pub city: String,
    pub county: String,
    pub detailed_address: String,
    pub order_amount: i64,
    pub product_list: Vec<OrderLine>,
    pub status: String,
    pub order_time: String,
    pub remarks: Option<String>,
}

impl From<entity::orders::Model> for Order {
    fn from(m: entity::orders::Model) -> Self {
        let logistics_process = m
            .logistics_process
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default();
        let product_list = serde_json::from_value(m.product_list).unwrap_or_default();
        Self {
            order_id: m.order_id,
            user_id: m.user_id,
            receiver_name: m.receiver_name,
            receiver_phone: m.receiver_phone,
            express_company: m.express_company,
            express_number: m.express_number,
            logistics_process,
            province: m.province,
            city: m.city,
            county: m.county,
            detailed_address: m.detailed_address,
            order_amount: m.order_amount,
            product_list,
            status: m.status,
            order_time: display_time(&utc(&m.order_time)),
            remarks: m.remarks,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ActivityImage {
    pub id: i32,
    pub image: Option<String>,
    pub status: String,
    pub online_time: Option<String>,
    pub offline_time: Option<String>,
    pub commodities: Vec<String>,
    pub category: String,
    pub notes: String,
    pub created_at: String,
    pub updated_at: String,
}

impl ActivityImage {
    pub fn from_model(m: entity::activity_images::Model, image_url: Option<String>) -> Self {
        Self {
            id: m.id,
            image: image_url,
            status: m.status,
            online_time: fmt_opt(m.online_time.as_ref().map(utc)),
            offline_time: fmt_opt(m.offline_time.as_ref().map(utc)),
            commodities: split_ids(&m.commodities),
            category: m.category,
            notes: m.notes,
            created_at: display_time(&utc(&m.created_at)),
            updated_at: display_time(&utc(&m.updated_at)),
        }
    }
}

/// Splits a comma separated id list, dropping blanks.
pub fn split_ids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
