use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, Debug, ToSchema)]
pub struct RegisterRequest {
    pub mobile: String,
    pub nickname: String,
    pub password: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginRequest {
    pub mobile: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub user_id: i32,
    pub nickname: String,
    pub token: TokenPair,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct WechatLoginRequest {
    pub code: String,
    pub nickname: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WechatLoginResponse {
    pub user_id: i32,
    pub is_new_user: bool,
    pub token: TokenPair,
}

#[derive(Deserialize, Debug, ToSchema, IntoParams)]
pub struct UserIdQuery {
    pub user_id: i32,
}

#[derive(Deserialize, Debug, ToSchema, IntoParams)]
pub struct MobileQuery {
    pub mobile: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserIdData {
    pub user_id: i32,
}

/// Profile fields a user may change. The mobile number is fixed after registration.
#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct UpdateUserRequest {
    pub user_id: i32,
    pub nickname: Option<String>,
    pub avatar_url: Option<String>,
    pub default_receiver: Option<String>,
    pub province: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,
    pub detailed_address: Option<String>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StaffKind {
    Operation,
    CustomerService,
}

impl StaffKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StaffKind::Operation => "operation",
            StaffKind::CustomerService => "customer_service",
        }
    }

    /// JWT role carried by tokens issued to this kind of staff.
    pub fn role(&self) -> &'static str {
        match self {
            StaffKind::Operation => "admin",
            StaffKind::CustomerService => "service",
        }
    }
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct StaffRegisterRequest {
    pub kind: StaffKind,
    pub nickname: String,
    pub mobile: String,
    pub password: String,
    pub level: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StaffAccount {
    pub user_id: String,
    pub nickname: String,
    pub mobile: String,
    pub kind: String,
    pub level: i32,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct StaffLoginRequest {
    pub kind: StaffKind,
    pub mobile: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StaffLoginResponse {
    pub user_id: String,
    pub nickname: String,
    pub kind: String,
    pub token: TokenPair,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct ChangePasswordRequest {
    pub kind: StaffKind,
    pub mobile: String,
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    /// `access` or `refresh`.
    pub typ: String,
    pub exp: usize,
}
