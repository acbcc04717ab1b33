use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenIssued {
    pub access_token: String,
    pub ip_address: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IpList {
    pub ips: Vec<String>,
}
