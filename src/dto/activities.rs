use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::ActivityImage;

/// OpenAPI shape of the activity image multipart body.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct ActivityImageForm {
    #[schema(value_type = String, format = Binary)]
    pub image: Vec<u8>,
    pub category: Option<String>,
    pub notes: Option<String>,
    /// Comma separated commodity ids.
    pub commodities: Option<String>,
}

#[derive(Debug, Default)]
pub struct NewActivityImage {
    pub category: String,
    pub notes: String,
    pub commodities: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ActivityIdRequest {
    #[serde(alias = "activity_id")]
    pub id: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRelationsRequest {
    #[serde(alias = "activity_id")]
    pub id: i32,
    /// Comma separated commodity ids; every id must exist.
    pub commodities: String,
    pub category: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ActivityImageList {
    pub items: Vec<ActivityImage>,
}
