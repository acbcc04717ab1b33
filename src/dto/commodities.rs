use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{models::Visibility, routes::params::Pagination};

/// Text fields of the `add_goods` multipart form. Files travel as separate parts.
#[derive(Debug, Default, Clone)]
pub struct NewCommodity {
    pub commodity_id: String,
    pub name: String,
    pub style_code: String,
    pub category: String,
    pub category_detail: String,
    pub price: i64,
    pub size: String,
    pub color: String,
    pub height: String,
    pub spec_code: String,
    pub notes: String,
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Default, Clone)]
pub struct CommodityUploads {
    pub image: Option<UploadedFile>,
    pub promo_image: Option<UploadedFile>,
    pub color_image: Option<UploadedFile>,
    pub gallery: Vec<UploadedFile>,
}

/// OpenAPI shape of the `add_goods` multipart body.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct CreateCommodityForm {
    pub commodity_id: String,
    pub name: String,
    pub style_code: Option<String>,
    pub category: String,
    pub category_detail: Option<String>,
    pub price: i64,
    pub size: Option<String>,
    pub color: Option<String>,
    pub height: Option<String>,
    pub spec_code: Option<String>,
    pub notes: Option<String>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub image: Option<Vec<u8>>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub promo_image: Option<Vec<u8>>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub color_image: Option<Vec<u8>>,
    /// Gallery images, repeated part name.
    #[schema(value_type = Option<Vec<String>>)]
    pub images: Option<Vec<Vec<u8>>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CommodityCreated {
    pub commodity_id: String,
    pub style_code: String,
    pub image: Option<String>,
    /// The style family already had a main image and this commodity now shares it.
    pub image_reused: bool,
}

/// Fields editable after creation. The style code is fixed because it drives
/// image grouping and the style family counters.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateCommodityRequest {
    pub commodity_id: String,
    pub name: Option<String>,
    pub category: Option<String>,
    pub category_detail: Option<String>,
    pub price: Option<i64>,
    pub size: Option<String>,
    pub color: Option<String>,
    pub height: Option<String>,
    pub spec_code: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CommodityIdRequest {
    pub commodity_id: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CommodityStatusRequest {
    pub commodity_id: String,
    pub status: Visibility,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StyleStatusRequest {
    pub style_code: String,
    pub status: Visibility,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ImageView {
    pub id: Option<i32>,
    pub url: String,
    pub is_main: bool,
    pub created_at: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CommodityDetail {
    pub commodity_id: String,
    pub name: String,
    pub style_code: String,
    pub category: String,
    pub category_detail: String,
    pub price: i64,
    pub image: Option<String>,
    pub promo_image: Option<String>,
    pub color_image: Option<String>,
    pub size: String,
    pub color: String,
    pub height: String,
    pub spec_code: String,
    pub notes: String,
    pub created_at: String,
    pub images: Vec<ImageView>,
    pub main_image: Option<String>,
    pub other_images: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CommodityStatusView {
    pub commodity_id: String,
    pub status: String,
    pub online_time: Option<String>,
    pub offline_time: Option<String>,
    pub sales_volume: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StyleStatusResult {
    pub style_code: String,
    pub status: String,
    pub affected_commodities: u64,
    pub time: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeletedCommodity {
    pub commodity_id: String,
    pub removed_files: usize,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StyleCodeQuery {
    pub shopname: String,
    pub style_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SizeEntry {
    pub commodity_id: String,
    pub size: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ColorGroup {
    pub color: String,
    pub color_image: Option<String>,
    pub sizes: Vec<SizeEntry>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StyleFamilyView {
    pub style_code: String,
    pub name: String,
    pub price: i64,
    pub items: Vec<ColorGroup>,
    pub images: Vec<ImageView>,
    pub main_image: Option<String>,
    pub other_images: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GoodsDemand {
    /// One row per online style family.
    StyleCode,
    /// Every commodity of online style families.
    Goods,
    /// Every commodity, regardless of style status.
    All,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect()
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GoodsQuery {
    pub shopname: String,
    pub demand: Option<GoodsDemand>,
    pub style_code: Option<String>,
    pub category: Option<OneOrMany>,
    pub status: Option<String>,
    #[serde(flatten)]
    pub pagination: Pagination,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GoodsItem {
    pub commodity_id: String,
    pub name: String,
    pub style_code: String,
    pub category: String,
    pub price: i64,
    /// Promo image, falling back to the main image.
    pub promo_image_url: Option<String>,
    pub created_at: String,
    pub images: Vec<ImageView>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GoodsList {
    pub items: Vec<GoodsItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryList {
    pub categories: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SearchByNameRequest {
    pub search_str: String,
    #[serde(flatten)]
    pub pagination: Pagination,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CommoditySummary {
    pub commodity_id: String,
    pub name: String,
    pub style_code: String,
    pub category: String,
    pub category_detail: String,
    pub price: i64,
    pub image: Option<String>,
    pub promo_image: Option<String>,
    pub size: String,
    pub color: String,
    pub height: String,
    pub spec_code: String,
    pub created_at: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CommoditySummaryList {
    pub items: Vec<CommoditySummary>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BatchByIdsRequest {
    pub commodity_ids: Vec<String>,
    /// Restrict each returned object to these keys.
    pub fields: Option<Vec<String>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BatchByIdsResult {
    #[schema(value_type = Vec<Object>)]
    pub items: Vec<serde_json::Map<String, serde_json::Value>>,
    pub not_found: Vec<String>,
}
