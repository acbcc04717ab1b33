use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

pub const MAX_PAGE_SIZE: i64 = 50;

#[derive(Debug, Default, Clone, Deserialize, ToSchema, IntoParams)]
pub struct Pagination {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl Pagination {
    pub fn new(page: i64, page_size: i64) -> Self {
        Self {
            page: Some(page),
            page_size: Some(page_size),
        }
    }

    /// `(page, page_size, offset)` with the page size capped at [`MAX_PAGE_SIZE`].
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let page_size = self.page_size.unwrap_or(10).clamp(1, MAX_PAGE_SIZE);
        let offset = (page - 1) * page_size;
        (page, page_size, offset)
    }
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct ShopQuery {
    pub shopname: String,
}
