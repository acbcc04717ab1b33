use axum::{Json, http::StatusCode};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct Meta {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub total: Option<i64>,
}

impl Meta {
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        Self {
            page: Some(page),
            per_page: Some(per_page),
            total: Some(total),
        }
    }

    pub fn empty() -> Self {
        Self {
            page: None,
            per_page: None,
            total: None,
        }
    }
}

/// Envelope for every JSON response. `code` mirrors the HTTP status and is
/// the field clients branch on.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub code: u16,
    pub message: String,
    pub data: Option<T>,
    pub meta: Option<Meta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T, meta: Option<Meta>) -> Self {
        Self::with_code(200, message, data, meta)
    }

    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self::with_code(201, message, data, Some(Meta::empty()))
    }

    pub fn with_code(code: u16, message: impl Into<String>, data: T, meta: Option<Meta>) -> Self {
        Self {
            code,
            message: message.into(),
            data: Some(data),
            meta,
        }
    }

    /// Pairs the body with the HTTP status matching its `code`.
    pub fn with_status(self) -> (StatusCode, Json<Self>) {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::OK);
        (status, Json(self))
    }
}

const DISPLAY_OFFSET_SECS: i32 = 8 * 3600;

/// Storefront dates are interpreted and rendered in China Standard Time.
pub fn display_offset() -> FixedOffset {
    FixedOffset::east_opt(DISPLAY_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

pub fn display_time(at: &DateTime<Utc>) -> String {
    at.with_timezone(&display_offset())
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}
