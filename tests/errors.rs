mod common;

use axum::{http::StatusCode, response::IntoResponse};
use common::duplicate_key;
use youlan_api::error::AppError;

#[tokio::test]
async fn uncaught_unique_violations_map_to_conflict() {
    let raw = AppError::DbError(duplicate_key());
    assert!(raw.is_unique_violation());
    assert_eq!(raw.status(), StatusCode::CONFLICT);

    let orm = AppError::OrmError(sea_orm::DbErr::Exec(sea_orm::RuntimeErr::SqlxError(
        duplicate_key(),
    )));
    assert!(orm.is_unique_violation());
    assert_eq!(orm.status(), StatusCode::CONFLICT);
    assert_eq!(orm.into_response().status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn other_database_errors_stay_server_errors() {
    let err = AppError::DbError(sqlx::Error::RowNotFound);
    assert!(!err.is_unique_violation());
    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        AppError::DbError(sqlx::Error::PoolTimedOut).status(),
        StatusCode::SERVICE_UNAVAILABLE
    );
}
