use std::{
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};

mod common;

use common::duplicate_key;
use youlan_api::{
    error::AppError,
    retry::{RetryPolicy, is_transient, with_fresh_id, with_retry},
};

fn fast() -> RetryPolicy {
    RetryPolicy {
        attempts: 3,
        base_delay: Duration::from_millis(1),
    }
}

#[tokio::test]
async fn transient_errors_are_retried_until_success() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let value = with_retry(fast(), move || {
        let counter = counter.clone();
        async move {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(AppError::DbError(sqlx::Error::PoolTimedOut))
            } else {
                Ok(42)
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(value, 42);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn attempts_are_bounded() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let err = with_retry(fast(), move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(AppError::DbError(sqlx::Error::PoolTimedOut))
        }
    })
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::DbError(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn permanent_errors_fail_fast() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let err = with_retry(fast(), move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(AppError::not_found("Order Y1 does not exist"))
        }
    })
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn classification_and_backoff() {
    assert!(is_transient(&AppError::OrmError(sea_orm::DbErr::Conn(
        sea_orm::RuntimeErr::Internal("reset".into())
    ))));
    assert!(!is_transient(&AppError::bad_request("nope")));

    let policy = RetryPolicy::default();
    assert_eq!(policy.delay_for(0), Duration::from_millis(500));
    assert_eq!(policy.delay_for(2), Duration::from_secs(2));
}

#[tokio::test]
async fn id_collisions_retry_with_fresh_ids() {
    let mut ids = ["Y1", "Y2", "Y3"].into_iter();
    let tried = Arc::new(std::sync::Mutex::new(Vec::new()));
    let seen = tried.clone();
    let value = with_fresh_id(
        5,
        "an order id",
        || ids.next().unwrap_or("Y9").to_string(),
        move |id| {
            let seen = seen.clone();
            async move {
                seen.lock().unwrap().push(id.clone());
                if id == "Y3" {
                    Ok(id)
                } else {
                    Err(AppError::DbError(duplicate_key()))
                }
            }
        },
    )
    .await
    .unwrap();
    assert_eq!(value, "Y3");
    assert_eq!(*tried.lock().unwrap(), vec!["Y1", "Y2", "Y3"]);
}

#[tokio::test]
async fn exhausted_id_attempts_conflict() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let err = with_fresh_id(
        5,
        "an order id",
        || "Y2024060100000000".to_string(),
        move |_| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(AppError::DbError(duplicate_key()))
            }
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn other_insert_errors_are_not_retried() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let err = with_fresh_id(
        5,
        "an order id",
        || "Y1".to_string(),
        move |_| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(AppError::bad_request("bad row"))
            }
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
