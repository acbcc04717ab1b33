use chrono::{TimeZone, Utc};
use youlan_api::{
    error::AppError,
    models::OrderStatus,
    services::order_service::{date_range, day_start, generate_order_id},
};

#[tokio::test]
async fn order_ids_use_the_local_calendar_day() {
    // 2024-03-31 17:30 UTC is already April 1st in China Standard Time.
    let now = Utc.with_ymd_and_hms(2024, 3, 31, 17, 30, 0).unwrap();
    let id = generate_order_id(now);
    assert_eq!(id.len(), 1 + 8 + 8);
    assert!(id.starts_with("Y20240401"));
    assert!(id[9..].chars().all(|c| c.is_ascii_digit()));
}

#[tokio::test]
async fn day_start_is_local_midnight() {
    let start = day_start("2024-06-01").unwrap();
    assert_eq!(start, Utc.with_ymd_and_hms(2024, 5, 31, 16, 0, 0).unwrap());
    assert!(matches!(day_start("06/01/2024"), Err(AppError::BadRequest(_))));
}

#[tokio::test]
async fn date_range_covers_whole_days() {
    let (begin, end) = date_range(Some("2024-06-01"), Some("2024-06-01")).unwrap();
    assert_eq!(begin, Some(Utc.with_ymd_and_hms(2024, 5, 31, 16, 0, 0).unwrap()));
    assert_eq!(end, Some(Utc.with_ymd_and_hms(2024, 6, 1, 16, 0, 0).unwrap()));

    let (begin, end) = date_range(None, Some("")).unwrap();
    assert!(begin.is_none() && end.is_none());

    assert!(matches!(
        date_range(Some("2024-06-02"), Some("2024-06-01")),
        Err(AppError::BadRequest(_))
    ));
}

#[tokio::test]
async fn order_statuses_parse_and_track() {
    assert_eq!("shipped".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
    assert!("lost".parse::<OrderStatus>().is_err());
    assert!(OrderStatus::Shipped.is_trackable());
    assert!(OrderStatus::Delivered.is_trackable());
    assert!(!OrderStatus::Pending.is_trackable());
    assert_eq!(
        serde_json::to_value(OrderStatus::Canceled).unwrap(),
        serde_json::json!("canceled")
    );
}
