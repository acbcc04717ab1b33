use chrono::{Duration, TimeZone, Utc};
use youlan_api::{
    cart::{CartContents, CartError},
    error::AppError,
};

fn at(secs: i64) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap() + Duration::seconds(secs)
}

#[tokio::test]
async fn add_accumulates_and_refreshes_added_time() {
    let mut cart = CartContents::new();
    assert_eq!(cart.add("YL001-90", 2, at(0)).unwrap(), 2);
    assert_eq!(cart.add("YL001-90", 3, at(10)).unwrap(), 5);

    let entry = cart.get("YL001-90").unwrap();
    assert_eq!(entry.quantity, 5);
    assert_eq!(entry.added_time, at(10));
    assert_eq!(cart.len(), 1);
    assert_eq!(cart.total_quantity(), 5);
}

#[tokio::test]
async fn zero_quantities_are_rejected() {
    let mut cart = CartContents::new();
    assert_eq!(cart.add("A", 0, at(0)), Err(CartError::InvalidQuantity));
    cart.add("A", 1, at(0)).unwrap();
    assert_eq!(cart.set_quantity("A", 0, at(1)), Err(CartError::InvalidQuantity));
    assert_eq!(cart.increment("A", 0, at(1)), Err(CartError::InvalidQuantity));
    assert_eq!(cart.quantity_of("A"), 1);
}

#[tokio::test]
async fn operations_on_missing_items_report_not_in_cart() {
    let mut cart = CartContents::new();
    assert_eq!(
        cart.set_quantity("missing", 2, at(0)),
        Err(CartError::NotInCart("missing".into()))
    );
    assert_eq!(
        cart.increment("missing", 1, at(0)),
        Err(CartError::NotInCart("missing".into()))
    );
    assert_eq!(
        cart.decrement("missing", at(0)),
        Err(CartError::NotInCart("missing".into()))
    );
    assert!(!cart.remove("missing"));
    assert!(cart.is_empty());
}

#[tokio::test]
async fn decrement_never_drops_the_last_unit() {
    let mut cart = CartContents::new();
    cart.add("A", 2, at(0)).unwrap();
    assert_eq!(cart.decrement("A", at(1)).unwrap(), 1);

    let err = cart.decrement("A", at(2)).unwrap_err();
    assert_eq!(
        err,
        CartError::WouldReachZero {
            code: "A".into(),
            current_quantity: 1
        }
    );
    assert_eq!(cart.quantity_of("A"), 1);
    assert!(matches!(AppError::from(err), AppError::BadRequest(_)));
}

#[tokio::test]
async fn remove_many_partitions_codes() {
    let mut cart = CartContents::new();
    cart.add("A", 1, at(0)).unwrap();
    cart.add("B", 4, at(1)).unwrap();
    cart.add("C", 2, at(2)).unwrap();

    let report = cart.remove_many(["A", "X", "C"]);
    assert_eq!(report.deleted, vec!["A".to_string(), "C".to_string()]);
    assert_eq!(report.not_found, vec!["X".to_string()]);
    assert_eq!(cart.len(), 1);
    assert_eq!(cart.total_quantity(), 4);
}

#[tokio::test]
async fn items_are_listed_newest_first() {
    let mut cart = CartContents::new();
    cart.add("old", 1, at(0)).unwrap();
    cart.add("new", 1, at(30)).unwrap();
    cart.add("mid", 1, at(15)).unwrap();
    cart.increment("old", 1, at(60)).unwrap();

    let codes: Vec<&str> = cart.items_by_recency().into_iter().map(|(c, _)| c).collect();
    assert_eq!(codes, vec!["old", "new", "mid"]);
}

#[tokio::test]
async fn clear_reports_distinct_items_and_json_survives() {
    let mut cart = CartContents::new();
    cart.add("A", 3, at(0)).unwrap();
    cart.add("B", 1, at(1)).unwrap();

    let restored = CartContents::from_json(&cart.to_json()).unwrap();
    assert_eq!(restored, cart);
    assert!(CartContents::from_json(&serde_json::Value::Null).unwrap().is_empty());

    assert_eq!(cart.clear(), 2);
    assert!(cart.is_empty());
    assert_eq!(cart.total_quantity(), 0);
}

#[tokio::test]
async fn cart_errors_map_to_http_errors() {
    assert!(matches!(
        AppError::from(CartError::InvalidQuantity),
        AppError::BadRequest(_)
    ));
    assert!(matches!(
        AppError::from(CartError::NotInCart("A".into())),
        AppError::NotFound(_)
    ));
}

#[tokio::test]
async fn full_quantity_lifecycle() {
    let mut cart = CartContents::new();
    assert_eq!(cart.add("YL24001-红色-90", 2, at(0)).unwrap(), 2);
    assert_eq!(cart.increment("YL24001-红色-90", 3, at(1)).unwrap(), 5);
    for (step, expected) in [4, 3, 2, 1].into_iter().enumerate() {
        assert_eq!(
            cart.decrement("YL24001-红色-90", at(2 + step as i64)).unwrap(),
            expected
        );
    }
    assert!(matches!(
        cart.decrement("YL24001-红色-90", at(10)),
        Err(CartError::WouldReachZero {
            current_quantity: 1,
            ..
        })
    ));
    assert_eq!(cart.quantity_of("YL24001-红色-90"), 1);

    assert!(cart.remove("YL24001-红色-90"));
    assert_eq!(cart.total_quantity(), 0);
    assert!(cart.is_empty());
}
