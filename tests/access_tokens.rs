use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::http::{HeaderMap, HeaderValue};
use youlan_api::{
    error::AppError,
    middleware::access_token::{
        AccessTokenGate, client_ip, is_exempt, token_from_form, token_from_query,
    },
    services::access_token_service::generate_token,
};

#[tokio::test]
async fn generated_tokens_are_32_hex_chars() {
    let a = generate_token();
    let b = generate_token();
    assert_eq!(a.len(), 32);
    assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    assert_ne!(a, b);
}

#[tokio::test]
async fn client_ip_prefers_first_forwarded_hop() {
    let peer: SocketAddr = "10.0.0.9:5555".parse().unwrap();
    let mut headers = HeaderMap::new();
    assert_eq!(client_ip(&headers, Some(peer)).as_deref(), Some("10.0.0.9"));

    headers.insert(
        "x-forwarded-for",
        HeaderValue::from_static(" 203.0.113.7 , 10.0.0.1"),
    );
    assert_eq!(client_ip(&headers, Some(peer)).as_deref(), Some("203.0.113.7"));

    headers.insert("x-forwarded-for", HeaderValue::from_static(""));
    assert_eq!(client_ip(&headers, None), None);
}

#[tokio::test]
async fn tokens_are_read_from_query_and_form() {
    assert_eq!(
        token_from_query(Some("page=1&access_token=abc123")).as_deref(),
        Some("abc123")
    );
    assert_eq!(token_from_query(Some("access_token=")), None);
    assert_eq!(token_from_query(None), None);
    assert_eq!(
        token_from_form(b"user_id=3&access_token=f00d").as_deref(),
        Some("f00d")
    );
}

#[tokio::test]
async fn public_paths_skip_the_gate() {
    assert!(is_exempt("/health"));
    assert!(is_exempt("/docs"));
    assert!(is_exempt("/media/commodities/YL1/a.jpg"));
    assert!(is_exempt("/api/access_token/get_token"));
    assert!(!is_exempt("/api/cart/add_to_cart"));
    assert!(!is_exempt("/api/users/register"));
}

#[tokio::test]
async fn gate_caches_bindings_and_evicts_on_mismatch() {
    let gate = AccessTokenGate::new(Duration::from_secs(300));
    let loads = Arc::new(AtomicUsize::new(0));

    let load = |loads: Arc<AtomicUsize>| async move {
        loads.fetch_add(1, Ordering::SeqCst);
        Ok::<_, AppError>(Some("1.2.3.4".to_string()))
    };

    gate.validate("tok", "1.2.3.4", || load(loads.clone()))
        .await
        .unwrap();
    gate.validate("tok", "1.2.3.4", || load(loads.clone()))
        .await
        .unwrap();
    assert_eq!(loads.load(Ordering::SeqCst), 1);
    assert!(gate.is_cached("tok").await);

    let err = gate
        .validate("tok", "5.6.7.8", || load(loads.clone()))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
    assert!(!gate.is_cached("tok").await);
}

#[tokio::test]
async fn unknown_tokens_are_rejected() {
    let gate = AccessTokenGate::new(Duration::from_secs(300));
    let err = gate
        .validate("nope", "1.2.3.4", || async { Ok(None) })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));

    gate.remember("fresh", "9.9.9.9").await;
    gate.validate("fresh", "9.9.9.9", || async { Ok(None) })
        .await
        .unwrap();
}
