use youlan_api::{
    dto::auth::StaffKind,
    error::AppError,
    middleware::auth::{AuthUser, decode_access_token, ensure_admin, ensure_staff},
    services::{
        auth_service::{
            default_wechat_nickname, hash_password, is_valid_mobile, issue_tokens, verify_password,
        },
        staff_service::generate_staff_id,
    },
};

const SECRET: &str = "test-secret";

#[tokio::test]
async fn mobile_numbers_follow_mainland_format() {
    assert!(is_valid_mobile("13800138000"));
    assert!(is_valid_mobile("19912345678"));
    assert!(!is_valid_mobile("12800138000"));
    assert!(!is_valid_mobile("1380013800"));
    assert!(!is_valid_mobile("+8613800138000"));
}

#[tokio::test]
async fn passwords_hash_and_verify() {
    let hash = hash_password("s3cret!").unwrap();
    assert_ne!(hash, "s3cret!");
    assert!(verify_password("s3cret!", &hash).unwrap());
    assert!(!verify_password("wrong", &hash).unwrap());
}

#[tokio::test]
async fn access_tokens_decode_and_refresh_tokens_do_not() {
    let pair = issue_tokens("42", "customer", SECRET).unwrap();

    let claims = decode_access_token(&pair.access, SECRET).unwrap();
    assert_eq!(claims.sub, "42");
    assert_eq!(claims.role, "customer");

    assert!(matches!(
        decode_access_token(&pair.refresh, SECRET),
        Err(AppError::Unauthorized(_))
    ));
    assert!(matches!(
        decode_access_token(&pair.access, "other-secret"),
        Err(AppError::Unauthorized(_))
    ));
}

#[tokio::test]
async fn staff_roles_gate_endpoints() {
    let operation = AuthUser {
        subject: "100001".into(),
        role: StaffKind::Operation.role().into(),
    };
    let service = AuthUser {
        subject: "100002".into(),
        role: StaffKind::CustomerService.role().into(),
    };
    let customer = AuthUser {
        subject: "7".into(),
        role: "customer".into(),
    };

    assert!(ensure_admin(&operation).is_ok());
    assert!(matches!(ensure_admin(&service), Err(AppError::Forbidden)));
    assert!(ensure_staff(&service).is_ok());
    assert!(matches!(ensure_staff(&customer), Err(AppError::Forbidden)));
}

#[tokio::test]
async fn generated_defaults() {
    let id = generate_staff_id();
    assert_eq!(id.len(), 6);
    let n: u32 = id.parse().unwrap();
    assert!((100_000..=999_999).contains(&n));

    assert_eq!(default_wechat_nickname("oAbCdEfGhIjK"), "微信用户_oAbCdEfG");
    assert_eq!(default_wechat_nickname("abc"), "微信用户_abc");
}
