use std::sync::LazyLock;

use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use regex::Regex;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, ActiveValue::NotSet};

use crate::{
    audit,
    dto::auth::{
        Claims, LoginRequest, LoginResponse, RegisterRequest, TokenPair, UpdateUserRequest,
        UserIdData, WechatLoginRequest, WechatLoginResponse,
    },
    entity::users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel},
    error::{AppError, AppResult},
    models::UserProfile,
    response::{ApiResponse, Meta},
    retry::{RetryPolicy, with_retry},
    state::AppState,
};

pub const CUSTOMER_ROLE: &str = "customer";
const ACCESS_TTL_HOURS: i64 = 24;
const REFRESH_TTL_DAYS: i64 = 7;

static MOBILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^1[3-9]\d{9}$").expect("Invalid regex"));

/// Mainland China mobile number.
pub fn is_valid_mobile(mobile: &str) -> bool {
    MOBILE_RE.is_match(mobile)
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string())
}

pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

fn sign(claims: &Claims, secret: &str) -> AppResult<String> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

/// Access token valid for a day, refresh token for a week.
pub fn issue_tokens(subject: &str, role: &str, secret: &str) -> AppResult<TokenPair> {
    let now = Utc::now();
    let claims = |typ: &str, ttl: Duration| Claims {
        sub: subject.to_string(),
        role: role.to_string(),
        typ: typ.to_string(),
        exp: (now + ttl).timestamp() as usize,
    };
    Ok(TokenPair {
        access: sign(&claims("access", Duration::hours(ACCESS_TTL_HOURS)), secret)?,
        refresh: sign(&claims("refresh", Duration::days(REFRESH_TTL_DAYS)), secret)?,
    })
}

pub fn default_wechat_nickname(openid: &str) -> String {
    let prefix: String = openid.chars().take(8).collect();
    format!("微信用户_{prefix}")
}

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<UserProfile>> {
    let RegisterRequest {
        mobile,
        nickname,
        password,
    } = payload;
    if !is_valid_mobile(&mobile) {
        return Err(AppError::bad_request("Invalid mobile number"));
    }
    if nickname.trim().is_empty() || password.is_empty() {
        return Err(AppError::bad_request("nickname and password are required"));
    }

    let exist = Users::find()
        .filter(UserCol::Mobile.eq(mobile.as_str()))
        .one(&state.orm)
        .await?;
    if exist.is_some() {
        return Err(AppError::Conflict("Mobile number is already registered".into()));
    }

    let user = UserActive {
        user_id: NotSet,
        mobile: Set(Some(mobile)),
        nickname: Set(nickname.trim().to_string()),
        password_hash: Set(Some(hash_password(&password)?)),
        registered_at: Set(Utc::now().into()),
        ..Default::default()
    }
    .insert(&state.orm)
    .await
    .map_err(|e| match AppError::from(e) {
        err if err.is_unique_violation() => {
            AppError::Conflict("Mobile number is already registered".into())
        }
        err => err,
    })?;

    audit::record(
        &state.pool,
        Some(&user.user_id.to_string()),
        "user_register",
        "users",
        serde_json::json!({ "user_id": user.user_id }),
    )
    .await;

    Ok(ApiResponse::created("User created", UserProfile::from(user)))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { mobile, password } = payload;
    let orm = &state.orm;
    let mobile_ref = mobile.as_str();
    let user = with_retry(RetryPolicy::default(), || async move {
        Ok(Users::find()
            .filter(UserCol::Mobile.eq(mobile_ref))
            .one(orm)
            .await?)
    })
    .await?
    .ok_or_else(|| AppError::not_found("User does not exist"))?;

    let hash = user
        .password_hash
        .as_deref()
        .ok_or_else(|| AppError::Unauthorized("Password login is not enabled for this account".into()))?;
    if !verify_password(&password, hash)? {
        return Err(AppError::Unauthorized("Incorrect password".into()));
    }

    let token = issue_tokens(&user.user_id.to_string(), CUSTOMER_ROLE, &state.config.jwt_secret)?;
    let user = touch_login(state, user).await?;

    audit::record(
        &state.pool,
        Some(&user.user_id.to_string()),
        "user_login",
        "users",
        serde_json::json!({ "user_id": user.user_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse {
            user_id: user.user_id,
            nickname: user.nickname,
            token,
        },
        Some(Meta::empty()),
    ))
}

async fn touch_login(state: &AppState, user: UserModel) -> AppResult<UserModel> {
    let mut active: UserActive = user.into();
    active.last_login_at = Set(Some(Utc::now().into()));
    Ok(active.update(&state.orm).await?)
}

async fn find_by_openid(state: &AppState, openid: &str) -> AppResult<Option<UserModel>> {
    Ok(Users::find()
        .filter(UserCol::Openid.eq(openid))
        .one(&state.orm)
        .await?)
}

pub async fn wechat_login(
    state: &AppState,
    payload: WechatLoginRequest,
) -> AppResult<ApiResponse<WechatLoginResponse>> {
    if payload.code.trim().is_empty() {
        return Err(AppError::bad_request("code is required"));
    }
    let session = state.wechat.exchange_code(payload.code.trim()).await?;

    let (user, is_new_user) = match find_by_openid(state, &session.openid).await? {
        Some(existing) => {
            let mut active: UserActive = existing.into();
            if let Some(nickname) = payload.nickname.filter(|n| !n.trim().is_empty()) {
                active.nickname = Set(nickname);
            }
            if let Some(avatar) = payload.avatar_url.filter(|a| !a.is_empty()) {
                active.avatar_url = Set(Some(avatar));
            }
            active.last_login_at = Set(Some(Utc::now().into()));
            (active.update(&state.orm).await?, false)
        }
        None => {
            let now = Utc::now();
            let inserted = UserActive {
                user_id: NotSet,
                openid: Set(Some(session.openid.clone())),
                nickname: Set(payload
                    .nickname
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| default_wechat_nickname(&session.openid))),
                avatar_url: Set(payload.avatar_url.filter(|a| !a.is_empty())),
                registered_at: Set(now.into()),
                last_login_at: Set(Some(now.into())),
                ..Default::default()
            }
            .insert(&state.orm)
            .await
            .map_err(AppError::from);

            match inserted {
                Ok(user) => (user, true),
                // Two logins with the same code raced; the other one created the row.
                Err(err) if err.is_unique_violation() => {
                    let user = find_by_openid(state, &session.openid)
                        .await?
                        .ok_or(err)?;
                    (user, false)
                }
                Err(err) => return Err(err),
            }
        }
    };

    let token = issue_tokens(&user.user_id.to_string(), CUSTOMER_ROLE, &state.config.jwt_secret)?;
    tracing::info!(user_id = user.user_id, is_new_user, "wechat login");
    audit::record(
        &state.pool,
        Some(&user.user_id.to_string()),
        "wechat_login",
        "users",
        serde_json::json!({ "user_id": user.user_id, "is_new_user": is_new_user }),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged in",
        WechatLoginResponse {
            user_id: user.user_id,
            is_new_user,
            token,
        },
        Some(Meta::empty()),
    ))
}

async fn find_user(state: &AppState, user_id: i32) -> AppResult<UserModel> {
    let orm = &state.orm;
    with_retry(RetryPolicy::default(), || async move {
        Ok(Users::find_by_id(user_id).one(orm).await?)
    })
    .await?
    .ok_or_else(|| AppError::not_found(format!("User {user_id} does not exist")))
}

pub async fn get_user(state: &AppState, user_id: i32) -> AppResult<ApiResponse<UserProfile>> {
    let user = find_user(state, user_id).await?;
    Ok(ApiResponse::success("OK", user.into(), Some(Meta::empty())))
}

pub async fn get_user_id_by_mobile(
    state: &AppState,
    mobile: &str,
) -> AppResult<ApiResponse<UserIdData>> {
    if !is_valid_mobile(mobile) {
        return Err(AppError::bad_request("Invalid mobile number"));
    }
    let user = Users::find()
        .filter(UserCol::Mobile.eq(mobile))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("No user with this mobile number"))?;
    Ok(ApiResponse::success(
        "OK",
        UserIdData {
            user_id: user.user_id,
        },
        Some(Meta::empty()),
    ))
}

pub async fn update_user(
    state: &AppState,
    payload: UpdateUserRequest,
) -> AppResult<ApiResponse<UserProfile>> {
    let user = find_user(state, payload.user_id).await?;
    let mut active: UserActive = user.into();

    if let Some(nickname) = payload.nickname {
        if nickname.trim().is_empty() {
            return Err(AppError::bad_request("nickname must not be empty"));
        }
        active.nickname = Set(nickname);
    }
    if let Some(avatar_url) = payload.avatar_url {
        active.avatar_url = Set(Some(avatar_url));
    }
    if let Some(default_receiver) = payload.default_receiver {
        active.default_receiver = Set(Some(default_receiver));
    }
    if let Some(province) = payload.province {
        active.province = Set(Some(province));
    }
    if let Some(city) = payload.city {
        active.city = Set(Some(city));
    }
    if let Some(county) = payload.county {
        active.county = Set(Some(county));
    }
    if let Some(detailed_address) = payload.detailed_address {
        active.detailed_address = Set(Some(detailed_address));
    }
    if let Some(remarks) = payload.remarks {
        active.remarks = Set(Some(remarks));
    }

    let updated = active.update(&state.orm).await?;
    Ok(ApiResponse::success(
        "User updated",
        updated.into(),
        Some(Meta::empty()),
    ))
}
