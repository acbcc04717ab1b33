use chrono::Utc;
use rand::Rng;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};

use crate::{
    audit,
    dto::auth::{
        ChangePasswordRequest, StaffAccount, StaffKind, StaffLoginRequest, StaffLoginResponse,
        StaffRegisterRequest,
    },
    entity::operation_users::{
        ActiveModel as StaffActive, Column as StaffCol, Entity as OperationUsers,
        Model as StaffModel,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    response::{ApiResponse, Meta},
    retry::{RetryPolicy, with_retry},
    services::auth_service::{hash_password, is_valid_mobile, issue_tokens, verify_password},
    state::AppState,
};

const MAX_ID_ATTEMPTS: usize = 10;

/// Six decimal digits, no leading zero.
pub fn generate_staff_id() -> String {
    rand::rng().random_range(100_000..=999_999).to_string()
}

fn account(m: StaffModel) -> StaffAccount {
    StaffAccount {
        user_id: m.user_id,
        nickname: m.nickname,
        mobile: m.mobile,
        kind: m.kind,
        level: m.level,
    }
}

pub async fn find_staff(state: &AppState, kind: StaffKind, mobile: &str) -> AppResult<Option<StaffModel>> {
    let orm = &state.orm;
    with_retry(RetryPolicy::default(), || async move {
        Ok(OperationUsers::find()
            .filter(StaffCol::Mobile.eq(mobile))
            .filter(StaffCol::Kind.eq(kind.as_str()))
            .one(orm)
            .await?)
    })
    .await
}

/// Inserts a staff account under a fresh random id.
pub async fn create_staff(state: &AppState, payload: StaffRegisterRequest) -> AppResult<StaffModel> {
    if !is_valid_mobile(&payload.mobile) {
        return Err(AppError::bad_request("Invalid mobile number"));
    }
    if payload.nickname.trim().is_empty() || payload.password.is_empty() {
        return Err(AppError::bad_request("nickname and password are required"));
    }
    let taken = OperationUsers::find()
        .filter(StaffCol::Mobile.eq(payload.mobile.as_str()))
        .one(&state.orm)
        .await?;
    if taken.is_some() {
        return Err(AppError::Conflict("Mobile number is already registered".into()));
    }

    let password_hash = hash_password(&payload.password)?;
    for _ in 0..MAX_ID_ATTEMPTS {
        let user_id = generate_staff_id();
        let inserted = StaffActive {
            user_id: Set(user_id),
            nickname: Set(payload.nickname.trim().to_string()),
            mobile: Set(payload.mobile.clone()),
            password_hash: Set(password_hash.clone()),
            kind: Set(payload.kind.as_str().to_string()),
            level: Set(payload.level.unwrap_or(0)),
            created_at: Set(Utc::now().into()),
        }
        .insert(&state.orm)
        .await
        .map_err(AppError::from);

        match inserted {
            Ok(staff) => return Ok(staff),
            Err(err) if err.is_unique_violation() => {
                // Either the id collided or the mobile was taken concurrently.
                if OperationUsers::find()
                    .filter(StaffCol::Mobile.eq(payload.mobile.as_str()))
                    .one(&state.orm)
                    .await?
                    .is_some()
                {
                    return Err(AppError::Conflict("Mobile number is already registered".into()));
                }
            }
            Err(err) => return Err(err),
        }
    }
    Err(AppError::Conflict("Could not allocate a staff id".into()))
}

pub async fn register_staff(
    state: &AppState,
    user: &AuthUser,
    payload: StaffRegisterRequest,
) -> AppResult<ApiResponse<StaffAccount>> {
    ensure_admin(user)?;
    let staff = create_staff(state, payload).await?;

    audit::record(
        &state.pool,
        Some(&user.subject),
        "staff_register",
        "operation_users",
        serde_json::json!({ "staff_id": staff.user_id, "kind": staff.kind }),
    )
    .await;

    Ok(ApiResponse::created("Staff account created", account(staff)))
}

pub async fn login_staff(
    state: &AppState,
    payload: StaffLoginRequest,
) -> AppResult<ApiResponse<StaffLoginResponse>> {
    let staff = find_staff(state, payload.kind, &payload.mobile)
        .await?
        .ok_or_else(|| AppError::not_found("Staff account does not exist"))?;
    if !verify_password(&payload.password, &staff.password_hash)? {
        return Err(AppError::Unauthorized("Incorrect password".into()));
    }

    let token = issue_tokens(&staff.user_id, payload.kind.role(), &state.config.jwt_secret)?;
    audit::record(
        &state.pool,
        Some(&staff.user_id),
        "staff_login",
        "operation_users",
        serde_json::json!({ "staff_id": staff.user_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged in",
        StaffLoginResponse {
            user_id: staff.user_id,
            nickname: staff.nickname,
            kind: staff.kind,
            token,
        },
        Some(Meta::empty()),
    ))
}

pub async fn change_password(
    state: &AppState,
    payload: ChangePasswordRequest,
) -> AppResult<ApiResponse<StaffAccount>> {
    if payload.new_password.is_empty() {
        return Err(AppError::bad_request("new_password must not be empty"));
    }
    let staff = find_staff(state, payload.kind, &payload.mobile)
        .await?
        .ok_or_else(|| AppError::not_found("Staff account does not exist"))?;
    if !verify_password(&payload.old_password, &staff.password_hash)? {
        return Err(AppError::Unauthorized("Incorrect password".into()));
    }

    let mut active: StaffActive = staff.into();
    active.password_hash = Set(hash_password(&payload.new_password)?);
    let staff = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(&staff.user_id),
        "staff_change_password",
        "operation_users",
        serde_json::json!({ "staff_id": staff.user_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Password changed",
        account(staff),
        Some(Meta::empty()),
    ))
}
