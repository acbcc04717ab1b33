use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::post,
};

use crate::{
    dto::auth::{
        ChangePasswordRequest, StaffAccount, StaffLoginRequest, StaffLoginResponse,
        StaffRegisterRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::staff_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/change_password", post(change_password))
}

#[utoipa::path(
    post,
    path = "/api/staff/register",
    request_body = StaffRegisterRequest,
    responses(
        (status = 201, description = "Staff account created", body = ApiResponse<StaffAccount>),
        (status = 403, description = "Caller is not an admin"),
        (status = 409, description = "Mobile already registered for this kind"),
    ),
    security(("bearer_auth" = []), ("access_token" = [])),
    tag = "Staff"
)]
pub async fn register(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<StaffRegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<StaffAccount>>)> {
    let resp = staff_service::register_staff(&state, &user, payload).await?;
    Ok(resp.with_status())
}

#[utoipa::path(
    post,
    path = "/api/staff/login",
    request_body = StaffLoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<StaffLoginResponse>),
        (status = 401, description = "Wrong password"),
        (status = 404, description = "Unknown staff member"),
    ),
    security(("access_token" = [])),
    tag = "Staff"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<StaffLoginRequest>,
) -> AppResult<Json<ApiResponse<StaffLoginResponse>>> {
    let resp = staff_service::login_staff(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/staff/change_password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = ApiResponse<StaffAccount>),
        (status = 401, description = "Old password does not match"),
    ),
    security(("access_token" = [])),
    tag = "Staff"
)]
pub async fn change_password(
    State(state): State<AppState>,
    Json(payload): Json<ChangePasswordRequest>,
) -> AppResult<Json<ApiResponse<StaffAccount>>> {
    let resp = staff_service::change_password(&state, payload).await?;
    Ok(Json(resp))
}
