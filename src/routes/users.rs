use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::post,
};

use crate::{
    dto::auth::{
        LoginRequest, LoginResponse, MobileQuery, RegisterRequest, UpdateUserRequest, UserIdData,
        UserIdQuery, WechatLoginRequest, WechatLoginResponse,
    },
    error::AppResult,
    models::UserProfile,
    response::ApiResponse,
    services::auth_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/verify_login", post(verify_login))
        .route("/wechat_login", post(wechat_login))
        .route("/get_user", post(get_user))
        .route("/get_user_id", post(get_user_id))
        .route("/update_user", post(update_user))
}

#[utoipa::path(
    post,
    path = "/api/users/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = ApiResponse<UserProfile>),
        (status = 400, description = "Invalid mobile or missing fields"),
        (status = 409, description = "Mobile already registered"),
    ),
    security(("access_token" = [])),
    tag = "Users"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<UserProfile>>)> {
    let resp = auth_service::register_user(&state, payload).await?;
    Ok(resp.with_status())
}

#[utoipa::path(
    post,
    path = "/api/users/verify_login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Wrong password"),
        (status = 404, description = "Unknown mobile"),
    ),
    security(("access_token" = [])),
    tag = "Users"
)]
pub async fn verify_login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let resp = auth_service::login_user(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/users/wechat_login",
    request_body = WechatLoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<WechatLoginResponse>),
        (status = 400, description = "Code rejected by WeChat"),
        (status = 502, description = "WeChat unreachable"),
    ),
    security(("access_token" = [])),
    tag = "Users"
)]
pub async fn wechat_login(
    State(state): State<AppState>,
    Json(payload): Json<WechatLoginRequest>,
) -> AppResult<Json<ApiResponse<WechatLoginResponse>>> {
    let resp = auth_service::wechat_login(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/users/get_user",
    request_body = UserIdQuery,
    responses(
        (status = 200, description = "User profile", body = ApiResponse<UserProfile>),
        (status = 404, description = "User not found"),
    ),
    security(("access_token" = [])),
    tag = "Users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    Json(payload): Json<UserIdQuery>,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    let resp = auth_service::get_user(&state, payload.user_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/users/get_user_id",
    request_body = MobileQuery,
    responses(
        (status = 200, description = "User id for the mobile", body = ApiResponse<UserIdData>),
        (status = 404, description = "User not found"),
    ),
    security(("access_token" = [])),
    tag = "Users"
)]
pub async fn get_user_id(
    State(state): State<AppState>,
    Json(payload): Json<MobileQuery>,
) -> AppResult<Json<ApiResponse<UserIdData>>> {
    let resp = auth_service::get_user_id_by_mobile(&state, &payload.mobile).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/users/update_user",
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = ApiResponse<UserProfile>),
        (status = 404, description = "User not found"),
    ),
    security(("access_token" = [])),
    tag = "Users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    Json(payload): Json<UpdateUserRequest>,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    let resp = auth_service::update_user(&state, payload).await?;
    Ok(Json(resp))
}
