use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use crate::{
    dto::access_tokens::{IpList, TokenIssued},
    error::AppResult,
    middleware::access_token::ClientIp,
    response::ApiResponse,
    routes::params::ShopQuery,
    services::access_token_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/get_token", get(get_token).post(get_token))
        .route("/get_ips", post(get_ips))
}

#[utoipa::path(
    get,
    path = "/api/access_token/get_token",
    responses(
        (status = 201, description = "New token bound to the caller IP", body = ApiResponse<TokenIssued>),
        (status = 200, description = "Token already bound to the caller IP", body = ApiResponse<TokenIssued>),
    ),
    tag = "AccessToken"
)]
pub async fn get_token(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
) -> AppResult<(StatusCode, Json<ApiResponse<TokenIssued>>)> {
    let resp = access_token_service::get_token(&state, &ip).await?;
    Ok(resp.with_status())
}

#[utoipa::path(
    post,
    path = "/api/access_token/get_ips",
    request_body = ShopQuery,
    responses(
        (status = 200, description = "IPs holding a token", body = ApiResponse<IpList>),
        (status = 400, description = "Invalid shopname"),
    ),
    tag = "AccessToken"
)]
pub async fn get_ips(
    State(state): State<AppState>,
    Json(payload): Json<ShopQuery>,
) -> AppResult<Json<ApiResponse<IpList>>> {
    let resp = access_token_service::list_ips(&state, &payload.shopname).await?;
    Ok(Json(resp))
}
