use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::post,
};

use crate::{
    dto::{
        addresses::{AddAddressRequest, AddressList, AddressRef, UpdateAddressRequest},
        auth::UserIdQuery,
    },
    error::AppResult,
    models::Address,
    response::ApiResponse,
    services::address_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/add", post(add_address))
        .route("/delete", post(delete_address))
        .route("/update", post(update_address))
        .route("/set_default", post(set_default))
        .route("/list", post(list_addresses))
        .route("/get", post(get_address))
}

#[utoipa::path(
    post,
    path = "/api/address/add",
    request_body = AddAddressRequest,
    responses(
        (status = 201, description = "Address added", body = ApiResponse<Address>),
        (status = 404, description = "User not found"),
    ),
    security(("access_token" = [])),
    tag = "Address"
)]
pub async fn add_address(
    State(state): State<AppState>,
    Json(payload): Json<AddAddressRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Address>>)> {
    let resp = address_service::add_address(&state, payload).await?;
    Ok(resp.with_status())
}

#[utoipa::path(
    post,
    path = "/api/address/delete",
    request_body = AddressRef,
    responses(
        (status = 200, description = "Address deleted", body = ApiResponse<Address>),
        (status = 404, description = "Address not found for this user"),
    ),
    security(("access_token" = [])),
    tag = "Address"
)]
pub async fn delete_address(
    State(state): State<AppState>,
    Json(payload): Json<AddressRef>,
) -> AppResult<Json<ApiResponse<Address>>> {
    let resp = address_service::delete_address(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/address/update",
    request_body = UpdateAddressRequest,
    responses(
        (status = 200, description = "Address updated", body = ApiResponse<Address>),
        (status = 404, description = "Address not found for this user"),
    ),
    security(("access_token" = [])),
    tag = "Address"
)]
pub async fn update_address(
    State(state): State<AppState>,
    Json(payload): Json<UpdateAddressRequest>,
) -> AppResult<Json<ApiResponse<Address>>> {
    let resp = address_service::update_address(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/address/set_default",
    request_body = AddressRef,
    responses(
        (status = 200, description = "Default address set", body = ApiResponse<Address>),
        (status = 404, description = "Address not found for this user"),
    ),
    security(("access_token" = [])),
    tag = "Address"
)]
pub async fn set_default(
    State(state): State<AppState>,
    Json(payload): Json<AddressRef>,
) -> AppResult<Json<ApiResponse<Address>>> {
    let resp = address_service::set_default_address(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/address/list",
    request_body = UserIdQuery,
    responses(
        (status = 200, description = "Addresses, default first", body = ApiResponse<AddressList>),
        (status = 404, description = "User not found"),
    ),
    security(("access_token" = [])),
    tag = "Address"
)]
pub async fn list_addresses(
    State(state): State<AppState>,
    Json(payload): Json<UserIdQuery>,
) -> AppResult<Json<ApiResponse<AddressList>>> {
    let resp = address_service::list_addresses(&state, payload.user_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/address/get",
    request_body = AddressRef,
    responses(
        (status = 200, description = "Address", body = ApiResponse<Address>),
        (status = 404, description = "Address not found for this user"),
    ),
    security(("access_token" = [])),
    tag = "Address"
)]
pub async fn get_address(
    State(state): State<AppState>,
    Json(payload): Json<AddressRef>,
) -> AppResult<Json<ApiResponse<Address>>> {
    let resp = address_service::get_address(&state, payload).await?;
    Ok(Json(resp))
}
