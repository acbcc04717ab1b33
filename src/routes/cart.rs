use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};

use crate::{
    dto::cart::{
        AddToCartRequest, BatchDeleteRequest, BatchDeleteResult, CartItemQuantity,
        CartItemRequest, CartQuery, CartView, ClearCartResult, IncreaseQuantityRequest,
        UpdateQuantityRequest,
    },
    error::AppResult,
    response::ApiResponse,
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/add_to_cart", post(add_to_cart))
        .route("/delete_from_cart", post(delete_from_cart))
        .route("/batch_delete_from_cart", post(batch_delete_from_cart))
        .route(
            "/query_cart_items",
            get(query_cart_items).post(query_cart_items_json),
        )
        .route("/update_cart_item_quantity", post(update_cart_item_quantity))
        .route("/increase_cart_item_quantity", post(increase_cart_item_quantity))
        .route("/decrease_cart_item_quantity", post(decrease_cart_item_quantity))
        .route("/clear_cart", post(clear_cart))
}

#[utoipa::path(
    post,
    path = "/api/cart/add_to_cart",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Item added or quantity increased", body = ApiResponse<CartItemQuantity>),
        (status = 400, description = "Quantity must be positive"),
        (status = 404, description = "User not found"),
    ),
    security(("access_token" = [])),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    Json(payload): Json<AddToCartRequest>,
) -> AppResult<Json<ApiResponse<CartItemQuantity>>> {
    let resp = cart_service::add_to_cart(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart/delete_from_cart",
    request_body = CartItemRequest,
    responses(
        (status = 200, description = "Item removed", body = ApiResponse<BatchDeleteResult>),
        (status = 404, description = "User or item not found"),
    ),
    security(("access_token" = [])),
    tag = "Cart"
)]
pub async fn delete_from_cart(
    State(state): State<AppState>,
    Json(payload): Json<CartItemRequest>,
) -> AppResult<Json<ApiResponse<BatchDeleteResult>>> {
    let resp = cart_service::delete_from_cart(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart/batch_delete_from_cart",
    request_body = BatchDeleteRequest,
    responses(
        (status = 200, description = "Items removed; unknown codes reported", body = ApiResponse<BatchDeleteResult>),
        (status = 404, description = "User not found"),
    ),
    security(("access_token" = [])),
    tag = "Cart"
)]
pub async fn batch_delete_from_cart(
    State(state): State<AppState>,
    Json(payload): Json<BatchDeleteRequest>,
) -> AppResult<Json<ApiResponse<BatchDeleteResult>>> {
    let resp = cart_service::batch_delete(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/cart/query_cart_items",
    params(CartQuery),
    responses(
        (status = 200, description = "Cart items, most recent first", body = ApiResponse<CartView>),
        (status = 404, description = "User not found"),
    ),
    security(("access_token" = [])),
    tag = "Cart"
)]
pub async fn query_cart_items(
    State(state): State<AppState>,
    Query(query): Query<CartQuery>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::query_cart(&state, query.user_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart/query_cart_items",
    request_body = CartQuery,
    responses(
        (status = 200, description = "Cart items, most recent first", body = ApiResponse<CartView>),
        (status = 404, description = "User not found"),
    ),
    security(("access_token" = [])),
    tag = "Cart"
)]
pub async fn query_cart_items_json(
    State(state): State<AppState>,
    Json(query): Json<CartQuery>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::query_cart(&state, query.user_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart/update_cart_item_quantity",
    request_body = UpdateQuantityRequest,
    responses(
        (status = 200, description = "Quantity set", body = ApiResponse<CartItemQuantity>),
        (status = 400, description = "Quantity must be positive"),
        (status = 404, description = "User or item not found"),
    ),
    security(("access_token" = [])),
    tag = "Cart"
)]
pub async fn update_cart_item_quantity(
    State(state): State<AppState>,
    Json(payload): Json<UpdateQuantityRequest>,
) -> AppResult<Json<ApiResponse<CartItemQuantity>>> {
    let resp = cart_service::update_quantity(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart/increase_cart_item_quantity",
    request_body = IncreaseQuantityRequest,
    responses(
        (status = 200, description = "Quantity increased", body = ApiResponse<CartItemQuantity>),
        (status = 404, description = "User or item not found"),
    ),
    security(("access_token" = [])),
    tag = "Cart"
)]
pub async fn increase_cart_item_quantity(
    State(state): State<AppState>,
    Json(payload): Json<IncreaseQuantityRequest>,
) -> AppResult<Json<ApiResponse<CartItemQuantity>>> {
    let resp = cart_service::increase_quantity(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart/decrease_cart_item_quantity",
    request_body = CartItemRequest,
    responses(
        (status = 200, description = "Quantity decreased", body = ApiResponse<CartItemQuantity>),
        (status = 400, description = "Quantity would reach zero"),
        (status = 404, description = "User or item not found"),
    ),
    security(("access_token" = [])),
    tag = "Cart"
)]
pub async fn decrease_cart_item_quantity(
    State(state): State<AppState>,
    Json(payload): Json<CartItemRequest>,
) -> AppResult<Json<ApiResponse<CartItemQuantity>>> {
    let resp = cart_service::decrease_quantity(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart/clear_cart",
    request_body = CartQuery,
    responses(
        (status = 200, description = "Cart emptied", body = ApiResponse<ClearCartResult>),
        (status = 404, description = "User not found"),
    ),
    security(("access_token" = [])),
    tag = "Cart"
)]
pub async fn clear_cart(
    State(state): State<AppState>,
    Json(payload): Json<CartQuery>,
) -> AppResult<Json<ApiResponse<ClearCartResult>>> {
    let resp = cart_service::clear_cart(&state, payload.user_id).await?;
    Ok(Json(resp))
}
