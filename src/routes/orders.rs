use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::post,
};

use crate::{
    dto::orders::{
        ChangeStatusRequest, CreateOrderRequest, LogisticsSyncResult, OrderCreated, OrderList,
        OrderListQuery, OrderLookup, StatusChanged, SyncLogisticsRequest, UpdateExpressRequest,
        UpdateReceiverRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Order,
    response::ApiResponse,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/add_order", post(add_order))
        .route("/get_order", post(get_order))
        .route("/update_receiver", post(update_receiver))
        .route("/change_status", post(change_status))
        .route("/update_express", post(update_express))
        .route("/sync_logistics", post(sync_logistics))
        .route("/orders_query", post(orders_query))
        .route("/user_orders", post(user_orders))
}

#[utoipa::path(
    post,
    path = "/api/orders/add_order",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = ApiResponse<OrderCreated>),
        (status = 400, description = "Missing fields or product_list is not an array"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Could not allocate a unique order id"),
    ),
    security(("access_token" = [])),
    tag = "Orders"
)]
pub async fn add_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<OrderCreated>>)> {
    let resp = order_service::create_order(&state, payload).await?;
    Ok(resp.with_status())
}

#[utoipa::path(
    post,
    path = "/api/orders/get_order",
    request_body = OrderLookup,
    responses(
        (status = 200, description = "Order", body = ApiResponse<Order>),
        (status = 404, description = "Order not found"),
    ),
    security(("access_token" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Json(payload): Json<OrderLookup>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::get_order(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/update_receiver",
    request_body = UpdateReceiverRequest,
    responses(
        (status = 200, description = "Receiver updated", body = ApiResponse<Order>),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = []), ("access_token" = [])),
    tag = "Orders"
)]
pub async fn update_receiver(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateReceiverRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::update_receiver(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/change_status",
    request_body = ChangeStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = ApiResponse<StatusChanged>),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = []), ("access_token" = [])),
    tag = "Orders"
)]
pub async fn change_status(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ChangeStatusRequest>,
) -> AppResult<Json<ApiResponse<StatusChanged>>> {
    let resp = order_service::change_status(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/update_express",
    request_body = UpdateExpressRequest,
    responses(
        (status = 200, description = "Express info updated", body = ApiResponse<Order>),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = []), ("access_token" = [])),
    tag = "Orders"
)]
pub async fn update_express(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateExpressRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::update_express(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/sync_logistics",
    request_body = SyncLogisticsRequest,
    responses(
        (status = 200, description = "Logistics trace, refreshed when the carrier answered", body = ApiResponse<LogisticsSyncResult>),
        (status = 400, description = "Order is not trackable"),
        (status = 404, description = "Order not found"),
    ),
    security(("access_token" = [])),
    tag = "Orders"
)]
pub async fn sync_logistics(
    State(state): State<AppState>,
    Json(payload): Json<SyncLogisticsRequest>,
) -> AppResult<Json<ApiResponse<LogisticsSyncResult>>> {
    let resp = order_service::sync_logistics(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/orders_query",
    request_body = OrderListQuery,
    responses(
        (status = 200, description = "Orders across users", body = ApiResponse<OrderList>),
        (status = 400, description = "Invalid shopname or date range"),
        (status = 403, description = "Caller is not staff"),
    ),
    security(("bearer_auth" = []), ("access_token" = [])),
    tag = "Orders"
)]
pub async fn orders_query(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_orders(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/user_orders",
    request_body = OrderListQuery,
    responses(
        (status = 200, description = "Orders of one user, with logistics", body = ApiResponse<OrderList>),
        (status = 400, description = "Invalid shopname, missing user_id or bad date range"),
    ),
    security(("access_token" = [])),
    tag = "Orders"
)]
pub async fn user_orders(
    State(state): State<AppState>,
    Json(payload): Json<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_user_orders(&state, payload).await?;
    Ok(Json(resp))
}
