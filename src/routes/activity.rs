use axum::{
    Json, Router,
    extract::{Multipart, State},
    http::StatusCode,
    routing::post,
};

use crate::{
    dto::activities::{
        ActivityIdRequest, ActivityImageForm, ActivityImageList, NewActivityImage,
        UpdateRelationsRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::ActivityImage,
    response::ApiResponse,
    routes::{form::MultipartForm, params::ShopQuery},
    services::activity_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/add", post(add_activity_image))
        .route("/update_relations", post(update_relations))
        .route("/online", post(online))
        .route("/offline", post(offline))
        .route("/list", post(list_activity_images))
}

#[utoipa::path(
    post,
    path = "/api/activity/add",
    request_body(content = ActivityImageForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Activity image slot created as pending", body = ApiResponse<ActivityImage>),
        (status = 400, description = "Invalid image"),
    ),
    security(("bearer_auth" = []), ("access_token" = [])),
    tag = "Activity"
)]
pub async fn add_activity_image(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<ApiResponse<ActivityImage>>)> {
    let mut form = MultipartForm::read(multipart).await?;
    let image = form.take_file("image");
    let new = NewActivityImage {
        category: form.text("category"),
        notes: form.text("notes"),
        commodities: form.text("commodities"),
    };
    let resp = activity_service::add_activity_image(&state, &user, new, image).await?;
    Ok(resp.with_status())
}

#[utoipa::path(
    post,
    path = "/api/activity/update_relations",
    request_body = UpdateRelationsRequest,
    responses(
        (status = 200, description = "Related commodities updated", body = ApiResponse<ActivityImage>),
        (status = 400, description = "Unknown commodity ids or too many for an online slot"),
        (status = 404, description = "Activity image not found"),
    ),
    security(("bearer_auth" = []), ("access_token" = [])),
    tag = "Activity"
)]
pub async fn update_relations(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateRelationsRequest>,
) -> AppResult<Json<ApiResponse<ActivityImage>>> {
    let resp = activity_service::update_relations(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/activity/online",
    request_body = ActivityIdRequest,
    responses(
        (status = 200, description = "Activity image is online", body = ApiResponse<ActivityImage>),
        (status = 400, description = "Too many related commodities or online slots"),
        (status = 404, description = "Activity image not found"),
    ),
    security(("bearer_auth" = []), ("access_token" = [])),
    tag = "Activity"
)]
pub async fn online(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ActivityIdRequest>,
) -> AppResult<Json<ApiResponse<ActivityImage>>> {
    let resp = activity_service::set_online(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/activity/offline",
    request_body = ActivityIdRequest,
    responses(
        (status = 200, description = "Activity image is offline", body = ApiResponse<ActivityImage>),
        (status = 404, description = "Activity image not found"),
    ),
    security(("bearer_auth" = []), ("access_token" = [])),
    tag = "Activity"
)]
pub async fn offline(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ActivityIdRequest>,
) -> AppResult<Json<ApiResponse<ActivityImage>>> {
    let resp = activity_service::set_offline(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/activity/list",
    request_body = ShopQuery,
    responses(
        (status = 200, description = "All activity image slots", body = ApiResponse<ActivityImageList>),
        (status = 400, description = "Invalid shopname"),
    ),
    security(("access_token" = [])),
    tag = "Activity"
)]
pub async fn list_activity_images(
    State(state): State<AppState>,
    Json(payload): Json<ShopQuery>,
) -> AppResult<Json<ApiResponse<ActivityImageList>>> {
    let resp = activity_service::list_activity_images(&state, &payload.shopname).await?;
    Ok(Json(resp))
}
