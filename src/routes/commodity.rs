use axum::{
    Json, Router,
    extract::{Multipart, State},
    http::StatusCode,
    routing::post,
};

use crate::{
    dto::commodities::{
        BatchByIdsRequest, BatchByIdsResult, CategoryList, CommodityCreated, CommodityDetail,
        CommodityIdRequest, CommodityStatusRequest, CommodityStatusView, CommoditySummaryList,
        CommodityUploads, CreateCommodityForm, DeletedCommodity, GoodsList, GoodsQuery,
        NewCommodity, SearchByNameRequest, StyleCodeQuery, StyleFamilyView, StyleStatusRequest,
        StyleStatusResult, UpdateCommodityRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::{form::MultipartForm, params::ShopQuery},
    services::commodity_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/add_goods", post(add_goods))
        .route("/delete_goods", post(delete_goods))
        .route("/update_goods", post(update_goods))
        .route("/detail", post(detail))
        .route("/set_status", post(set_status))
        .route("/get_status", post(get_status))
        .route("/style_status", post(style_status))
        .route("/style_code_commodities", post(style_code_commodities))
        .route("/goods_query", post(goods_query))
        .route("/categories", post(categories))
        .route("/search_by_name", post(search_by_name))
        .route("/batch_by_ids", post(batch_by_ids))
}

fn commodity_form(mut form: MultipartForm) -> AppResult<(NewCommodity, CommodityUploads)> {
    let new = NewCommodity {
        commodity_id: form.text("commodity_id"),
        name: form.text("name"),
        style_code: form.text("style_code"),
        category: form.text("category"),
        category_detail: form.text("category_detail"),
        price: form.parse("price")?.unwrap_or_default(),
        size: form.text("size"),
        color: form.text("color"),
        height: form.text("height"),
        spec_code: form.text("spec_code"),
        notes: form.text("notes"),
    };
    let uploads = CommodityUploads {
        image: form.take_file("image"),
        promo_image: form.take_file("promo_image"),
        color_image: form.take_file("color_image"),
        gallery: form.take_files("images"),
    };
    Ok((new, uploads))
}

#[utoipa::path(
    post,
    path = "/api/commodity/add_goods",
    request_body(content = CreateCommodityForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Commodity created; main image may be shared with its style", body = ApiResponse<CommodityCreated>),
        (status = 400, description = "Missing fields or invalid image"),
        (status = 409, description = "Commodity id already exists"),
    ),
    security(("bearer_auth" = []), ("access_token" = [])),
    tag = "Commodity"
)]
pub async fn add_goods(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<ApiResponse<CommodityCreated>>)> {
    let form = MultipartForm::read(multipart).await?;
    let (new, uploads) = commodity_form(form)?;
    let resp = commodity_service::create_commodity(&state, &user, new, uploads).await?;
    Ok(resp.with_status())
}

#[utoipa::path(
    post,
    path = "/api/commodity/delete_goods",
    request_body = CommodityIdRequest,
    responses(
        (status = 200, description = "Commodity and its unshared images removed", body = ApiResponse<DeletedCommodity>),
        (status = 404, description = "Commodity not found"),
    ),
    security(("bearer_auth" = []), ("access_token" = [])),
    tag = "Commodity"
)]
pub async fn delete_goods(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CommodityIdRequest>,
) -> AppResult<Json<ApiResponse<DeletedCommodity>>> {
    let resp = commodity_service::delete_commodity(&state, &user, &payload.commodity_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/commodity/update_goods",
    request_body = UpdateCommodityRequest,
    responses(
        (status = 200, description = "Commodity updated", body = ApiResponse<CommodityDetail>),
        (status = 404, description = "Commodity not found"),
    ),
    security(("bearer_auth" = []), ("access_token" = [])),
    tag = "Commodity"
)]
pub async fn update_goods(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateCommodityRequest>,
) -> AppResult<Json<ApiResponse<CommodityDetail>>> {
    let resp = commodity_service::update_commodity(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/commodity/detail",
    request_body = CommodityIdRequest,
    responses(
        (status = 200, description = "Commodity with images", body = ApiResponse<CommodityDetail>),
        (status = 404, description = "Commodity not found"),
    ),
    security(("access_token" = [])),
    tag = "Commodity"
)]
pub async fn detail(
    State(state): State<AppState>,
    Json(payload): Json<CommodityIdRequest>,
) -> AppResult<Json<ApiResponse<CommodityDetail>>> {
    let resp = commodity_service::get_commodity_detail(&state, &payload.commodity_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/commodity/set_status",
    request_body = CommodityStatusRequest,
    responses(
        (status = 200, description = "Commodity status changed", body = ApiResponse<CommodityStatusView>),
        (status = 404, description = "Commodity not found"),
    ),
    security(("bearer_auth" = []), ("access_token" = [])),
    tag = "Commodity"
)]
pub async fn set_status(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CommodityStatusRequest>,
) -> AppResult<Json<ApiResponse<CommodityStatusView>>> {
    let resp = commodity_service::set_commodity_status(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/commodity/get_status",
    request_body = CommodityIdRequest,
    responses(
        (status = 200, description = "Commodity status", body = ApiResponse<CommodityStatusView>),
        (status = 404, description = "Commodity not found"),
    ),
    security(("access_token" = [])),
    tag = "Commodity"
)]
pub async fn get_status(
    State(state): State<AppState>,
    Json(payload): Json<CommodityIdRequest>,
) -> AppResult<Json<ApiResponse<CommodityStatusView>>> {
    let resp = commodity_service::get_commodity_status(&state, &payload.commodity_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/commodity/style_status",
    request_body = StyleStatusRequest,
    responses(
        (status = 200, description = "Style family status changed", body = ApiResponse<StyleStatusResult>),
        (status = 404, description = "Style has no commodities"),
    ),
    security(("bearer_auth" = []), ("access_token" = [])),
    tag = "Commodity"
)]
pub async fn style_status(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<StyleStatusRequest>,
) -> AppResult<Json<ApiResponse<StyleStatusResult>>> {
    let resp = commodity_service::set_style_family_status(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/commodity/style_code_commodities",
    request_body = StyleCodeQuery,
    responses(
        (status = 200, description = "Online commodities of a style, grouped by color", body = ApiResponse<StyleFamilyView>),
        (status = 404, description = "No online commodities for the style"),
    ),
    security(("access_token" = [])),
    tag = "Commodity"
)]
pub async fn style_code_commodities(
    State(state): State<AppState>,
    Json(payload): Json<StyleCodeQuery>,
) -> AppResult<Json<ApiResponse<StyleFamilyView>>> {
    let resp = commodity_service::style_code_commodities(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/commodity/goods_query",
    request_body = GoodsQuery,
    responses(
        (status = 200, description = "Paginated goods", body = ApiResponse<GoodsList>),
        (status = 400, description = "Invalid shopname"),
    ),
    security(("access_token" = [])),
    tag = "Commodity"
)]
pub async fn goods_query(
    State(state): State<AppState>,
    Json(payload): Json<GoodsQuery>,
) -> AppResult<Json<ApiResponse<GoodsList>>> {
    let resp = commodity_service::goods_query(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/commodity/categories",
    request_body = ShopQuery,
    responses(
        (status = 200, description = "Distinct categories", body = ApiResponse<CategoryList>),
        (status = 400, description = "Invalid shopname"),
    ),
    security(("access_token" = [])),
    tag = "Commodity"
)]
pub async fn categories(
    State(state): State<AppState>,
    Json(payload): Json<ShopQuery>,
) -> AppResult<Json<ApiResponse<CategoryList>>> {
    let resp = commodity_service::categories(&state, &payload.shopname).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/commodity/search_by_name",
    request_body = SearchByNameRequest,
    responses(
        (status = 200, description = "Commodities whose name contains the search string", body = ApiResponse<CommoditySummaryList>),
    ),
    security(("access_token" = [])),
    tag = "Commodity"
)]
pub async fn search_by_name(
    State(state): State<AppState>,
    Json(payload): Json<SearchByNameRequest>,
) -> AppResult<Json<ApiResponse<CommoditySummaryList>>> {
    let resp = commodity_service::search_by_name(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/commodity/batch_by_ids",
    request_body = BatchByIdsRequest,
    responses(
        (status = 200, description = "Requested commodities, optionally projected to `fields`", body = ApiResponse<BatchByIdsResult>),
    ),
    security(("access_token" = [])),
    tag = "Commodity"
)]
pub async fn batch_by_ids(
    State(state): State<AppState>,
    Json(payload): Json<BatchByIdsRequest>,
) -> AppResult<Json<ApiResponse<BatchByIdsResult>>> {
    let resp = commodity_service::batch_by_ids(&state, payload).await?;
    Ok(Json(resp))
}
