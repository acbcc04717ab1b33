use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    ActiveValue::NotSet,
    sea_query::{Expr, LockType, OnConflict, extension::postgres::PgExpr},
};
use sqlx::{Postgres, QueryBuilder};

use crate::{
    audit,
    db::OrmConn,
    dto::commodities::{
        BatchByIdsRequest, BatchByIdsResult, CategoryList, ColorGroup, CommodityCreated,
        CommodityDetail, CommodityStatusRequest, CommodityStatusView, CommoditySummary,
        CommoditySummaryList, CommodityUploads, DeletedCommodity, GoodsDemand, GoodsItem,
        GoodsList, GoodsQuery, ImageView, NewCommodity, SearchByNameRequest, SizeEntry,
        StyleCodeQuery, StyleFamilyView, StyleStatusRequest, StyleStatusResult,
        UpdateCommodityRequest, UploadedFile,
    },
    entity::{
        commodities::{
            ActiveModel as CommodityActive, Column as CommodityCol, Entity as Commodities,
            Model as CommodityModel,
        },
        commodity_images::{
            ActiveModel as ImageActive, Column as ImageCol, Entity as CommodityImages,
            Model as ImageModel,
        },
        commodity_situations::{
            ActiveModel as SituationActive, Column as SituationCol, Entity as CommoditySituations,
        },
        style_code_situations::{
            ActiveModel as StyleActive, Column as StyleCol, Entity as StyleSituations,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{ListingStatus, Visibility},
    response::{ApiResponse, Meta, display_time},
    retry::{RetryPolicy, with_retry},
    routes::params::Pagination,
    state::AppState,
    storage::{ImageKind, ImageStore},
};

const GOODS_DEFAULT_PAGE_SIZE: i64 = 20;

fn utc(at: &chrono::DateTime<chrono::FixedOffset>) -> DateTime<Utc> {
    at.with_timezone(&Utc)
}

fn image_view(store: &ImageStore, m: &ImageModel) -> ImageView {
    ImageView {
        id: Some(m.id),
        url: store.public_url(&m.image),
        is_main: m.is_main,
        created_at: display_time(&utc(&m.created_at)),
    }
}

/// Image views for a commodity, falling back to its own image columns when it
/// has no image rows.
fn images_of(store: &ImageStore, commodity: &CommodityModel, rows: &[ImageModel]) -> Vec<ImageView> {
    if !rows.is_empty() {
        return rows.iter().map(|m| image_view(store, m)).collect();
    }
    commodity
        .image
        .as_ref()
        .or(commodity.promo_image.as_ref())
        .map(|path| ImageView {
            id: None,
            url: store.public_url(path),
            is_main: true,
            created_at: display_time(&utc(&commodity.created_at)),
        })
        .into_iter()
        .collect()
}

fn split_main(images: &[ImageView]) -> (Option<String>, Vec<String>) {
    let main = images.iter().find(|i| i.is_main).map(|i| i.url.clone());
    let others = images
        .iter()
        .filter(|i| !i.is_main)
        .map(|i| i.url.clone())
        .collect();
    (main, others)
}

async fn find_commodity(conn: &impl ConnectionTrait, commodity_id: &str) -> AppResult<CommodityModel> {
    Commodities::find_by_id(commodity_id.to_string())
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Commodity {commodity_id} does not exist")))
}

async fn image_rows(conn: &impl ConnectionTrait, commodity_id: &str) -> AppResult<Vec<ImageModel>> {
    Ok(CommodityImages::find()
        .filter(ImageCol::CommodityId.eq(commodity_id))
        .order_by_asc(ImageCol::CreatedAt)
        .order_by_asc(ImageCol::Id)
        .all(conn)
        .await?)
}

/// Main image already shared by the style family, if any.
pub async fn style_main_image(
    conn: &impl ConnectionTrait,
    style_code: &str,
) -> AppResult<Option<String>> {
    let row = CommodityImages::find()
        .inner_join(Commodities)
        .filter(CommodityCol::StyleCode.eq(style_code))
        .filter(ImageCol::IsMain.eq(true))
        .order_by_asc(ImageCol::CreatedAt)
        .order_by_asc(ImageCol::Id)
        .one(conn)
        .await?;
    Ok(row.map(|m| m.image))
}

/// Stores an upload and records its path in `fresh` when a new file was written.
async fn store_upload(
    store: &ImageStore,
    file: &UploadedFile,
    kind: ImageKind,
    group_key: &str,
    fresh: &mut Vec<String>,
) -> AppResult<String> {
    let stored = store
        .store_image(&file.bytes, kind, group_key, &file.filename)
        .await?;
    tracing::debug!(path = %stored.path, reused = stored.reused, degraded = stored.degraded, "image stored");
    if !stored.reused {
        fresh.push(stored.path.clone());
    }
    Ok(stored.path)
}

fn validate_new(new: &NewCommodity) -> AppResult<()> {
    let mut missing = Vec::new();
    if new.commodity_id.trim().is_empty() {
        missing.push("commodity_id");
    }
    if new.name.trim().is_empty() {
        missing.push("name");
    }
    if new.category.trim().is_empty() {
        missing.push("category");
    }
    if !missing.is_empty() {
        return Err(AppError::bad_request(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }
    if new.price < 0 {
        return Err(AppError::bad_request("price must not be negative"));
    }
    Ok(())
}

/// Creates the style row on first sighting, listed online, and locks it so
/// creates within one style family run one at a time.
async fn lock_style(txn: &DatabaseTransaction, style_code: &str, now: DateTime<Utc>) -> AppResult<()> {
    StyleSituations::insert(StyleActive {
        style_code: Set(style_code.to_string()),
        status: Set(ListingStatus::Online.as_str().to_string()),
        online_time: Set(Some(now.into())),
        offline_time: Set(None),
        sync_data_count: Set(0),
    })
    .on_conflict(OnConflict::column(StyleCol::StyleCode).do_nothing().to_owned())
    .exec_without_returning(txn)
    .await?;

    StyleSituations::find_by_id(style_code.to_string())
        .lock(LockType::Update)
        .one(txn)
        .await?;
    Ok(())
}

async fn recount_style(txn: &DatabaseTransaction, style_code: &str) -> AppResult<()> {
    let count = Commodities::find()
        .filter(CommodityCol::StyleCode.eq(style_code))
        .count(txn)
        .await?;
    StyleSituations::update_many()
        .col_expr(StyleCol::SyncDataCount, Expr::value(count as i32))
        .filter(StyleCol::StyleCode.eq(style_code))
        .exec(txn)
        .await?;
    Ok(())
}

/// Paths under `dir` that a commodity or image row still points at.
async fn referenced_in_dir(conn: &impl ConnectionTrait, dir: &str) -> AppResult<HashSet<String>> {
    let prefix = format!("{dir}/%");
    let mut paths: HashSet<String> = Commodities::find()
        .filter(
            Condition::any()
                .add(CommodityCol::Image.like(prefix.as_str()))
                .add(CommodityCol::PromoImage.like(prefix.as_str()))
                .add(CommodityCol::ColorImage.like(prefix.as_str())),
        )
        .all(conn)
        .await?
        .into_iter()
        .flat_map(|c| [c.image, c.promo_image, c.color_image])
        .flatten()
        .collect();
    paths.extend(
        CommodityImages::find()
            .select_only()
            .column(ImageCol::Image)
            .filter(ImageCol::Image.like(prefix.as_str()))
            .into_tuple::<String>()
            .all(conn)
            .await?,
    );
    Ok(paths)
}

/// Removes other main images from the style folder once the create committed.
async fn prune_style_folder(state: &AppState, style_code: &str, canonical: &str) -> AppResult<usize> {
    let store = &state.images;
    let Some(dir) = store.group_dir(ImageKind::Main, style_code) else {
        return Ok(0);
    };
    let referenced = referenced_in_dir(&state.orm, &dir).await?;
    Ok(store
        .prune_group(ImageKind::Main, style_code, canonical, &referenced)
        .await?)
}

/// Deletes files written for a create that did not commit.
async fn discard_uploads(state: &AppState, fresh: &[String]) {
    for path in fresh {
        match path_still_referenced(&state.orm, path).await {
            Ok(true) => continue,
            Ok(false) => {}
            Err(err) => {
                tracing::warn!(error = %err, path = %path, "could not check image references");
                continue;
            }
        }
        match state.images.delete(path).await {
            Ok(()) => tracing::debug!(path = %path, "discarded upload"),
            Err(err) => tracing::warn!(error = %err, path = %path, "failed to discard upload"),
        }
    }
}

struct InsertedCommodity {
    main_image: Option<String>,
    image_reused: bool,
}

async fn insert_commodity(
    state: &AppState,
    txn: &DatabaseTransaction,
    new: NewCommodity,
    uploads: &CommodityUploads,
    now: DateTime<Utc>,
    fresh: &mut Vec<String>,
) -> AppResult<InsertedCommodity> {
    let commodity_id = new.commodity_id.trim().to_string();
    let style_code = new.style_code.trim().to_string();
    if !style_code.is_empty() {
        lock_style(txn, &style_code, now).await?;
    }

    let store = &state.images;
    let mut image_reused = false;
    let main_image = match &uploads.image {
        Some(file) if !style_code.is_empty() => match style_main_image(txn, &style_code).await? {
            Some(existing) => {
                image_reused = true;
                Some(existing)
            }
            None => Some(store_upload(store, file, ImageKind::Main, &style_code, fresh).await?),
        },
        Some(file) => Some(store_upload(store, file, ImageKind::Main, "", fresh).await?),
        None => None,
    };
    let promo_image = match &uploads.promo_image {
        Some(file) => Some(store_upload(store, file, ImageKind::Promo, &style_code, fresh).await?),
        None => None,
    };
    let color_image = match &uploads.color_image {
        Some(file) => Some(store_upload(store, file, ImageKind::Color, &new.color, fresh).await?),
        None => None,
    };
    let mut gallery = Vec::with_capacity(uploads.gallery.len());
    for file in &uploads.gallery {
        gallery.push(store_upload(store, file, ImageKind::Gallery, &style_code, fresh).await?);
    }

    CommodityActive {
        commodity_id: Set(commodity_id.clone()),
        name: Set(new.name.trim().to_string()),
        style_code: Set(style_code.clone()),
        category: Set(new.category.trim().to_string()),
        category_detail: Set(new.category_detail),
        price: Set(new.price),
        image: Set(main_image.clone()),
        promo_image: Set(promo_image),
        size: Set(new.size),
        color: Set(new.color),
        height: Set(new.height),
        spec_code: Set(new.spec_code),
        color_image: Set(color_image),
        notes: Set(new.notes),
        created_at: Set(now.into()),
    }
    .insert(txn)
    .await?;

    CommoditySituations::insert(SituationActive {
        commodity_id: Set(commodity_id.clone()),
        status: Set(ListingStatus::Pending.as_str().to_string()),
        online_time: Set(None),
        offline_time: Set(None),
        sales_volume: Set(0),
        remarks: Set(String::new()),
        style_code: Set(style_code.clone()),
    })
    .on_conflict(
        OnConflict::column(SituationCol::CommodityId)
            .update_columns([
                SituationCol::Status,
                SituationCol::OnlineTime,
                SituationCol::OfflineTime,
                SituationCol::SalesVolume,
                SituationCol::StyleCode,
            ])
            .to_owned(),
    )
    .exec_without_returning(txn)
    .await?;

    if !style_code.is_empty() {
        recount_style(txn, &style_code).await?;
    }

    let image_rows = main_image
        .iter()
        .map(|path| (path.clone(), true))
        .chain(gallery.into_iter().map(|path| (path, false)))
        .map(|(image, is_main)| ImageActive {
            id: NotSet,
            commodity_id: Set(commodity_id.clone()),
            image: Set(image),
            is_main: Set(is_main),
            created_at: Set(now.into()),
        })
        .collect::<Vec<_>>();
    if !image_rows.is_empty() {
        CommodityImages::insert_many(image_rows)
            .exec_without_returning(txn)
            .await?;
    }

    Ok(InsertedCommodity {
        main_image,
        image_reused,
    })
}

pub async fn create_commodity(
    state: &AppState,
    user: &AuthUser,
    new: NewCommodity,
    uploads: CommodityUploads,
) -> AppResult<ApiResponse<CommodityCreated>> {
    ensure_admin(user)?;
    validate_new(&new)?;

    let commodity_id = new.commodity_id.trim().to_string();
    let style_code = new.style_code.trim().to_string();
    if Commodities::find_by_id(commodity_id.clone())
        .one(&state.orm)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(format!(
            "Commodity {commodity_id} already exists"
        )));
    }

    let now = Utc::now();
    let mut fresh = Vec::new();
    let txn = state.orm.begin().await?;
    let inserted = insert_commodity(state, &txn, new, &uploads, now, &mut fresh).await;
    let outcome = match inserted {
        Ok(inserted) => txn.commit().await.map(|()| inserted).map_err(AppError::from),
        Err(err) => {
            if let Err(rollback) = txn.rollback().await {
                tracing::warn!(error = %rollback, "rollback failed");
            }
            Err(err)
        }
    };
    let InsertedCommodity {
        main_image,
        image_reused,
    } = match outcome {
        Ok(inserted) => inserted,
        Err(err) => {
            discard_uploads(state, &fresh).await;
            return Err(match err {
                err if err.is_unique_violation() => {
                    AppError::Conflict(format!("Commodity {commodity_id} already exists"))
                }
                err => err,
            });
        }
    };

    if let (false, Some(canonical)) = (style_code.is_empty(), main_image.as_deref()) {
        match prune_style_folder(state, &style_code, canonical).await {
            Ok(0) => {}
            Ok(removed) => tracing::info!(style_code = %style_code, removed, "style main images pruned"),
            Err(err) => tracing::warn!(error = %err, style_code = %style_code, "failed to prune style images"),
        }
    }

    audit::record(
        &state.pool,
        Some(&user.subject),
        "commodity_create",
        "commodities",
        serde_json::json!({ "commodity_id": commodity_id, "style_code": style_code }),
    )
    .await;

    Ok(ApiResponse::created(
        "Commodity created",
        CommodityCreated {
            commodity_id,
            style_code,
            image: main_image.map(|p| state.images.public_url(&p)),
            image_reused,
        },
    ))
}

async fn path_still_referenced(conn: &impl ConnectionTrait, path: &str) -> AppResult<bool> {
    let by_commodity = Commodities::find()
        .filter(
            Condition::any()
                .add(CommodityCol::Image.eq(path))
                .add(CommodityCol::PromoImage.eq(path))
                .add(CommodityCol::ColorImage.eq(path)),
        )
        .count(conn)
        .await?;
    if by_commodity > 0 {
        return Ok(true);
    }
    let by_image = CommodityImages::find()
        .filter(ImageCol::Image.eq(path))
        .count(conn)
        .await?;
    Ok(by_image > 0)
}

pub async fn delete_commodity(
    state: &AppState,
    user: &AuthUser,
    commodity_id: &str,
) -> AppResult<ApiResponse<DeletedCommodity>> {
    ensure_admin(user)?;
    let txn = state.orm.begin().await?;
    let commodity = find_commodity(&txn, commodity_id).await?;
    let rows = image_rows(&txn, commodity_id).await?;

    let paths: BTreeSet<String> = [
        commodity.image.clone(),
        commodity.promo_image.clone(),
        commodity.color_image.clone(),
    ]
    .into_iter()
    .flatten()
    .chain(rows.into_iter().map(|r| r.image))
    .collect();

    CommodityImages::delete_many()
        .filter(ImageCol::CommodityId.eq(commodity_id))
        .exec(&txn)
        .await?;
    CommoditySituations::delete_by_id(commodity_id.to_string())
        .exec(&txn)
        .await?;
    Commodities::delete_by_id(commodity_id.to_string())
        .exec(&txn)
        .await?;
    if !commodity.style_code.is_empty() {
        recount_style(&txn, &commodity.style_code).await?;
    }
    txn.commit().await?;

    let mut removed_files = 0;
    for path in &paths {
        if path_still_referenced(&state.orm, path).await? {
            continue;
        }
        match state.images.delete(path).await {
            Ok(()) => removed_files += 1,
            Err(err) => tracing::warn!(error = %err, path = %path, "failed to remove commodity image"),
        }
    }

    audit::record(
        &state.pool,
        Some(&user.subject),
        "commodity_delete",
        "commodities",
        serde_json::json!({ "commodity_id": commodity_id, "removed_files": removed_files }),
    )
    .await;

    Ok(ApiResponse::success(
        "Commodity deleted",
        DeletedCommodity {
            commodity_id: commodity_id.to_string(),
            removed_files,
        },
        Some(Meta::empty()),
    ))
}

pub async fn update_commodity(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateCommodityRequest,
) -> AppResult<ApiResponse<CommodityDetail>> {
    ensure_admin(user)?;
    let existing = find_commodity(&state.orm, &payload.commodity_id).await?;

    let mut active: CommodityActive = existing.into();
    if let Some(name) = payload.name.filter(|n| !n.trim().is_empty()) {
        active.name = Set(name);
    }
    if let Some(category) = payload.category.filter(|c| !c.trim().is_empty()) {
        active.category = Set(category);
    }
    if let Some(category_detail) = payload.category_detail {
        active.category_detail = Set(category_detail);
    }
    if let Some(price) = payload.price {
        if price < 0 {
            return Err(AppError::bad_request("price must not be negative"));
        }
        active.price = Set(price);
    }
    if let Some(size) = payload.size {
        active.size = Set(size);
    }
    if let Some(color) = payload.color {
        active.color = Set(color);
    }
    if let Some(height) = payload.height {
        active.height = Set(height);
    }
    if let Some(spec_code) = payload.spec_code {
        active.spec_code = Set(spec_code);
    }
    if let Some(notes) = payload.notes {
        active.notes = Set(notes);
    }
    let updated = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(&user.subject),
        "commodity_update",
        "commodities",
        serde_json::json!({ "commodity_id": updated.commodity_id }),
    )
    .await;

    let rows = image_rows(&state.orm, &updated.commodity_id).await?;
    Ok(ApiResponse::success(
        "Commodity updated",
        detail_view(&state.images, updated, &rows),
        Some(Meta::empty()),
    ))
}

fn detail_view(store: &ImageStore, m: CommodityModel, rows: &[ImageModel]) -> CommodityDetail {
    let images = images_of(store, &m, rows);
    let (main_image, other_images) = split_main(&images);
    CommodityDetail {
        image: m.image.as_deref().map(|p| store.public_url(p)),
        promo_image: m.promo_image.as_deref().map(|p| store.public_url(p)),
        color_image: m.color_image.as_deref().map(|p| store.public_url(p)),
        created_at: display_time(&utc(&m.created_at)),
        commodity_id: m.commodity_id,
        name: m.name,
        style_code: m.style_code,
        category: m.category,
        category_detail: m.category_detail,
        price: m.price,
        size: m.size,
        color: m.color,
        height: m.height,
        spec_code: m.spec_code,
        notes: m.notes,
        images,
        main_image,
        other_images,
    }
}

pub async fn get_commodity_detail(
    state: &AppState,
    commodity_id: &str,
) -> AppResult<ApiResponse<CommodityDetail>> {
    let orm = &state.orm;
    let (commodity, rows) = with_retry(RetryPolicy::default(), || async move {
        let commodity = find_commodity(orm, commodity_id).await?;
        let rows = image_rows(orm, commodity_id).await?;
        Ok((commodity, rows))
    })
    .await?;

    Ok(ApiResponse::success(
        "OK",
        detail_view(&state.images, commodity, &rows),
        Some(Meta::empty()),
    ))
}

fn status_view(m: crate::entity::commodity_situations::Model) -> CommodityStatusView {
    CommodityStatusView {
        commodity_id: m.commodity_id,
        status: m.status,
        online_time: m.online_time.as_ref().map(|t| display_time(&utc(t))),
        offline_time: m.offline_time.as_ref().map(|t| display_time(&utc(t))),
        sales_volume: m.sales_volume,
    }
}

pub async fn set_commodity_status(
    state: &AppState,
    user: &AuthUser,
    payload: CommodityStatusRequest,
) -> AppResult<ApiResponse<CommodityStatusView>> {
    ensure_admin(user)?;
    let commodity = find_commodity(&state.orm, &payload.commodity_id).await?;
    let status: ListingStatus = payload.status.into();
    let now: chrono::DateTime<chrono::FixedOffset> = Utc::now().into();

    let (online_time, offline_time) = match payload.status {
        Visibility::Online => (Set(Some(now)), NotSet),
        Visibility::Offline => (NotSet, Set(Some(now))),
    };
    let stamped = match payload.status {
        Visibility::Online => SituationCol::OnlineTime,
        Visibility::Offline => SituationCol::OfflineTime,
    };

    CommoditySituations::insert(SituationActive {
        commodity_id: Set(commodity.commodity_id.clone()),
        status: Set(status.as_str().to_string()),
        online_time,
        offline_time,
        sales_volume: Set(0),
        remarks: Set(String::new()),
        style_code: Set(commodity.style_code.clone()),
    })
    .on_conflict(
        OnConflict::column(SituationCol::CommodityId)
            .update_columns([SituationCol::Status, stamped])
            .to_owned(),
    )
    .exec_without_returning(&state.orm)
    .await?;

    let situation = CommoditySituations::find_by_id(commodity.commodity_id.clone())
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Commodity status"))?;

    audit::record(
        &state.pool,
        Some(&user.subject),
        "commodity_status",
        "commodity_situations",
        serde_json::json!({ "commodity_id": commodity.commodity_id, "status": status.as_str() }),
    )
    .await;

    Ok(ApiResponse::success(
        format!("Commodity is now {status}"),
        status_view(situation),
        Some(Meta::empty()),
    ))
}

pub async fn get_commodity_status(
    state: &AppState,
    commodity_id: &str,
) -> AppResult<ApiResponse<CommodityStatusView>> {
    let situation = CommoditySituations::find_by_id(commodity_id.to_string())
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found(format!("No status recorded for {commodity_id}")))?;
    Ok(ApiResponse::success("OK", status_view(situation), Some(Meta::empty())))
}

/// Flips a whole style family inside the caller's transaction and returns how
/// many commodity statuses changed. Nothing is committed here.
pub async fn set_style_family_status_in(
    txn: &DatabaseTransaction,
    style_code: &str,
    visibility: Visibility,
    now: DateTime<Utc>,
) -> AppResult<u64> {
    let members = Commodities::find()
        .filter(CommodityCol::StyleCode.eq(style_code))
        .count(txn)
        .await?;
    if members == 0 {
        return Err(AppError::not_found(format!("Style code {style_code} has no commodities")));
    }

    let status: ListingStatus = visibility.into();
    let stamp: chrono::DateTime<chrono::FixedOffset> = now.into();
    let (online_time, offline_time, stamped_style, stamped_item) = match visibility {
        Visibility::Online => (
            Set(Some(stamp)),
            Set(None),
            StyleCol::OnlineTime,
            SituationCol::OnlineTime,
        ),
        Visibility::Offline => (
            Set(None),
            Set(Some(stamp)),
            StyleCol::OfflineTime,
            SituationCol::OfflineTime,
        ),
    };

    StyleSituations::insert(StyleActive {
        style_code: Set(style_code.to_string()),
        status: Set(status.as_str().to_string()),
        online_time,
        offline_time,
        sync_data_count: Set(members as i32),
    })
    .on_conflict(
        OnConflict::column(StyleCol::StyleCode)
            .update_columns([StyleCol::Status, stamped_style, StyleCol::SyncDataCount])
            .to_owned(),
    )
    .exec_without_returning(txn)
    .await?;

    let updated = CommoditySituations::update_many()
        .col_expr(SituationCol::Status, Expr::value(status.as_str()))
        .col_expr(stamped_item, Expr::value(stamp))
        .filter(
            SituationCol::CommodityId.in_subquery(
                sea_orm::sea_query::Query::select()
                    .column(CommodityCol::CommodityId)
                    .from(Commodities)
                    .and_where(CommodityCol::StyleCode.eq(style_code))
                    .to_owned(),
            ),
        )
        .exec(txn)
        .await?;

    Ok(updated.rows_affected)
}

pub async fn set_style_family_status(
    state: &AppState,
    user: &AuthUser,
    payload: StyleStatusRequest,
) -> AppResult<ApiResponse<StyleStatusResult>> {
    ensure_admin(user)?;
    let style_code = payload.style_code.trim();
    if style_code.is_empty() {
        return Err(AppError::bad_request("style_code must not be empty"));
    }

    let now = Utc::now();
    let txn = state.orm.begin().await?;
    let affected = set_style_family_status_in(&txn, style_code, payload.status, now).await?;
    txn.commit().await?;

    let status: ListingStatus = payload.status.into();
    tracing::info!(style_code, status = %status, affected, "style family status changed");
    audit::record(
        &state.pool,
        Some(&user.subject),
        "style_status",
        "style_code_situations",
        serde_json::json!({ "style_code": style_code, "status": status.as_str(), "affected": affected }),
    )
    .await;

    Ok(ApiResponse::success(
        format!("Style {style_code} is now {status}"),
        StyleStatusResult {
            style_code: style_code.to_string(),
            status: status.as_str().to_string(),
            affected_commodities: affected,
            time: display_time(&now),
        },
        Some(Meta::empty()),
    ))
}

fn check_shop(state: &AppState, shopname: &str) -> AppResult<()> {
    if shopname != state.config.shop_name {
        return Err(AppError::bad_request("Invalid shopname"));
    }
    Ok(())
}

/// Groups a style family by color in first-seen order. Each color takes its
/// swatch from the first commodity that has one, falling back to the main image.
pub fn group_by_color(
    commodities: &[CommodityModel],
    url: impl Fn(&str) -> String,
) -> Vec<ColorGroup> {
    let mut groups: Vec<ColorGroup> = Vec::new();
    for c in commodities {
        let swatch = c
            .color_image
            .as_deref()
            .or(c.image.as_deref())
            .map(&url);
        let entry = SizeEntry {
            commodity_id: c.commodity_id.clone(),
            size: c.size.clone(),
        };
        match groups.iter_mut().find(|g| g.color == c.color) {
            Some(group) => {
                if group.color_image.is_none() {
                    group.color_image = swatch;
                }
                group.sizes.push(entry);
            }
            None => groups.push(ColorGroup {
                color: c.color.clone(),
                color_image: swatch,
                sizes: vec![entry],
            }),
        }
    }
    groups
}

pub async fn style_code_commodities(
    state: &AppState,
    query: StyleCodeQuery,
) -> AppResult<ApiResponse<StyleFamilyView>> {
    check_shop(state, &query.shopname)?;
    let style_code = query.style_code.trim();
    if style_code.is_empty() {
        return Err(AppError::bad_request("style_code must not be empty"));
    }

    let orm = &state.orm;
    let members = with_retry(RetryPolicy::default(), || async move {
        Ok(Commodities::find()
            .inner_join(CommoditySituations)
            .filter(CommodityCol::StyleCode.eq(style_code))
            .filter(SituationCol::Status.eq(ListingStatus::Online.as_str()))
            .order_by_asc(CommodityCol::CreatedAt)
            .order_by_asc(CommodityCol::CommodityId)
            .all(orm)
            .await?)
    })
    .await?;

    let store = &state.images;
    let items = group_by_color(&members, |p| store.public_url(p));
    let (name, price, images) = match members.first() {
        Some(first) => {
            let rows = image_rows(orm, &first.commodity_id).await?;
            (first.name.clone(), first.price, images_of(store, first, &rows))
        }
        None => (String::new(), 0, Vec::new()),
    };
    let (main_image, other_images) = split_main(&images);

    Ok(ApiResponse::success(
        "OK",
        StyleFamilyView {
            style_code: style_code.to_string(),
            name,
            price,
            items,
            images,
            main_image,
            other_images,
        },
        Some(Meta::empty()),
    ))
}

#[derive(Debug, sqlx::FromRow)]
struct RepresentativeRow {
    commodity_id: String,
    name: String,
    style_code: String,
    category: String,
    price: i64,
    image: Option<String>,
    promo_image: Option<String>,
    created_at: DateTime<Utc>,
}

/// Shared FROM/WHERE of the one-row-per-style listing.
fn push_online_styles(qb: &mut QueryBuilder<'_, Postgres>, categories: &[String], status: &str) {
    qb.push(
        " FROM commodities c \
         JOIN style_code_situations s ON s.style_code = c.style_code AND s.status = 'online' \
         JOIN commodity_situations cs ON cs.commodity_id = c.commodity_id AND cs.status = ",
    )
    .push_bind(status.to_string());
    qb.push(" WHERE c.style_code <> ''");
    if !categories.is_empty() {
        qb.push(" AND c.category = ANY(").push_bind(categories.to_vec()).push(")");
    }
}

async fn list_style_representatives(
    state: &AppState,
    categories: &[String],
    status: &str,
    limit: i64,
    offset: i64,
) -> AppResult<(Vec<RepresentativeRow>, i64)> {
    let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(DISTINCT c.style_code)");
    push_online_styles(&mut count_qb, categories, status);
    let total: i64 = count_qb.build_query_scalar().fetch_one(&state.pool).await?;

    let mut qb = QueryBuilder::<Postgres>::new(
        "WITH ranked AS (SELECT c.commodity_id, c.name, c.style_code, c.category, c.price, \
         c.image, c.promo_image, c.created_at, ROW_NUMBER() OVER \
         (PARTITION BY c.style_code ORDER BY c.created_at DESC, c.commodity_id DESC) AS rn",
    );
    push_online_styles(&mut qb, categories, status);
    qb.push(
        ") SELECT commodity_id, name, style_code, category, price, image, promo_image, created_at \
         FROM ranked WHERE rn = 1 ORDER BY created_at DESC, commodity_id DESC LIMIT ",
    )
    .push_bind(limit)
    .push(" OFFSET ")
    .push_bind(offset);

    let rows = qb
        .build_query_as::<RepresentativeRow>()
        .fetch_all(&state.pool)
        .await?;
    Ok((rows, total))
}

async fn main_image_of(orm: &OrmConn, commodity_id: &str) -> AppResult<Option<String>> {
    Ok(CommodityImages::find()
        .filter(ImageCol::CommodityId.eq(commodity_id))
        .filter(ImageCol::IsMain.eq(true))
        .order_by_asc(ImageCol::Id)
        .one(orm)
        .await?
        .map(|m| m.image))
}

pub async fn goods_query(state: &AppState, query: GoodsQuery) -> AppResult<ApiResponse<GoodsList>> {
    check_shop(state, &query.shopname)?;

    let status = match query.status.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(
            raw.parse::<ListingStatus>()
                .map_err(|_| AppError::bad_request(format!("Invalid status value: {raw}")))?,
        ),
        None => None,
    };
    let categories = query.category.map(|c| c.into_vec()).unwrap_or_default();
    let pagination = Pagination {
        page: query.pagination.page,
        page_size: query.pagination.page_size.or(Some(GOODS_DEFAULT_PAGE_SIZE)),
    };
    let (page, limit, offset) = pagination.normalize();
    let store = &state.images;

    if query.demand == Some(GoodsDemand::StyleCode) {
        let listed = status.unwrap_or(ListingStatus::Online);
        let (rows, total) =
            list_style_representatives(state, &categories, listed.as_str(), limit, offset).await?;
        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            let promo = match row.promo_image.or(row.image) {
                Some(path) => Some(path),
                None => main_image_of(&state.orm, &row.commodity_id).await?,
            };
            items.push(GoodsItem {
                commodity_id: row.commodity_id,
                name: row.name,
                style_code: row.style_code,
                category: row.category,
                price: row.price,
                promo_image_url: promo.map(|p| store.public_url(&p)),
                created_at: display_time(&row.created_at),
                images: Vec::new(),
            });
        }
        return Ok(ApiResponse::success(
            "OK",
            GoodsList { items },
            Some(Meta::new(page, limit, total)),
        ));
    }

    let mut condition = Condition::all();
    if query.demand == Some(GoodsDemand::Goods) {
        let online_styles = StyleSituations::find()
            .select_only()
            .column(StyleCol::StyleCode)
            .filter(StyleCol::Status.eq(ListingStatus::Online.as_str()))
            .into_tuple::<String>()
            .all(&state.orm)
            .await?;
        condition = condition.add(CommodityCol::StyleCode.is_in(online_styles));
        if let Some(style) = query.style_code.as_deref().filter(|s| !s.is_empty()) {
            condition = condition.add(CommodityCol::StyleCode.eq(style));
        }
    }
    if !categories.is_empty() {
        condition = condition.add(CommodityCol::Category.is_in(categories));
    }

    let mut finder = Commodities::find().filter(condition);
    if let Some(status) = status {
        finder = finder
            .inner_join(CommoditySituations)
            .filter(SituationCol::Status.eq(status.as_str()));
    }
    let finder = finder
        .order_by_desc(CommodityCol::CreatedAt)
        .order_by_desc(CommodityCol::CommodityId);

    let total = finder.clone().count(&state.orm).await? as i64;
    let commodities = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let mut items = Vec::with_capacity(commodities.len());
    for c in commodities {
        let rows = image_rows(&state.orm, &c.commodity_id).await?;
        let images: Vec<ImageView> = rows.iter().map(|m| image_view(store, m)).collect();
        let promo = c
            .promo_image
            .clone()
            .or_else(|| c.image.clone())
            .or_else(|| rows.iter().find(|r| r.is_main).map(|r| r.image.clone()));
        items.push(GoodsItem {
            promo_image_url: promo.map(|p| store.public_url(&p)),
            created_at: display_time(&utc(&c.created_at)),
            commodity_id: c.commodity_id,
            name: c.name,
            style_code: c.style_code,
            category: c.category,
            price: c.price,
            images,
        });
    }

    Ok(ApiResponse::success(
        "OK",
        GoodsList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn categories(state: &AppState, shopname: &str) -> AppResult<ApiResponse<CategoryList>> {
    check_shop(state, shopname)?;
    let categories: Vec<String> = Commodities::find()
        .select_only()
        .column(CommodityCol::Category)
        .distinct()
        .filter(CommodityCol::Category.ne(""))
        .order_by_asc(CommodityCol::Category)
        .into_tuple()
        .all(&state.orm)
        .await?;
    Ok(ApiResponse::success(
        "OK",
        CategoryList { categories },
        Some(Meta::empty()),
    ))
}

fn summary(store: &ImageStore, c: CommodityModel) -> CommoditySummary {
    CommoditySummary {
        image: c.image.as_deref().map(|p| store.public_url(p)),
        promo_image: c.promo_image.as_deref().map(|p| store.public_url(p)),
        created_at: display_time(&utc(&c.created_at)),
        commodity_id: c.commodity_id,
        name: c.name,
        style_code: c.style_code,
        category: c.category,
        category_detail: c.category_detail,
        price: c.price,
        size: c.size,
        color: c.color,
        height: c.height,
        spec_code: c.spec_code,
    }
}

pub async fn search_by_name(
    state: &AppState,
    payload: SearchByNameRequest,
) -> AppResult<ApiResponse<CommoditySummaryList>> {
    let needle = payload.search_str.trim();
    if needle.is_empty() {
        return Err(AppError::bad_request("search_str must not be empty"));
    }
    let (page, limit, offset) = payload.pagination.normalize();
    let pattern = format!("%{needle}%");

    let finder = Commodities::find()
        .filter(Expr::col(CommodityCol::Name).ilike(pattern))
        .order_by_desc(CommodityCol::CreatedAt)
        .order_by_asc(CommodityCol::CommodityId);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|c| summary(&state.images, c))
        .collect();

    Ok(ApiResponse::success(
        "OK",
        CommoditySummaryList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

/// Keeps only the requested keys of a serialized summary.
pub fn project_fields(
    value: serde_json::Value,
    fields: Option<&[String]>,
) -> serde_json::Map<String, serde_json::Value> {
    let serde_json::Value::Object(map) = value else {
        return serde_json::Map::new();
    };
    match fields {
        Some(fields) if !fields.is_empty() => {
            let wanted: HashSet<&str> = fields.iter().map(String::as_str).collect();
            map.into_iter().filter(|(k, _)| wanted.contains(k.as_str())).collect()
        }
        _ => map,
    }
}

pub async fn batch_by_ids(
    state: &AppState,
    payload: BatchByIdsRequest,
) -> AppResult<ApiResponse<BatchByIdsResult>> {
    if payload.commodity_ids.is_empty() {
        return Err(AppError::bad_request("commodity_ids must not be empty"));
    }
    let found = Commodities::find()
        .filter(CommodityCol::CommodityId.is_in(payload.commodity_ids.clone()))
        .all(&state.orm)
        .await?;

    let mut items = Vec::with_capacity(found.len());
    let mut not_found = Vec::new();
    for id in &payload.commodity_ids {
        match found.iter().find(|c| &c.commodity_id == id) {
            Some(c) => {
                let value = serde_json::to_value(summary(&state.images, c.clone()))
                    .map_err(anyhow::Error::from)?;
                items.push(project_fields(value, payload.fields.as_deref()));
            }
            None => not_found.push(id.clone()),
        }
    }

    Ok(ApiResponse::success(
        format!("Found {} of {} commodities", items.len(), payload.commodity_ids.len()),
        BatchByIdsResult { items, not_found },
        Some(Meta::empty()),
    ))
}
