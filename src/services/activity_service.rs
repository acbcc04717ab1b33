use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
    ActiveValue::NotSet,
    sea_query::LockType,
};

use crate::{
    audit,
    dto::{
        activities::{ActivityIdRequest, ActivityImageList, NewActivityImage, UpdateRelationsRequest},
        commodities::UploadedFile,
    },
    entity::{
        activity_images::{
            ActiveModel as ActivityActive, Column as ActivityCol, Entity as ActivityImages,
            Model as ActivityModel,
        },
        commodities::{Column as CommodityCol, Entity as Commodities},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{ActivityImage, ListingStatus, split_ids},
    response::{ApiResponse, Meta},
    state::AppState,
    storage::ImageKind,
};

pub const MAX_RELATED_COMMODITIES: usize = 5;
pub const MAX_ONLINE_SLOTS: u64 = 5;

fn view(state: &AppState, m: ActivityModel) -> ActivityImage {
    let url = m
        .image
        .as_deref()
        .map(|p| state.activity_images().public_url(p));
    ActivityImage::from_model(m, url)
}

async fn lock_slot(txn: &DatabaseTransaction, id: i32) -> AppResult<ActivityModel> {
    ActivityImages::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Activity image {id} does not exist")))
}

/// Ids that do not name an existing commodity.
async fn unknown_commodities(state: &AppState, ids: &[String]) -> AppResult<Vec<String>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let found: Vec<String> = Commodities::find()
        .select_only()
        .column(CommodityCol::CommodityId)
        .filter(CommodityCol::CommodityId.is_in(ids.to_vec()))
        .into_tuple()
        .all(&state.orm)
        .await?;
    Ok(ids.iter().filter(|id| !found.contains(id)).cloned().collect())
}

pub async fn add_activity_image(
    state: &AppState,
    user: &AuthUser,
    new: NewActivityImage,
    image: Option<UploadedFile>,
) -> AppResult<ApiResponse<ActivityImage>> {
    ensure_admin(user)?;
    let now = Utc::now();
    let txn = state.orm.begin().await?;

    let slot = ActivityActive {
        id: NotSet,
        image: Set(None),
        status: Set(ListingStatus::Pending.as_str().to_string()),
        online_time: Set(None),
        offline_time: Set(None),
        commodities: Set(split_ids(&new.commodities).join(",")),
        category: Set(new.category),
        notes: Set(new.notes),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    let slot = match image {
        Some(file) => {
            let stored = state
                .activity_images()
                .store_image(&file.bytes, ImageKind::Main, &slot.id.to_string(), &file.filename)
                .await?;
            let mut active: ActivityActive = slot.into();
            active.image = Set(Some(stored.path));
            active.update(&txn).await?
        }
        None => slot,
    };
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(&user.subject),
        "activity_image_add",
        "activity_images",
        serde_json::json!({ "id": slot.id }),
    )
    .await;

    Ok(ApiResponse::created("Activity image added", view(state, slot)))
}

pub async fn update_relations(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateRelationsRequest,
) -> AppResult<ApiResponse<ActivityImage>> {
    ensure_admin(user)?;
    let ids = split_ids(&payload.commodities);
    let unknown = unknown_commodities(state, &ids).await?;
    if !unknown.is_empty() {
        return Err(AppError::bad_request(format!(
            "Unknown commodity ids: {}",
            unknown.join(", ")
        )));
    }

    let txn = state.orm.begin().await?;
    let slot = lock_slot(&txn, payload.id).await?;
    if slot.status == ListingStatus::Online.as_str() && ids.len() > MAX_RELATED_COMMODITIES {
        return Err(AppError::bad_request(format!(
            "An online activity image can relate at most {MAX_RELATED_COMMODITIES} commodities"
        )));
    }
    let mut active: ActivityActive = slot.into();
    active.commodities = Set(ids.join(","));
    if let Some(category) = payload.category {
        active.category = Set(category);
    }
    if let Some(notes) = payload.notes {
        active.notes = Set(notes);
    }
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&txn).await?;
    txn.commit().await?;

    Ok(ApiResponse::success(
        "Activity image updated",
        view(state, updated),
        Some(Meta::empty()),
    ))
}

pub async fn set_online(
    state: &AppState,
    user: &AuthUser,
    payload: ActivityIdRequest,
) -> AppResult<ApiResponse<ActivityImage>> {
    ensure_admin(user)?;
    let txn = state.orm.begin().await?;
    let slot = lock_slot(&txn, payload.id).await?;

    if split_ids(&slot.commodities).len() > MAX_RELATED_COMMODITIES {
        return Err(AppError::bad_request(format!(
            "An activity image can relate at most {MAX_RELATED_COMMODITIES} commodities"
        )));
    }
    if slot.status != ListingStatus::Online.as_str() {
        let online = ActivityImages::find()
            .filter(ActivityCol::Status.eq(ListingStatus::Online.as_str()))
            .count(&txn)
            .await?;
        if online >= MAX_ONLINE_SLOTS {
            return Err(AppError::bad_request(format!(
                "At most {MAX_ONLINE_SLOTS} activity images can be online"
            )));
        }
    }

    let now = Utc::now();
    let mut active: ActivityActive = slot.into();
    active.status = Set(ListingStatus::Online.as_str().to_string());
    active.online_time = Set(Some(now.into()));
    active.updated_at = Set(now.into());
    let updated = active.update(&txn).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(&user.subject),
        "activity_image_online",
        "activity_images",
        serde_json::json!({ "id": updated.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Activity image is online",
        view(state, updated),
        Some(Meta::empty()),
    ))
}

pub async fn set_offline(
    state: &AppState,
    user: &AuthUser,
    payload: ActivityIdRequest,
) -> AppResult<ApiResponse<ActivityImage>> {
    ensure_admin(user)?;
    let existing = ActivityImages::find_by_id(payload.id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Activity image {} does not exist", payload.id)))?;

    let now = Utc::now();
    let mut active: ActivityActive = existing.into();
    active.status = Set(ListingStatus::Offline.as_str().to_string());
    active.offline_time = Set(Some(now.into()));
    active.updated_at = Set(now.into());
    let updated = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(&user.subject),
        "activity_image_offline",
        "activity_images",
        serde_json::json!({ "id": updated.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Activity image is offline",
        view(state, updated),
        Some(Meta::empty()),
    ))
}

pub async fn list_activity_images(
    state: &AppState,
    shopname: &str,
) -> AppResult<ApiResponse<ActivityImageList>> {
    if shopname != state.config.shop_name {
        return Err(AppError::bad_request("Invalid shopname"));
    }
    let items: Vec<ActivityImage> = ActivityImages::find()
        .order_by_asc(ActivityCol::Id)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|m| view(state, m))
        .collect();
    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "OK",
        ActivityImageList { items },
        Some(Meta::new(1, total, total)),
    ))
}
