use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, QuerySelect,
    Set, TransactionTrait,
    ActiveValue::NotSet,
    sea_query::{LockType, OnConflict},
};

use crate::{
    cart::{CartContents, CartError},
    db::OrmConn,
    dto::cart::{
        AddToCartRequest, BatchDeleteRequest, BatchDeleteResult, CartItemQuantity,
        CartItemRequest, CartItemView, CartView, ClearCartResult, IncreaseQuantityRequest,
        UpdateQuantityRequest,
    },
    entity::{
        carts::{ActiveModel as CartActive, Column as CartCol, Entity as Carts},
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    response::{ApiResponse, Meta, display_time},
    retry::{RetryPolicy, with_retry},
    state::AppState,
};

fn positive_quantity(raw: i64) -> AppResult<u32> {
    u32::try_from(raw)
        .ok()
        .filter(|q| *q > 0)
        .ok_or_else(|| CartError::InvalidQuantity.into())
}

fn require_code(code: &str) -> AppResult<&str> {
    let code = code.trim();
    if code.is_empty() {
        return Err(AppError::BadRequest("commodity_code must not be empty".into()));
    }
    Ok(code)
}

async fn ensure_user(conn: &impl sea_orm::ConnectionTrait, user_id: i32) -> AppResult<()> {
    if Users::find_by_id(user_id).one(conn).await?.is_none() {
        return Err(AppError::NotFound(format!("User {user_id} does not exist")));
    }
    Ok(())
}

async fn lock_cart(
    txn: &DatabaseTransaction,
    user_id: i32,
) -> AppResult<Option<crate::entity::carts::Model>> {
    Ok(Carts::find()
        .filter(CartCol::UserId.eq(user_id))
        .lock(LockType::Update)
        .one(txn)
        .await?)
}

/// Runs one cart operation as a locked read-modify-write.
///
/// With `create` the cart row is created on first use. Without it a missing
/// cart behaves as an empty one and nothing is written.
async fn mutate_cart<R>(
    orm: &OrmConn,
    user_id: i32,
    create: bool,
    op: impl FnOnce(&mut CartContents, DateTime<Utc>) -> Result<R, CartError>,
) -> AppResult<(R, CartContents)> {
    let txn = orm.begin().await?;
    ensure_user(&txn, user_id).await?;
    let now = Utc::now();

    if create {
        Carts::insert(CartActive {
            cart_id: NotSet,
            user_id: Set(user_id),
            items: Set(serde_json::json!({})),
            remarks: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        })
        .on_conflict(OnConflict::column(CartCol::UserId).do_nothing().to_owned())
        .exec_without_returning(&txn)
        .await?;
    }

    let row = lock_cart(&txn, user_id).await?;
    let mut contents = match &row {
        Some(cart) => CartContents::from_json(&cart.items)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("corrupt cart for user {user_id}: {e}")))?,
        None => CartContents::new(),
    };

    let result = op(&mut contents, now)?;

    if let Some(cart) = row {
        let mut active: CartActive = cart.into();
        active.items = Set(contents.to_json());
        active.updated_at = Set(now.into());
        active.update(&txn).await?;
    }
    txn.commit().await?;

    Ok((result, contents))
}

fn quantity_view(code: &str, quantity: u32, contents: &CartContents) -> CartItemQuantity {
    CartItemQuantity {
        commodity_code: code.to_string(),
        quantity,
        total_quantity: contents.total_quantity(),
    }
}

pub async fn add_to_cart(
    state: &AppState,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItemQuantity>> {
    let code = require_code(&payload.commodity_code)?;
    let qty = positive_quantity(payload.quantity.unwrap_or(1))?;

    let (quantity, contents) =
        mutate_cart(&state.orm, payload.user_id, true, |cart, now| cart.add(code, qty, now)).await?;

    tracing::debug!(user_id = payload.user_id, commodity_code = %code, quantity, "cart item added");
    Ok(ApiResponse::success(
        "Added to cart",
        quantity_view(code, quantity, &contents),
        Some(Meta::empty()),
    ))
}

pub async fn delete_from_cart(
    state: &AppState,
    payload: CartItemRequest,
) -> AppResult<ApiResponse<BatchDeleteResult>> {
    batch_delete(
        state,
        BatchDeleteRequest {
            user_id: payload.user_id,
            commodity_codes: vec![payload.commodity_code],
        },
    )
    .await
}

pub async fn batch_delete(
    state: &AppState,
    payload: BatchDeleteRequest,
) -> AppResult<ApiResponse<BatchDeleteResult>> {
    if payload.commodity_codes.is_empty() {
        return Err(AppError::BadRequest("commodity_codes must not be empty".into()));
    }
    let codes: Vec<String> = payload
        .commodity_codes
        .iter()
        .map(|c| c.trim().to_string())
        .collect();

    let (report, contents) = mutate_cart(&state.orm, payload.user_id, false, |cart, _| {
        Ok(cart.remove_many(&codes))
    })
    .await?;

    let deleted_count = report.deleted.len();
    let message = if deleted_count == 0 {
        "No items were removed; none of the codes are in the cart".to_string()
    } else if report.not_found.is_empty() {
        format!("All {deleted_count} items removed from cart")
    } else {
        format!("Partially removed: {deleted_count} items removed from cart")
    };

    Ok(ApiResponse::success(
        message,
        BatchDeleteResult {
            deleted_count,
            deleted_codes: report.deleted,
            not_exist_codes: report.not_found,
            remaining_items_count: contents.len(),
            total_quantity: contents.total_quantity(),
        },
        Some(Meta::empty()),
    ))
}

pub async fn query_cart(state: &AppState, user_id: i32) -> AppResult<ApiResponse<CartView>> {
    let orm = &state.orm;
    let cart = with_retry(RetryPolicy::default(), || async move {
        ensure_user(orm, user_id).await?;
        Ok(Carts::find()
            .filter(CartCol::UserId.eq(user_id))
            .one(orm)
            .await?)
    })
    .await?;

    let contents = match cart {
        Some(cart) => CartContents::from_json(&cart.items)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("corrupt cart for user {user_id}: {e}")))?,
        None => CartContents::new(),
    };

    let cart_items: Vec<CartItemView> = contents
        .items_by_recency()
        .into_iter()
        .map(|(code, entry)| CartItemView {
            commodity_code: code.to_string(),
            quantity: entry.quantity,
            added_time: display_time(&entry.added_time),
        })
        .collect();

    Ok(ApiResponse::success(
        "OK",
        CartView {
            items_count: cart_items.len(),
            total_quantity: contents.total_quantity(),
            cart_items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn update_quantity(
    state: &AppState,
    payload: UpdateQuantityRequest,
) -> AppResult<ApiResponse<CartItemQuantity>> {
    let code = require_code(&payload.commodity_code)?;
    let qty = positive_quantity(payload.quantity)?;

    let (quantity, contents) = mutate_cart(&state.orm, payload.user_id, false, |cart, now| {
        cart.set_quantity(code, qty, now)
    })
    .await?;

    Ok(ApiResponse::success(
        "Quantity updated",
        quantity_view(code, quantity, &contents),
        Some(Meta::empty()),
    ))
}

pub async fn increase_quantity(
    state: &AppState,
    payload: IncreaseQuantityRequest,
) -> AppResult<ApiResponse<CartItemQuantity>> {
    let code = require_code(&payload.commodity_code)?;
    let delta = positive_quantity(payload.quantity.unwrap_or(1))?;

    let (quantity, contents) = mutate_cart(&state.orm, payload.user_id, false, |cart, now| {
        cart.increment(code, delta, now)
    })
    .await?;

    Ok(ApiResponse::success(
        format!("Quantity increased by {delta}"),
        quantity_view(code, quantity, &contents),
        Some(Meta::empty()),
    ))
}

pub async fn decrease_quantity(
    state: &AppState,
    payload: CartItemRequest,
) -> AppResult<ApiResponse<CartItemQuantity>> {
    let code = require_code(&payload.commodity_code)?;

    let (quantity, contents) =
        mutate_cart(&state.orm, payload.user_id, false, |cart, now| cart.decrement(code, now))
            .await?;

    Ok(ApiResponse::success(
        "Quantity decreased by 1",
        quantity_view(code, quantity, &contents),
        Some(Meta::empty()),
    ))
}

pub async fn clear_cart(state: &AppState, user_id: i32) -> AppResult<ApiResponse<ClearCartResult>> {
    let (cleared_items_count, _) =
        mutate_cart(&state.orm, user_id, false, |cart, _| Ok(cart.clear())).await?;

    Ok(ApiResponse::success(
        format!("Cart cleared, {cleared_items_count} items removed"),
        ClearCartResult { cleared_items_count },
        Some(Meta::empty()),
    ))
}
