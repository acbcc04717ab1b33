use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
    ActiveValue::NotSet,
    sea_query::Expr,
};

use crate::{
    dto::addresses::{AddAddressRequest, AddressList, AddressRef, UpdateAddressRequest},
    entity::{
        addresses::{
            ActiveModel as AddressActive, Column as AddressCol, Entity as Addresses,
            Model as AddressModel,
        },
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    models::Address,
    response::{ApiResponse, Meta},
    state::AppState,
};

async fn ensure_user(conn: &impl ConnectionTrait, user_id: i32) -> AppResult<()> {
    if Users::find_by_id(user_id).one(conn).await?.is_none() {
        return Err(AppError::not_found(format!("User {user_id} does not exist")));
    }
    Ok(())
}

async fn owned_address(
    conn: &impl ConnectionTrait,
    user_id: i32,
    address_id: i32,
) -> AppResult<AddressModel> {
    Addresses::find_by_id(address_id)
        .filter(AddressCol::UserId.eq(user_id))
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Address {address_id} does not exist")))
}

/// Clears the default flag on every other address of the user.
async fn clear_other_defaults(
    txn: &DatabaseTransaction,
    user_id: i32,
    keep: Option<i32>,
) -> AppResult<()> {
    let mut update = Addresses::update_many()
        .col_expr(AddressCol::IsDefault, Expr::value(false))
        .filter(AddressCol::UserId.eq(user_id))
        .filter(AddressCol::IsDefault.eq(true));
    if let Some(keep) = keep {
        update = update.filter(AddressCol::AddressId.ne(keep));
    }
    update.exec(txn).await?;
    Ok(())
}

fn require(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::bad_request(format!("{field} is required")));
    }
    Ok(())
}

pub async fn add_address(
    state: &AppState,
    payload: AddAddressRequest,
) -> AppResult<ApiResponse<Address>> {
    require("province", &payload.province)?;
    require("city", &payload.city)?;
    require("detailed_address", &payload.detailed_address)?;
    require("receiver_name", &payload.receiver_name)?;
    require("phone_number", &payload.phone_number)?;

    let txn = state.orm.begin().await?;
    ensure_user(&txn, payload.user_id).await?;
    if payload.is_default {
        clear_other_defaults(&txn, payload.user_id, None).await?;
    }
    let now = Utc::now();
    let address = AddressActive {
        address_id: NotSet,
        user_id: Set(payload.user_id),
        province: Set(payload.province),
        city: Set(payload.city),
        county: Set(payload.county),
        detailed_address: Set(payload.detailed_address),
        receiver_name: Set(payload.receiver_name),
        phone_number: Set(payload.phone_number),
        is_default: Set(payload.is_default),
        remark: Set(payload.remark),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    Ok(ApiResponse::created("Address added", address.into()))
}

pub async fn delete_address(state: &AppState, payload: AddressRef) -> AppResult<ApiResponse<Address>> {
    let address = owned_address(&state.orm, payload.user_id, payload.address_id).await?;
    Addresses::delete_by_id(address.address_id)
        .exec(&state.orm)
        .await?;
    Ok(ApiResponse::success(
        "Address deleted",
        address.into(),
        Some(Meta::empty()),
    ))
}

pub async fn update_address(
    state: &AppState,
    payload: UpdateAddressRequest,
) -> AppResult<ApiResponse<Address>> {
    let txn = state.orm.begin().await?;
    let existing = owned_address(&txn, payload.user_id, payload.address_id).await?;
    let mut active: AddressActive = existing.into();

    if let Some(province) = payload.province {
        require("province", &province)?;
        active.province = Set(province);
    }
    if let Some(city) = payload.city {
        require("city", &city)?;
        active.city = Set(city);
    }
    if let Some(county) = payload.county {
        active.county = Set(county);
    }
    if let Some(detailed_address) = payload.detailed_address {
        require("detailed_address", &detailed_address)?;
        active.detailed_address = Set(detailed_address);
    }
    if let Some(receiver_name) = payload.receiver_name {
        require("receiver_name", &receiver_name)?;
        active.receiver_name = Set(receiver_name);
    }
    if let Some(phone_number) = payload.phone_number {
        require("phone_number", &phone_number)?;
        active.phone_number = Set(phone_number);
    }
    if let Some(remark) = payload.remark {
        active.remark = Set(Some(remark));
    }
    if let Some(is_default) = payload.is_default {
        if is_default {
            clear_other_defaults(&txn, payload.user_id, Some(payload.address_id)).await?;
        }
        active.is_default = Set(is_default);
    }
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&txn).await?;
    txn.commit().await?;

    Ok(ApiResponse::success(
        "Address updated",
        updated.into(),
        Some(Meta::empty()),
    ))
}

pub async fn set_default_address(
    state: &AppState,
    payload: AddressRef,
) -> AppResult<ApiResponse<Address>> {
    let txn = state.orm.begin().await?;
    let existing = owned_address(&txn, payload.user_id, payload.address_id).await?;
    clear_other_defaults(&txn, payload.user_id, Some(payload.address_id)).await?;

    let mut active: AddressActive = existing.into();
    active.is_default = Set(true);
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&txn).await?;
    txn.commit().await?;

    Ok(ApiResponse::success(
        "Default address set",
        updated.into(),
        Some(Meta::empty()),
    ))
}

pub async fn list_addresses(state: &AppState, user_id: i32) -> AppResult<ApiResponse<AddressList>> {
    ensure_user(&state.orm, user_id).await?;
    let items: Vec<Address> = Addresses::find()
        .filter(AddressCol::UserId.eq(user_id))
        .order_by_desc(AddressCol::IsDefault)
        .order_by_asc(AddressCol::CreatedAt)
        .order_by_asc(AddressCol::AddressId)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Address::from)
        .collect();

    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "OK",
        AddressList { items },
        Some(Meta::new(1, total, total)),
    ))
}

pub async fn get_address(state: &AppState, payload: AddressRef) -> AppResult<ApiResponse<Address>> {
    let address = owned_address(&state.orm, payload.user_id, payload.address_id).await?;
    Ok(ApiResponse::success("OK", address.into(), Some(Meta::empty())))
}
