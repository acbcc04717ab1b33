use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};
use rand::Rng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use crate::{
    audit,
    dto::orders::{
        ChangeStatusRequest, CreateOrderRequest, LogisticsSyncResult, OrderCreated, OrderList,
        OrderListQuery, OrderLookup, StatusChanged, SyncLogisticsRequest, UpdateExpressRequest,
        UpdateReceiverRequest,
    },
    entity::{
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_staff},
    models::{LogisticsEvent, Order, OrderStatus},
    response::{ApiResponse, Meta, display_offset},
    retry::{RetryPolicy, with_fresh_id, with_retry},
    state::AppState,
};

const MAX_ID_ATTEMPTS: usize = 5;

/// `Y` + order date in China Standard Time + 8 random digits.
pub fn generate_order_id(now: DateTime<Utc>) -> String {
    let date = now.with_timezone(&display_offset()).format("%Y%m%d");
    let mut rng = rand::rng();
    let digits: String = (0..8)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect();
    format!("Y{date}{digits}")
}

/// Start of a `YYYY-MM-DD` day in China Standard Time, as a UTC instant.
pub fn day_start(raw: &str) -> AppResult<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::bad_request("Dates must be formatted as YYYY-MM-DD"))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| AppError::bad_request("Invalid date"))?;
    display_offset()
        .from_local_datetime(&midnight)
        .single()
        .map(|at| at.with_timezone(&Utc))
        .ok_or_else(|| AppError::bad_request("Invalid date"))
}

/// Half-open UTC range covering the inclusive local day range.
pub fn date_range(
    begin: Option<&str>,
    end: Option<&str>,
) -> AppResult<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)> {
    let begin = begin.filter(|s| !s.is_empty()).map(day_start).transpose()?;
    let end = match end.filter(|s| !s.is_empty()) {
        Some(raw) => Some(
            day_start(raw)?
                .checked_add_days(Days::new(1))
                .ok_or_else(|| AppError::bad_request("Invalid date"))?,
        ),
        None => None,
    };
    if let (Some(b), Some(e)) = (begin, end) {
        if b >= e {
            return Err(AppError::bad_request("begin_date must not be after end_date"));
        }
    }
    Ok((begin, end))
}

fn require(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::bad_request(format!("Missing required field: {field}")));
    }
    Ok(())
}

async fn find_order(state: &AppState, order_id: &str) -> AppResult<OrderModel> {
    let orm = &state.orm;
    with_retry(RetryPolicy::default(), || async move {
        Ok(Orders::find_by_id(order_id.to_string()).one(orm).await?)
    })
    .await?
    .ok_or_else(|| AppError::not_found(format!("Order {order_id} does not exist")))
}

pub async fn create_order(
    state: &AppState,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderCreated>> {
    require("receiver_name", &payload.receiver_name)?;
    require("province", &payload.province)?;
    require("city", &payload.city)?;
    require("county", &payload.county)?;
    require("detailed_address", &payload.detailed_address)?;
    if !payload.product_list.is_array() {
        return Err(AppError::bad_request("product_list must be an array"));
    }
    if payload.order_amount < 0 {
        return Err(AppError::bad_request("order_amount must not be negative"));
    }
    if Users::find_by_id(payload.user_id)
        .one(&state.orm)
        .await?
        .is_none()
    {
        return Err(AppError::not_found(format!(
            "User {} does not exist",
            payload.user_id
        )));
    }

    let now = Utc::now();
    let orm = &state.orm;
    let order = with_fresh_id(
        MAX_ID_ATTEMPTS,
        "an order id",
        || generate_order_id(now),
        |order_id| {
            let active = OrderActive {
                order_id: Set(order_id),
                user_id: Set(payload.user_id),
                receiver_name: Set(payload.receiver_name.clone()),
                receiver_phone: Set(payload.receiver_phone.clone()),
                express_company: Set(payload.express_company.clone()),
                express_number: Set(payload.express_number.clone()),
                logistics_process: Set(None),
                province: Set(payload.province.clone()),
                city: Set(payload.city.clone()),
                county: Set(payload.county.clone()),
                detailed_address: Set(payload.detailed_address.clone()),
                order_amount: Set(payload.order_amount),
                product_list: Set(payload.product_list.clone()),
                status: Set(OrderStatus::Pending.as_str().to_string()),
                order_time: Set(now.into()),
                remarks: Set(payload.remarks.clone()),
            };
            async move { active.insert(orm).await.map_err(AppError::from) }
        },
    )
    .await?;

    audit::record(
        &state.pool,
        Some(&order.user_id.to_string()),
        "order_create",
        "orders",
        serde_json::json!({ "order_id": order.order_id, "amount": order.order_amount }),
    )
    .await;
    Ok(ApiResponse::created(
        "Order created",
        OrderCreated {
            order_id: order.order_id,
            user_id: order.user_id,
            receiver_name: order.receiver_name,
            receiver_phone: order.receiver_phone,
            express_company: order.express_company,
            express_number: order.express_number,
        },
    ))
}

pub async fn get_order(state: &AppState, payload: OrderLookup) -> AppResult<ApiResponse<Order>> {
    let order = find_order(state, &payload.order_id).await?;
    if let Some(user_id) = payload.user_id {
        if order.user_id != user_id {
            return Err(AppError::not_found(format!(
                "Order {} does not exist",
                payload.order_id
            )));
        }
    }
    Ok(ApiResponse::success("OK", order.into(), Some(Meta::empty())))
}

pub async fn update_receiver(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateReceiverRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_staff(user)?;
    let order = find_order(state, &payload.order_id).await?;
    let mut active: OrderActive = order.into();

    let fields = [
        ("receiver_name", payload.receiver_name, &mut active.receiver_name),
        ("receiver_phone", payload.receiver_phone, &mut active.receiver_phone),
        ("province", payload.province, &mut active.province),
        ("city", payload.city, &mut active.city),
        ("county", payload.county, &mut active.county),
        ("detailed_address", payload.detailed_address, &mut active.detailed_address),
    ];
    let mut changed = Vec::new();
    for (name, value, slot) in fields {
        if let Some(value) = value {
            require(name, &value)?;
            *slot = Set(value);
            changed.push(name);
        }
    }
    if changed.is_empty() {
        return Err(AppError::bad_request("No receiver fields to update"));
    }

    let updated = active.update(&state.orm).await?;
    audit::record(
        &state.pool,
        Some(&user.subject),
        "order_update_receiver",
        "orders",
        serde_json::json!({ "order_id": updated.order_id, "fields": changed }),
    )
    .await;

    Ok(ApiResponse::success(
        "Receiver updated",
        updated.into(),
        Some(Meta::empty()),
    ))
}

pub async fn change_status(
    state: &AppState,
    user: &AuthUser,
    payload: ChangeStatusRequest,
) -> AppResult<ApiResponse<StatusChanged>> {
    ensure_staff(user)?;
    let order = find_order(state, &payload.order_id).await?;
    let old_status = order.status.clone();

    let mut active: OrderActive = order.into();
    active.status = Set(payload.status.as_str().to_string());
    if let Some(company) = payload.express_company {
        active.express_company = Set(company);
    }
    if let Some(number) = payload.express_number {
        active.express_number = Set(number);
    }
    if let Some(events) = payload.logistics_process {
        let value = serde_json::to_value(events).map_err(anyhow::Error::from)?;
        active.logistics_process = Set(Some(value));
    }
    let updated = active.update(&state.orm).await?;

    tracing::info!(
        order_id = %updated.order_id,
        old_status = %old_status,
        new_status = %updated.status,
        "order status changed"
    );
    audit::record(
        &state.pool,
        Some(&user.subject),
        "order_status",
        "orders",
        serde_json::json!({
            "order_id": updated.order_id,
            "old_status": old_status,
            "new_status": updated.status,
        }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order status updated",
        StatusChanged {
            old_status,
            order: updated.into(),
        },
        Some(Meta::empty()),
    ))
}

pub async fn update_express(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateExpressRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_staff(user)?;
    if payload.express_company.is_none() && payload.express_number.is_none() {
        return Err(AppError::bad_request(
            "express_company or express_number is required",
        ));
    }
    let order = find_order(state, &payload.order_id).await?;
    let mut active: OrderActive = order.into();
    if let Some(company) = payload.express_company {
        active.express_company = Set(company.trim().to_string());
    }
    if let Some(number) = payload.express_number {
        active.express_number = Set(number.trim().to_string());
    }
    let updated = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(&user.subject),
        "order_update_express",
        "orders",
        serde_json::json!({
            "order_id": updated.order_id,
            "express_company": updated.express_company,
            "express_number": updated.express_number,
        }),
    )
    .await;

    Ok(ApiResponse::success(
        "Express info updated",
        updated.into(),
        Some(Meta::empty()),
    ))
}

fn stored_events(order: &OrderModel) -> Vec<LogisticsEvent> {
    order
        .logistics_process
        .clone()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default()
}

/// Refreshes the carrier trace. A carrier failure leaves the stored trace as
/// it was and is reported in the body rather than as an error.
pub async fn sync_logistics(
    state: &AppState,
    payload: SyncLogisticsRequest,
) -> AppResult<ApiResponse<LogisticsSyncResult>> {
    let order = find_order(state, &payload.order_id).await?;
    let status: OrderStatus = order
        .status
        .parse()
        .map_err(|e: String| AppError::Internal(anyhow::anyhow!(e)))?;
    if !status.is_trackable() {
        return Err(AppError::bad_request(format!(
            "Order is {status}; only shipped or delivered orders can be tracked"
        )));
    }
    if order.express_number.trim().is_empty() {
        return Err(AppError::bad_request("Order has no express number"));
    }

    match state
        .logistics
        .track(&order.express_company, &order.express_number)
        .await
    {
        Ok(events) => {
            let value = serde_json::to_value(&events).map_err(anyhow::Error::from)?;
            let mut active: OrderActive = order.clone().into();
            active.logistics_process = Set(Some(value));
            active.update(&state.orm).await?;
            Ok(ApiResponse::success(
                "Logistics synced",
                LogisticsSyncResult {
                    order_id: order.order_id,
                    express_company: order.express_company,
                    express_number: order.express_number,
                    logistics_process: events,
                    synced: true,
                    reason: None,
                },
                Some(Meta::empty()),
            ))
        }
        Err(err) => {
            tracing::warn!(error = %err, order_id = %order.order_id, "logistics sync failed");
            Ok(ApiResponse::success(
                "Logistics provider unavailable, showing stored trace",
                LogisticsSyncResult {
                    logistics_process: stored_events(&order),
                    order_id: order.order_id,
                    express_company: order.express_company,
                    express_number: order.express_number,
                    synced: false,
                    reason: Some(err.to_string()),
                },
                Some(Meta::empty()),
            ))
        }
    }
}

fn check_shop(state: &AppState, shopname: &str) -> AppResult<()> {
    if shopname != state.config.shop_name {
        return Err(AppError::bad_request("Invalid shopname"));
    }
    Ok(())
}

async fn query_orders(
    state: &AppState,
    query: OrderListQuery,
    include_logistics: bool,
) -> AppResult<ApiResponse<OrderList>> {
    let (begin, end) = date_range(query.begin_date.as_deref(), query.end_date.as_deref())?;
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if let Some(user_id) = query.user_id {
        condition = condition.add(OrderCol::UserId.eq(user_id));
    }
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status.as_str()));
    }
    if let Some(begin) = begin {
        condition = condition.add(OrderCol::OrderTime.gte(begin));
    }
    if let Some(end) = end {
        condition = condition.add(OrderCol::OrderTime.lt(end));
    }

    let finder = Orders::find()
        .filter(condition)
        .order_by_desc(OrderCol::OrderTime)
        .order_by_desc(OrderCol::OrderId);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|m| {
            let mut order = Order::from(m);
            if !include_logistics {
                order.logistics_process.clear();
            }
            order
        })
        .collect();

    Ok(ApiResponse::success(
        "OK",
        OrderList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

/// Staff view across all users. Logistics traces are omitted from the listing.
pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_staff(user)?;
    check_shop(state, &query.shopname)?;
    query_orders(state, query, false).await
}

pub async fn list_user_orders(
    state: &AppState,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    check_shop(state, &query.shopname)?;
    if query.user_id.is_none() {
        return Err(AppError::bad_request("user_id is required"));
    }
    query_orders(state, query, true).await
}
