use chrono::Utc;
use rand::RngCore;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    ActiveValue::NotSet,
};

use crate::{
    audit,
    db::OrmConn,
    dto::access_tokens::{IpList, TokenIssued},
    entity::access_tokens::{ActiveModel as TokenActive, Column as TokenCol, Entity as AccessTokens},
    error::{AppError, AppResult},
    response::{ApiResponse, Meta},
    retry::{RetryPolicy, with_retry},
    state::AppState,
};

const MAX_MINT_ATTEMPTS: usize = 5;

/// 128 random bits, hex encoded.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// IP address a token is bound to, if the token exists.
pub async fn bound_ip(orm: &OrmConn, token: String) -> AppResult<Option<String>> {
    let token = token.as_str();
    with_retry(RetryPolicy::default(), || async move {
        let row = AccessTokens::find()
            .filter(TokenCol::AccessToken.eq(token))
            .one(orm)
            .await?;
        Ok(row.map(|t| t.ip_address))
    })
    .await
}

async fn token_for_ip(orm: &OrmConn, ip: &str) -> AppResult<Option<String>> {
    let row = AccessTokens::find()
        .filter(TokenCol::IpAddress.eq(ip))
        .one(orm)
        .await?;
    Ok(row.map(|t| t.access_token))
}

async fn token_exists(orm: &OrmConn, token: &str) -> AppResult<bool> {
    let row = AccessTokens::find()
        .filter(TokenCol::AccessToken.eq(token))
        .one(orm)
        .await?;
    Ok(row.is_some())
}

/// Returns the token already bound to `ip`, or mints and binds a new one.
/// The boolean is true when a new token was created.
pub async fn issue_or_get(state: &AppState, ip: &str) -> AppResult<(bool, String)> {
    if let Some(token) = token_for_ip(&state.orm, ip).await? {
        return Ok((false, token));
    }

    for _ in 0..MAX_MINT_ATTEMPTS {
        let token = generate_token();
        if token_exists(&state.orm, &token).await? {
            continue;
        }

        let inserted = TokenActive {
            id: NotSet,
            ip_address: Set(ip.to_string()),
            access_token: Set(token.clone()),
            register_time: Set(Utc::now().into()),
        }
        .insert(&state.orm)
        .await;

        match inserted.map_err(AppError::from) {
            Ok(_) => {
                state.tokens.remember(&token, ip).await;
                audit::record(
                    &state.pool,
                    None,
                    "access_token_issued",
                    "access_tokens",
                    serde_json::json!({ "ip_address": ip }),
                )
                .await;
                return Ok((true, token));
            }
            // A concurrent request for the same IP won the race.
            Err(err) if err.is_unique_violation() => {
                if let Some(existing) = token_for_ip(&state.orm, ip).await? {
                    return Ok((false, existing));
                }
            }
            Err(err) => return Err(err),
        }
    }

    Err(AppError::Conflict("Could not allocate a unique access token".into()))
}

pub async fn get_token(state: &AppState, ip: &str) -> AppResult<ApiResponse<TokenIssued>> {
    let (created, access_token) = issue_or_get(state, ip).await?;
    let data = TokenIssued {
        access_token,
        ip_address: ip.to_string(),
    };
    if created {
        Ok(ApiResponse::created("Token generated", data))
    } else {
        Ok(ApiResponse::success(
            "Token already exists for this IP",
            data,
            Some(Meta::empty()),
        ))
    }
}

pub async fn list_ips(state: &AppState, shopname: &str) -> AppResult<ApiResponse<IpList>> {
    if shopname != state.config.shop_name {
        return Err(AppError::BadRequest("Invalid shopname".into()));
    }

    let ips: Vec<String> = AccessTokens::find()
        .select_only()
        .column(TokenCol::IpAddress)
        .distinct()
        .order_by_asc(TokenCol::IpAddress)
        .into_tuple()
        .all(&state.orm)
        .await?;

    let total = ips.len() as i64;
    Ok(ApiResponse::success(
        "OK",
        IpList { ips },
        Some(Meta::new(1, total, total)),
    ))
}
