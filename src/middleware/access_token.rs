//! IP-bound access tokens guarding the public API.
//!
//! A token is valid only when presented from the address it was issued to.
//! Successful lookups are cached for a few minutes; a mismatch evicts the
//! cached binding so the next request goes back to the database.

use std::{future::Future, net::SocketAddr, time::Duration};

use axum::{
    body::{Body, to_bytes},
    extract::{ConnectInfo, FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use moka::future::Cache;

use crate::{error::AppError, services::access_token_service, state::AppState};

pub const TOKEN_PARAM: &str = "access_token";

const EXEMPT_PREFIXES: &[&str] = &[
    "/health",
    "/docs",
    "/media/",
    "/static/",
    "/api/access_token/",
];

const FORM_BODY_LIMIT: usize = 1024 * 1024;

pub fn is_exempt(path: &str) -> bool {
    EXEMPT_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

/// First `X-Forwarded-For` hop, else the socket peer.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
}

fn token_from_pairs(raw: &[u8]) -> Option<String> {
    url::form_urlencoded::parse(raw)
        .find(|(key, _)| key == TOKEN_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|token| !token.is_empty())
}

pub fn token_from_query(query: Option<&str>) -> Option<String> {
    query.and_then(|q| token_from_pairs(q.as_bytes()))
}

pub fn token_from_form(body: &[u8]) -> Option<String> {
    token_from_pairs(body)
}

/// Caller address as seen by the token gate.
#[derive(Debug, Clone)]
pub struct ClientIp(pub String);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        client_ip(&parts.headers, peer)
            .map(ClientIp)
            .ok_or_else(|| AppError::BadRequest("Unable to determine client IP address".into()))
    }
}

/// Cached token → bound IP lookups.
#[derive(Clone)]
pub struct AccessTokenGate {
    cache: Cache<String, String>,
}

impl AccessTokenGate {
    pub fn new(ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(100_000)
            .time_to_live(ttl)
            .build();
        Self { cache }
    }

    /// Accepts when `token` is bound to `ip`. `load` resolves the bound IP on a cache miss.
    pub async fn validate<F, Fut>(&self, token: &str, ip: &str, load: F) -> Result<(), AppError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<String>, AppError>>,
    {
        let bound_ip = match self.cache.get(token).await {
            Some(ip) => ip,
            None => {
                let ip = load()
                    .await?
                    .ok_or_else(|| AppError::Unauthorized("Invalid access token".into()))?;
                self.cache.insert(token.to_string(), ip.clone()).await;
                ip
            }
        };

        if bound_ip != ip {
            self.cache.invalidate(token).await;
            tracing::warn!(client_ip = %ip, "access token presented from a different address");
            return Err(AppError::Unauthorized("IP address does not match token".into()));
        }
        Ok(())
    }

    pub async fn remember(&self, token: &str, ip: &str) {
        self.cache.insert(token.to_string(), ip.to_string()).await;
    }

    pub async fn is_cached(&self, token: &str) -> bool {
        self.cache.get(token).await.is_some()
    }
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"))
}

pub async fn require_access_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if is_exempt(request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let (mut parts, body) = request.into_parts();
    let ClientIp(ip) = ClientIp::from_request_parts(&mut parts, &state).await?;

    let mut token = token_from_query(parts.uri.query());
    let body = if token.is_none() && is_form(&parts.headers) {
        let bytes = to_bytes(body, FORM_BODY_LIMIT)
            .await
            .map_err(|_| AppError::BadRequest("Unreadable form body".into()))?;
        token = token_from_form(&bytes);
        Body::from(bytes)
    } else {
        body
    };

    let token = token.ok_or_else(|| AppError::Unauthorized("Missing access token".into()))?;
    state
        .tokens
        .validate(&token, &ip, || {
            access_token_service::bound_ip(&state.orm, token.clone())
        })
        .await?;

    Ok(next.run(Request::from_parts(parts, body)).await)
}
