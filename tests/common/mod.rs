#![allow(dead_code)]

use std::{borrow::Cow, error::Error as StdError, fmt, sync::Arc};

use async_trait::async_trait;
use sqlx::error::DatabaseError;
use youlan_api::{
    clients::{
        ProviderError,
        logistics::LogisticsProvider,
        wechat::{OAuthProvider, OAuthSession},
    },
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    models::LogisticsEvent,
    state::AppState,
    storage::MemoryBlobStore,
};

pub struct FixedWechat;

#[async_trait]
impl OAuthProvider for FixedWechat {
    async fn exchange_code(&self, code: &str) -> Result<OAuthSession, ProviderError> {
        if code == "bad" {
            return Err(ProviderError::Rejected("invalid code".into()));
        }
        Ok(OAuthSession {
            openid: format!("openid-{code}"),
            unionid: None,
        })
    }
}

pub struct FixedCarrier;

#[async_trait]
impl LogisticsProvider for FixedCarrier {
    async fn track(
        &self,
        _express_company: &str,
        _express_number: &str,
    ) -> Result<Vec<LogisticsEvent>, ProviderError> {
        Ok(vec![LogisticsEvent {
            time: "2024-06-01 10:00:00".into(),
            location: "杭州".into(),
            description: "已揽收".into(),
        }])
    }
}

pub fn test_config(database_url: &str) -> AppConfig {
    AppConfig {
        database_url: database_url.to_string(),
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "flow-secret".into(),
        media_root: "media".into(),
        media_url: "/media/".into(),
        shop_name: "youlan_kids".into(),
        wechat_app_id: String::new(),
        wechat_app_secret: String::new(),
        wechat_login_url: String::new(),
        logistics_api_url: String::new(),
        logistics_api_key: String::new(),
        token_cache_ttl_secs: 60,
        body_limit_bytes: 1024 * 1024,
    }
}

/// Database for flow tests, or `None` to skip them.
pub fn database_url() -> Option<String> {
    match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
        Ok(url) => Some(url),
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run flow tests.");
            None
        }
    }
}

pub async fn setup_state(database_url: &str) -> anyhow::Result<(AppState, Arc<MemoryBlobStore>)> {
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;
    let blobs = Arc::new(MemoryBlobStore::new());
    let state = AppState::with_parts(
        orm,
        test_config(database_url),
        blobs.clone(),
        Arc::new(FixedWechat),
        Arc::new(FixedCarrier),
    );
    Ok((state, blobs))
}

pub fn suffix() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_uppercase()
}

#[derive(Debug)]
pub struct DuplicateKey;

impl fmt::Display for DuplicateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl StdError for DuplicateKey {}

impl DatabaseError for DuplicateKey {
    fn message(&self) -> &str {
        "duplicate key value violates unique constraint"
    }

    fn code(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed("23505"))
    }

    fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self
    }

    fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
        self
    }

    fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
        self
    }

    fn kind(&self) -> sqlx::error::ErrorKind {
        sqlx::error::ErrorKind::UniqueViolation
    }
}

pub fn duplicate_key() -> sqlx::Error {
    sqlx::Error::Database(Box::new(DuplicateKey))
}
