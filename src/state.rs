use std::{sync::Arc, time::Duration};

use crate::{
    clients::{
        logistics::{HttpLogisticsProvider, LogisticsProvider},
        wechat::{OAuthProvider, WechatClient},
    },
    config::AppConfig,
    db::{DbPool, OrmConn, raw_pool},
    middleware::access_token::AccessTokenGate,
    storage::{BlobStore, FsBlobStore, ImageStore},
};

pub const COMMODITY_NAMESPACE: &str = "commodities";
pub const ACTIVITY_NAMESPACE: &str = "activities";

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub config: Arc<AppConfig>,
    pub images: ImageStore,
    pub tokens: AccessTokenGate,
    pub wechat: Arc<dyn OAuthProvider>,
    pub logistics: Arc<dyn LogisticsProvider>,
}

impl AppState {
    /// Production wiring: filesystem media root and HTTP providers.
    pub fn new(orm: OrmConn, config: AppConfig) -> anyhow::Result<Self> {
        let blobs: Arc<dyn BlobStore> = Arc::new(FsBlobStore::new(&config.media_root));
        let wechat = WechatClient::new(
            &config.wechat_login_url,
            &config.wechat_app_id,
            &config.wechat_app_secret,
        )?;
        let logistics =
            HttpLogisticsProvider::new(&config.logistics_api_url, &config.logistics_api_key)?;
        Ok(Self::with_parts(
            orm,
            config,
            blobs,
            Arc::new(wechat),
            Arc::new(logistics),
        ))
    }

    pub fn with_parts(
        orm: OrmConn,
        config: AppConfig,
        blobs: Arc<dyn BlobStore>,
        wechat: Arc<dyn OAuthProvider>,
        logistics: Arc<dyn LogisticsProvider>,
    ) -> Self {
        let images = ImageStore::new(blobs, COMMODITY_NAMESPACE, &config.media_url);
        let tokens = AccessTokenGate::new(Duration::from_secs(config.token_cache_ttl_secs));
        Self {
            pool: raw_pool(&orm),
            orm,
            config: Arc::new(config),
            images,
            tokens,
            wechat,
            logistics,
        }
    }

    pub fn activity_images(&self) -> ImageStore {
        self.images.with_namespace(ACTIVITY_NAMESPACE)
    }
}
