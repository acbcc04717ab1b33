use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub media_root: String,
    pub media_url: String,
    pub shop_name: String,
    pub wechat_app_id: String,
    pub wechat_app_secret: String,
    pub wechat_login_url: String,
    pub logistics_api_url: String,
    pub logistics_api_key: String,
    pub token_cache_ttl_secs: u64,
    pub body_limit_bytes: usize,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let jwt_secret = env::var("JWT_SECRET")?;
        let host = var_or("APP_HOST", "127.0.0.1");
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let token_cache_ttl_secs = env::var("TOKEN_CACHE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(600);
        let body_limit_bytes = env::var("BODY_LIMIT_BYTES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(10 * 1024 * 1024);

        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            media_root: var_or("MEDIA_ROOT", "media"),
            media_url: var_or("MEDIA_URL", "/media"),
            shop_name: var_or("SHOP_NAME", "youlan_kids"),
            wechat_app_id: var_or("WECHAT_APP_ID", ""),
            wechat_app_secret: var_or("WECHAT_APP_SECRET", ""),
            wechat_login_url: var_or(
                "WECHAT_LOGIN_URL",
                "https://api.weixin.qq.com/sns/jscode2session",
            ),
            logistics_api_url: var_or("LOGISTICS_API_URL", ""),
            logistics_api_key: var_or("LOGISTICS_API_KEY", ""),
            token_cache_ttl_secs,
            body_limit_bytes,
        })
    }
}
