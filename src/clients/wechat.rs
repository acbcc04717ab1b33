use async_trait::async_trait;
use serde::Deserialize;

use super::{ProviderError, http_client};

/// Identity returned by a mini-program login code exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthSession {
    pub openid: String,
    pub unionid: Option<String>,
}

#[async_trait]
pub trait OAuthProvider: Send + Sync {
    async fn exchange_code(&self, code: &str) -> Result<OAuthSession, ProviderError>;
}

#[derive(Debug, Deserialize)]
struct Code2SessionResponse {
    openid: Option<String>,
    unionid: Option<String>,
    #[serde(default)]
    errcode: i64,
    errmsg: Option<String>,
}

/// `jscode2session` client.
pub struct WechatClient {
    client: reqwest::Client,
    url: String,
    app_id: String,
    app_secret: String,
}

impl WechatClient {
    pub fn new(url: &str, app_id: &str, app_secret: &str) -> reqwest::Result<Self> {
        Ok(Self {
            client: http_client(10)?,
            url: url.to_string(),
            app_id: app_id.to_string(),
            app_secret: app_secret.to_string(),
        })
    }
}

#[async_trait]
impl OAuthProvider for WechatClient {
    async fn exchange_code(&self, code: &str) -> Result<OAuthSession, ProviderError> {
        if self.app_id.is_empty() || self.app_secret.is_empty() {
            return Err(ProviderError::NotConfigured);
        }

        let body: Code2SessionResponse = self
            .client
            .get(&self.url)
            .query(&[
                ("appid", self.app_id.as_str()),
                ("secret", self.app_secret.as_str()),
                ("js_code", code),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if body.errcode != 0 {
            return Err(ProviderError::Rejected(format!(
                "wechat login failed ({}): {}",
                body.errcode,
                body.errmsg.unwrap_or_default()
            )));
        }
        let openid = body
            .openid
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ProviderError::Rejected("wechat login returned no openid".into()))?;

        Ok(OAuthSession {
            openid,
            unionid: body.unionid,
        })
    }
}
