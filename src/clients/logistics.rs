use async_trait::async_trait;
use serde::Deserialize;

use super::{ProviderError, http_client};
use crate::models::LogisticsEvent;

#[async_trait]
pub trait LogisticsProvider: Send + Sync {
    /// Carrier trace for a shipment, oldest event first.
    async fn track(
        &self,
        express_company: &str,
        express_number: &str,
    ) -> Result<Vec<LogisticsEvent>, ProviderError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TrackResponse {
    success: bool,
    reason: Option<String>,
    #[serde(default)]
    traces: Vec<Trace>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Trace {
    accept_time: String,
    #[serde(default)]
    location: String,
    accept_station: String,
}

/// Tracking aggregator speaking the common `Success`/`Reason`/`Traces` JSON shape.
pub struct HttpLogisticsProvider {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl HttpLogisticsProvider {
    pub fn new(url: &str, api_key: &str) -> reqwest::Result<Self> {
        Ok(Self {
            client: http_client(10)?,
            url: url.to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl LogisticsProvider for HttpLogisticsProvider {
    async fn track(
        &self,
        express_company: &str,
        express_number: &str,
    ) -> Result<Vec<LogisticsEvent>, ProviderError> {
        if self.url.is_empty() {
            return Err(ProviderError::NotConfigured);
        }

        let body: TrackResponse = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "ShipperCode": express_company,
                "LogisticCode": express_number,
            }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if !body.success {
            return Err(ProviderError::Rejected(
                body.reason.unwrap_or_else(|| "tracking lookup failed".into()),
            ));
        }

        Ok(body
            .traces
            .into_iter()
            .map(|t| LogisticsEvent {
                time: t.accept_time,
                location: t.location,
                description: t.accept_station,
            })
            .collect())
    }
}
