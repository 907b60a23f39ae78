use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use url::Url;

use crate::app::Result;
use crate::config::{AnalyticsConfig, ApiConfig};
use crate::domain::AnalyticsEvent;
use crate::fetcher::http_fetcher::{classify_status, normalize_base_url};

/// Delivers a batch of view events. Receivers must tolerate duplicates.
#[async_trait]
pub trait AnalyticsTransport {
    async fn deliver(&self, events: &[AnalyticsEvent]) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct ViewRecord<'a> {
    token: &'a str,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct ViewBatch<'a> {
    views: Vec<ViewRecord<'a>>,
}

impl<'a> ViewBatch<'a> {
    fn new(events: &'a [AnalyticsEvent]) -> Self {
        Self {
            views: events
                .iter()
                .map(|e| ViewRecord {
                    token: &e.view_token,
                    timestamp: e.timestamp,
                })
                .collect(),
        }
    }
}

pub struct HttpTransport {
    client: Client,
    endpoint: Url,
}

impl HttpTransport {
    pub fn new(api: &ApiConfig, analytics: &AnalyticsConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(api.timeout_secs))
            .user_agent(api.user_agent.as_str())
            .build()?;
        let endpoint = normalize_base_url(&api.base_url)?.join(&analytics.endpoint)?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl AnalyticsTransport for HttpTransport {
    async fn deliver(&self, events: &[AnalyticsEvent]) -> Result<()> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&ViewBatch::new(events))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status, self.endpoint.as_str()));
        }
        Ok(())
    }
}

/// Accepts everything and sends nothing.
#[derive(Debug, Default)]
pub struct NoopTransport;

#[async_trait]
impl AnalyticsTransport for NoopTransport {
    async fn deliver(&self, events: &[AnalyticsEvent]) -> Result<()> {
        tracing::trace!("Dropping {} view events (analytics disabled)", events.len());
        Ok(())
    }
}

/// Pick the transport for the current environment.
pub fn transport_for(
    api: &ApiConfig,
    analytics: &AnalyticsConfig,
) -> Result<Arc<dyn AnalyticsTransport + Send + Sync>> {
    if analytics.enabled {
        Ok(Arc::new(HttpTransport::new(api, analytics)?))
    } else {
        Ok(Arc::new(NoopTransport))
    }
}
