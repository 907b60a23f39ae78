use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::app::{EddyError, Result};
use crate::cache::ResourceLoader;
use crate::config::ApiConfig;
use crate::domain::{check_channel, ChannelMeta, Direction};
use crate::fetcher::{FetchPort, InitialPage, Page};

pub struct HttpFetchPort {
    client: Client,
    base_url: Url,
}

impl HttpFetchPort {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .brotli(true)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            base_url: normalize_base_url(&config.base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn channel_url(&self, channel: &str) -> Result<Url> {
        check_channel(channel)?;
        Ok(self.base_url.join(&format!("channels/{}", channel))?)
    }

    pub fn messages_url(&self, channel: &str, cursor: Option<(Direction, i64)>) -> Result<Url> {
        check_channel(channel)?;
        let mut url = self
            .base_url
            .join(&format!("channels/{}/messages", channel))?;

        if let Some((direction, id)) = cursor {
            if id <= 0 {
                return Err(EddyError::Validation(format!(
                    "cursor must be positive, got {}",
                    id
                )));
            }
            url.query_pairs_mut()
                .append_pair(direction.as_str(), &id.to_string());
        }

        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        tracing::debug!("GET {}", url);
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(classify_status(status, url.as_str()));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl FetchPort for HttpFetchPort {
    async fn fetch_initial(&self, channel: &str) -> Result<InitialPage> {
        let url = self.messages_url(channel, None)?;
        self.get_json(url).await
    }

    async fn fetch_page(&self, channel: &str, cursor: i64, direction: Direction) -> Result<Page> {
        let url = self.messages_url(channel, Some((direction, cursor)))?;
        self.get_json(url).await
    }
}

#[async_trait]
impl ResourceLoader<String, ChannelMeta> for HttpFetchPort {
    async fn load(&self, channel: &String) -> Result<ChannelMeta> {
        let url = self.channel_url(channel)?;
        self.get_json(url).await
    }
}

/// Map a non-success status onto the error taxonomy.
pub fn classify_status(status: StatusCode, what: &str) -> EddyError {
    match status {
        StatusCode::NOT_FOUND | StatusCode::GONE => EddyError::NotFound(what.to_string()),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            EddyError::Validation(format!("{} rejected with {}", what, status))
        }
        _ => EddyError::Transient(format!("{} failed with {}", what, status)),
    }
}

pub(crate) fn normalize_base_url(raw: &str) -> Result<Url> {
    // Url::join drops the last segment unless the base ends with a slash
    if raw.ends_with('/') {
        Ok(Url::parse(raw)?)
    } else {
        Ok(Url::parse(&format!("{}/", raw))?)
    }
}
