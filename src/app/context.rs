use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;

use crate::analytics::{transport_for, AnalyticsTransport, FlushScheduler, SchedulerHandle, VisibilityAnalytics};
use crate::app::error::{EddyError, Result};
use crate::cache::ResourceCache;
use crate::config::Config;
use crate::domain::ChannelMeta;
use crate::feed::{FeedPager, FeedSynchronizer, Notice, ScrollPosition};
use crate::fetcher::http_fetcher::HttpFetchPort;
use crate::fetcher::FetchPort;
use crate::playback::PlaybackCoordinator;
use crate::store::sqlite::SqliteStore;

/// Application-scoped instances shared by every view.
pub struct AppContext {
    pub config: Arc<Config>,
    pub store: Arc<SqliteStore>,
    pub fetcher: Arc<dyn FetchPort + Send + Sync>,
    pub channels: Arc<ResourceCache<String, ChannelMeta>>,
    pub playback: Arc<PlaybackCoordinator>,
    pub analytics: Arc<VisibilityAnalytics>,
}

impl AppContext {
    pub fn new(db_path: Option<PathBuf>, config: Config) -> Result<Self> {
        let db_path = match db_path {
            Some(p) => p,
            None => Self::default_db_path()?,
        };
        Self::with_store(Arc::new(SqliteStore::new(&db_path)?), config)
    }

    pub fn in_memory(config: Config) -> Result<Self> {
        Self::with_store(Arc::new(SqliteStore::in_memory()?), config)
    }

    fn with_store(store: Arc<SqliteStore>, config: Config) -> Result<Self> {
        let http = Arc::new(HttpFetchPort::new(&config.api)?);
        let transport = transport_for(&config.api, &config.analytics)?;
        Ok(Self::assemble(config, store, http.clone(), http, transport))
    }

    /// Wire the shared instances from explicit parts.
    pub fn assemble(
        config: Config,
        store: Arc<SqliteStore>,
        fetcher: Arc<dyn FetchPort + Send + Sync>,
        channel_loader: Arc<dyn crate::cache::ResourceLoader<String, ChannelMeta>>,
        transport: Arc<dyn AnalyticsTransport + Send + Sync>,
    ) -> Self {
        let analytics = Arc::new(VisibilityAnalytics::new(
            transport,
            config.analytics.dwell(),
        ));

        Self {
            config: Arc::new(config),
            store,
            fetcher,
            channels: Arc::new(ResourceCache::new(channel_loader)),
            playback: Arc::new(PlaybackCoordinator::new()),
            analytics,
        }
    }

    /// A synchronizer for one channel, sharing this context's fetcher.
    pub fn synchronizer(
        &self,
        channel: &str,
        scroll: Arc<dyn ScrollPosition + Send + Sync>,
        notices: UnboundedSender<Notice>,
    ) -> Arc<FeedSynchronizer> {
        let pager = Arc::new(FeedPager::new(self.fetcher.clone(), channel));
        Arc::new(FeedSynchronizer::new(
            pager,
            scroll,
            notices,
            self.config.sync.poll_interval(),
        ))
    }

    /// Start periodic delivery of view events.
    pub fn start_analytics(&self) -> SchedulerHandle {
        FlushScheduler::new(
            self.config.analytics.flush_interval(),
            self.config.analytics.retry_backoff(),
        )
        .spawn(&self.analytics)
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| EddyError::Config("Could not find data directory".into()))?;
        let eddy_dir = data_dir.join("eddy");
        std::fs::create_dir_all(&eddy_dir)?;
        Ok(eddy_dir.join("eddy.db"))
    }
}
