//! # Eddy
//!
//! Live-updating reader for public channel feeds.
//!
//! ## Architecture
//!
//! ```text
//! FetchPort → FeedPager → FeedSynchronizer → view
//!                                  │
//!                    VisibilityAnalytics → AnalyticsTransport
//! ```
//!
//! - [`feed`]: bidirectional paging, staged new posts, poll loop
//! - [`analytics`]: dwell-based view reporting with batched delivery
//! - [`playback`]: at most one playing media element
//! - [`cache`]: request-coalescing cache for channel metadata
//!
//! ## Quick Start
//!
//! ```bash
//! # Track a channel
//! eddy track add rustlang
//!
//! # Print the latest posts and two older pages
//! eddy history rustlang --pages 2
//!
//! # Follow new posts
//! eddy watch rustlang --interval 30s
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct owns the application-scoped
/// instances: store, fetcher, channel cache, playback coordinator, analytics.
pub mod app;

/// View analytics.
///
/// - [`VisibilityAnalytics`](analytics::VisibilityAnalytics): dwell timers and the event queue
/// - [`FlushScheduler`](analytics::FlushScheduler): periodic delivery with retry
pub mod analytics;

/// Keyed resource cache with in-flight request sharing.
pub mod cache;

/// Command-line interface using clap.
///
/// - `track add|remove|list` - Manage tracked channels
/// - `info <channel>` - Show channel metadata
/// - `history <channel>` - Print posts, paging back
/// - `watch <channel>` - Follow new posts
pub mod cli;

/// Configuration loaded from `~/.config/eddy/config.toml`.
pub mod config;

/// Core domain models.
///
/// - [`Item`](domain::Item): a post in a channel
/// - [`Offset`](domain::Offset): paging cursors
/// - [`ChannelMeta`](domain::ChannelMeta): channel metadata
pub mod domain;

/// Channel feed state and synchronization.
pub mod feed;

/// Content service access.
///
/// - [`FetchPort`](fetcher::FetchPort): async trait for paged fetches
/// - [`HttpFetchPort`](fetcher::http_fetcher::HttpFetchPort): reqwest-based implementation
pub mod fetcher;

/// Single active media player coordination.
pub mod playback;

/// SQLite persistence for the tracked channel list.
///
/// - [`Store`](store::Store): key/value storage trait
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
pub mod store;
