pub mod http_fetcher;
#[cfg(test)]
pub mod scripted;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::app::Result;
use crate::domain::{Direction, Item, Offset};

/// First page of a channel together with the cursors that bound it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InitialPage {
    pub items: Vec<Item>,
    #[serde(default)]
    pub cursors: Offset,
}

/// One directional page. An empty `items` list is a normal outcome.
///
/// Cursors sent along with a page are ignored; they are derived from the
/// items once the page is merged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Page {
    pub items: Vec<Item>,
}

impl Page {
    pub fn new(items: Vec<Item>) -> Self {
        Self { items }
    }
}

/// Network side of the feed.
///
/// Implementations must keep three outcomes apart: `Ok` with an empty page,
/// `Err(EddyError::NotFound)` when the channel or range no longer exists,
/// and every other `Err` for genuine failures.
#[async_trait]
pub trait FetchPort {
    async fn fetch_initial(&self, channel: &str) -> Result<InitialPage>;

    async fn fetch_page(&self, channel: &str, cursor: i64, direction: Direction) -> Result<Page>;
}
