//! In-memory `FetchPort` that replays queued responses.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::app::Result;
use crate::domain::{Direction, Item, Offset};
use crate::fetcher::{FetchPort, InitialPage, Page};

pub fn items(ids: impl IntoIterator<Item = i64>) -> Vec<Item> {
    ids.into_iter().map(|id| Item::new(id, "test")).collect()
}

pub fn ids(items: &[Item]) -> Vec<i64> {
    items.iter().map(|i| i.id).collect()
}

pub struct ScriptedFetchPort {
    initial: Mutex<VecDeque<Result<InitialPage>>>,
    older: Mutex<VecDeque<Result<Page>>>,
    newer: Mutex<VecDeque<Result<Page>>>,
    calls: Mutex<Vec<(Direction, i64)>>,
    held: AtomicBool,
    gate: Semaphore,
}

impl Default for ScriptedFetchPort {
    fn default() -> Self {
        Self {
            initial: Mutex::new(VecDeque::new()),
            older: Mutex::new(VecDeque::new()),
            newer: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            held: AtomicBool::new(false),
            gate: Semaphore::new(0),
        }
    }
}

impl ScriptedFetchPort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_initial(&self, ids: impl IntoIterator<Item = i64>, cursors: Offset) {
        self.initial.lock().unwrap().push_back(Ok(InitialPage {
            items: items(ids),
            cursors,
        }));
    }

    pub fn push_older(&self, page: Result<Page>) {
        self.older.lock().unwrap().push_back(page);
    }

    pub fn push_newer(&self, page: Result<Page>) {
        self.newer.lock().unwrap().push_back(page);
    }

    pub fn calls(&self) -> Vec<(Direction, i64)> {
        self.calls.lock().unwrap().clone()
    }

    /// Make every following page request wait for `release`.
    pub fn hold(&self) {
        self.held.store(true, Ordering::SeqCst);
    }

    pub fn release(&self, requests: usize) {
        self.gate.add_permits(requests);
    }
}

#[async_trait]
impl FetchPort for ScriptedFetchPort {
    async fn fetch_initial(&self, _channel: &str) -> Result<InitialPage> {
        self.initial
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(InitialPage::default()))
    }

    async fn fetch_page(&self, _channel: &str, cursor: i64, direction: Direction) -> Result<Page> {
        self.calls.lock().unwrap().push((direction, cursor));

        if self.held.load(Ordering::SeqCst) {
            if let Ok(permit) = self.gate.acquire().await {
                permit.forget();
            }
        }

        let queue = match direction {
            Direction::Before => &self.older,
            Direction::After => &self.newer,
        };
        let next = queue.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(Page::default()))
    }
}
