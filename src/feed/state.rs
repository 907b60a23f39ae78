use std::collections::HashSet;

use crate::domain::{newest_first, Item, Offset};

/// Live sequence, staging buffer and cursors of one channel.
///
/// Every method is a complete transition; callers hold the lock for exactly
/// one call so a splice is never split across an await point.
#[derive(Debug, Default)]
pub struct FeedState {
    live: Vec<Item>,
    staging: Vec<Item>,
    /// Ids present in `live` or `staging`.
    seen: HashSet<i64>,
    cursors: Offset,
    /// Newest id fetched so far, committed into `cursors.after` on merge.
    pending_after: Option<i64>,
    no_more_older: bool,
    initialized: bool,
}

impl FeedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace everything with a freshly loaded first page.
    pub fn initialize(&mut self, items: Vec<Item>, cursors: Offset) {
        self.live.clear();
        self.staging.clear();
        self.seen.clear();
        self.pending_after = None;
        self.no_more_older = false;

        let fresh = self.take_unseen(items);
        self.live = fresh;

        self.cursors = Offset {
            before: cursors.before.or_else(|| self.live.last().map(|i| i.id)),
            after: cursors.after.or_else(|| self.live.first().map(|i| i.id)),
        };
        self.initialized = true;
    }

    /// Append an older page at the tail. Returns how many items were new.
    pub fn append_older(&mut self, batch: Vec<Item>) -> usize {
        let fresh = self.take_unseen(batch);
        let count = fresh.len();
        self.live.extend(fresh);

        if count > 0 {
            self.cursors.before = self.live.last().map(|i| i.id);
        }
        count
    }

    pub fn mark_exhausted(&mut self) {
        self.no_more_older = true;
    }

    /// Put newer items in front of the staging buffer without touching the
    /// live sequence or the committed cursors.
    pub fn stage(&mut self, batch: Vec<Item>) -> usize {
        let fresh = self.take_unseen(batch);
        let count = fresh.len();

        if let Some(newest) = fresh.first().map(|i| i.id) {
            self.pending_after = Some(match self.latest_after() {
                Some(current) => current.max(newest),
                None => newest,
            });
            self.staging.splice(0..0, fresh);
        }
        count
    }

    /// Move the whole staging buffer to the head of the live sequence.
    pub fn commit(&mut self) -> usize {
        let count = self.staging.len();
        if count > 0 {
            let staged: Vec<Item> = self.staging.drain(..).collect();
            self.live.splice(0..0, staged);
        }

        if let Some(after) = self.pending_after.take() {
            self.cursors.after = Some(after);
        }
        if self.cursors.before.is_none() {
            self.cursors.before = self.live.last().map(|i| i.id);
        }
        count
    }

    /// Cursor for the next newer-direction fetch, ahead of any unmerged items.
    pub fn latest_after(&self) -> Option<i64> {
        self.pending_after.or(self.cursors.after)
    }

    pub fn items(&self) -> &[Item] {
        &self.live
    }

    pub fn staged(&self) -> &[Item] {
        &self.staging
    }

    pub fn offset(&self) -> Offset {
        self.cursors
    }

    pub fn has_new_items(&self) -> bool {
        !self.staging.is_empty()
    }

    pub fn no_more_older(&self) -> bool {
        self.no_more_older
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Sort newest-first and drop ids already known, keeping the first
    /// occurrence inside the batch as well.
    fn take_unseen(&mut self, mut batch: Vec<Item>) -> Vec<Item> {
        newest_first(&mut batch);
        batch.retain(|item| self.seen.insert(item.id));
        batch
    }
}
