use crate::app::Result;
use crate::domain::check_channel;
use crate::store::Store;

pub const TRACKED_CHANNELS_KEY: &str = "tracked-channels";

/// Channels the user follows, persisted as one JSON string list.
///
/// Loaded once at startup and written back on every change.
pub struct TrackedChannels<'a, S: Store> {
    store: &'a S,
    channels: Vec<String>,
}

impl<'a, S: Store> TrackedChannels<'a, S> {
    pub fn load(store: &'a S) -> Result<Self> {
        let channels = match store.get_value(TRACKED_CHANNELS_KEY)? {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable tracked channel list: {}", e);
                Vec::new()
            }),
            None => Vec::new(),
        };
        Ok(Self { store, channels })
    }

    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    pub fn contains(&self, channel: &str) -> bool {
        self.channels.iter().any(|c| c == channel)
    }

    /// Returns false when the channel was already tracked.
    pub fn add(&mut self, channel: &str) -> Result<bool> {
        check_channel(channel)?;
        if self.contains(channel) {
            return Ok(false);
        }
        self.channels.push(channel.to_string());
        self.save()?;
        Ok(true)
    }

    /// Returns false when the channel was not tracked.
    pub fn remove(&mut self, channel: &str) -> Result<bool> {
        let before = self.channels.len();
        self.channels.retain(|c| c != channel);
        if self.channels.len() == before {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    fn save(&self) -> Result<()> {
        if self.channels.is_empty() {
            return self.store.delete_value(TRACKED_CHANNELS_KEY);
        }
        let raw = serde_json::to_string(&self.channels)?;
        self.store.set_value(TRACKED_CHANNELS_KEY, &raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ErrorKind;
    use crate::store::SqliteStore;

    #[test]
    fn test_empty_by_default() {
        let store = SqliteStore::in_memory().unwrap();
        let tracked = TrackedChannels::load(&store).unwrap();
        assert!(tracked.channels().is_empty());
    }

    #[test]
    fn test_add_persists_immediately() {
        let store = SqliteStore::in_memory().unwrap();
        let mut tracked = TrackedChannels::load(&store).unwrap();
        assert!(tracked.add("rustlang").unwrap());
        assert!(tracked.add("tokio_rs").unwrap());

        let raw = store.get_value(TRACKED_CHANNELS_KEY).unwrap().unwrap();
        assert_eq!(raw, r#"["rustlang","tokio_rs"]"#);

        let reloaded = TrackedChannels::load(&store).unwrap();
        assert_eq!(reloaded.channels(), ["rustlang", "tokio_rs"]);
    }

    #[test]
    fn test_add_duplicate_is_noop() {
        let store = SqliteStore::in_memory().unwrap();
        let mut tracked = TrackedChannels::load(&store).unwrap();
        tracked.add("rustlang").unwrap();
        assert!(!tracked.add("rustlang").unwrap());
        assert_eq!(tracked.channels().len(), 1);
    }

    #[test]
    fn test_add_invalid_channel() {
        let store = SqliteStore::in_memory().unwrap();
        let mut tracked = TrackedChannels::load(&store).unwrap();
        let err = tracked.add("not a channel").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(store.get_value(TRACKED_CHANNELS_KEY).unwrap().is_none());
    }

    #[test]
    fn test_remove() {
        let store = SqliteStore::in_memory().unwrap();
        let mut tracked = TrackedChannels::load(&store).unwrap();
        tracked.add("a").unwrap();
        tracked.add("b").unwrap();

        assert!(tracked.remove("a").unwrap());
        assert!(!tracked.remove("a").unwrap());

        let reloaded = TrackedChannels::load(&store).unwrap();
        assert_eq!(reloaded.channels(), ["b"]);
    }

    #[test]
    fn test_removing_last_channel_clears_key() {
        let store = SqliteStore::in_memory().unwrap();
        let mut tracked = TrackedChannels::load(&store).unwrap();
        tracked.add("rustlang").unwrap();
        assert!(store.get_value(TRACKED_CHANNELS_KEY).unwrap().is_some());

        assert!(tracked.remove("rustlang").unwrap());
        assert!(store.get_value(TRACKED_CHANNELS_KEY).unwrap().is_none());
        assert!(TrackedChannels::load(&store).unwrap().channels().is_empty());
    }

    #[test]
    fn test_corrupt_list_loads_empty() {
        let store = SqliteStore::in_memory().unwrap();
        store.set_value(TRACKED_CHANNELS_KEY, "{not json").unwrap();
        let tracked = TrackedChannels::load(&store).unwrap();
        assert!(tracked.channels().is_empty());
    }
}
