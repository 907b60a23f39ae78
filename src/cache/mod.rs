//! Request-coalescing cache for small keyed remote resources.
//!
//! Successful lookups are kept for the lifetime of the cache. Concurrent
//! lookups of the same key share one request; failures are not cached and
//! resolve to `None` for the callers that were waiting on them.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};

use crate::app::Result;

/// Fetches one resource by key.
#[async_trait]
pub trait ResourceLoader<K, V>: Send + Sync
where
    K: Sync,
{
    async fn load(&self, key: &K) -> Result<V>;
}

type InFlight<V> = Shared<BoxFuture<'static, Option<V>>>;

struct Entries<K, V> {
    values: HashMap<K, V>,
    in_flight: HashMap<K, InFlight<V>>,
}

impl<K, V> Default for Entries<K, V> {
    fn default() -> Self {
        Self {
            values: HashMap::new(),
            in_flight: HashMap::new(),
        }
    }
}

pub struct ResourceCache<K, V> {
    loader: Arc<dyn ResourceLoader<K, V>>,
    entries: Arc<Mutex<Entries<K, V>>>,
}

impl<K, V> ResourceCache<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(loader: Arc<dyn ResourceLoader<K, V>>) -> Self {
        Self {
            loader,
            entries: Arc::new(Mutex::new(Entries::default())),
        }
    }

    /// Cached value without touching the network.
    pub fn peek(&self, key: &K) -> Option<V> {
        lock(&self.entries).values.get(key).cloned()
    }

    pub fn is_loading(&self, key: &K) -> bool {
        lock(&self.entries).in_flight.contains_key(key)
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve `key`, joining an outstanding request if there is one.
    pub async fn get(&self, key: K) -> Option<V> {
        let request = {
            let mut entries = lock(&self.entries);
            if let Some(value) = entries.values.get(&key) {
                return Some(value.clone());
            }
            match entries.in_flight.get(&key) {
                Some(request) => request.clone(),
                None => {
                    let request = self.start_request(key.clone());
                    entries.in_flight.insert(key, request.clone());
                    request
                }
            }
        };

        request.await
    }

    /// Start lookups for every key that is neither cached nor loading.
    pub fn preload(self: &Arc<Self>, keys: impl IntoIterator<Item = K>) {
        for key in keys {
            if self.peek(&key).is_some() || self.is_loading(&key) {
                continue;
            }
            let cache = Arc::clone(self);
            tokio::spawn(async move {
                cache.get(key).await;
            });
        }
    }

    /// The shared future does its own bookkeeping, so it runs exactly once
    /// no matter how many callers await it.
    fn start_request(&self, key: K) -> InFlight<V> {
        let loader = Arc::clone(&self.loader);
        let entries = Arc::clone(&self.entries);

        async move {
            let result = loader.load(&key).await;
            let mut entries = lock(&entries);
            entries.in_flight.remove(&key);

            match result {
                Ok(value) => {
                    entries.values.insert(key, value.clone());
                    Some(value)
                }
                Err(e) => {
                    tracing::warn!("Failed to load {:?}: {}", key, e);
                    None
                }
            }
        }
        .boxed()
        .shared()
    }
}

fn lock<K, V>(entries: &Mutex<Entries<K, V>>) -> MutexGuard<'_, Entries<K, V>> {
    entries.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::EddyError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Semaphore;
    use tokio_test::{assert_pending, assert_ready};

    struct CountingLoader {
        calls: AtomicUsize,
        fail_first: AtomicUsize,
        gate: Semaphore,
    }

    impl CountingLoader {
        fn new(open: bool, fail_first: usize) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail_first: AtomicUsize::new(fail_first),
                gate: Semaphore::new(if open { Semaphore::MAX_PERMITS } else { 0 }),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ResourceLoader<String, String> for CountingLoader {
        async fn load(&self, key: &String) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.gate.acquire().await.unwrap().forget();
            let failing = self
                .fail_first
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failing {
                return Err(EddyError::Transient("timeout".into()));
            }
            Ok(format!("meta:{}", key))
        }
    }

    #[tokio::test]
    async fn test_concurrent_gets_share_one_request() {
        let loader = CountingLoader::new(false, 0);
        let cache = ResourceCache::new(loader.clone());

        let mut first = tokio_test::task::spawn(cache.get("x".to_string()));
        let mut second = tokio_test::task::spawn(cache.get("x".to_string()));
        let mut third = tokio_test::task::spawn(cache.get("x".to_string()));
        assert_pending!(first.poll());
        assert_pending!(second.poll());
        assert_pending!(third.poll());
        assert!(cache.is_loading(&"x".to_string()));

        loader.gate.add_permits(1);
        assert_eq!(assert_ready!(first.poll()), Some("meta:x".to_string()));
        assert_eq!(assert_ready!(second.poll()), Some("meta:x".to_string()));
        assert_eq!(assert_ready!(third.poll()), Some("meta:x".to_string()));
        assert_eq!(loader.calls(), 1);
        assert!(!cache.is_loading(&"x".to_string()));
    }

    #[tokio::test]
    async fn test_cached_value_skips_loader() {
        let loader = CountingLoader::new(true, 0);
        let cache = ResourceCache::new(loader.clone());

        assert_eq!(cache.get("x".into()).await, Some("meta:x".into()));
        assert_eq!(cache.peek(&"x".into()), Some("meta:x".into()));
        assert_eq!(cache.get("x".into()).await, Some("meta:x".into()));
        assert_eq!(loader.calls(), 1);
    }

    #[tokio::test]
    async fn test_distinct_keys_load_separately() {
        let loader = CountingLoader::new(true, 0);
        let cache = ResourceCache::new(loader.clone());

        let (a, b) = tokio::join!(cache.get("a".into()), cache.get("b".into()));
        assert_eq!(a, Some("meta:a".into()));
        assert_eq!(b, Some("meta:b".into()));
        assert_eq!(loader.calls(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let loader = CountingLoader::new(true, 1);
        let cache = ResourceCache::new(loader.clone());

        assert_eq!(cache.get("x".into()).await, None);
        assert!(cache.is_empty());
        assert!(!cache.is_loading(&"x".into()));

        assert_eq!(cache.get("x".into()).await, Some("meta:x".into()));
        assert_eq!(loader.calls(), 2);
    }

    #[tokio::test]
    async fn test_failure_resolves_every_waiter_to_none() {
        let loader = CountingLoader::new(false, 1);
        let cache = ResourceCache::new(loader.clone());

        let mut first = tokio_test::task::spawn(cache.get("x".to_string()));
        let mut second = tokio_test::task::spawn(cache.get("x".to_string()));
        assert_pending!(first.poll());
        assert_pending!(second.poll());

        loader.gate.add_permits(1);
        assert_eq!(assert_ready!(first.poll()), None);
        assert_eq!(assert_ready!(second.poll()), None);
        assert_eq!(loader.calls(), 1);
    }

    #[tokio::test]
    async fn test_preload_skips_known_keys() {
        let loader = CountingLoader::new(true, 0);
        let cache = Arc::new(ResourceCache::new(loader.clone()));
        cache.get("a".into()).await;

        cache.preload(["a".to_string(), "b".to_string(), "b".to_string()]);
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        assert_eq!(cache.peek(&"b".into()), Some("meta:b".into()));
        assert_eq!(loader.calls(), 2);
    }

    #[tokio::test]
    async fn test_preload_swallows_errors() {
        let loader = CountingLoader::new(true, 1);
        let cache = Arc::new(ResourceCache::new(loader.clone()));

        cache.preload(["x".to_string()]);
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(cache.peek(&"x".into()).is_none());
        assert_eq!(cache.get("x".into()).await, Some("meta:x".into()));
    }
}
