use crate::{
    clock::{to_signed, SharedClock},
    store::{CacheKey, CacheRow, CacheStore},
};
use log::{info, warn};
use serde::{de::DeserializeOwned, Serialize};
use std::{fmt::Display, future::Future, sync::Arc, time::Duration};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Cache,
    Api,
}

/// Data handed back to callers together with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub data: T,
    pub source: Source,
    pub stale: bool,
}
impl<T> Resolved<T> {
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Resolved<U> {
        Resolved {
            data: f(self.data),
            source: self.source,
            stale: self.stale,
        }
    }
}

/// Decides between fresh cache, live data and stale cache for one key.
#[derive(Clone)]
pub struct Resolver {
    store: Arc<dyn CacheStore>,
    clock: SharedClock,
}

impl Resolver {
    pub fn new(store: Arc<dyn CacheStore>, clock: SharedClock) -> Self {
        Self { store, clock }
    }

    /// Serves the cached row if it is at most `ttl` old, otherwise fetches.
    pub async fn resolve<T, E, F, Fut>(&self, key: &CacheKey, ttl: Duration, fetch: F) -> Option<Resolved<T>>
    where
        T: Serialize + DeserializeOwned,
        E: Display,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.run(key, Some(ttl), fetch).await
    }

    /// Always tries a live fetch, keeping the stale fallback.
    pub async fn refresh<T, E, F, Fut>(&self, key: &CacheKey, fetch: F) -> Option<Resolved<T>>
    where
        T: Serialize + DeserializeOwned,
        E: Display,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.run(key, None, fetch).await
    }

    fn read(&self, key: &CacheKey) -> Option<CacheRow> {
        self.store.read(key).unwrap_or_else(|e| {
            warn!("Treating {} as uncached: {}", key, e);
            None
        })
    }
    fn decode<T: DeserializeOwned>(key: &CacheKey, row: &CacheRow) -> Option<T> {
        serde_json::from_str(&row.payload)
            .map_err(|e| warn!("Dropping unreadable cache of {}: {}", key, e))
            .ok()
    }
    fn is_fresh(&self, row: &CacheRow, ttl: Duration) -> bool {
        let age = self.clock.now() - row.last_fetched;
        age >= chrono::Duration::zero() && age <= to_signed(ttl)
    }

    async fn run<T, E, F, Fut>(&self, key: &CacheKey, ttl: Option<Duration>, fetch: F) -> Option<Resolved<T>>
    where
        T: Serialize + DeserializeOwned,
        E: Display,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let cached = self.read(key);
        if let (Some(row), Some(ttl)) = (&cached, ttl) {
            if self.is_fresh(row, ttl) {
                if let Some(data) = Self::decode(key, row) {
                    return Some(Resolved {
                        data,
                        source: Source::Cache,
                        stale: false,
                    });
                }
            }
        }
        match fetch().await {
            Ok(data) => {
                match serde_json::to_string(&data) {
                    Ok(payload) => {
                        if let Err(e) = self.store.write(key, &payload, self.clock.now()) {
                            warn!("Can't cache {}: {}", key, e);
                        }
                    }
                    Err(e) => warn!("Can't serialize {}: {}", key, e),
                }
                Some(Resolved {
                    data,
                    source: Source::Api,
                    stale: false,
                })
            }
            Err(e) => {
                warn!("Live fetch of {} failed: {}", key, e);
                let data = Self::decode(key, cached.as_ref()?)?;
                info!("Serving stale {}", key);
                Some(Resolved {
                    data,
                    source: Source::Cache,
                    stale: true,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::{Clock, ManualClock},
        store::{SqliteStore, StoreError},
    };
    use chrono::{DateTime, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const HOUR: Duration = Duration::from_secs(3600);

    fn setup() -> (Resolver, Arc<SqliteStore>, Arc<ManualClock>) {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let clock = Arc::new(ManualClock::default());
        (Resolver::new(store.clone(), clock.clone()), store, clock)
    }

    async fn ok(calls: &AtomicUsize, v: Vec<u32>) -> Result<Vec<u32>, String> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(v)
    }
    async fn fail(calls: &AtomicUsize) -> Result<Vec<u32>, String> {
        calls.fetch_add(1, Ordering::SeqCst);
        Err("upstream down".to_string())
    }

    #[tokio::test]
    async fn fresh_row_skips_fetch() {
        let (resolver, store, clock) = setup();
        let key = CacheKey::ContestRating(1);
        store.write(&key, "[1,2]", clock.now()).unwrap();
        clock.advance(Duration::from_secs(59 * 60));
        let calls = AtomicUsize::new(0);
        let r = resolver.resolve(&key, HOUR, || ok(&calls, vec![9])).await.unwrap();
        assert_eq!(r, Resolved { data: vec![1, 2], source: Source::Cache, stale: false });
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn expired_row_is_refetched_then_served_from_cache() {
        let (resolver, store, clock) = setup();
        let key = CacheKey::ContestRating(1);
        store.write(&key, "[1]", clock.now()).unwrap();
        clock.advance(2 * HOUR);
        let calls = AtomicUsize::new(0);
        let r = resolver.resolve(&key, HOUR, || ok(&calls, vec![2])).await.unwrap();
        assert_eq!((r.data, r.source, r.stale), (vec![2], Source::Api, false));
        assert_eq!(store.read(&key).unwrap().unwrap().last_fetched, clock.now());

        let r = resolver.resolve(&key, HOUR, || ok(&calls, vec![3])).await.unwrap();
        assert_eq!((r.data, r.source), (vec![2], Source::Cache));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_without_cache_is_absent() {
        let (resolver, store, _) = setup();
        let key = CacheKey::ContestRating(1);
        let calls = AtomicUsize::new(0);
        assert!(resolver.resolve(&key, HOUR, || fail(&calls)).await.is_none());
        assert_eq!(store.read(&key).unwrap(), None);
    }

    #[tokio::test]
    async fn failure_with_old_row_serves_stale() {
        let (resolver, store, clock) = setup();
        let key = CacheKey::user_rating("tourist");
        let written = clock.now();
        store.write(&key, "[7]", written).unwrap();
        clock.advance(2 * HOUR);
        let calls = AtomicUsize::new(0);
        let r = resolver.resolve(&key, HOUR, || fail(&calls)).await.unwrap();
        assert_eq!(r, Resolved { data: vec![7], source: Source::Cache, stale: true });
        assert_eq!(
            store.read(&key).unwrap().unwrap(),
            CacheRow { payload: "[7]".to_string(), last_fetched: written }
        );
    }

    #[tokio::test]
    async fn row_from_the_future_is_not_fresh() {
        let (resolver, store, clock) = setup();
        let key = CacheKey::ContestRating(1);
        store.write(&key, "[1]", clock.now()).unwrap();
        clock.rewind(Duration::from_secs(60));
        let calls = AtomicUsize::new(0);
        let r = resolver.resolve(&key, HOUR, || ok(&calls, vec![2])).await.unwrap();
        assert_eq!(r.source, Source::Api);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn refresh_ignores_freshness() {
        let (resolver, store, clock) = setup();
        let key = CacheKey::ProblemCatalog;
        store.write(&key, "[1]", clock.now()).unwrap();
        let calls = AtomicUsize::new(0);
        let r = resolver.refresh(&key, || ok(&calls, vec![5])).await.unwrap();
        assert_eq!((r.data, r.source), (vec![5], Source::Api));
        let r = resolver.refresh(&key, || fail(&calls)).await.unwrap();
        assert_eq!((r.data, r.stale), (vec![5], true));
    }

    #[tokio::test]
    async fn unreadable_payload_counts_as_missing() {
        let (resolver, store, clock) = setup();
        let key = CacheKey::ContestRating(1);
        store.write(&key, "not json", clock.now()).unwrap();
        let calls = AtomicUsize::new(0);
        assert!(resolver.resolve(&key, HOUR, || fail(&calls)).await.is_none());
        let r = resolver.resolve(&key, HOUR, || ok(&calls, vec![1])).await.unwrap();
        assert_eq!(r.source, Source::Api);
    }

    struct Broken;
    impl CacheStore for Broken {
        fn read(&self, _: &CacheKey) -> Result<Option<CacheRow>, StoreError> {
            Err(StoreError::Poisoned)
        }
        fn write(&self, _: &CacheKey, _: &str, _: DateTime<Utc>) -> Result<(), StoreError> {
            Err(StoreError::Poisoned)
        }
    }

    #[tokio::test]
    async fn broken_store_never_hides_live_data() {
        let resolver = Resolver::new(Arc::new(Broken), Arc::new(ManualClock::default()));
        let calls = AtomicUsize::new(0);
        let key = CacheKey::ProblemCatalog;
        let r = resolver.resolve(&key, HOUR, || ok(&calls, vec![4])).await.unwrap();
        assert_eq!((r.data, r.source, r.stale), (vec![4], Source::Api, false));
        assert!(resolver.resolve(&key, HOUR, || fail(&calls)).await.is_none());
    }
}
