//! Query cache and invalidation.
//!
//! Responses are stored as JSON values under a [`CacheKey`] with the time
//! they were fetched. A read is served according to the entry's freshness:
//!
//! - fresh (younger than the TTL): returned without any network call,
//! - stale: returned as is while a background refresh runs,
//! - missing or invalidated: fetched before returning.
//!
//! Concurrent reads of the same key share one request. Mutations run through
//! [`QueryCache::mutate`], which serializes them per entity and invalidates
//! the scopes they declare once the request has been attempted.

mod keys;

pub use keys::{CacheKey, EntityKind, EntityRef, Invalidate, ListKind};

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::errors::ClientError;

type FetchResult = Result<Value, ClientError>;
type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

/// How an entry would be served right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Stale,
    Invalidated,
    Missing,
}

/// Counters for cache behaviour, mostly useful in tests and debug logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub stale_hits: u64,
    pub misses: u64,
    pub network_fetches: u64,
    pub invalidated: u64,
}

struct Entry {
    value: Value,
    fetched_at: Instant,
    invalidated: bool,
}

struct InFlight {
    id: u64,
    fetch: SharedFetch,
    waiters: usize,
}

/// One caller's interest in an in-flight request. When the last waiter goes
/// away before the request finishes, the request is dropped so the next read
/// starts a new one instead of joining an abandoned future.
struct Waiter {
    inner: Weak<Inner>,
    key: CacheKey,
    id: u64,
}

impl Drop for Waiter {
    fn drop(&mut self) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let abandoned = {
            let mut in_flight = lock(&inner.in_flight);
            match in_flight.get_mut(&self.key) {
                Some(current) if current.id == self.id => {
                    current.waiters -= 1;
                    if current.waiters == 0 {
                        in_flight.remove(&self.key)
                    } else {
                        None
                    }
                }
                _ => None,
            }
        };
        if abandoned.is_some() {
            debug!(key = %self.key, "in-flight request abandoned by every caller");
        }
    }
}

/// Applies a mutation's invalidations and releases its entity locks, on
/// completion or when the mutation is dropped mid-request.
struct MutationGuard<'a> {
    cache: &'a QueryCache,
    entities: Vec<EntityRef>,
    invalidates: &'a [Invalidate],
    locks: Vec<Arc<tokio::sync::Mutex<()>>>,
    guards: Vec<tokio::sync::OwnedMutexGuard<()>>,
    started: bool,
}

impl Drop for MutationGuard<'_> {
    fn drop(&mut self) {
        if self.started {
            self.cache.invalidate(self.invalidates);
        }
        self.guards.clear();
        self.cache.release_entity_locks(&self.entities, &self.locks);
    }
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    stale_hits: AtomicU64,
    misses: AtomicU64,
    network_fetches: AtomicU64,
    invalidated: AtomicU64,
}

struct Inner {
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, Entry>>,
    in_flight: Mutex<HashMap<CacheKey, InFlight>>,
    entity_locks: Mutex<HashMap<EntityRef, Arc<tokio::sync::Mutex<()>>>>,
    refreshes: Mutex<JoinSet<()>>,
    next_fetch_id: AtomicU64,
    closed: AtomicBool,
    counters: Counters,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Session-scoped cache of server responses.
///
/// Cheap to clone; clones share the same store.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Inner>,
}

impl QueryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                ttl,
                entries: Mutex::new(HashMap::new()),
                in_flight: Mutex::new(HashMap::new()),
                entity_locks: Mutex::new(HashMap::new()),
                refreshes: Mutex::new(JoinSet::new()),
                next_fetch_id: AtomicU64::new(1),
                closed: AtomicBool::new(false),
                counters: Counters::default(),
            }),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    pub fn len(&self) -> usize {
        lock(&self.inner.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> CacheStats {
        let c = &self.inner.counters;
        CacheStats {
            hits: c.hits.load(Ordering::Relaxed),
            stale_hits: c.stale_hits.load(Ordering::Relaxed),
            misses: c.misses.load(Ordering::Relaxed),
            network_fetches: c.network_fetches.load(Ordering::Relaxed),
            invalidated: c.invalidated.load(Ordering::Relaxed),
        }
    }

    pub fn freshness(&self, key: &CacheKey) -> Freshness {
        match lock(&self.inner.entries).get(key) {
            None => Freshness::Missing,
            Some(entry) if entry.invalidated => Freshness::Invalidated,
            Some(entry) if entry.fetched_at.elapsed() < self.inner.ttl => Freshness::Fresh,
            Some(_) => Freshness::Stale,
        }
    }

    /// True when `key` was stored and a mutation has since invalidated it.
    /// Keys that were never stored (or were dropped by `clear`/`close`) are
    /// not invalidated.
    pub fn is_invalidated(&self, key: &CacheKey) -> bool {
        self.freshness(key) == Freshness::Invalidated
    }

    /// Cached value regardless of age, unless it was invalidated.
    pub fn peek<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let entries = lock(&self.inner.entries);
        let entry = entries.get(key).filter(|e| !e.invalidated)?;
        serde_json::from_value(entry.value.clone()).ok()
    }

    /// Read `key`, calling `fetcher` only when the cache cannot answer.
    ///
    /// `fetcher` is not called at all when the read is served from the cache
    /// or joins a request that is already running for the same key.
    pub async fn fetch<T, F, Fut>(&self, key: CacheKey, fetcher: F) -> Result<T, ClientError>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ClientError>> + Send + 'static,
    {
        if self.is_closed() {
            debug!(%key, "cache closed, fetching uncached");
            return fetcher().await;
        }

        let cached = {
            let entries = lock(&self.inner.entries);
            entries
                .get(&key)
                .filter(|e| !e.invalidated)
                .map(|e| (e.value.clone(), e.fetched_at.elapsed() < self.inner.ttl))
        };

        let value = match cached {
            Some((value, true)) => {
                self.inner.counters.hits.fetch_add(1, Ordering::Relaxed);
                debug!(%key, "cache hit");
                value
            }
            Some((value, false)) => {
                self.inner.counters.stale_hits.fetch_add(1, Ordering::Relaxed);
                debug!(%key, "cache stale, refreshing in background");
                self.spawn_refresh(key, fetcher);
                value
            }
            None => {
                self.inner.counters.misses.fetch_add(1, Ordering::Relaxed);
                debug!(%key, "cache miss");
                let (_waiter, fetch) = self.shared_fetch(key, fetcher);
                fetch.await?
            }
        };

        Ok(serde_json::from_value(value)?)
    }

    /// The running request for `key`, or a newly started one, together with
    /// the caller's [`Waiter`]. Drop the waiter after the future.
    fn shared_fetch<T, F, Fut>(&self, key: CacheKey, fetcher: F) -> (Waiter, SharedFetch)
    where
        T: Serialize + Send + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ClientError>> + Send + 'static,
    {
        let mut in_flight = lock(&self.inner.in_flight);
        if let Some(existing) = in_flight.get_mut(&key) {
            debug!(%key, "joining in-flight request");
            existing.waiters += 1;
            let waiter = Waiter {
                inner: Arc::downgrade(&self.inner),
                key,
                id: existing.id,
            };
            return (waiter, existing.fetch.clone());
        }

        let id = self.inner.next_fetch_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .counters
            .network_fetches
            .fetch_add(1, Ordering::Relaxed);

        let request = fetcher();
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let store_key = key.clone();
        let fetch = async move {
            let result = match request.await {
                Ok(value) => serde_json::to_value(value).map_err(ClientError::from),
                Err(err) => Err(err),
            };
            if let Some(inner) = weak.upgrade() {
                QueryCache { inner }.complete(&store_key, id, &result);
            }
            result
        }
        .boxed()
        .shared();

        in_flight.insert(
            key.clone(),
            InFlight {
                id,
                fetch: fetch.clone(),
                waiters: 1,
            },
        );
        let waiter = Waiter {
            inner: Arc::downgrade(&self.inner),
            key,
            id,
        };
        (waiter, fetch)
    }

    /// Store a finished request, unless its key was invalidated (or the cache
    /// cleared) while it ran.
    fn complete(&self, key: &CacheKey, id: u64, result: &FetchResult) {
        let mut in_flight = lock(&self.inner.in_flight);
        match in_flight.get(key) {
            Some(current) if current.id == id => {
                in_flight.remove(key);
            }
            _ => {
                debug!(%key, "dropping response for invalidated request");
                return;
            }
        }

        if let Ok(value) = result {
            lock(&self.inner.entries).insert(
                key.clone(),
                Entry {
                    value: value.clone(),
                    fetched_at: Instant::now(),
                    invalidated: false,
                },
            );
        }
    }

    fn spawn_refresh<T, F, Fut>(&self, key: CacheKey, fetcher: F)
    where
        T: Serialize + Send + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ClientError>> + Send + 'static,
    {
        let (waiter, fetch) = self.shared_fetch(key.clone(), fetcher);
        let mut refreshes = lock(&self.inner.refreshes);
        while refreshes.try_join_next().is_some() {}
        refreshes.spawn(async move {
            let result = fetch.await;
            drop(waiter);
            if let Err(err) = result {
                warn!(%key, "background refresh failed: {}", err);
            }
        });
    }

    /// Mark every entry matching any of `scopes` invalidated and forget
    /// matching in-flight requests so their results are not stored. Returns
    /// the number of stored entries affected.
    pub fn invalidate(&self, scopes: &[Invalidate]) -> usize {
        if scopes.is_empty() {
            return 0;
        }
        let matches = |key: &CacheKey| scopes.iter().any(|scope| scope.matches(key));

        let mut in_flight = lock(&self.inner.in_flight);
        in_flight.retain(|key, _| !matches(key));

        let mut entries = lock(&self.inner.entries);
        let mut count = 0;
        for (key, entry) in entries.iter_mut() {
            if !entry.invalidated && matches(key) {
                entry.invalidated = true;
                count += 1;
            }
        }
        self.inner
            .counters
            .invalidated
            .fetch_add(count as u64, Ordering::Relaxed);
        debug!(?scopes, count, "cache invalidated");
        count
    }

    /// Run a mutation.
    ///
    /// Mutations touching a common entity run one at a time, in the order
    /// they asked. Locks are taken in [`EntityRef`] order so mutations on
    /// several entities cannot deadlock. `invalidates` is applied after `op`
    /// completes, whether it succeeded or not, since the server may have
    /// applied a request whose response was lost, and also when the returned
    /// future is dropped while `op` is running.
    pub async fn mutate<T, Fut>(
        &self,
        entities: &[EntityRef],
        invalidates: &[Invalidate],
        op: Fut,
    ) -> Result<T, ClientError>
    where
        Fut: Future<Output = Result<T, ClientError>>,
    {
        let mut ordered = entities.to_vec();
        ordered.sort();
        ordered.dedup();

        let locks: Vec<_> = ordered.iter().map(|e| self.entity_lock(*e)).collect();
        let mut guard = MutationGuard {
            cache: self,
            entities: ordered,
            invalidates,
            guards: Vec::with_capacity(locks.len()),
            locks,
            started: false,
        };
        for entity_lock in guard.locks.clone() {
            let held = entity_lock.lock_owned().await;
            guard.guards.push(held);
        }

        guard.started = true;
        let result = op.await;
        if let Err(err) = &result {
            warn!(entities = ?guard.entities, "mutation failed: {}", err);
        }
        result
    }

    fn entity_lock(&self, entity: EntityRef) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = lock(&self.inner.entity_locks);
        Arc::clone(locks.entry(entity).or_default())
    }

    /// Drop per-entity locks nobody else holds or waits on.
    fn release_entity_locks(&self, entities: &[EntityRef], held: &[Arc<tokio::sync::Mutex<()>>]) {
        let mut locks = lock(&self.inner.entity_locks);
        for (entity, ours) in entities.iter().zip(held) {
            // One reference in the map, one in `held`. Owned guards hold
            // their own references, so they must be dropped first.
            if Arc::strong_count(ours) == 2 {
                locks.remove(entity);
            }
        }
    }

    /// Drop every entry. Running requests complete but are not stored.
    pub fn clear(&self) {
        lock(&self.inner.in_flight).clear();
        lock(&self.inner.entries).clear();
    }

    /// End of session: drop all entries and abort background refreshes.
    /// Later reads bypass the cache.
    pub fn close(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        lock(&self.inner.refreshes).abort_all();
        self.clear();
        info!("query cache closed");
    }
}
