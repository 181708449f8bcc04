//! Query cache for data read from the care API.
//!
//! Entries are keyed by request URL. Reads declare the [`Tag`]s they depend
//! on and writes invalidate by tag, so no write has to know which URLs
//! happen to be cached.
//!
//! The cache is bounded: past its capacity the least recently read idle
//! entries are dropped, and [`QueryCache::evict_idle`] drops entries nobody
//! has read for a while.

use crate::errors::ApiError;
use serde::Serialize;
use std::{
    any::Any,
    collections::HashMap,
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex as StdMutex, PoisonError,
    },
    time::{Duration, Instant},
};
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tag {
    Client,
    User,
    Behavior,
    Goal,
    Activity,
    ActivityLog,
    Schedule,
    Shift,
    Dashboard,
    Report,
    Profile,
}

/// Outcome of a cached read.
#[derive(Debug)]
pub struct Resource<T> {
    pub data: Option<Arc<T>>,
    pub error: Option<Arc<ApiError>>,
    /// The data may be outdated: revalidation failed, or the entry was
    /// invalidated while the fetch was in flight.
    pub stale: bool,
    pub version: u64,
}

impl<T> Clone for Resource<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            error: self.error.clone(),
            stale: self.stale,
            version: self.version,
        }
    }
}

impl<T> Resource<T> {
    pub fn is_loading(&self) -> bool {
        self.data.is_none() && self.error.is_none()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(|err| err.to_string())
    }

    pub fn is_unauthorized(&self) -> bool {
        self.error.as_ref().is_some_and(|err| err.is_unauthorized())
    }

    /// Turns the read into a plain result, failing only when nothing is cached.
    pub fn into_result(self) -> Result<Arc<T>, Arc<ApiError>> {
        match (self.data, self.error) {
            (Some(data), _) => Ok(data),
            (None, Some(err)) => Err(err),
            (None, None) => Err(Arc::new(ApiError::Decode("no data".into()))),
        }
    }
}

struct Stored {
    value: Arc<dyn Any + Send + Sync>,
    fetched_at: Instant,
    generation: u64,
    version: u64,
}

pub const DEFAULT_CAPACITY: usize = 256;
pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(10 * 60);

struct Slot {
    tags: Vec<Tag>,
    refresh: Option<Duration>,
    generation: AtomicU64,
    state: Mutex<Option<Stored>>,
    touched: AtomicU64,
    used_at: StdMutex<Instant>,
}

impl Slot {
    fn touch(&self, tick: u64) {
        self.touched.store(tick, Ordering::Release);
        *self.used_at.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    fn idle_for(&self) -> Duration {
        self.used_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .elapsed()
    }

    /// Only the map holds it: no read is waiting on or filling it.
    fn is_unused(self: &Arc<Self>) -> bool {
        Arc::strong_count(self) == 1
    }

    fn is_fresh(&self, stored: &Stored) -> bool {
        stored.generation == self.generation.load(Ordering::Acquire)
            && self
                .refresh
                .is_none_or(|interval| stored.fetched_at.elapsed() < interval)
    }
}

pub struct QueryCache {
    slots: StdMutex<HashMap<String, Arc<Slot>>>,
    versions: AtomicU64,
    ticks: AtomicU64,
    capacity: usize,
    idle_ttl: Duration,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::with_limits(DEFAULT_CAPACITY, DEFAULT_IDLE_TTL)
    }
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(capacity: usize, idle_ttl: Duration) -> Self {
        Self {
            slots: StdMutex::new(HashMap::new()),
            versions: AtomicU64::new(0),
            ticks: AtomicU64::new(0),
            capacity: capacity.max(1),
            idle_ttl,
        }
    }

    /// Reads `key`, calling `fetcher` only when the entry is missing or stale.
    ///
    /// Concurrent reads of one key share a single fetch. When the fetch fails
    /// the previously stored value is returned alongside the error.
    pub async fn fetch<T, F, Fut>(
        &self,
        key: &str,
        tags: &[Tag],
        refresh: Option<Duration>,
        fetcher: F,
    ) -> Resource<T>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let slot = self.slot(key, tags, refresh);
        let mut state = slot.state.lock().await;

        if let Some(stored) = state.as_ref() {
            if slot.is_fresh(stored) {
                if let Ok(value) = Arc::clone(&stored.value).downcast::<T>() {
                    return Resource {
                        data: Some(value),
                        error: None,
                        stale: false,
                        version: stored.version,
                    };
                }
            }
        }

        let generation = slot.generation.load(Ordering::Acquire);
        debug!(key, "revalidating");
        match fetcher().await {
            Ok(value) => {
                let value = Arc::new(value);
                let version = self.versions.fetch_add(1, Ordering::AcqRel) + 1;
                *state = Some(Stored {
                    value: Arc::clone(&value) as Arc<dyn Any + Send + Sync>,
                    fetched_at: Instant::now(),
                    generation,
                    version,
                });
                Resource {
                    data: Some(value),
                    error: None,
                    stale: slot.generation.load(Ordering::Acquire) != generation,
                    version,
                }
            }
            Err(err) => {
                debug!(key, error = %err, "revalidation failed");
                let previous = state.as_ref().and_then(|stored| {
                    Arc::clone(&stored.value)
                        .downcast::<T>()
                        .ok()
                        .map(|value| (value, stored.version))
                });
                let (data, version) = match previous {
                    Some((value, version)) => (Some(value), version),
                    None => (None, 0),
                };
                Resource {
                    stale: data.is_some(),
                    data,
                    error: Some(Arc::new(err)),
                    version,
                }
            }
        }
    }

    /// Forces the next read of `key` to revalidate.
    pub fn mutate(&self, key: &str) -> bool {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        match slots.get(key) {
            Some(slot) => {
                slot.generation.fetch_add(1, Ordering::AcqRel);
                true
            }
            None => false,
        }
    }

    /// Marks every entry depending on any of `tags` stale; returns how many.
    pub fn invalidate_tags(&self, tags: &[Tag]) -> usize {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let mut invalidated = 0;
        for slot in slots.values() {
            if slot.tags.iter().any(|tag| tags.contains(tag)) {
                slot.generation.fetch_add(1, Ordering::AcqRel);
                invalidated += 1;
            }
        }
        debug!(?tags, invalidated, "invalidated cache entries");
        invalidated
    }

    pub fn clear(&self) {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Drops entries unread for longer than the idle TTL; returns how many.
    pub fn evict_idle(&self) -> usize {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let before = slots.len();
        slots.retain(|_, slot| !slot.is_unused() || slot.idle_for() < self.idle_ttl);
        let evicted = before - slots.len();
        if evicted > 0 {
            debug!(evicted, remaining = slots.len(), "evicted idle cache entries");
        }
        evicted
    }

    pub fn contains(&self, key: &str) -> bool {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, key: &str, tags: &[Tag], refresh: Option<Duration>) -> Arc<Slot> {
        let tick = self.ticks.fetch_add(1, Ordering::AcqRel) + 1;
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = slots.get(key) {
            slot.touch(tick);
            return Arc::clone(slot);
        }

        let slot = Arc::new(Slot {
            tags: tags.to_vec(),
            refresh,
            generation: AtomicU64::new(0),
            state: Mutex::new(None),
            touched: AtomicU64::new(tick),
            used_at: StdMutex::new(Instant::now()),
        });
        slots.insert(key.to_string(), Arc::clone(&slot));
        if slots.len() > self.capacity {
            let excess = slots.len() - self.capacity;
            evict_least_recent(&mut slots, excess);
        }
        slot
    }
}

/// Removes up to `excess` unused slots, least recently read first.
fn evict_least_recent(slots: &mut HashMap<String, Arc<Slot>>, excess: usize) {
    let mut candidates: Vec<(u64, String)> = slots
        .iter()
        .filter(|(_, slot)| slot.is_unused())
        .map(|(key, slot)| (slot.touched.load(Ordering::Acquire), key.clone()))
        .collect();
    candidates.sort_unstable();
    for (_, key) in candidates.into_iter().take(excess) {
        slots.remove(&key);
    }
    debug!(excess, remaining = slots.len(), "evicted least recently read cache entries");
}

/// Derived values memoised per cache key by the stamp (cache version and
/// anything else the value depends on) they were computed from. A key holds
/// one entry: a new stamp replaces the old value.
pub struct Memo<V, S = u64> {
    entries: StdMutex<HashMap<String, (S, Arc<V>)>>,
}

impl<V, S> Default for Memo<V, S> {
    fn default() -> Self {
        Self {
            entries: StdMutex::new(HashMap::new()),
        }
    }
}

impl<V, S: PartialEq> Memo<V, S> {
    pub fn get_or_compute(&self, key: &str, stamp: S, compute: impl FnOnce() -> V) -> Arc<V> {
        {
            let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some((cached, value)) = entries.get(key) {
                if *cached == stamp {
                    return Arc::clone(value);
                }
            }
        }

        let value = Arc::new(compute());
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), (stamp, Arc::clone(&value)));
        value
    }

    /// Drops entries whose key no longer passes `keep`.
    pub fn retain(&self, keep: impl Fn(&str) -> bool) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|key, _| keep(key));
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
