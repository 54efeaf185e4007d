//! Cached remote resources.
//!
//! A [`RemoteResource`] holds the last confirmed server value for one query
//! key. It never holds a value the server has not returned: mutations either
//! write a confirmed response through or invalidate, and the next read
//! refetches.
//!
//! Invalidation bumps an epoch. A fetch records the epoch it started in and
//! its result only counts as fresh if no invalidation happened meanwhile, so
//! a slow read racing a mutation can never mask the mutation's effect.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::ApiError;

#[derive(Debug)]
struct Slot<T> {
    value: Option<T>,
    /// Epoch the stored value was fetched in.
    value_epoch: u64,
    fetched_at: Option<Instant>,
    /// Bumped by every invalidation.
    epoch: u64,
    /// Epoch of the last `clear`. Fetches started before it belong to
    /// whoever the cache was cleared for and are discarded.
    cleared_at: u64,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            value: None,
            value_epoch: 0,
            fetched_at: None,
            epoch: 0,
            cleared_at: 0,
        }
    }
}

/// One cached server resource.
#[derive(Debug)]
pub struct RemoteResource<T> {
    name: String,
    stale_after: Duration,
    slot: Mutex<Slot<T>>,
}

impl<T: Clone> RemoteResource<T> {
    pub fn new(name: impl Into<String>, stale_after: Duration) -> Self {
        Self {
            name: name.into(),
            stale_after,
            slot: Mutex::new(Slot::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fresh_value(&self) -> Option<T> {
        let slot = self.lock();
        let fresh = slot.value_epoch == slot.epoch
            && slot
                .fetched_at
                .is_some_and(|at| at.elapsed() < self.stale_after);
        if fresh { slot.value.clone() } else { None }
    }

    /// Return the cached value if fresh, otherwise fetch and store it.
    pub async fn read<F, Fut>(&self, fetch: F) -> Result<T, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        if let Some(value) = self.fresh_value() {
            debug!(resource = %self.name, "Cache hit");
            return Ok(value);
        }
        let started_in = self.lock().epoch;
        debug!(resource = %self.name, "Fetching");
        let value = fetch().await?;
        self.store_fetched(started_in, value.clone());
        Ok(value)
    }

    fn store_fetched(&self, started_in: u64, value: T) {
        let mut slot = self.lock();
        if started_in < slot.cleared_at {
            debug!(resource = %self.name, "Dropping fetch result from before a clear");
            return;
        }
        // A fetch that started earlier than the stored value's fetch is older data.
        if slot.value.is_some() && started_in < slot.value_epoch {
            debug!(resource = %self.name, "Dropping superseded fetch result");
            return;
        }
        if started_in != slot.epoch {
            debug!(resource = %self.name, "Fetch overlapped an invalidation, keeping it stale");
        }
        slot.value = Some(value);
        slot.value_epoch = started_in;
        slot.fetched_at = Some(Instant::now());
    }

    /// Store a value the server just confirmed (write-through).
    pub fn set_confirmed(&self, value: T) {
        let mut slot = self.lock();
        slot.value = Some(value);
        slot.value_epoch = slot.epoch;
        slot.fetched_at = Some(Instant::now());
    }

    /// Apply a confirmed change to the cached value in place, if any.
    /// Freshness is unchanged.
    pub fn patch(&self, apply: impl FnOnce(&mut T)) {
        if let Some(value) = self.lock().value.as_mut() {
            apply(value);
        }
    }

    /// Mark the value stale; the next read refetches.
    pub fn invalidate(&self) {
        let mut slot = self.lock();
        slot.epoch += 1;
        debug!(resource = %self.name, epoch = slot.epoch, "Invalidated");
    }

    /// Drop the value entirely. Reads already in flight will not store
    /// their results.
    pub fn clear(&self) {
        let mut slot = self.lock();
        slot.value = None;
        slot.fetched_at = None;
        slot.epoch += 1;
        slot.cleared_at = slot.epoch;
    }

    /// Last stored value, fresh or not.
    pub fn peek(&self) -> Option<T> {
        self.lock().value.clone()
    }

    /// Whether the next read will go to the server.
    pub fn is_stale(&self) -> bool {
        self.fresh_value().is_none()
    }
}

/// A family of resources keyed by query parameters.
#[derive(Debug)]
pub struct ResourceMap<K, T> {
    name: &'static str,
    stale_after: Duration,
    entries: Mutex<HashMap<K, Arc<RemoteResource<T>>>>,
}

impl<K, T> ResourceMap<K, T>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    T: Clone,
{
    pub fn new(name: &'static str, stale_after: Duration) -> Self {
        Self {
            name,
            stale_after,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<K, Arc<RemoteResource<T>>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Resource for `key`, created empty on first use.
    pub fn entry(&self, key: &K) -> Arc<RemoteResource<T>> {
        let mut entries = self.lock();
        Arc::clone(entries.entry(key.clone()).or_insert_with(|| {
            Arc::new(RemoteResource::new(
                format!("{}{key:?}", self.name),
                self.stale_after,
            ))
        }))
    }

    /// Existing resource for `key`, without creating one.
    pub fn get(&self, key: &K) -> Option<Arc<RemoteResource<T>>> {
        self.lock().get(key).cloned()
    }

    pub fn invalidate(&self, key: &K) {
        if let Some(resource) = self.get(key) {
            resource.invalidate();
        }
    }

    /// Number of keys currently held.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Forget `key` entirely; in-flight reads for it are discarded.
    pub fn remove(&self, key: &K) {
        if let Some(resource) = self.lock().remove(key) {
            resource.clear();
        }
    }

    /// Forget every key. Used where any key may be affected and a refetch
    /// is needed anyway, so entries for queries nobody repeats don't pile up.
    pub fn clear(&self) {
        for (_, resource) in self.lock().drain() {
            resource.clear();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    const LONG: Duration = Duration::from_secs(3600);

    #[tokio::test]
    async fn fresh_value_is_served_from_cache() {
        let res = RemoteResource::new("apps", LONG);
        let calls = AtomicU32::new(0);
        for _ in 0..3 {
            let v = res
                .read(|| async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ApiError>(7)
                })
                .await
                .unwrap();
            assert_eq!(v, 7);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidation_forces_refetch() {
        let res = RemoteResource::new("apps", LONG);
        res.read(|| async { Ok::<_, ApiError>(1) }).await.unwrap();
        res.invalidate();
        assert!(res.is_stale());
        assert_eq!(res.peek(), Some(1));
        let v = res.read(|| async { Ok::<_, ApiError>(2) }).await.unwrap();
        assert_eq!(v, 2);
        assert!(!res.is_stale());
    }

    #[tokio::test]
    async fn zero_ttl_always_refetches() {
        let res = RemoteResource::new("jobs", Duration::ZERO);
        res.read(|| async { Ok::<_, ApiError>(1) }).await.unwrap();
        let v = res.read(|| async { Ok::<_, ApiError>(2) }).await.unwrap();
        assert_eq!(v, 2);
    }

    #[tokio::test]
    async fn failed_fetch_keeps_previous_value() {
        let res = RemoteResource::new("jobs", LONG);
        res.read(|| async { Ok::<_, ApiError>(1) }).await.unwrap();
        res.invalidate();
        let err = res
            .read(|| async { Err::<i32, _>(ApiError::Transient("down".into())) })
            .await;
        assert!(err.is_err());
        assert_eq!(res.peek(), Some(1));
        assert!(res.is_stale());
    }

    #[tokio::test]
    async fn fetch_overlapping_invalidation_stays_stale() {
        let res = RemoteResource::new("apps", LONG);
        let v = res
            .read(|| async {
                // The mutation lands while this read is in flight.
                res.invalidate();
                Ok::<_, ApiError>("before")
            })
            .await
            .unwrap();
        assert_eq!(v, "before");
        assert!(res.is_stale());
        let v = res.read(|| async { Ok::<_, ApiError>("after") }).await.unwrap();
        assert_eq!(v, "after");
    }

    #[test]
    fn superseded_fetch_result_is_dropped() {
        let res = RemoteResource::new("apps", LONG);
        res.invalidate();
        res.store_fetched(1, "newer");
        res.store_fetched(0, "older");
        assert_eq!(res.peek(), Some("newer"));
        assert!(!res.is_stale());
    }

    #[tokio::test]
    async fn fetch_in_flight_across_clear_is_discarded() {
        let res = RemoteResource::new("saved-jobs", LONG);
        let v = res
            .read(|| async {
                // Sign-out lands while the previous user's read is in flight.
                res.clear();
                Ok::<_, ApiError>(vec![1])
            })
            .await
            .unwrap();
        assert_eq!(v, vec![1]);
        assert_eq!(res.peek(), None);
        assert!(res.is_stale());

        let v = res.read(|| async { Ok::<_, ApiError>(vec![]) }).await.unwrap();
        assert!(v.is_empty());
        assert_eq!(res.peek(), Some(vec![]));
    }

    #[test]
    fn write_through_and_patch() {
        let res = RemoteResource::new("profile", LONG);
        res.patch(|v: &mut Vec<u32>| v.push(1));
        assert_eq!(res.peek(), None);
        res.set_confirmed(vec![1, 2]);
        res.patch(|v| v.push(3));
        assert_eq!(res.peek(), Some(vec![1, 2, 3]));
        assert!(!res.is_stale());
        res.clear();
        assert_eq!(res.peek(), None);
    }

    #[test]
    fn map_invalidates_per_key() {
        let map: ResourceMap<u64, u32> = ResourceMap::new("applicants", LONG);
        map.entry(&1).set_confirmed(10);
        map.entry(&2).set_confirmed(20);
        map.invalidate(&1);
        assert!(map.get(&1).unwrap().is_stale());
        assert!(!map.get(&2).unwrap().is_stale());
        map.invalidate(&99);
        assert!(map.get(&99).is_none());

        assert_eq!(map.len(), 2);
        map.remove(&1);
        assert!(map.get(&1).is_none());
        map.clear();
        assert!(map.get(&2).is_none());
        assert!(map.is_empty());
    }
}
