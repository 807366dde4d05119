// Query cache keyed by (entity, id, params) with explicit invalidation

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::api_client::models::Id;
use crate::error::Result;
use crate::store::BookFilter;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Books(BookFilter),
    Book(Id),
    Comments { book: Id, page: u32, limit: u32 },
    Reviews(Id),
    AverageRating(Id),
    Followers(Id),
    Following(Id),
}

impl CacheKey {
    pub fn is_book_list(&self) -> bool {
        matches!(self, CacheKey::Books(_))
    }

    /// Any key holding data about the given book.
    pub fn concerns_book(&self, book: &Id) -> bool {
        match self {
            CacheKey::Book(id)
            | CacheKey::Reviews(id)
            | CacheKey::AverageRating(id)
            | CacheKey::Comments { book: id, .. } => id == book,
            _ => false,
        }
    }
}

#[derive(Default)]
struct Slot {
    generation: u64,
    value: Option<Arc<dyn Any + Send + Sync>>,
}

/// Every key carries a generation. Invalidation bumps it, and a fetch only stores its
/// result when the generation it started under is still current, so a response that
/// settles after an invalidation never overwrites newer state.
#[derive(Default)]
pub struct QueryCache {
    slots: Mutex<HashMap<CacheKey, Slot>>,
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("keys", &self.slots.lock().len())
            .finish()
    }
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: Clone + 'static>(&self, key: &CacheKey) -> Option<T> {
        let slots = self.slots.lock();
        slots
            .get(key)?
            .value
            .as_ref()?
            .downcast_ref::<T>()
            .cloned()
    }

    fn generation(&self, key: &CacheKey) -> u64 {
        self.slots.lock().entry(key.clone()).or_default().generation
    }

    fn store_if_current<T: Send + Sync + 'static>(
        &self,
        key: &CacheKey,
        generation: u64,
        value: T,
    ) -> bool {
        let mut slots = self.slots.lock();
        let slot = slots.entry(key.clone()).or_default();
        if slot.generation != generation {
            tracing::debug!(?key, "discarding stale response");
            return false;
        }
        slot.value = Some(Arc::new(value));
        true
    }

    /// Cached value for `key`, fetching it when absent.
    pub async fn get_or_fetch<T, F, Fut>(&self, key: CacheKey, fetch: F) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(hit) = self.get::<T>(&key) {
            tracing::trace!(?key, "cache hit");
            return Ok(hit);
        }
        self.refresh(key, fetch).await
    }

    /// Fetch unconditionally; the result is cached unless `key` was invalidated meanwhile.
    pub async fn refresh<T, F, Fut>(&self, key: CacheKey, fetch: F) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let generation = self.generation(&key);
        let value = fetch().await?;
        self.store_if_current(&key, generation, value.clone());
        Ok(value)
    }

    /// Write a value known to be fresh (e.g. a mutation response).
    pub fn set<T: Send + Sync + 'static>(&self, key: CacheKey, value: T) {
        let mut slots = self.slots.lock();
        let slot = slots.entry(key).or_default();
        slot.generation += 1;
        slot.value = Some(Arc::new(value));
    }

    pub fn invalidate(&self, key: &CacheKey) {
        let mut slots = self.slots.lock();
        let slot = slots.entry(key.clone()).or_default();
        slot.generation += 1;
        slot.value = None;
        tracing::debug!(?key, "invalidated");
    }

    pub fn invalidate_where(&self, pred: impl Fn(&CacheKey) -> bool) {
        let mut slots = self.slots.lock();
        for (key, slot) in slots.iter_mut().filter(|(k, _)| pred(k)) {
            slot.generation += 1;
            slot.value = None;
            tracing::debug!(?key, "invalidated");
        }
    }

    pub fn clear(&self) {
        self.invalidate_where(|_| true);
    }
}
