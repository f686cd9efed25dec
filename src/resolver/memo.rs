//! Write-once memoization with per-key single flight
//!
//! Each key owns a cell. The first caller for a key runs the computation;
//! concurrent callers for the same key wait on that cell and receive its
//! value. Callers for different keys never wait on each other. A failed or
//! cancelled computation leaves no value behind, so the next caller retries;
//! its slot is removed once no other caller is waiting on it.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OnceCell;

pub struct Memo<K, V> {
    slots: Slots<K, V>,
}

type Slots<K, V> = Mutex<HashMap<K, Arc<OnceCell<V>>>>;

impl<K, V> Memo<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Cached value for `key`, computing it with `init` if no value exists yet
    pub async fn get_or_try_init<F, Fut, E>(&self, key: K, init: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let cell = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(key.clone()).or_default())
        };
        if let Some(value) = cell.get() {
            tracing::trace!("memo hit");
            return Ok(value.clone());
        }

        let guard = SlotGuard {
            slots: &self.slots,
            key,
            cell,
        };
        let result = guard.cell.get_or_try_init(init).await.cloned();
        drop(guard);
        result
    }

    /// Cached value for `key` without computing it
    pub fn get(&self, key: &K) -> Option<V> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.get(key).and_then(|cell| cell.get().cloned())
    }

    /// Number of keys with a value
    pub fn len(&self) -> usize {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.values().filter(|cell| cell.initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached value. Computations already in flight finish into
    /// their detached cells and are not visible to later callers.
    pub fn clear(&self) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.clear();
    }
}

impl<K, V> Default for Memo<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Removes a slot left without a value when the last caller holding it
/// finishes or is dropped
struct SlotGuard<'a, K: Eq + Hash, V> {
    slots: &'a Slots<K, V>,
    key: K,
    cell: Arc<OnceCell<V>>,
}

impl<K: Eq + Hash, V> Drop for SlotGuard<'_, K, V> {
    fn drop(&mut self) {
        if self.cell.initialized() {
            return;
        }
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference in the map plus ours: nobody else is waiting
        let abandoned = slots
            .get(&self.key)
            .is_some_and(|slot| Arc::ptr_eq(slot, &self.cell) && Arc::strong_count(slot) == 2);
        if abandoned {
            slots.remove(&self.key);
        }
    }
}
