//! In-flight request de-duplication
//!
//! While a request for a key is pending, later callers for the same key join
//! it instead of issuing another one. All joiners observe the same outcome,
//! success or failure, and the slot is released when the request settles.
//! A request abandoned by every joiner (all of them cancelled or timed out)
//! is dropped together with its slot.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};

use crate::error::ApiError;

type SharedRequest<T> = Shared<BoxFuture<'static, Result<T, ApiError>>>;
type Slots<T> = Arc<Mutex<HashMap<String, Slot<T>>>>;

struct Slot<T: Clone> {
    id: u64,
    request: SharedRequest<T>,
    waiters: usize,
}

/// Map of pending requests keyed by request identity
pub struct InFlight<T: Clone + Send + Sync + 'static> {
    slots: Slots<T>,
    next_id: AtomicU64,
}

impl<T: Clone + Send + Sync + 'static> Default for InFlight<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync + 'static> InFlight<T> {
    pub fn new() -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(0),
        }
    }

    /// Run `factory` for `key` unless a request for `key` is already pending,
    /// in which case wait for that one instead.
    pub async fn dedupe<F, Fut>(&self, key: &str, factory: F) -> Result<T, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let (id, request) = {
            let mut slots = lock(&self.slots);
            if let Some(slot) = slots.get_mut(key) {
                log::debug!("Joining in-flight request: {}", key);
                slot.waiters += 1;
                (slot.id, slot.request.clone())
            } else {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                let request = release_on_settle(factory(), Arc::clone(&self.slots), key, id);
                slots.insert(
                    key.to_string(),
                    Slot {
                        id,
                        request: request.clone(),
                        waiters: 1,
                    },
                );
                (id, request)
            }
        };

        let _waiter = Waiter {
            slots: Arc::clone(&self.slots),
            key: key.to_string(),
            id,
        };
        request.await
    }

    /// Number of pending requests
    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        lock(&self.slots).len()
    }
}

/// Wrap a request so it frees its own slot when it completes
fn release_on_settle<T, Fut>(request: Fut, slots: Slots<T>, key: &str, id: u64) -> SharedRequest<T>
where
    T: Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
{
    let key = key.to_string();
    async move {
        let outcome = request.await;
        let mut slots = lock(&slots);
        if slots.get(&key).is_some_and(|slot| slot.id == id) {
            slots.remove(&key);
        }
        outcome
    }
    .boxed()
    .shared()
}

/// One caller waiting on a slot; dropping the last waiter of an unsettled
/// request abandons it.
struct Waiter<T: Clone + Send + Sync + 'static> {
    slots: Slots<T>,
    key: String,
    id: u64,
}

impl<T: Clone + Send + Sync + 'static> Drop for Waiter<T> {
    fn drop(&mut self) {
        let mut slots = lock(&self.slots);
        let abandoned = match slots.get_mut(&self.key) {
            Some(slot) if slot.id == self.id => {
                slot.waiters = slot.waiters.saturating_sub(1);
                slot.waiters == 0
            }
            _ => false,
        };
        if abandoned {
            log::debug!("Abandoning in-flight request: {}", self.key);
            slots.remove(&self.key);
        }
    }
}

fn lock<T: Clone>(slots: &Mutex<HashMap<String, Slot<T>>>) -> MutexGuard<'_, HashMap<String, Slot<T>>> {
    slots.lock().unwrap_or_else(PoisonError::into_inner)
}
