//! Cancellation of superseded requests
//!
//! A [`CancelToken`] wraps one request future: it ends early when the token
//! is aborted (the user started something newer) or when a deadline passes.
//! The two outcomes map to different errors so that a timeout is reported
//! while a user cancellation is silently dropped.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use futures::future::{AbortHandle, AbortRegistration, Abortable, Aborted};

use crate::client::ApiResult;
use crate::error::ApiError;

/// Default deadline for a single search request
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(8);

/// Handle to one cancellable request
pub struct CancelToken {
    id: u64,
    handle: AbortHandle,
    registration: AbortRegistration,
}

impl CancelToken {
    fn new(id: u64) -> Self {
        let (handle, registration) = AbortHandle::new_pair();
        Self {
            id,
            handle,
            registration,
        }
    }

    /// Run `request` until it finishes, the token is aborted or `deadline`
    /// elapses.
    pub async fn run<T, F>(self, deadline: Duration, request: F) -> ApiResult<T>
    where
        F: Future<Output = ApiResult<T>>,
    {
        match tokio::time::timeout(deadline, Abortable::new(request, self.registration)).await {
            Err(_) => {
                log::debug!("Request exceeded deadline of {:?}", deadline);
                Err(ApiError::Timeout(deadline))
            }
            Ok(Err(Aborted)) => Err(ApiError::Cancelled),
            Ok(Ok(outcome)) => outcome,
        }
    }
}

/// Holds the abort handle of the request currently occupying a slot
#[derive(Default)]
struct Slot {
    current: Mutex<Option<(u64, AbortHandle)>>,
}

impl Slot {
    fn replace(&self, token: &CancelToken) {
        let previous = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace((token.id, token.handle.clone()));
        if let Some((_, handle)) = previous {
            handle.abort();
        }
    }

    fn abort(&self) {
        if let Some((_, handle)) = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }

    fn release(&self, id: u64) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if current.as_ref().is_some_and(|(held, _)| *held == id) {
            current.take();
        }
    }
}

/// Cancellation policy of one search session.
///
/// A new primary search aborts the previous primary search and any pending
/// suggestion lookup. A new suggestion lookup aborts only the previous
/// suggestion lookup, and a background refresh only the previous refresh.
pub struct CancelPolicy {
    deadline: Duration,
    next_id: AtomicU64,
    primary: Slot,
    suggestion: Slot,
    refresh: Slot,
}

impl CancelPolicy {
    pub fn new(deadline: Duration) -> Self {
        Self {
            deadline,
            next_id: AtomicU64::new(0),
            primary: Slot::default(),
            suggestion: Slot::default(),
            refresh: Slot::default(),
        }
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Token for a new primary search
    pub fn begin_primary(&self) -> (u64, CancelToken) {
        let token = self.token();
        self.suggestion.abort();
        self.primary.replace(&token);
        (token.id, token)
    }

    /// Token for a new suggestion lookup
    pub fn begin_suggestion(&self) -> (u64, CancelToken) {
        let token = self.token();
        self.suggestion.replace(&token);
        (token.id, token)
    }

    /// Token for a background cache refresh
    pub fn begin_refresh(&self) -> (u64, CancelToken) {
        let token = self.token();
        self.refresh.replace(&token);
        (token.id, token)
    }

    /// Forget a finished primary search
    pub fn finish_primary(&self, id: u64) {
        self.primary.release(id);
    }

    /// Forget a finished suggestion lookup
    pub fn finish_suggestion(&self, id: u64) {
        self.suggestion.release(id);
    }

    pub fn finish_refresh(&self, id: u64) {
        self.refresh.release(id);
    }

    fn token(&self) -> CancelToken {
        CancelToken::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }
}
