//! Per-page widget state shared by the render pipeline and the history
//! synchronizer.

use std::sync::{Mutex, PoisonError};

use crate::cache::{FetchKey, SectionCache};
use crate::filter_state::FilterState;

#[derive(Debug)]
struct SessionState {
    cache: SectionCache,
    previous: FilterState,
    latest_seq: u64,
}

/// Section cache, last-requested filters and the render sequence counter for
/// one page load.
///
/// The lock is only held for bookkeeping, never across a fetch.
#[derive(Debug)]
pub struct FacetSession {
    initial: FilterState,
    state: Mutex<SessionState>,
}

impl FacetSession {
    /// `initial` is the filter state the page was loaded with, restored when
    /// navigating back to a history entry that carries no state.
    #[must_use]
    pub fn new(initial: FilterState) -> Self {
        Self {
            state: Mutex::new(SessionState {
                cache: SectionCache::new(),
                previous: initial.clone(),
                latest_seq: 0,
            }),
            initial,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a new render request for `filter`.
    ///
    /// Returns the request's sequence number, which supersedes every earlier
    /// one, and the cached markup for `key` if there is any.
    pub fn begin(&self, filter: &FilterState, key: &FetchKey) -> (u64, Option<String>) {
        let mut state = self.lock();
        state.latest_seq += 1;
        state.previous = filter.clone();
        (state.latest_seq, state.cache.lookup(key).map(ToOwned::to_owned))
    }

    /// Whether `seq` is still the most recently issued request.
    #[must_use]
    pub fn is_current(&self, seq: u64) -> bool {
        self.lock().latest_seq == seq
    }

    /// Runs `apply` only while `seq` is the most recent request.
    ///
    /// The session lock is held for the whole call, so no newer request can
    /// begin until `apply` returns. `apply` must not call back into the
    /// session.
    pub fn apply_if_current<R>(&self, seq: u64, apply: impl FnOnce() -> R) -> Option<R> {
        let state = self.lock();
        if state.latest_seq != seq {
            return None;
        }
        let applied = apply();
        drop(state);
        Some(applied)
    }

    pub fn store(&self, key: FetchKey, markup: String) {
        self.lock().cache.store(key, markup);
    }

    /// Filter state of the most recently requested render.
    #[must_use]
    pub fn previous(&self) -> FilterState {
        self.lock().previous.clone()
    }

    #[must_use]
    pub fn initial(&self) -> &FilterState {
        &self.initial
    }

    #[must_use]
    pub fn cached_entries(&self) -> usize {
        self.lock().cache.len()
    }
}
