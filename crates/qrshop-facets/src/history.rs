//! Browser history binding and back/forward handling.

use std::sync::{Arc, Mutex, PoisonError};

use crate::error::FacetError;
use crate::fetch::SectionFetcher;
use crate::filter_state::FilterState;
use crate::page::PageSurface;
use crate::pipeline::{RenderOutcome, RenderPipeline, RenderTrigger};

/// State attached to a history entry pushed by the widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    pub filter: FilterState,
}

/// `history.pushState`.
pub trait BrowserHistory: Send + Sync + 'static {
    fn push(&self, record: HistoryRecord, url: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// `None` for entries the widget did not push, such as the initial load.
    pub state: Option<HistoryRecord>,
    pub url: String,
}

#[derive(Debug)]
struct Stack {
    entries: Vec<HistoryEntry>,
    index: usize,
}

/// In-memory session history with browser semantics: pushing discards any
/// forward entries.
#[derive(Debug)]
pub struct MemoryHistory {
    stack: Mutex<Stack>,
}

impl MemoryHistory {
    pub fn new(initial_url: impl Into<String>) -> Self {
        Self {
            stack: Mutex::new(Stack {
                entries: vec![HistoryEntry {
                    state: None,
                    url: initial_url.into(),
                }],
                index: 0,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Stack> {
        self.stack.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Step back one entry, returning the entry navigated to.
    pub fn back(&self) -> Option<HistoryEntry> {
        let mut stack = self.lock();
        if stack.index == 0 {
            return None;
        }
        stack.index -= 1;
        Some(stack.entries[stack.index].clone())
    }

    pub fn forward(&self) -> Option<HistoryEntry> {
        let mut stack = self.lock();
        if stack.index + 1 >= stack.entries.len() {
            return None;
        }
        stack.index += 1;
        Some(stack.entries[stack.index].clone())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    #[must_use]
    pub fn current_url(&self) -> String {
        let stack = self.lock();
        stack.entries[stack.index].url.clone()
    }
}

impl BrowserHistory for MemoryHistory {
    fn push(&self, record: HistoryRecord, url: &str) {
        let mut stack = self.lock();
        let keep = stack.index + 1;
        stack.entries.truncate(keep);
        stack.entries.push(HistoryEntry {
            state: Some(record),
            url: url.to_owned(),
        });
        stack.index = keep;
    }
}

/// Re-renders on `popstate` without pushing history again.
pub struct HistorySynchronizer<F, P, H> {
    pipeline: Arc<RenderPipeline<F, P, H>>,
}

impl<F, P, H> HistorySynchronizer<F, P, H>
where
    F: SectionFetcher,
    P: PageSurface,
    H: BrowserHistory,
{
    #[must_use]
    pub fn new(pipeline: Arc<RenderPipeline<F, P, H>>) -> Self {
        Self { pipeline }
    }

    /// Handle navigation to an entry carrying `state`.
    ///
    /// Entries without state restore the filters the page was loaded with.
    /// Returns `Ok(None)` when the destination filters are the ones last
    /// requested, so nothing is rendered.
    ///
    /// # Errors
    ///
    /// Propagates a failed render; see [`RenderPipeline::render`].
    pub async fn on_popstate(
        &self,
        state: Option<&HistoryRecord>,
    ) -> Result<Option<RenderOutcome>, FacetError> {
        let session = self.pipeline.session();
        let target = state.map_or_else(|| session.initial().clone(), |r| r.filter.clone());
        if target == session.previous() {
            tracing::debug!(filter = %target, "popstate to current filters; skipping");
            return Ok(None);
        }
        self.pipeline
            .render(target, RenderTrigger::History)
            .await
            .map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(query: &str) -> HistoryRecord {
        HistoryRecord {
            filter: FilterState::from_query(query),
        }
    }

    #[test]
    fn back_and_forward_walk_the_stack() {
        let history = MemoryHistory::new("/c");
        history.push(record("a=1"), "/c?a=1");
        history.push(record("a=2"), "/c?a=2");

        let back = history.back().unwrap();
        assert_eq!(back.url, "/c?a=1");
        assert_eq!(back.state, Some(record("a=1")));
        assert_eq!(history.back().unwrap().state, None);
        assert!(history.back().is_none());

        assert_eq!(history.forward().unwrap().url, "/c?a=1");
        assert_eq!(history.current_url(), "/c?a=1");
    }

    #[test]
    fn push_discards_forward_entries() {
        let history = MemoryHistory::new("/c");
        history.push(record("a=1"), "/c?a=1");
        history.push(record("a=2"), "/c?a=2");
        history.back();
        history.push(record("a=3"), "/c?a=3");

        assert_eq!(history.len(), 3);
        assert!(history.forward().is_none());
        assert_eq!(history.current_url(), "/c?a=3");
    }
}
