//! Fetch-and-render: from a filter state to swapped page regions.

use std::sync::Arc;

use crate::cache::FetchKey;
use crate::error::FacetError;
use crate::fetch::SectionFetcher;
use crate::filter_state::FilterState;
use crate::fragment;
use crate::history::{BrowserHistory, HistoryRecord};
use crate::page::{PageSurface, Region, SectionDescriptor, SECTION_ELEMENT_ID};
use crate::session::FacetSession;

/// What caused a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderTrigger {
    /// Filter form input. The only trigger that pushes a history entry.
    Input,
    /// Back/forward navigation.
    History,
    /// Re-issue of the last requested filters after a failure.
    Retry,
}

impl RenderTrigger {
    fn pushes_history(self) -> bool {
        matches!(self, RenderTrigger::Input)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderSource {
    Cache,
    Network,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    Rendered { source: RenderSource },
    /// A newer render was requested while this one was in flight; its
    /// markup was cached but not applied.
    Stale,
}

struct Fragments {
    grid: String,
    count: Option<String>,
}

impl Fragments {
    fn extract(markup: &str, with_count: bool) -> Result<Self, FacetError> {
        let grid = fragment::extract_region(markup, Region::ProductGrid.element_id())?.to_owned();
        let count = if with_count {
            Some(fragment::extract_region(markup, Region::ProductCount.element_id())?.to_owned())
        } else {
            None
        };
        Ok(Self { grid, count })
    }
}

pub struct RenderPipeline<F, P, H> {
    fetcher: F,
    page: P,
    history: H,
    session: Arc<FacetSession>,
    section: SectionDescriptor,
}

impl<F, P, H> RenderPipeline<F, P, H>
where
    F: SectionFetcher,
    P: PageSurface,
    H: BrowserHistory,
{
    /// Wire the pipeline to a page.
    ///
    /// # Errors
    ///
    /// Returns [`FacetError::MissingElement`] if the page has no section
    /// element with a `data-id`, or no product grid region.
    pub fn new(
        fetcher: F,
        page: P,
        history: H,
        session: Arc<FacetSession>,
    ) -> Result<Self, FacetError> {
        let section_id = page.section_id().ok_or_else(|| FacetError::MissingElement {
            id: SECTION_ELEMENT_ID.to_owned(),
        })?;
        if !page.has_region(Region::ProductGrid) {
            return Err(FacetError::MissingElement {
                id: Region::ProductGrid.element_id().to_owned(),
            });
        }
        Ok(Self {
            fetcher,
            page,
            history,
            session,
            section: SectionDescriptor {
                section_id,
                target: Region::ProductGrid,
            },
        })
    }

    /// Render the section for `filter`.
    ///
    /// Cached markup is applied without suspending. A response that arrives
    /// after a newer render was requested is cached and dropped as
    /// [`RenderOutcome::Stale`].
    ///
    /// # Errors
    ///
    /// A failed fetch or a response missing a region, when this is still the
    /// latest render. Loading flags are cleared, the page error is shown and
    /// prior content stays in place.
    pub async fn render(
        &self,
        filter: FilterState,
        trigger: RenderTrigger,
    ) -> Result<RenderOutcome, FacetError> {
        let path = self.page.current_path();
        let key = FetchKey::new(&path, &self.section.section_id, &filter);
        let with_count = self.page.has_region(Region::ProductCount);
        let (seq, cached) = self.session.begin(&filter, &key);

        let started = self.session.apply_if_current(seq, || {
            self.set_loading(with_count, true);
            if trigger.pushes_history() {
                let url = filter.location(&path);
                self.history.push(HistoryRecord { filter }, &url);
            }
        });
        if started.is_none() {
            tracing::debug!(url = %key, seq, "render superseded before it started");
            return Ok(RenderOutcome::Stale);
        }

        let (markup, source) = match cached {
            Some(markup) => (markup, RenderSource::Cache),
            None => match self.fetcher.fetch(key.as_str()).await {
                Ok(markup) => (markup, RenderSource::Network),
                Err(e) => return self.fail(seq, with_count, &key, e),
            },
        };

        let fragments = match Fragments::extract(&markup, with_count) {
            Ok(f) => f,
            Err(e) => return self.fail(seq, with_count, &key, e),
        };
        if source == RenderSource::Network {
            self.session.store(key.clone(), markup);
        }

        match self
            .session
            .apply_if_current(seq, || self.swap(with_count, &fragments))
        {
            None => {
                tracing::debug!(url = %key, seq, "discarding stale section response");
                Ok(RenderOutcome::Stale)
            }
            Some(Ok(())) => {
                tracing::debug!(url = %key, ?source, "section rendered");
                Ok(RenderOutcome::Rendered { source })
            }
            Some(Err(e)) => {
                tracing::warn!(url = %key, error = %e, "page region missing while rendering");
                Err(e)
            }
        }
    }

    /// Re-render the most recently requested filters, without pushing
    /// history.
    ///
    /// # Errors
    ///
    /// See [`render`](Self::render).
    pub async fn retry(&self) -> Result<RenderOutcome, FacetError> {
        self.render(self.session.previous(), RenderTrigger::Retry).await
    }

    fn set_loading(&self, with_count: bool, loading: bool) {
        self.page.set_loading(self.section.target, loading);
        if with_count {
            self.page.set_loading(Region::ProductCount, loading);
        }
    }

    /// Swap in both regions and settle the loading and error state. Runs
    /// under the session lock.
    fn swap(&self, with_count: bool, fragments: &Fragments) -> Result<(), FacetError> {
        let swapped = self
            .page
            .replace_region(self.section.target, &fragments.grid)
            .and_then(|()| match &fragments.count {
                Some(count) => self.page.replace_region(Region::ProductCount, count),
                None => Ok(()),
            });
        self.set_loading(with_count, false);
        match &swapped {
            Ok(()) => self.page.clear_error(),
            Err(e) => self.page.show_error(e),
        }
        swapped
    }

    fn fail(
        &self,
        seq: u64,
        with_count: bool,
        key: &FetchKey,
        error: FacetError,
    ) -> Result<RenderOutcome, FacetError> {
        let reported = self.session.apply_if_current(seq, || {
            self.set_loading(with_count, false);
            self.page.show_error(&error);
        });
        if reported.is_none() {
            tracing::debug!(url = %key, error = %error, "stale section request failed");
            return Ok(RenderOutcome::Stale);
        }
        tracing::warn!(url = %key, error = %error, retryable = error.is_retryable(), "section render failed");
        Err(error)
    }

    #[must_use]
    pub fn section(&self) -> &SectionDescriptor {
        &self.section
    }

    #[must_use]
    pub fn page(&self) -> &P {
        &self.page
    }

    #[must_use]
    pub fn history(&self) -> &H {
        &self.history
    }

    #[must_use]
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    #[must_use]
    pub fn session(&self) -> &Arc<FacetSession> {
        &self.session
    }
}
