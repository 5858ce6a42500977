//! The widget instance bound to one filter form.

use std::sync::Arc;
use std::time::Duration;

use crate::debounce::Debouncer;
use crate::error::FacetError;
use crate::fetch::SectionFetcher;
use crate::filter_state::{FilterState, FormField};
use crate::history::{BrowserHistory, HistoryRecord, HistorySynchronizer};
use crate::page::PageSurface;
use crate::pipeline::{RenderOutcome, RenderPipeline, RenderTrigger};
use crate::session::FacetSession;

/// Quiet period after the last form input before a render is issued.
pub const INPUT_DEBOUNCE: Duration = Duration::from_millis(800);

/// Owns the session state, pipeline, history synchronizer and input
/// debouncer for one filter form.
pub struct FacetFiltersForm<F, P, H> {
    pipeline: Arc<RenderPipeline<F, P, H>>,
    synchronizer: HistorySynchronizer<F, P, H>,
    debouncer: Debouncer<FilterState>,
}

impl<F, P, H> FacetFiltersForm<F, P, H>
where
    F: SectionFetcher,
    P: PageSurface,
    H: BrowserHistory,
{
    /// Bind to a page loaded with `initial` filters (its `location.search`).
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`FacetError::MissingElement`] if the page lacks the elements
    /// the widget renders into.
    pub fn new(fetcher: F, page: P, history: H, initial: FilterState) -> Result<Self, FacetError> {
        Self::with_debounce(fetcher, page, history, initial, INPUT_DEBOUNCE)
    }

    /// # Errors
    ///
    /// See [`new`](Self::new).
    pub fn with_debounce(
        fetcher: F,
        page: P,
        history: H,
        initial: FilterState,
        delay: Duration,
    ) -> Result<Self, FacetError> {
        let session = Arc::new(FacetSession::new(initial));
        let pipeline = Arc::new(RenderPipeline::new(fetcher, page, history, session)?);

        let for_input = Arc::clone(&pipeline);
        let debouncer = Debouncer::new(delay, move |filter: FilterState| {
            let pipeline = Arc::clone(&for_input);
            tokio::spawn(async move {
                // failures are already surfaced on the page by the pipeline
                if let Ok(outcome) = pipeline.render(filter, RenderTrigger::Input).await {
                    tracing::trace!(?outcome, "input render finished");
                }
            });
        });

        Ok(Self {
            synchronizer: HistorySynchronizer::new(Arc::clone(&pipeline)),
            pipeline,
            debouncer,
        })
    }

    /// Form `input` event: snapshot the form and schedule a debounced render.
    pub fn on_input(&self, fields: &[FormField]) {
        self.debouncer.trigger(FilterState::from_fields(fields));
    }

    /// Window `popstate` event.
    ///
    /// # Errors
    ///
    /// See [`HistorySynchronizer::on_popstate`].
    pub async fn on_popstate(
        &self,
        state: Option<&HistoryRecord>,
    ) -> Result<Option<RenderOutcome>, FacetError> {
        self.synchronizer.on_popstate(state).await
    }

    /// Retry affordance shown after a failed render.
    ///
    /// # Errors
    ///
    /// See [`RenderPipeline::render`].
    pub async fn retry(&self) -> Result<RenderOutcome, FacetError> {
        self.pipeline.retry().await
    }

    #[must_use]
    pub fn pipeline(&self) -> &RenderPipeline<F, P, H> {
        &self.pipeline
    }

    #[must_use]
    pub fn session(&self) -> &FacetSession {
        self.pipeline.session()
    }
}
