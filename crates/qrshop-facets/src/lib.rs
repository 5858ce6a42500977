//! Storefront facet-filter widget core.
//!
//! A filter form drives incremental re-renders of the collection product
//! grid. Debounced input becomes a [`FilterState`] whose section markup is
//! fetched or served from the session cache before the grid is swapped in
//! place. Browser history follows each change so back/forward navigation
//! restores earlier filters.
//!
//! The browser is reached only through the [`PageSurface`],
//! [`SectionFetcher`] and [`BrowserHistory`] traits, so the same engine runs
//! against a real page binding or the in-memory [`DocumentPage`] and
//! [`MemoryHistory`].

pub mod cache;
pub mod controller;
pub mod debounce;
pub mod error;
pub mod fetch;
pub mod filter_state;
pub mod fragment;
pub mod history;
pub mod page;
pub mod pipeline;
pub mod session;

pub use cache::{FetchKey, SectionCache};
pub use controller::{FacetFiltersForm, INPUT_DEBOUNCE};
pub use debounce::Debouncer;
pub use error::FacetError;
pub use fetch::{HttpSectionFetcher, SectionFetcher};
pub use filter_state::{FilterState, FormField};
pub use history::{BrowserHistory, HistoryEntry, HistoryRecord, HistorySynchronizer, MemoryHistory};
pub use page::{DocumentPage, PageSurface, Region, SectionDescriptor};
pub use pipeline::{RenderOutcome, RenderPipeline, RenderSource, RenderTrigger};
pub use session::FacetSession;
