//! Shared fixtures for the widget integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{mpsc, Arc, Mutex};

use tokio::sync::Notify;

use qrshop_facets::{DocumentPage, FacetError, PageSurface, Region, SectionFetcher};

pub const PATH: &str = "/collection";
pub const SECTION_ID: &str = "grid";

/// Inner markup of `#ProductGridContainer` labelled with `label`.
pub fn grid_inner(label: &str) -> String {
    format!(r#"<div id="product-grid" data-id="{SECTION_ID}"><p class="card">{label}</p></div>"#)
}

pub fn count_inner(label: &str) -> String {
    format!("{label} products")
}

/// A section response as the storefront renders it.
pub fn section_html(label: &str) -> String {
    format!(
        r#"<div id="shopify-section-{SECTION_ID}"><div id="ProductGridContainer">{}</div><span id="ProductCount">{}</span></div>"#,
        grid_inner(label),
        count_inner(label)
    )
}

/// A full collection page showing `label`.
pub fn page_html(label: &str) -> String {
    format!(
        r#"<html><body><form id="FacetFiltersForm"></form>{}<footer></footer></body></html>"#,
        section_html(label)
    )
}

/// Section URL for a serialized filter query.
pub fn section_url(query: &str) -> String {
    format!("{PATH}?section_id={SECTION_ID}&{query}")
}

/// Serves canned markup per URL and records every request.
#[derive(Default)]
pub struct StubFetcher {
    responses: Mutex<HashMap<String, String>>,
    calls: Mutex<Vec<String>>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: impl Into<String>, markup: impl Into<String>) {
        self.responses.lock().unwrap().insert(url.into(), markup.into());
    }

    pub fn with(self, url: impl Into<String>, markup: impl Into<String>) -> Self {
        self.respond(url, markup);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl SectionFetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FacetError> {
        self.calls.lock().unwrap().push(url.to_owned());
        let found = self.responses.lock().unwrap().get(url).cloned();
        found.ok_or_else(|| FacetError::UnexpectedStatus {
            status: 503,
            url: url.to_owned(),
        })
    }
}

/// Like [`StubFetcher`], but responses for gated URLs are held until the
/// gate is opened, so tests control resolution order.
#[derive(Default)]
pub struct GatedFetcher {
    responses: Mutex<HashMap<String, String>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    calls: Mutex<Vec<String>>,
}

impl GatedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: impl Into<String>, markup: impl Into<String>) {
        self.responses.lock().unwrap().insert(url.into(), markup.into());
    }

    /// Hold responses for `url` until [`open`](Self::open) is called.
    pub fn gate(&self, url: impl Into<String>) {
        self.gates
            .lock()
            .unwrap()
            .insert(url.into(), Arc::new(Notify::new()));
    }

    pub fn open(&self, url: &str) {
        if let Some(gate) = self.gates.lock().unwrap().get(url) {
            gate.notify_one();
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl SectionFetcher for GatedFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FacetError> {
        self.calls.lock().unwrap().push(url.to_owned());
        let gate = self.gates.lock().unwrap().get(url).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let found = self.responses.lock().unwrap().get(url).cloned();
        found.ok_or_else(|| FacetError::UnexpectedStatus {
            status: 503,
            url: url.to_owned(),
        })
    }
}

/// A [`DocumentPage`] whose first swap containing `pause_on` blocks the
/// swapping thread until the test releases it.
pub struct PausingPage {
    inner: DocumentPage,
    pause_on: String,
    entered: Mutex<Option<mpsc::Sender<()>>>,
    release: Mutex<mpsc::Receiver<()>>,
}

impl PausingPage {
    /// Returns the page, a receiver signalled once the swap has paused, and
    /// the sender that lets it continue.
    pub fn new(
        inner: DocumentPage,
        pause_on: impl Into<String>,
    ) -> (Self, mpsc::Receiver<()>, mpsc::Sender<()>) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let page = Self {
            inner,
            pause_on: pause_on.into(),
            entered: Mutex::new(Some(entered_tx)),
            release: Mutex::new(release_rx),
        };
        (page, entered_rx, release_tx)
    }

    pub fn document(&self) -> &DocumentPage {
        &self.inner
    }
}

impl PageSurface for PausingPage {
    fn current_path(&self) -> String {
        self.inner.current_path()
    }

    fn section_id(&self) -> Option<String> {
        self.inner.section_id()
    }

    fn has_region(&self, region: Region) -> bool {
        self.inner.has_region(region)
    }

    fn set_loading(&self, region: Region, loading: bool) {
        self.inner.set_loading(region, loading);
    }

    fn replace_region(&self, region: Region, inner_html: &str) -> Result<(), FacetError> {
        if inner_html.contains(&self.pause_on) {
            let entered = self.entered.lock().unwrap().take();
            if let Some(entered) = entered {
                entered.send(()).unwrap();
                self.release.lock().unwrap().recv().unwrap();
            }
        }
        self.inner.replace_region(region, inner_html)
    }

    fn show_error(&self, error: &FacetError) {
        self.inner.show_error(error);
    }

    fn clear_error(&self) {
        self.inner.clear_error();
    }
}

/// Pipeline over a fresh collection page loaded without filters.
pub fn pipeline<F: SectionFetcher>(
    fetcher: F,
) -> qrshop_facets::RenderPipeline<F, qrshop_facets::DocumentPage, qrshop_facets::MemoryHistory> {
    qrshop_facets::RenderPipeline::new(
        fetcher,
        qrshop_facets::DocumentPage::new(PATH, page_html("initial")),
        qrshop_facets::MemoryHistory::new(PATH),
        Arc::new(qrshop_facets::FacetSession::new(
            qrshop_facets::FilterState::default(),
        )),
    )
    .expect("fixture page has every widget element")
}
