//! The page the widget renders into.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use crate::error::FacetError;
use crate::fragment;

/// Element carrying the section id as `data-id`.
pub const SECTION_ELEMENT_ID: &str = "product-grid";

/// Page regions the widget swaps, located by element id both on the live
/// page and in fetched section markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    ProductGrid,
    ProductCount,
}

impl Region {
    #[must_use]
    pub fn element_id(self) -> &'static str {
        match self {
            Region::ProductGrid => "ProductGridContainer",
            Region::ProductCount => "ProductCount",
        }
    }
}

/// A renderable section: the id the storefront renders it under, and the
/// page region it fills.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionDescriptor {
    pub section_id: String,
    pub target: Region,
}

/// What the widget needs from the live page.
pub trait PageSurface: Send + Sync + 'static {
    /// `location.pathname`.
    fn current_path(&self) -> String;

    /// `data-id` of the [`SECTION_ELEMENT_ID`] element, if present.
    fn section_id(&self) -> Option<String>;

    fn has_region(&self, region: Region) -> bool;

    fn set_loading(&self, region: Region, loading: bool);

    /// Swap a region's inner markup.
    ///
    /// # Errors
    ///
    /// [`FacetError::MissingElement`] if the region is no longer on the page.
    fn replace_region(&self, region: Region, inner_html: &str) -> Result<(), FacetError>;

    /// Show a retryable error next to the grid. Prior content stays visible.
    fn show_error(&self, error: &FacetError);

    fn clear_error(&self);
}

#[derive(Debug)]
struct DocumentState {
    path: String,
    html: String,
    loading: HashSet<Region>,
    error: Option<String>,
}

/// In-memory page backed by an HTML string.
///
/// Loading flags and the error banner are tracked beside the markup rather
/// than as classes inside it.
#[derive(Debug)]
pub struct DocumentPage {
    state: Mutex<DocumentState>,
}

impl DocumentPage {
    pub fn new(path: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(DocumentState {
                path: path.into(),
                html: html.into(),
                loading: HashSet::new(),
                error: None,
            }),
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut DocumentState) -> R) -> R {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    #[must_use]
    pub fn html(&self) -> String {
        self.with_state(|s| s.html.clone())
    }

    /// Current inner markup of a region, if the page has it.
    #[must_use]
    pub fn region_html(&self, region: Region) -> Option<String> {
        self.with_state(|s| {
            fragment::extract_region(&s.html, region.element_id())
                .ok()
                .map(ToOwned::to_owned)
        })
    }

    #[must_use]
    pub fn is_loading(&self, region: Region) -> bool {
        self.with_state(|s| s.loading.contains(&region))
    }

    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.with_state(|s| s.error.clone())
    }
}

impl PageSurface for DocumentPage {
    fn current_path(&self) -> String {
        self.with_state(|s| s.path.clone())
    }

    fn section_id(&self) -> Option<String> {
        self.with_state(|s| fragment::element_attribute(&s.html, SECTION_ELEMENT_ID, "data-id"))
    }

    fn has_region(&self, region: Region) -> bool {
        self.with_state(|s| fragment::locate_region(&s.html, region.element_id()).is_ok())
    }

    fn set_loading(&self, region: Region, loading: bool) {
        self.with_state(|s| {
            if loading {
                s.loading.insert(region);
            } else {
                s.loading.remove(&region);
            }
        });
    }

    fn replace_region(&self, region: Region, inner_html: &str) -> Result<(), FacetError> {
        self.with_state(|s| {
            s.html = fragment::replace_region(&s.html, region.element_id(), inner_html).map_err(
                |_| FacetError::MissingElement {
                    id: region.element_id().to_owned(),
                },
            )?;
            Ok(())
        })
    }

    fn show_error(&self, error: &FacetError) {
        self.with_state(|s| s.error = Some(error.to_string()));
    }

    fn clear_error(&self) {
        self.with_state(|s| s.error = None);
    }
}
