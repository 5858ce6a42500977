use thiserror::Error;

#[derive(Debug, Error)]
pub enum FacetError {
    /// The page is missing an element the widget is wired to. This is a
    /// markup bug, reported when the widget is constructed.
    #[error("required page element #{id} is missing")]
    MissingElement { id: String },

    #[error("region #{id} not found in section markup")]
    RegionNotFound { id: String },

    #[error("region #{id} is never closed in section markup")]
    UnclosedRegion { id: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },
}

impl FacetError {
    /// Whether re-issuing the same render could succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            FacetError::Http(_) => true,
            FacetError::UnexpectedStatus { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}
