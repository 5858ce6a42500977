//! Section markup retrieval.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;

use crate::error::FacetError;

/// Fetches rendered section markup for a storefront-relative URL such as
/// `/collections/all?section_id=grid&filter.v.color=red`.
pub trait SectionFetcher: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, FacetError>> + Send;
}

/// [`SectionFetcher`] over HTTP against a storefront origin.
pub struct HttpSectionFetcher {
    client: Client,
    origin: String,
}

impl HttpSectionFetcher {
    /// # Errors
    ///
    /// Returns [`FacetError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(origin: &str, timeout_secs: u64) -> Result<Self, FacetError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            origin: origin.trim_end_matches('/').to_owned(),
        })
    }
}

impl SectionFetcher for HttpSectionFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FacetError> {
        let full = format!("{}{url}", self.origin);
        let response = self
            .client
            .get(&full)
            .header(reqwest::header::ACCEPT, "text/html")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FacetError::UnexpectedStatus {
                status: status.as_u16(),
                url: full,
            });
        }
        Ok(response.text().await?)
    }
}
