//! HTTP client for the Shopify Admin GraphQL API.

use std::time::Duration;

use reqwest::Client;
use serde_json::json;

use crate::error::ShopifyError;
use crate::retry::retry_with_backoff;
use crate::types::{GraphQlResponse, ProductQueryData, ProductSummary};

/// Longest `Retry-After` honoured before retrying a throttled request.
const MAX_RETRY_AFTER_SECS: u64 = 60;

const PRODUCT_QUERY: &str = r"
query supplementQRCode($id: ID!) {
    product(id: $id) {
        title
        media(first: 1) {
            nodes {
                alt
                preview {
                    image {
                        altText
                        url
                    }
                }
            }
        }
    }
}";

/// Settings for [`AdminClient::new`].
#[derive(Debug, Clone)]
pub struct AdminClientConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
    pub api_version: String,
    /// Additional attempts after the first failure for retriable errors.
    pub max_retries: u32,
    /// Base delay for exponential backoff: `backoff_base_secs * 2^attempt`.
    pub backoff_base_secs: u64,
    /// Sends every request to this origin instead of `https://{shop}`.
    /// Meant for local stand-ins of the Admin API; unset in production.
    pub admin_origin: Option<String>,
}

/// Client for the per-shop Admin GraphQL endpoint.
///
/// Throttling (429), 5xx and network failures are retried with exponential
/// backoff; a rejected access token surfaces as [`ShopifyError::Unauthorized`].
pub struct AdminClient {
    client: Client,
    api_version: String,
    admin_origin: Option<String>,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl AdminClient {
    /// # Errors
    ///
    /// Returns [`ShopifyError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ShopifyError::InvalidOrigin`] if
    /// `admin_origin` is not an http(s) URL.
    pub fn new(config: &AdminClientConfig) -> Result<Self, ShopifyError> {
        let admin_origin = config
            .admin_origin
            .as_deref()
            .map(parse_origin)
            .transpose()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(&config.user_agent)
            .build()?;
        Ok(Self {
            client,
            api_version: config.api_version.clone(),
            admin_origin,
            max_retries: config.max_retries,
            backoff_base_secs: config.backoff_base_secs,
        })
    }

    /// Looks up the product behind a QR code.
    ///
    /// Returns `Ok(None)` when Shopify reports no such product (deleted, or an
    /// id from another shop) or the product has no title.
    ///
    /// # Errors
    ///
    /// - [`ShopifyError::InvalidShop`]: `shop` is not a `*.myshopify.com` domain.
    /// - [`ShopifyError::Unauthorized`]: 401/403 from the shop.
    /// - [`ShopifyError::RateLimited`]: 429 after all retries.
    /// - [`ShopifyError::UnexpectedStatus`]: any other non-2xx status.
    /// - [`ShopifyError::GraphQl`]: the response carried top-level `errors`.
    /// - [`ShopifyError::Deserialize`]: the body is not the expected JSON.
    pub async fn fetch_product(
        &self,
        shop: &str,
        access_token: &str,
        product_gid: &str,
    ) -> Result<Option<ProductSummary>, ShopifyError> {
        let url = self.graphql_url(shop)?;
        let body = json!({
            "query": PRODUCT_QUERY,
            "variables": { "id": product_gid },
        });

        let response: GraphQlResponse<ProductQueryData> =
            retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
                let url = url.clone();
                let body = body.clone();
                async move { self.post_graphql(shop, &url, access_token, &body).await }
            })
            .await?;

        if !response.errors.is_empty() {
            return Err(ShopifyError::GraphQl {
                shop: shop.to_owned(),
                messages: response.errors.into_iter().map(|e| e.message).collect(),
            });
        }

        Ok(response
            .data
            .and_then(|d| d.product)
            .and_then(crate::types::ProductNode::into_summary))
    }

    async fn post_graphql(
        &self,
        shop: &str,
        url: &str,
        access_token: &str,
        body: &serde_json::Value,
    ) -> Result<GraphQlResponse<ProductQueryData>, ShopifyError> {
        let response = self
            .client
            .post(url)
            .header("X-Shopify-Access-Token", access_token)
            .json(body)
            .send()
            .await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = retry_after_secs(
                response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok()),
            );
            return Err(ShopifyError::RateLimited {
                shop: shop.to_owned(),
                retry_after_secs,
            });
        }

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(ShopifyError::Unauthorized {
                shop: shop.to_owned(),
            });
        }

        if !status.is_success() {
            return Err(ShopifyError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| ShopifyError::Deserialize {
            context: format!("product query from {shop}"),
            source: e,
        })
    }

    /// Builds the Admin GraphQL URL for a shop.
    ///
    /// The shop is always validated, even when requests go to a configured
    /// `admin_origin`.
    fn graphql_url(&self, shop: &str) -> Result<String, ShopifyError> {
        let shop = normalize_shop_domain(shop)?;
        let origin = match &self.admin_origin {
            Some(origin) => origin.clone(),
            None => format!("https://{shop}"),
        };
        Ok(format!(
            "{origin}/admin/api/{}/graphql.json",
            self.api_version
        ))
    }
}

/// Normalizes a shop identifier to its lowercase `{name}.myshopify.com`
/// domain.
///
/// # Errors
///
/// Returns [`ShopifyError::InvalidShop`] for anything else: schemes, ports,
/// paths, custom domains or an empty store name.
pub fn normalize_shop_domain(shop: &str) -> Result<String, ShopifyError> {
    let domain = shop.trim().to_ascii_lowercase();
    let valid = domain.strip_suffix(".myshopify.com").is_some_and(|name| {
        !name.is_empty()
            && !name.starts_with('-')
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });
    if !valid {
        return Err(ShopifyError::InvalidShop {
            shop: shop.to_owned(),
            reason: "expected a domain such as demo.myshopify.com".to_owned(),
        });
    }
    Ok(domain)
}

/// Seconds to wait after a 429, from its `Retry-After` header. Missing or
/// unparseable values wait 2s; anything above [`MAX_RETRY_AFTER_SECS`] is
/// capped.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
fn retry_after_secs(header: Option<&str>) -> u64 {
    header
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|secs| secs.is_finite())
        .map_or(2, |secs| secs.ceil().clamp(0.0, MAX_RETRY_AFTER_SECS as f64) as u64)
}

fn parse_origin(raw: &str) -> Result<String, ShopifyError> {
    let invalid = |reason: String| ShopifyError::InvalidOrigin {
        origin: raw.to_owned(),
        reason,
    };
    let url = reqwest::Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    Ok(url.as_str().trim_end_matches('/').to_owned())
}
