pub mod client;
pub mod error;
mod retry;
pub mod types;

pub use client::{normalize_shop_domain, AdminClient, AdminClientConfig};
pub use error::ShopifyError;
pub use types::ProductSummary;
