//! Admin GraphQL response shapes for the product lookup used to enrich QR codes.
//!
//! `product` is `null` when the product was deleted or the id belongs to
//! another shop. Media is requested with `first: 1`; the thumbnail lives
//! under `preview.image`, which is absent while media is still processing.

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProductQueryData {
    pub product: Option<ProductNode>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProductNode {
    pub title: Option<String>,
    #[serde(default)]
    pub media: MediaConnection,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct MediaConnection {
    #[serde(default)]
    pub nodes: Vec<MediaNode>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MediaNode {
    pub alt: Option<String>,
    pub preview: Option<MediaPreview>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MediaPreview {
    pub image: Option<MediaImage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MediaImage {
    #[serde(rename = "altText")]
    pub alt_text: Option<String>,
    pub url: String,
}

/// Live product fields shown next to a QR code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductSummary {
    pub title: String,
    pub image_url: Option<String>,
    pub image_alt: Option<String>,
}

impl ProductNode {
    /// `None` when the product has no usable title, which the admin treats
    /// the same as a deleted product.
    pub(crate) fn into_summary(self) -> Option<ProductSummary> {
        let title = self.title.filter(|t| !t.trim().is_empty())?;
        let first = self.media.nodes.into_iter().next();
        let (image_url, image_alt) = match first {
            Some(node) => {
                let image = node.preview.and_then(|p| p.image);
                let alt = image
                    .as_ref()
                    .and_then(|i| i.alt_text.clone())
                    .or(node.alt);
                (image.map(|i| i.url), alt)
            }
            None => (None, None),
        };
        Some(ProductSummary {
            title,
            image_url,
            image_alt,
        })
    }
}
