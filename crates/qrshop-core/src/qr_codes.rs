//! QR code domain rules: form validation and destination URLs.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::CoreError;

static VARIANT_GID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"gid://shopify/ProductVariant/([0-9]+)").expect("valid variant gid regex")
});

/// Where a scanned QR code sends the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    /// The product's storefront page.
    Product,
    /// A cart permalink with one unit of the first variant, which lands on checkout.
    Cart,
}

impl Destination {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Destination::Product => "product",
            Destination::Cart => "cart",
        }
    }
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Destination {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "product" => Ok(Destination::Product),
            "cart" => Ok(Destination::Cart),
            other => Err(CoreError::InvalidDestination(other.to_string())),
        }
    }
}

/// Raw, unvalidated form submission for creating or updating a QR code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrCodeForm {
    pub title: Option<String>,
    pub product_id: Option<String>,
    pub product_handle: Option<String>,
    pub product_variant_id: Option<String>,
    pub destination: Option<String>,
}

/// A form that passed [`validate_qr_code`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidQrCode {
    pub title: String,
    pub product_id: String,
    pub product_handle: String,
    pub product_variant_id: String,
    pub destination: Destination,
}

/// Field name → human-readable message.
pub type ValidationErrors = BTreeMap<&'static str, String>;

/// Defaults shown when a merchant starts a new QR code.
#[must_use]
pub fn default_form() -> QrCodeForm {
    QrCodeForm {
        destination: Some(Destination::Product.as_str().to_string()),
        ..QrCodeForm::default()
    }
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(ToOwned::to_owned)
}

/// Validate a form submission, collecting every field error at once.
///
/// # Errors
///
/// Returns a map of field name to message when any required field is
/// missing or the destination cannot be built from the submitted data.
pub fn validate_qr_code(form: &QrCodeForm) -> Result<ValidQrCode, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let title = non_blank(form.title.as_ref());
    if title.is_none() {
        errors.insert("title", "Title is required".to_string());
    }

    let product_id = non_blank(form.product_id.as_ref());
    if product_id.is_none() {
        errors.insert("product_id", "Product is required".to_string());
    }

    let destination = match non_blank(form.destination.as_ref()) {
        None => {
            errors.insert("destination", "Destination is required".to_string());
            None
        }
        Some(raw) => match raw.parse::<Destination>() {
            Ok(d) => Some(d),
            Err(_) => {
                errors.insert(
                    "destination",
                    format!("Destination must be 'product' or 'cart', got '{raw}'"),
                );
                None
            }
        },
    };

    let product_variant_id = non_blank(form.product_variant_id.as_ref()).unwrap_or_default();
    if destination == Some(Destination::Cart) && variant_number(&product_variant_id).is_none() {
        errors.insert(
            "product_variant_id",
            "Unrecognized product variant ID".to_string(),
        );
    }

    let product_handle = non_blank(form.product_handle.as_ref()).unwrap_or_default();
    if destination == Some(Destination::Product) && product_id.is_some() && product_handle.is_empty()
    {
        errors.insert("product_handle", "Product handle is required".to_string());
    }

    match (title, product_id, destination) {
        (Some(title), Some(product_id), Some(destination)) if errors.is_empty() => Ok(ValidQrCode {
            title,
            product_id,
            product_handle,
            product_variant_id,
            destination,
        }),
        _ => Err(errors),
    }
}

fn variant_number(variant_gid: &str) -> Option<&str> {
    VARIANT_GID_RE
        .captures(variant_gid)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Storefront URL a scan of this QR code redirects to.
///
/// # Errors
///
/// Returns [`CoreError::UnrecognizedVariantId`] for a cart destination whose
/// variant id is not a `gid://shopify/ProductVariant/<n>` GID.
pub fn destination_url(
    shop: &str,
    destination: Destination,
    product_handle: &str,
    product_variant_id: &str,
) -> Result<String, CoreError> {
    match destination {
        Destination::Product => Ok(format!("https://{shop}/products/{product_handle}")),
        Destination::Cart => {
            let variant = variant_number(product_variant_id)
                .ok_or_else(|| CoreError::UnrecognizedVariantId(product_variant_id.to_string()))?;
            Ok(format!("https://{shop}/cart/{variant}:1"))
        }
    }
}

/// Public scan endpoint encoded into the QR image.
#[must_use]
pub fn scan_url(app_url: &str, id: i64) -> String {
    format!("{}/qrcodes/{id}/scan", app_url.trim_end_matches('/'))
}

#[cfg(test)]
#[path = "qr_codes_test.rs"]
mod tests;
