//! Database operations for the `qr_codes` table.

use chrono::{DateTime, Utc};
use qrshop_core::{Destination, ValidQrCode};
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `qr_codes` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct QrCodeRow {
    pub id: i64,
    pub title: String,
    pub shop: String,
    pub product_id: String,
    pub product_handle: String,
    pub product_variant_id: String,
    pub destination: String,
    pub scans: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl QrCodeRow {
    /// Parsed destination. The table's CHECK constraint keeps this infallible
    /// for rows written through this crate.
    ///
    /// # Errors
    ///
    /// Returns [`qrshop_core::CoreError::InvalidDestination`] for a row edited
    /// outside the app with an unknown destination.
    pub fn destination(&self) -> Result<Destination, qrshop_core::CoreError> {
        self.destination.parse()
    }

    /// Storefront URL a scan of this code should redirect to.
    ///
    /// # Errors
    ///
    /// Propagates [`qrshop_core::CoreError`] from destination parsing or URL building.
    pub fn destination_url(&self) -> Result<String, qrshop_core::CoreError> {
        qrshop_core::destination_url(
            &self.shop,
            self.destination()?,
            &self.product_handle,
            &self.product_variant_id,
        )
    }
}

const COLUMNS: &str = "id, title, shop, product_id, product_handle, product_variant_id, \
                       destination, scans, created_at, updated_at";

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Inserts a validated QR code for `shop` and returns the stored row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn create_qr_code(
    pool: &PgPool,
    shop: &str,
    qr_code: &ValidQrCode,
) -> Result<QrCodeRow, DbError> {
    let row = sqlx::query_as::<_, QrCodeRow>(&format!(
        "INSERT INTO qr_codes (title, shop, product_id, product_handle, product_variant_id, destination) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING {COLUMNS}"
    ))
    .bind(&qr_code.title)
    .bind(shop)
    .bind(&qr_code.product_id)
    .bind(&qr_code.product_handle)
    .bind(&qr_code.product_variant_id)
    .bind(qr_code.destination.as_str())
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Replaces the editable fields of a shop's QR code. Scan counts are preserved.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row with that id belongs to `shop`,
/// or [`DbError::Sqlx`] if the query fails.
pub async fn update_qr_code(
    pool: &PgPool,
    shop: &str,
    id: i64,
    qr_code: &ValidQrCode,
) -> Result<QrCodeRow, DbError> {
    sqlx::query_as::<_, QrCodeRow>(&format!(
        "UPDATE qr_codes \
         SET title = $1, product_id = $2, product_handle = $3, product_variant_id = $4, \
             destination = $5, updated_at = NOW() \
         WHERE id = $6 AND shop = $7 \
         RETURNING {COLUMNS}"
    ))
    .bind(&qr_code.title)
    .bind(&qr_code.product_id)
    .bind(&qr_code.product_handle)
    .bind(&qr_code.product_variant_id)
    .bind(qr_code.destination.as_str())
    .bind(id)
    .bind(shop)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Returns a shop's QR code by id, or `None` if it does not exist or belongs
/// to another shop.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_qr_code(pool: &PgPool, shop: &str, id: i64) -> Result<Option<QrCodeRow>, DbError> {
    let row = sqlx::query_as::<_, QrCodeRow>(&format!(
        "SELECT {COLUMNS} FROM qr_codes WHERE id = $1 AND shop = $2"
    ))
    .bind(id)
    .bind(shop)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns a QR code by id regardless of shop. Used by the public scan and
/// image routes, which are reached from a printed code.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_qr_code_by_id(pool: &PgPool, id: i64) -> Result<Option<QrCodeRow>, DbError> {
    let row = sqlx::query_as::<_, QrCodeRow>(&format!(
        "SELECT {COLUMNS} FROM qr_codes WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns every QR code for `shop`, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_qr_codes(pool: &PgPool, shop: &str) -> Result<Vec<QrCodeRow>, DbError> {
    let rows = sqlx::query_as::<_, QrCodeRow>(&format!(
        "SELECT {COLUMNS} FROM qr_codes WHERE shop = $1 ORDER BY id DESC"
    ))
    .bind(shop)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Deletes a shop's QR code. Returns `true` if a row was removed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn delete_qr_code(pool: &PgPool, shop: &str, id: i64) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM qr_codes WHERE id = $1 AND shop = $2")
        .bind(id)
        .bind(shop)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Atomically bumps the scan counter and returns the updated row, or `None`
/// if the code no longer exists.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn increment_scans(pool: &PgPool, id: i64) -> Result<Option<QrCodeRow>, DbError> {
    let row = sqlx::query_as::<_, QrCodeRow>(&format!(
        "UPDATE qr_codes SET scans = scans + 1 WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
