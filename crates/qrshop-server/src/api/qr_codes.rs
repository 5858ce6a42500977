//! Admin QR code handlers. Every route acts for the shop named in the
//! `x-shopify-shop-domain` header and never sees another shop's records.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use qrshop_core::{qr_image, QrCodeForm};
use qrshop_db::{DbError, QrCodeRow};
use serde::Serialize;

use crate::middleware::RequestId;

use super::{
    map_core_error, map_db_error, map_shopify_error, require_shop, ApiError, ApiResponse,
    AppState, ResponseMeta,
};

/// A stored QR code merged with live product data and its rendered image.
#[derive(Debug, Serialize)]
pub(super) struct QrCodeItem {
    id: i64,
    title: String,
    shop: String,
    product_id: String,
    product_handle: String,
    product_variant_id: String,
    destination: String,
    scans: i32,
    created_at: DateTime<Utc>,
    product_deleted: bool,
    product_title: Option<String>,
    product_image: Option<String>,
    product_alt: Option<String>,
    destination_url: String,
    /// `data:` URI of the QR code SVG encoding the scan URL.
    image: String,
}

async fn supplement(state: &AppState, rid: &str, row: QrCodeRow) -> Result<QrCodeItem, ApiError> {
    let product = state
        .shopify
        .fetch_product(&row.shop, &state.access_token, &row.product_id)
        .await
        .map_err(|e| map_shopify_error(rid.to_owned(), &e))?;
    let destination_url = row
        .destination_url()
        .map_err(|e| map_core_error(rid.to_owned(), &e))?;
    let image = qr_image::render_data_uri(&qrshop_core::scan_url(&state.app_url, row.id))
        .map_err(|e| map_core_error(rid.to_owned(), &e))?;

    if product.is_none() {
        tracing::info!(id = row.id, product_id = %row.product_id, "QR code product no longer exists");
    }

    Ok(QrCodeItem {
        id: row.id,
        title: row.title,
        shop: row.shop,
        product_id: row.product_id,
        product_handle: row.product_handle,
        product_variant_id: row.product_variant_id,
        destination: row.destination,
        scans: row.scans,
        created_at: row.created_at,
        product_deleted: product.is_none(),
        product_title: product.as_ref().map(|p| p.title.clone()),
        product_image: product.as_ref().and_then(|p| p.image_url.clone()),
        product_alt: product.and_then(|p| p.image_alt),
        destination_url,
        image,
    })
}

fn parse_form(rid: &str, body: &QrCodeForm) -> Result<qrshop_core::ValidQrCode, ApiError> {
    qrshop_core::validate_qr_code(body).map_err(|errors| ApiError::validation(rid, &errors))
}

/// GET /api/v1/qrcodes. The shop's QR codes, newest first.
pub(super) async fn list_qr_codes(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<Vec<QrCodeItem>>>, ApiError> {
    let rid = &req_id.0;
    let shop = require_shop(&headers, rid)?;

    let rows = qrshop_db::list_qr_codes(&state.pool, &shop)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    let data = try_join_all(rows.into_iter().map(|row| supplement(&state, rid, row))).await?;

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/qrcodes/new. Defaults for an empty form.
pub(super) async fn new_qr_code(
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<QrCodeForm>> {
    Json(ApiResponse {
        data: qrshop_core::default_form(),
        meta: ResponseMeta::new(req_id.0),
    })
}

/// GET /api/v1/qrcodes/:id
pub(super) async fn get_qr_code(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<QrCodeItem>>, ApiError> {
    let rid = &req_id.0;
    let shop = require_shop(&headers, rid)?;

    let row = qrshop_db::get_qr_code(&state.pool, &shop, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::not_found(rid.as_str(), "QR code"))?;
    let data = supplement(&state, rid, row).await?;

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /api/v1/qrcodes
pub(super) async fn create_qr_code(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
    Json(body): Json<QrCodeForm>,
) -> Result<(StatusCode, Json<ApiResponse<QrCodeItem>>), ApiError> {
    let rid = &req_id.0;
    let shop = require_shop(&headers, rid)?;
    let valid = parse_form(rid, &body)?;

    let row = qrshop_db::create_qr_code(&state.pool, &shop, &valid)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    tracing::info!(id = row.id, %shop, "QR code created");
    let data = supplement(&state, rid, row).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data,
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// PUT /api/v1/qrcodes/:id. Replace the editable fields; scans are kept.
pub(super) async fn update_qr_code(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<QrCodeForm>,
) -> Result<Json<ApiResponse<QrCodeItem>>, ApiError> {
    let rid = &req_id.0;
    let shop = require_shop(&headers, rid)?;
    let valid = parse_form(rid, &body)?;

    let row = match qrshop_db::update_qr_code(&state.pool, &shop, id, &valid).await {
        Ok(row) => row,
        Err(DbError::NotFound) => return Err(ApiError::not_found(rid.as_str(), "QR code")),
        Err(e) => return Err(map_db_error(rid.clone(), &e)),
    };
    let data = supplement(&state, rid, row).await?;

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// DELETE /api/v1/qrcodes/:id
pub(super) async fn delete_qr_code(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let rid = &req_id.0;
    let shop = require_shop(&headers, rid)?;

    let deleted = qrshop_db::delete_qr_code(&state.pool, &shop, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    if !deleted {
        return Err(ApiError::not_found(rid.as_str(), "QR code"));
    }
    tracing::info!(id, %shop, "QR code deleted");

    Ok(Json(ApiResponse {
        data: serde_json::json!({ "deleted": true }),
        meta: ResponseMeta::new(req_id.0),
    }))
}
