//! Unauthenticated routes a customer's phone reaches by scanning a code.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Extension,
};
use qrshop_core::qr_image;

use crate::api::{map_core_error, map_db_error, ApiError, AppState};
use crate::middleware::RequestId;

async fn load(state: &AppState, rid: &str, id: i64) -> Result<qrshop_db::QrCodeRow, ApiError> {
    qrshop_db::get_qr_code_by_id(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.to_owned(), &e))?
        .ok_or_else(|| ApiError::not_found(rid, "QR code"))
}

/// GET /qrcodes/:id. Printable page with the title and QR image.
pub(crate) async fn qr_code_page(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Html<String>, ApiError> {
    let rid = &req_id.0;
    let row = load(&state, rid, id).await?;
    let image = qr_image::render_data_uri(&qrshop_core::scan_url(&state.app_url, row.id))
        .map_err(|e| map_core_error(rid.clone(), &e))?;

    let title = escape_html(&row.title);
    Ok(Html(format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head><meta charset=\"utf-8\"><title>{title}</title></head>\n\
         <body>\n<h1>{title}</h1>\n<img src=\"{image}\" alt=\"QR Code for product\">\n</body>\n</html>\n"
    )))
}

/// GET /qrcodes/:id/image. The QR code as SVG.
pub(crate) async fn qr_code_image(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let rid = &req_id.0;
    let row = load(&state, rid, id).await?;
    let svg = qr_image::render_svg(&qrshop_core::scan_url(&state.app_url, row.id))
        .map_err(|e| map_core_error(rid.clone(), &e))?;

    Ok((
        [
            (header::CONTENT_TYPE, "image/svg+xml"),
            (header::CACHE_CONTROL, "public, max-age=86400"),
        ],
        svg,
    )
        .into_response())
}

/// GET /qrcodes/:id/scan. Count the scan and send the customer on.
///
/// The destination is resolved before the counter moves, so a code that
/// cannot redirect is never counted.
pub(crate) async fn scan_qr_code(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let rid = &req_id.0;
    let row = qrshop_db::get_qr_code_by_id(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::not_found(rid.as_str(), "QR code"))?;
    let location = row
        .destination_url()
        .map_err(|e| map_core_error(rid.clone(), &e))?;
    let row = qrshop_db::increment_scans(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::not_found(rid.as_str(), "QR code"))?;

    tracing::debug!(id, scans = row.scans, "QR code scanned");
    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::escape_html;

    #[test]
    fn escape_html_neutralizes_markup() {
        assert_eq!(
            escape_html(r#"<b>"Tom's" & co</b>"#),
            "&lt;b&gt;&quot;Tom&#39;s&quot; &amp; co&lt;/b&gt;"
        );
    }

    #[test]
    fn escape_html_leaves_plain_text() {
        assert_eq!(escape_html("Spring sale"), "Spring sale");
    }
}
