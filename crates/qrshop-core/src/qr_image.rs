//! QR image rendering. Matrix encoding is delegated to the `qrcode` crate;
//! this module only picks the output format.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use qrcode::render::svg;
use qrcode::QrCode;

use crate::CoreError;

const MIN_DIMENSION_PX: u32 = 240;

// Characters left as-is inside an SVG data URI; everything else is escaped.
const DATA_URI_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b' ')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'/')
    .remove(b':')
    .remove(b'=');

/// Render `data` (normally a scan URL) as a standalone SVG document.
///
/// # Errors
///
/// Returns [`CoreError::QrEncoding`] if the payload does not fit in a QR code.
pub fn render_svg(data: &str) -> Result<String, CoreError> {
    let code = QrCode::new(data.as_bytes()).map_err(|e| CoreError::QrEncoding(e.to_string()))?;
    Ok(code
        .render::<svg::Color<'_>>()
        .min_dimensions(MIN_DIMENSION_PX, MIN_DIMENSION_PX)
        .dark_color(svg::Color("#000000"))
        .light_color(svg::Color("#ffffff"))
        .build())
}

/// Render `data` as a `data:` URI suitable for an `<img src>` or a download link.
///
/// # Errors
///
/// Returns [`CoreError::QrEncoding`] if the payload does not fit in a QR code.
pub fn render_data_uri(data: &str) -> Result<String, CoreError> {
    let svg = render_svg(data)?;
    Ok(format!(
        "data:image/svg+xml;charset=utf-8,{}",
        utf8_percent_encode(&svg, DATA_URI_ESCAPE)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_svg_produces_svg_document() {
        let svg = render_svg("https://qr.example.com/qrcodes/1/scan").unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("#000000"));
    }

    #[test]
    fn render_data_uri_is_escaped() {
        let uri = render_data_uri("https://qr.example.com/qrcodes/7/scan").unwrap();
        assert!(uri.starts_with("data:image/svg+xml;charset=utf-8,"));
        assert!(!uri.contains('<'));
        assert!(!uri.contains('"'));
    }

    #[test]
    fn render_svg_rejects_oversized_payload() {
        let huge = "x".repeat(8_000);
        assert!(matches!(render_svg(&huge), Err(CoreError::QrEncoding(_))));
    }
}
