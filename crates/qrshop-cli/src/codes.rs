use std::path::Path;

use qrshop_db::QrCodeRow;

/// Print a table of a shop's QR codes.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_list(pool: &sqlx::PgPool, shop: &str) -> anyhow::Result<()> {
    let rows = qrshop_db::list_qr_codes(pool, shop).await?;

    if rows.is_empty() {
        println!("no QR codes found for {shop}");
        return Ok(());
    }

    println!("{}", table_header());
    for row in &rows {
        println!("{}", table_row(row));
    }

    Ok(())
}

/// Render a QR code's SVG to `output`, or stdout when `None`.
///
/// # Errors
///
/// Returns an error if the code does not exist, cannot be encoded, or the
/// output cannot be written.
pub(crate) async fn run_image(
    pool: &sqlx::PgPool,
    app_url: &str,
    id: i64,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let row = qrshop_db::get_qr_code_by_id(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("QR code {id} not found"))?;
    let svg = qrshop_core::qr_image::render_svg(&qrshop_core::scan_url(app_url, row.id))?;

    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
            tracing::info!(id, path = %path.display(), "wrote QR code image");
        }
        None => println!("{svg}"),
    }

    Ok(())
}

fn table_header() -> String {
    format!(
        "{:<8}{:<10}{:<8}{:<12}TITLE",
        "ID", "DEST", "SCANS", "CREATED"
    )
}

fn table_row(row: &QrCodeRow) -> String {
    let title = if row.title.chars().count() > 50 {
        format!("{}...", row.title.chars().take(50).collect::<String>())
    } else {
        row.title.clone()
    };
    format!(
        "{:<8}{:<10}{:<8}{:<12}{}",
        row.id,
        row.destination,
        row.scans,
        row.created_at.format("%Y-%m-%d"),
        title
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn row(title: &str) -> QrCodeRow {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        QrCodeRow {
            id: 7,
            title: title.to_owned(),
            shop: "a.myshopify.com".to_owned(),
            product_id: "gid://shopify/Product/1".to_owned(),
            product_handle: "linen-shirt".to_owned(),
            product_variant_id: String::new(),
            destination: "product".to_owned(),
            scans: 3,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn table_row_aligns_with_header() {
        let line = table_row(&row("Window sticker"));
        assert!(line.starts_with("7       product   3       2025-03-01  Window sticker"));
        assert_eq!(table_header().find("TITLE"), line.find("Window"));
    }

    #[test]
    fn table_row_truncates_long_titles() {
        let line = table_row(&row(&"x".repeat(80)));
        assert!(line.ends_with(&format!("{}...", "x".repeat(50))));
    }
}
