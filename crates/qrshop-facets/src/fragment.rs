//! Locate, extract and replace an element's inner markup by `id`.
//!
//! This is a tag scanner, not an HTML parser: it balances start and end tags
//! of the target element's name, skips comments and the bodies of `script`
//! and `style`, and knows the void elements. That is enough for Liquid
//! section output.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::FacetError;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<!--.*?-->|<(/?)([A-Za-z][A-Za-z0-9:-]*)((?:[^>"']|"[^"]*"|'[^']*')*)>"#)
        .expect("valid tag regex")
});

static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s=/>"']+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+)))?"#)
        .expect("valid attribute regex")
});

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Byte offsets of an element within a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionSpan {
    pub outer_start: usize,
    pub inner_start: usize,
    pub inner_end: usize,
    pub outer_end: usize,
}

struct Tag<'a> {
    closing: bool,
    name: String,
    attrs: &'a str,
    self_closing: bool,
    start: usize,
    end: usize,
}

fn next_tag(html: &str, from: usize) -> Option<Tag<'_>> {
    let mut pos = from;
    loop {
        let caps = TAG_RE.captures_at(html, pos)?;
        let whole = caps.get(0)?;
        let Some(name) = caps.get(2) else {
            // comment
            pos = whole.end();
            continue;
        };
        let attrs = caps.get(3).map_or("", |m| m.as_str());
        return Some(Tag {
            closing: caps.get(1).is_some_and(|m| m.as_str() == "/"),
            name: name.as_str().to_ascii_lowercase(),
            self_closing: attrs.trim_end().ends_with('/'),
            attrs,
            start: whole.start(),
            end: whole.end(),
        });
    }
}

/// Value of attribute `name` within a tag's attribute text.
fn attribute<'a>(attrs: &'a str, name: &str) -> Option<&'a str> {
    ATTR_RE.captures_iter(attrs).find_map(|caps| {
        let key = caps.get(1)?;
        if !key.as_str().eq_ignore_ascii_case(name) {
            return None;
        }
        Some(
            caps.get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map_or("", |m| m.as_str()),
        )
    })
}

/// Position just past the end tag of a raw-text element opened at `from`.
fn skip_raw_text(html: &str, name: &str, from: usize) -> usize {
    let needle = format!("</{name}");
    html[from..]
        .to_ascii_lowercase()
        .find(&needle)
        .map_or(html.len(), |offset| {
            let close = from + offset;
            html[close..].find('>').map_or(html.len(), |gt| close + gt + 1)
        })
}

fn find_open_tag<'a>(html: &'a str, id: &str) -> Option<Tag<'a>> {
    let mut pos = 0;
    while let Some(tag) = next_tag(html, pos) {
        if !tag.closing && attribute(tag.attrs, "id") == Some(id) {
            return Some(tag);
        }
        pos = if !tag.closing && RAW_TEXT_ELEMENTS.contains(&tag.name.as_str()) {
            skip_raw_text(html, &tag.name, tag.end)
        } else {
            tag.end
        };
    }
    None
}

/// Find the element whose `id` attribute equals `id`.
///
/// # Errors
///
/// [`FacetError::RegionNotFound`] if no element carries the id, or
/// [`FacetError::UnclosedRegion`] if its end tag never appears.
pub fn locate_region(html: &str, id: &str) -> Result<RegionSpan, FacetError> {
    let open = find_open_tag(html, id).ok_or_else(|| FacetError::RegionNotFound { id: id.to_owned() })?;

    if open.self_closing || VOID_ELEMENTS.contains(&open.name.as_str()) {
        return Ok(RegionSpan {
            outer_start: open.start,
            inner_start: open.end,
            inner_end: open.end,
            outer_end: open.end,
        });
    }

    if RAW_TEXT_ELEMENTS.contains(&open.name.as_str()) {
        let outer_end = skip_raw_text(html, &open.name, open.end);
        let inner_end = html[..outer_end].rfind('<').unwrap_or(outer_end);
        return Ok(RegionSpan {
            outer_start: open.start,
            inner_start: open.end,
            inner_end,
            outer_end,
        });
    }

    let mut depth = 1usize;
    let mut pos = open.end;
    while let Some(tag) = next_tag(html, pos) {
        if tag.name == open.name {
            if tag.closing {
                depth -= 1;
                if depth == 0 {
                    return Ok(RegionSpan {
                        outer_start: open.start,
                        inner_start: open.end,
                        inner_end: tag.start,
                        outer_end: tag.end,
                    });
                }
            } else if !tag.self_closing {
                depth += 1;
            }
        }
        pos = if !tag.closing && RAW_TEXT_ELEMENTS.contains(&tag.name.as_str()) {
            skip_raw_text(html, &tag.name, tag.end)
        } else {
            tag.end
        };
    }

    Err(FacetError::UnclosedRegion { id: id.to_owned() })
}

/// Inner markup of the element with the given id.
///
/// # Errors
///
/// See [`locate_region`].
pub fn extract_region<'a>(html: &'a str, id: &str) -> Result<&'a str, FacetError> {
    let span = locate_region(html, id)?;
    Ok(&html[span.inner_start..span.inner_end])
}

/// Copy of `html` with the element's inner markup replaced by `inner`.
///
/// # Errors
///
/// See [`locate_region`].
pub fn replace_region(html: &str, id: &str, inner: &str) -> Result<String, FacetError> {
    let span = locate_region(html, id)?;
    let mut out = String::with_capacity(html.len() - (span.inner_end - span.inner_start) + inner.len());
    out.push_str(&html[..span.inner_start]);
    out.push_str(inner);
    out.push_str(&html[span.inner_end..]);
    Ok(out)
}

/// Attribute value on the element with the given id, if both exist.
#[must_use]
pub fn element_attribute(html: &str, id: &str, name: &str) -> Option<String> {
    find_open_tag(html, id).and_then(|tag| attribute(tag.attrs, name).map(ToOwned::to_owned))
}
