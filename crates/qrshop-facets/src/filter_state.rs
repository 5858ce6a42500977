//! Canonical query-string form of the filter form.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

// application/x-www-form-urlencoded leaves `*-._` and alphanumerics as-is;
// spaces are kept here and turned into `+` afterwards.
const FORM_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'*')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b' ');

/// One control of the filter form, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub name: String,
    pub value: String,
    pub disabled: bool,
    /// `Some` for checkboxes and radios; unchecked ones are not submitted.
    pub checked: Option<bool>,
}

impl FormField {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            disabled: false,
            checked: None,
        }
    }

    pub fn checkbox(name: impl Into<String>, value: impl Into<String>, checked: bool) -> Self {
        Self {
            checked: Some(checked),
            ..Self::text(name, value)
        }
    }

    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    fn is_submitted(&self) -> bool {
        !self.name.is_empty() && !self.disabled && self.checked != Some(false)
    }
}

/// Serialized set of active filters, e.g. `filter.v.color=red&sort_by=price`.
///
/// Equality is string equality: the same filters in a different order are a
/// different state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FilterState(String);

impl FilterState {
    /// Serialize the submitted fields of a form, in order.
    #[must_use]
    pub fn from_fields(fields: &[FormField]) -> Self {
        let pairs: Vec<String> = fields
            .iter()
            .filter(|f| f.is_submitted())
            .map(|f| format!("{}={}", encode(&f.name), encode(&f.value)))
            .collect();
        Self(pairs.join("&"))
    }

    /// Wrap an already-serialized query string, such as the page's
    /// `location.search` without the leading `?`.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        Self(query.strip_prefix('?').unwrap_or(query).to_owned())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `path?filters`, or the bare path when no filter is active.
    #[must_use]
    pub fn location(&self, path: &str) -> String {
        if self.is_empty() {
            path.to_owned()
        } else {
            format!("{path}?{}", self.0)
        }
    }
}

impl std::fmt::Display for FilterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn encode(raw: &str) -> String {
    utf8_percent_encode(raw, FORM_ENCODE)
        .to_string()
        .replace(' ', "+")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_form_serializes_to_empty_string() {
        assert_eq!(FilterState::from_fields(&[]).as_str(), "");
        assert!(FilterState::from_fields(&[]).is_empty());
    }

    #[test]
    fn fields_keep_document_order() {
        let state = FilterState::from_fields(&[
            FormField::text("filter.v.color", "red"),
            FormField::text("sort_by", "price-ascending"),
        ]);
        assert_eq!(state.as_str(), "filter.v.color=red&sort_by=price-ascending");
    }

    #[test]
    fn skips_unnamed_disabled_and_unchecked_fields() {
        let state = FilterState::from_fields(&[
            FormField::text("", "ignored"),
            FormField::text("q", "shirt").disabled(),
            FormField::checkbox("filter.v.size", "S", false),
            FormField::checkbox("filter.v.size", "M", true),
        ]);
        assert_eq!(state.as_str(), "filter.v.size=M");
    }

    #[test]
    fn encodes_like_url_search_params() {
        let state = FilterState::from_fields(&[FormField::text("q", "blue & white*")]);
        assert_eq!(state.as_str(), "q=blue+%26+white*");
    }

    #[test]
    fn empty_values_are_still_submitted() {
        let state = FilterState::from_fields(&[FormField::text("filter.v.color", "")]);
        assert_eq!(state.as_str(), "filter.v.color=");
    }

    #[test]
    fn location_omits_separator_when_empty() {
        assert_eq!(FilterState::default().location("/collections/all"), "/collections/all");
        assert_eq!(
            FilterState::from_query("?color=red").location("/collections/all"),
            "/collections/all?color=red"
        );
    }
}
