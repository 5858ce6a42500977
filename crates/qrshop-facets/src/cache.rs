//! Session cache of fetched section markup.

use std::collections::HashMap;

use crate::filter_state::FilterState;

/// Fully-qualified section URL, used both as the request target and as the
/// cache key: `{path}?section_id={section}&{filters}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchKey(String);

impl FetchKey {
    #[must_use]
    pub fn new(path: &str, section_id: &str, filter: &FilterState) -> Self {
        Self(format!("{path}?section_id={section_id}&{filter}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FetchKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Append-only map from [`FetchKey`] to the raw section markup.
///
/// There is no eviction: entries live as long as the owning session, which
/// is one page load.
#[derive(Debug, Default)]
pub struct SectionCache {
    entries: HashMap<FetchKey, String>,
}

impl SectionCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn lookup(&self, key: &FetchKey) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn store(&mut self, key: FetchKey, markup: String) {
        self.entries.insert(key, markup);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_keeps_trailing_ampersand_for_empty_filters() {
        let key = FetchKey::new("/collection", "grid", &FilterState::default());
        assert_eq!(key.as_str(), "/collection?section_id=grid&");
    }

    #[test]
    fn lookup_after_store() {
        let mut cache = SectionCache::new();
        let key = FetchKey::new("/collection", "grid", &FilterState::from_query("color=red"));
        assert!(cache.lookup(&key).is_none());
        cache.store(key.clone(), "<div>R1</div>".to_owned());
        assert_eq!(cache.lookup(&key), Some("<div>R1</div>"));
    }

    #[test]
    fn reordered_filters_are_distinct_entries() {
        let mut cache = SectionCache::new();
        let a = FetchKey::new("/c", "grid", &FilterState::from_query("a=1&b=2"));
        let b = FetchKey::new("/c", "grid", &FilterState::from_query("b=2&a=1"));
        cache.store(a, "first".to_owned());
        assert!(cache.lookup(&b).is_none());
        assert_eq!(cache.len(), 1);
    }
}
