//! Case-insensitive, single-valued header collection.
//!
//! `http::HeaderMap` is a multimap keyed by `HeaderName`; this spec's wire semantics are
//! simpler and stricter: one value per name, last write wins, names compared
//! case-insensitively. `Headers` is a small wrapper over a `HashMap<String, String>` that
//! lowercases every key on insertion so lookups never need to re-normalize the caller's key.

use std::collections::HashMap;
use std::collections::hash_map;

/// A case-insensitive, single-valued header collection.
///
/// Keys are normalized to lowercase on insertion. Duplicate keys: last-wins. Iteration order
/// is unspecified (backed by a `HashMap`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    inner: HashMap<String, String>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a header, overwriting any existing value for the same (case-insensitive) name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.insert(name.into().to_ascii_lowercase(), value.into());
    }

    /// Looks up a header value, case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(&name.to_ascii_lowercase())
    }

    /// Case-insensitive comparison against a header's value, used for `Connection: close` and
    /// similar checks where both the name and a specific value must match ignoring case.
    pub fn value_eq_ignore_case(&self, name: &str, value: &str) -> bool {
        self.get(name).is_some_and(|v| v.eq_ignore_ascii_case(value))
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.inner.remove(&name.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, String, String> {
        self.inner.iter()
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = (&'a String, &'a String);
    type IntoIter = hash_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

impl FromIterator<(String, String)> for Headers {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let mut headers = Headers::new();
        headers.insert("Content-Type", "text/plain");

        assert_eq!(headers.get("content-type"), Some("text/plain"));
        assert_eq!(headers.get("CONTENT-TYPE"), Some("text/plain"));
        assert_eq!(headers.get("Content-Type"), Some("text/plain"));
    }

    #[test]
    fn duplicate_insert_is_last_wins() {
        let mut headers = Headers::new();
        headers.insert("X-Count", "1");
        headers.insert("x-count", "2");

        assert_eq!(headers.get("X-COUNT"), Some("2"));
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn connection_close_matches_any_case() {
        let mut headers = Headers::new();
        headers.insert("Connection", "Close");
        assert!(headers.value_eq_ignore_case("connection", "close"));

        headers.insert("Connection", "Keep-Alive");
        assert!(!headers.value_eq_ignore_case("connection", "close"));
    }
}
