//! Query-string handling shared by the sortable, filterable listings.
//!
//! Listings need the raw parameters (not a typed struct) so that sort and
//! page links can carry every filter the caller sent.

use std::fmt::Write;

/// The request path plus its query parameters, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    path: String,
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    #[cfg(test)]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            pairs: Vec::new(),
        }
    }

    /// Parse a raw query string (without the leading `?`).
    pub fn parse(path: impl Into<String>, raw: Option<&str>) -> Self {
        let pairs = raw
            .unwrap_or("")
            .split('&')
            .filter(|part| !part.is_empty())
            .map(|part| {
                let (key, value) = part.split_once('=').unwrap_or((part, ""));
                (decode(key), decode(value))
            })
            .collect();

        Self {
            path: path.into(),
            pairs,
        }
    }

    #[cfg(test)]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First non-empty value for `key`.
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    /// Drop every value of `key`.
    pub fn remove(&mut self, key: &str) {
        self.pairs.retain(|(k, _)| k != key);
    }

    /// Replace every value of `key` with a single `value`, appended last.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.remove(key);
        self.pairs.push((key.to_string(), value.into()));
    }

    pub fn to_query_string(&self) -> String {
        let mut out = String::new();
        for (i, (key, value)) in self.pairs.iter().enumerate() {
            if i > 0 {
                out.push('&');
            }
            let _ = write!(
                out,
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(value)
            );
        }
        out
    }

    /// `?<query>`, or the bare path when there are no parameters.
    pub fn to_link(&self) -> String {
        if self.pairs.is_empty() {
            self.path.clone()
        } else {
            format!("?{}", self.to_query_string())
        }
    }
}

fn decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|s| s.into_owned())
        .unwrap_or(spaced)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decodes_pairs() {
        let params = QueryParams::parse("/admin", Some("q=foo+bar&filter=no-category&sort=-name"));

        assert_eq!(params.get("q"), Some("foo bar"));
        assert_eq!(params.get("filter"), Some("no-category"));
        assert_eq!(params.get("sort"), Some("-name"));
        assert_eq!(params.get("page"), None);
    }

    #[test]
    fn test_empty_values_and_keys_without_value() {
        let params = QueryParams::parse("/admin", Some("q=&flag&&page=2"));

        assert_eq!(params.get("q"), Some(""));
        assert_eq!(params.get_non_empty("q"), None);
        assert_eq!(params.get("flag"), Some(""));
        assert_eq!(params.get("page"), Some("2"));
    }

    #[test]
    fn test_set_replaces_and_appends() {
        let mut params = QueryParams::parse("/admin", Some("page=1&q=x&page=4"));
        params.set("page", "2");

        assert_eq!(params.to_query_string(), "q=x&page=2");
    }

    #[test]
    fn test_link_falls_back_to_path() {
        let mut params = QueryParams::parse("/api/admin/sources", Some("sort=type"));
        assert_eq!(params.to_link(), "?sort=type");

        params.remove("sort");
        assert!(params.is_empty());
        assert_eq!(params.to_link(), "/api/admin/sources");
    }

    #[test]
    fn test_values_are_encoded() {
        let mut params = QueryParams::new("/");
        params.set("q", "a&b c");
        assert_eq!(params.to_query_string(), "q=a%26b%20c");
    }
}
