//! Query strings and URLs.
use crate::{context::Lifecycle, platform::Platform};

/// Escape the characters that would break a query string: `?`, `&`, `#`
/// and `+`.
pub fn url_encode(s: &str) -> String {
    let mut encoded = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '?' => encoded.push_str("%3F"),
            '&' => encoded.push_str("%26"),
            '#' => encoded.push_str("%23"),
            '+' => encoded.push_str("%2B"),
            c => encoded.push(c),
        }
    }
    encoded
}

fn decode(s: &str) -> String {
    match urlencoding::decode(s) {
        Ok(decoded) => decoded.into_owned(),
        Err(err) => {
            log::warn!("could not decode query component '{s}': {err}");
            s.to_string()
        }
    }
}

/// Query parameters, in the order they were first set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Query(Vec<(String, String)>);

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set `key`, keeping its position if it is already present.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.0.iter().position(|(k, _)| k == key)?;
        Some(self.0.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Query {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut query = Query::new();
        for (k, v) in iter {
            query.set(k, v);
        }
        query
    }
}

/// Parse `a=1&b=2` (without a leading `?`).
///
/// Pairs missing a key or a value are dropped, as is anything after a second
/// `=` in a pair. A later duplicate key overwrites the earlier value.
pub fn parse_query(query: &str) -> Query {
    let mut params = Query::new();
    if !query.contains('=') {
        return params;
    }
    for pair in query.split('&') {
        let mut parts = pair.split('=');
        let key = parts.next().unwrap_or_default();
        let value = parts.next().unwrap_or_default();
        if !key.is_empty() && !value.is_empty() {
            params.set(decode(key), decode(value));
        }
    }
    params
}

pub fn format_query(query: &Query) -> String {
    query
        .iter()
        .map(|(k, v)| format!("{}={}", url_encode(k), url_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Apply `props` to a query string. `None` removes a key.
///
/// With no props the original string is returned untouched.
pub fn extend_query(original: &str, props: &[(&str, Option<&str>)]) -> String {
    if props.is_empty() {
        return original.to_string();
    }
    let mut query = parse_query(original);
    for (key, value) in props {
        match value {
            Some(value) => query.set(*key, *value),
            None => {
                query.remove(key);
            }
        }
    }
    format_query(&query)
}

/// Extend both the query and the hash of `url`.
pub fn extend_url(
    url: &str,
    query: &[(&str, Option<&str>)],
    hash: &[(&str, Option<&str>)],
) -> String {
    let (base, original_hash) = match url.split_once('#') {
        Some((base, hash)) => (base, hash),
        None => (url, ""),
    };
    let (path, original_query) = base.split_once('?').unwrap_or((base, ""));

    let mut extended = path.to_string();
    let query = extend_query(original_query, query);
    if !query.is_empty() {
        extended.push('?');
        extended.push_str(&query);
    }
    let hash = extend_query(original_hash, hash);
    if !hash.is_empty() {
        extended.push('#');
        extended.push_str(&hash);
    }
    extended
}

/// Whether navigating to `url` from `current_href` loads a new page, as
/// opposed to only moving to a fragment of the current one.
pub fn url_will_redirect_page(url: &str, current_href: &str) -> bool {
    let Some((base, _)) = url.split_once('#') else {
        return true;
    };
    if base.is_empty() {
        return false;
    }
    let current = current_href
        .split_once('#')
        .map(|(base, _)| base)
        .unwrap_or(current_href);
    base != current
}

impl<P: Platform> Lifecycle<P> {
    /// [`parse_query`], memoized per query string.
    pub fn parsed_query(&self, query: &str) -> Query {
        self.memo()
            .memoize("parse_query", query.to_string(), || parse_query(query))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn encode_only_touches_query_syntax() {
        assert_eq!(url_encode("a?b&c#d+e f"), "a%3Fb%26c%23d%2Be f");
    }

    #[test]
    fn parse_drops_incomplete_pairs() {
        let query = parse_query("a=1&=2&b=&c&d=x%20y&a=3");
        assert_eq!(
            query.iter().collect::<Vec<_>>(),
            vec![("a", "3"), ("d", "x y")]
        );
        assert!(parse_query("novalue").is_empty());
        assert!(parse_query("").is_empty());
    }

    #[test]
    fn format_keeps_insertion_order() {
        let query: Query = [("z", "1"), ("a", "b&c")].into_iter().collect();
        assert_eq!(format_query(&query), "z=1&a=b%26c");
    }

    #[test]
    fn extend_query_overrides_and_removes() {
        assert_eq!(extend_query("a=1&b=2", &[]), "a=1&b=2");
        assert_eq!(
            extend_query("a=1&b=2", &[("b", Some("3")), ("c", Some("4")), ("a", None)]),
            "b=3&c=4"
        );
    }

    #[test]
    fn extend_url_handles_query_and_hash() {
        assert_eq!(
            extend_url("https://x.test/p?a=1#h=1", &[("b", Some("2"))], &[("g", Some("3"))]),
            "https://x.test/p?a=1&b=2#h=1&g=3"
        );
        assert_eq!(
            extend_url("https://x.test/p", &[("q", Some("1"))], &[]),
            "https://x.test/p?q=1"
        );
        assert_eq!(extend_url("https://x.test/p", &[], &[]), "https://x.test/p");
    }

    #[test]
    fn redirect_detection() {
        let here = "https://x.test/p?a=1#top";
        assert!(url_will_redirect_page("https://x.test/other", here));
        assert!(!url_will_redirect_page("#section", here));
        assert!(!url_will_redirect_page("https://x.test/p?a=1#section", here));
        assert!(url_will_redirect_page("https://x.test/q#section", here));
    }

    #[test]
    fn parsed_query_is_memoized() {
        let lifecycle = Lifecycle::new(crate::sim::Sim::new());
        let first = lifecycle.parsed_query("a=1");
        assert_eq!(first.get("a"), Some("1"));
        lifecycle.parsed_query("a=1");
        lifecycle.parsed_query("b=2");
        assert_eq!(lifecycle.memo().len_of::<String, Query>("parse_query"), 2);
    }
}
