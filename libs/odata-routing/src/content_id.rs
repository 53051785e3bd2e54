//! Batch Content-ID references (`$1/Orders`) and their resolution.
//!
//! A [`ContentIdMapping`] lives for exactly one batch request: create it when
//! the batch starts, record each sub-response in arrival order, drop it when
//! the batch ends. Sub-responses must be processed sequentially for later
//! sub-requests to see earlier ids.

use std::collections::HashMap;

use http::HeaderMap;
use http::header::LOCATION;

/// Header carrying the Content-ID of a batch sub-request.
pub const CONTENT_ID_HEADER: &str = "Content-ID";

/// Content-ID token to absolute Location/Id of the created resource.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContentIdMapping {
    locations: HashMap<String, String>,
}

impl ContentIdMapping {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, content_id: impl Into<String>, location: impl Into<String>) {
        self.locations.insert(content_id.into(), location.into());
    }

    #[must_use]
    pub fn get(&self, content_id: &str) -> Option<&str> {
        self.locations.get(content_id).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Record a completed sub-response. Returns `true` when the sub-request
    /// carried a Content-ID and the response a `Location` header.
    pub fn record_response(
        &mut self,
        content_id: Option<&str>,
        response_headers: &HeaderMap,
    ) -> bool {
        let Some(content_id) = content_id.map(str::trim).filter(|id| !id.is_empty()) else {
            return false;
        };
        let Some(location) = response_headers
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
        else {
            return false;
        };
        tracing::trace!(content_id, location, "recorded batch content-id");
        self.insert(content_id, location);
        true
    }
}

/// Characters allowed in a Content-ID (`1*unreserved`).
fn is_content_id_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~')
}

/// Replace the first resolvable `$<content-id>` reference in `url`.
///
/// Everything before the `$` is dropped (locations are absolute) and the text
/// after the alias is kept: `http://host/$1/Orders` with `1 ->
/// http://host/Customers(1)` becomes `http://host/Customers(1)/Orders`.
/// At most one alias is substituted per call. Without a match, `url` is
/// returned unchanged.
#[must_use]
pub fn resolve_content_id(url: &str, mapping: &ContentIdMapping) -> String {
    let bytes = url.as_bytes();
    let mut start = 0;

    while let Some(offset) = url[start..].find('$') {
        let dollar = start + offset;
        let key_end = bytes[dollar + 1..]
            .iter()
            .position(|b| !is_content_id_char(*b))
            .map_or(bytes.len(), |p| dollar + 1 + p);

        if key_end > dollar + 1 {
            let key = &url[dollar + 1..key_end];
            if let Some(location) = mapping.get(key) {
                tracing::trace!(content_id = key, location, "resolved content-id reference");
                return format!("{location}{}", &url[key_end..]);
            }
        }

        start = dollar + 1;
    }

    url.to_owned()
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn mapping(pairs: &[(&str, &str)]) -> ContentIdMapping {
        let mut m = ContentIdMapping::new();
        for (k, v) in pairs {
            m.insert(*k, *v);
        }
        m
    }

    #[test]
    fn test_resolves_alias_and_keeps_suffix() {
        let m = mapping(&[("1", "http://x/Entities(1)")]);
        assert_eq!(
            resolve_content_id("http://x/$1/Orders", &m),
            "http://x/Entities(1)/Orders"
        );
    }

    #[test]
    fn test_only_first_alias_is_resolved() {
        let m = mapping(&[("1", "http://x/A(1)"), ("2", "http://x/B(2)")]);
        let resolved = resolve_content_id("$1/$ref?$id=$2", &m);
        assert_eq!(resolved, "http://x/A(1)/$ref?$id=$2");
    }

    #[test]
    fn test_unknown_aliases_are_skipped() {
        let m = mapping(&[("new-order", "http://x/Orders(9)")]);
        assert_eq!(
            resolve_content_id("$filter/$new-order/Items", &m),
            "http://x/Orders(9)/Items"
        );
    }

    #[test]
    fn test_no_match_returns_input() {
        let m = mapping(&[("1", "http://x/A(1)")]);
        for url in ["http://x/Customers", "http://x/$", "http://x/$/$$", "$10", "$12/Orders"] {
            assert_eq!(resolve_content_id(url, &m), url);
        }
    }

    #[test]
    fn test_alias_is_maximal_run() {
        let m = mapping(&[("1", "http://x/A(1)"), ("1.5", "http://x/B")]);
        assert_eq!(resolve_content_id("$1.5?x", &m), "http://x/B?x");
    }

    #[test]
    fn test_non_ascii_is_not_part_of_alias() {
        let m = mapping(&[("ab", "http://x/A")]);
        assert_eq!(
            resolve_content_id("$ab\u{e9}/x", &m),
            "http://x/A\u{e9}/x"
        );
    }

    #[test]
    fn test_record_response() {
        let mut m = ContentIdMapping::new();
        let mut headers = HeaderMap::new();
        assert!(!m.record_response(Some("1"), &headers));

        headers.insert(LOCATION, HeaderValue::from_static("http://x/Customers(4)"));
        assert!(!m.record_response(None, &headers));
        assert!(!m.record_response(Some("  "), &headers));
        assert!(m.record_response(Some("1"), &headers));
        assert_eq!(m.get("1"), Some("http://x/Customers(4)"));
        assert_eq!(m.len(), 1);
    }
}
