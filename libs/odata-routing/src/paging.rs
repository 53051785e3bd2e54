//! Server-driven paging: the `@odata.nextLink` of a truncated collection.

use url::Url;

use crate::error::Error;

/// Rewrite `request_uri` so it addresses the page after the current one.
///
/// `query` is the request's query options in their original order:
/// - a numeric `$top` is reduced by `page_size`; the caller only asks for a
///   next page when more than one page remains, so `top > page_size`
/// - `$skip` is consumed; numeric values add to the next skip, which starts
///   at `page_size`
/// - every other option is re-emitted with its value escaped and its key
///   escaped after an optional leading `$`
///
/// `$skip=<next skip>` is always the last option of the result.
///
/// # Errors
/// Returns `Error::InvalidPageSize` if `page_size` is not positive.
pub fn next_page_link<I, K, V>(request_uri: &Url, query: I, page_size: i64) -> Result<Url, Error>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    if page_size <= 0 {
        return Err(Error::InvalidPageSize);
    }

    let mut next_skip = page_size;
    let mut rebuilt = String::new();

    for (key, value) in query {
        let (key, value) = (key.as_ref(), value.as_ref());
        let value = match key {
            "$top" => match value.parse::<i64>() {
                Ok(top) => {
                    debug_assert!(top > page_size, "$top must exceed the page size");
                    top.saturating_sub(page_size).to_string()
                }
                Err(_) => value.to_owned(),
            },
            "$skip" => {
                if let Ok(skip) = value.parse::<i64>() {
                    next_skip = next_skip.saturating_add(skip);
                }
                continue;
            }
            _ => value.to_owned(),
        };

        match key.strip_prefix('$') {
            Some(rest) => {
                rebuilt.push('$');
                rebuilt.push_str(&urlencoding::encode(rest));
            }
            None => rebuilt.push_str(&urlencoding::encode(key)),
        }
        rebuilt.push('=');
        rebuilt.push_str(&urlencoding::encode(&value));
        rebuilt.push('&');
    }
    rebuilt.push_str("$skip=");
    rebuilt.push_str(&next_skip.to_string());

    let mut next = request_uri.clone();
    next.set_query(Some(&rebuilt));
    next.set_fragment(None);
    Ok(next)
}

/// [`next_page_link`] over the query options of `request_uri` itself.
///
/// # Errors
/// Returns `Error::InvalidPageSize` if `page_size` is not positive.
pub fn next_page_link_for(request_uri: &Url, page_size: i64) -> Result<Url, Error> {
    next_page_link(request_uri, request_uri.query_pairs(), page_size)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn uri(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_top_and_skip_are_rewritten() {
        let next = next_page_link(
            &uri("http://localhost/odata/Customers?$top=25&$skip=10"),
            [("$top", "25"), ("$skip", "10")],
            10,
        )
        .unwrap();
        assert_eq!(next.as_str(), "http://localhost/odata/Customers?$top=15&$skip=20");
        assert!(!next.query().unwrap().contains("$skip=10"));
    }

    #[test]
    fn test_filter_value_is_escaped_and_dollar_kept() {
        let next = next_page_link(
            &uri("http://localhost/odata/Customers"),
            [("$filter", "Name eq 'a=b'")],
            5,
        )
        .unwrap();
        assert_eq!(
            next.query(),
            Some("$filter=Name%20eq%20%27a%3Db%27&$skip=5")
        );
    }

    #[test]
    fn test_custom_keys_are_escaped() {
        let next = next_page_link(
            &uri("http://localhost/odata/Customers"),
            [("my key", "v"), ("$a b", "1")],
            5,
        )
        .unwrap();
        assert_eq!(next.query(), Some("my%20key=v&$a%20b=1&$skip=5"));
    }

    #[test]
    fn test_non_numeric_values_are_tolerated() {
        let next = next_page_link(
            &uri("http://localhost/odata/Customers"),
            [("$top", "all"), ("$skip", "some"), ("$orderby", "Name")],
            10,
        )
        .unwrap();
        assert_eq!(next.query(), Some("$top=all&$orderby=Name&$skip=10"));
    }

    #[test]
    fn test_repeated_application_advances_by_page_size() {
        let first =
            next_page_link_for(&uri("http://localhost/odata/Customers?$top=100"), 10).unwrap();
        assert_eq!(first.query(), Some("$top=90&$skip=10"));
        let second = next_page_link_for(&first, 10).unwrap();
        assert_eq!(second.query(), Some("$top=80&$skip=20"));
        let third = next_page_link_for(&second, 10).unwrap();
        assert_eq!(third.query(), Some("$top=70&$skip=30"));
    }

    #[test]
    fn test_keeps_scheme_host_and_path() {
        let next = next_page_link_for(
            &uri("https://api.example.com:8443/odata/Orders?$skip=3#frag"),
            4,
        )
        .unwrap();
        assert_eq!(next.as_str(), "https://api.example.com:8443/odata/Orders?$skip=7");
    }

    #[test]
    fn test_zero_page_size_is_rejected() {
        let err = next_page_link(&uri("http://localhost/"), [("$top", "5")], 0).unwrap_err();
        assert_eq!(err, Error::InvalidPageSize);
    }
}
