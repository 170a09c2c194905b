use http::{HeaderMap, HeaderValue};

use crate::common::data::{AssertionError, UrlPattern};

/// Regular expressions only need to match somewhere in the URL, literals must be equal.
pub(crate) fn url_matches(pattern: &UrlPattern, url: &str) -> bool {
    match pattern {
        UrlPattern::Exact(expected) => expected == url,
        UrlPattern::Regex(regex) => regex.is_match(url),
    }
}

/// Every header of `expected` must be present in `actual` with the same value. Headers that
/// only exist in `actual` are ignored.
pub(crate) fn match_headers(expected: &HeaderMap, actual: &HeaderMap) -> Result<(), AssertionError> {
    for name in expected.keys() {
        let expected_value = joined_header_value(expected, name.as_str());
        let actual_value = match actual.contains_key(name) {
            true => Some(joined_header_value(actual, name.as_str())),
            false => None,
        };

        if actual_value.as_deref() != Some(expected_value.as_str()) {
            return Err(AssertionError::HeaderMismatch {
                name: name.to_string(),
                expected: expected_value,
                actual: actual_value,
            });
        }
    }

    Ok(())
}

fn joined_header_value(headers: &HeaderMap, name: &str) -> String {
    headers
        .get_all(name)
        .iter()
        .map(header_value_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn header_value_str(value: &HeaderValue) -> String {
    String::from_utf8_lossy(value.as_bytes()).into_owned()
}

/// Parses the query string of a URL (everything after the first `?`) into ordered pairs.
pub(crate) fn query_params(url: &str) -> Vec<(String, String)> {
    match url.split_once('?') {
        Some((_, query)) => form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect(),
        None => Vec::new(),
    }
}

/// Every query parameter of `expected_url` must be present in `actual_url` with the same
/// value. For repeated parameters the first occurrence in `actual_url` is compared.
pub(crate) fn match_query_params(expected_url: &str, actual_url: &str) -> Result<(), AssertionError> {
    let expected = query_params(expected_url);
    if expected.is_empty() {
        return Ok(());
    }

    let actual = query_params(actual_url);
    for (name, expected_value) in expected {
        let actual_value = actual
            .iter()
            .find(|(k, _)| k == &name)
            .map(|(_, v)| v.to_owned());

        if actual_value.as_deref() != Some(expected_value.as_str()) {
            return Err(AssertionError::QueryParamMismatch {
                name,
                expected: expected_value,
                actual: actual_value,
            });
        }
    }

    Ok(())
}
