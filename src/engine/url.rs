use http::Uri;
use std::borrow::Cow;

/// Turns a request URL into the key expectations are compared against: the base URL prefix,
/// the query string and a single trailing slash are removed.
///
/// When the base URL does not end with a slash, the slash that separates it from the rest of
/// the URL is removed together with it, so that `http://localhost/api` and `foo` compare as
/// `foo` for a request to `http://localhost/api/foo`.
///
/// The base URL is rendered through [`Uri`] first, the same way request URLs are, so that
/// spellings like `HTTP://localhost` still match.
pub(crate) fn normalize_url(url: &str, base_url: &str) -> String {
    let mut url = url;
    let canonical = canonical_base_url(base_url);
    let base_url = canonical.as_ref();

    if !base_url.is_empty() {
        if let Some(rest) = url.strip_prefix(base_url) {
            url = match base_url.ends_with('/') {
                true => rest,
                false => rest.strip_prefix('/').unwrap_or(rest),
            };
        }
    }

    if let Some(idx) = url.find('?') {
        url = &url[..idx];
    }

    url.strip_suffix('/').unwrap_or(url).to_string()
}

fn canonical_base_url(base_url: &str) -> Cow<'_, str> {
    match base_url.parse::<Uri>() {
        Ok(uri) => Cow::Owned(uri.to_string()),
        Err(_) => Cow::Borrowed(base_url),
    }
}
