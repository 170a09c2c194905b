use bytes::Bytes;
use http::{
    header::{HeaderName, CONTENT_TYPE},
    HeaderMap, HeaderValue, Request, Response, StatusCode,
};
use regex::Regex;
use serde_json::Value;
use std::{borrow::Cow, fmt, sync::Arc};
use thiserror::Error;

/// The assertion failures raised by expectations and by the verification methods of
/// [`RestMock`](crate::RestMock).
///
/// The `Display` output of each variant is the human readable message that is reported to the
/// caller, so tests can compare against it directly.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssertionError {
    #[error("Method should be \"{expected}\", got \"{actual}\"")]
    MethodMismatch { expected: String, actual: String },
    #[error("URL should {} \"{}\", got \"{}\"", url_verb(.regex), .pattern, .actual)]
    UrlMismatch {
        pattern: String,
        regex: bool,
        actual: String,
    },
    #[error("The request test failed")]
    PredicateFailed,
    #[error("Header \"{}\" does not match on Request, found \"{}\" but \"{}\" was expected", .name, or_null(.actual), .expected)]
    HeaderMismatch {
        name: String,
        expected: String,
        actual: Option<String>,
    },
    #[error("Query param \"{}\" does not match on Request, found \"{}\" but \"{}\" was expected", .name, or_null(.actual), .expected)]
    QueryParamMismatch {
        name: String,
        expected: String,
        actual: Option<String>,
    },
    #[error("Request {method} {url} not expected")]
    UnexpectedRequest { method: String, url: String },
    #[error("There is {0} pending expectation")]
    OutstandingExpectations(usize),
    #[error("There is {0} pending request")]
    OutstandingRequests(usize),
}

fn url_verb(regex: &bool) -> &'static str {
    if *regex {
        "match"
    } else {
        "be"
    }
}

fn or_null(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("null")
}

// ************************************************************************************************
// UrlPattern
// ************************************************************************************************
/// The URL part of an expectation. A literal pattern must be exactly equal to the normalized
/// request URL, a regular expression only has to match somewhere in it.
#[derive(Debug, Clone)]
pub enum UrlPattern {
    Exact(String),
    Regex(Regex),
}

impl UrlPattern {
    pub fn is_regex(&self) -> bool {
        matches!(self, UrlPattern::Regex(_))
    }
}

impl fmt::Display for UrlPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlPattern::Exact(url) => f.write_str(url),
            UrlPattern::Regex(regex) => write!(f, "/{}/", regex.as_str()),
        }
    }
}

impl From<&str> for UrlPattern {
    fn from(value: &str) -> Self {
        UrlPattern::Exact(value.to_string())
    }
}

impl From<String> for UrlPattern {
    fn from(value: String) -> Self {
        UrlPattern::Exact(value)
    }
}

impl From<Regex> for UrlPattern {
    fn from(value: Regex) -> Self {
        UrlPattern::Regex(value)
    }
}

impl From<&Regex> for UrlPattern {
    fn from(value: &Regex) -> Self {
        UrlPattern::Regex(value.clone())
    }
}

// ************************************************************************************************
// RequestConstraint
// ************************************************************************************************
pub type RequestPredicate = Arc<dyn Fn(&Request<Bytes>) -> bool + Send + Sync>;

/// A request whose headers and query parameters an incoming request has to contain.
#[derive(Debug, Clone, Default)]
pub struct ReferenceRequest {
    pub(crate) url: String,
    pub(crate) headers: HeaderMap,
}

impl ReferenceRequest {
    pub fn new<IntoString: Into<String>>(url: IntoString) -> Self {
        Self {
            url: url.into(),
            headers: HeaderMap::new(),
        }
    }

    /// Adds a header the incoming request must carry with exactly this value.
    ///
    /// # Panics
    /// Panics if the name or the value is not a valid HTTP header name or value.
    pub fn header<K, V>(mut self, name: K, value: V) -> Self
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: fmt::Debug,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: fmt::Debug,
    {
        let name = HeaderName::try_from(name).expect("cannot parse header name");
        let value = HeaderValue::try_from(value).expect("cannot parse header value");
        self.headers.append(name, value);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

impl<B> From<Request<B>> for ReferenceRequest {
    fn from(value: Request<B>) -> Self {
        let (parts, _) = value.into_parts();
        Self {
            url: parts.uri.to_string(),
            headers: parts.headers,
        }
    }
}

/// An optional extra check an expectation performs after method and URL matched.
#[derive(Clone)]
pub enum RequestConstraint {
    /// A custom test function. The expectation fails if it returns `false`.
    Predicate(RequestPredicate),
    /// Headers and query parameters the request must contain.
    Reference(ReferenceRequest),
}

impl RequestConstraint {
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Request<Bytes>) -> bool + Send + Sync + 'static,
    {
        RequestConstraint::Predicate(Arc::new(f))
    }
}

impl fmt::Debug for RequestConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestConstraint::Predicate(_) => f.write_str("Predicate(<function>)"),
            RequestConstraint::Reference(reference) => {
                f.debug_tuple("Reference").field(reference).finish()
            }
        }
    }
}

impl From<ReferenceRequest> for RequestConstraint {
    fn from(value: ReferenceRequest) -> Self {
        RequestConstraint::Reference(value)
    }
}

impl<B> From<Request<B>> for RequestConstraint {
    fn from(value: Request<B>) -> Self {
        RequestConstraint::Reference(value.into())
    }
}

// ************************************************************************************************
// Reply
// ************************************************************************************************
/// The payload that can be attached to an expectation with
/// [`Responder::respond`](crate::Responder::respond).
#[derive(Debug)]
pub enum Reply {
    /// A bare status code. The response carries the standard reason phrase and `{}` as body.
    Status(u16),
    /// A fully built response that is returned as is.
    Response(Response<Bytes>),
    /// A value that is serialized to JSON and returned with status 200.
    Json(Value),
}

impl Reply {
    /// # Panics
    /// Panics if a [`Reply::Status`] does not hold a valid HTTP status code.
    pub(crate) fn into_response(self) -> Response<Bytes> {
        match self {
            Reply::Status(code) => {
                let status = StatusCode::from_u16(code).expect("cannot parse HTTP status code");
                json_response(status, Bytes::from_static(b"{}"))
            }
            Reply::Response(response) => response,
            Reply::Json(value) => json_response(StatusCode::OK, Bytes::from(value.to_string())),
        }
    }
}

impl From<u16> for Reply {
    fn from(value: u16) -> Self {
        Reply::Status(value)
    }
}

/// Integer literals default to `i32`, so `respond(500)` lands here.
///
/// # Panics
/// Panics if the value does not fit into a `u16`.
impl From<i32> for Reply {
    fn from(value: i32) -> Self {
        Reply::Status(u16::try_from(value).expect("cannot parse status code to u16"))
    }
}

impl From<StatusCode> for Reply {
    fn from(value: StatusCode) -> Self {
        Reply::Status(value.as_u16())
    }
}

impl From<Response<Bytes>> for Reply {
    fn from(value: Response<Bytes>) -> Self {
        Reply::Response(value)
    }
}

impl From<Value> for Reply {
    fn from(value: Value) -> Self {
        Reply::Json(value)
    }
}

// ************************************************************************************************
// Responses
// ************************************************************************************************
/// The reason phrase of a substituted response, stored in the response extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusText(pub Cow<'static, str>);

/// Returns the reason phrase of a response: the [`StatusText`] extension when present,
/// the canonical reason of its status code otherwise.
pub fn status_text<B>(response: &Response<B>) -> Option<&str> {
    match response.extensions().get::<StatusText>() {
        Some(text) => Some(text.0.as_ref()),
        None => response.status().canonical_reason(),
    }
}

pub(crate) fn json_response(status: StatusCode, body: Bytes) -> Response<Bytes> {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    let text = status.canonical_reason().unwrap_or_default();
    response
        .extensions_mut()
        .insert(StatusText(Cow::Borrowed(text)));
    response
}

/// The response served whenever no canned response applies: `{}` with status 200 "OK".
pub fn default_response() -> Response<Bytes> {
    json_response(StatusCode::OK, Bytes::from_static(b"{}"))
}
