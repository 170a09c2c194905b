use bytes::Bytes;
use http::{Method, Request, Response};
use std::sync::{Arc, Mutex};

use crate::{
    common::{
        data::{default_response, AssertionError, RequestConstraint, UrlPattern},
        util::lock,
    },
    engine::{
        matchers::{match_headers, match_query_params, url_matches},
        url::normalize_url,
    },
};

/// The canned response of an expectation. It is shared with the
/// [`Responder`](crate::Responder) that was handed out when the expectation was declared.
pub(crate) type ResponseSlot = Arc<Mutex<Option<Response<Bytes>>>>;

/// A declared request expectation together with its canned response. Standing stubs use the
/// same record with `assertive` set to `false`.
#[derive(Debug, Clone)]
pub(crate) struct Expectation {
    pub method: Method,
    pub url: UrlPattern,
    pub constraint: Option<RequestConstraint>,
    pub assertive: bool,
    pub response: ResponseSlot,
}

impl Expectation {
    pub fn new(
        method: Method,
        url: UrlPattern,
        constraint: Option<RequestConstraint>,
        assertive: bool,
    ) -> Self {
        Self {
            method,
            url,
            constraint,
            assertive,
            response: Arc::new(Mutex::new(None)),
        }
    }

    /// Cheap pre-selection used by the dispatch step: method and URL only.
    pub fn applies_to(&self, method: &Method, normalized_url: &str) -> bool {
        &self.method == method && url_matches(&self.url, normalized_url)
    }

    /// Runs all assertions of this expectation against `req`. Non-assertive records accept
    /// every request.
    pub fn check(&self, req: &Request<Bytes>, base_url: &str) -> Result<(), AssertionError> {
        if !self.assertive {
            return Ok(());
        }

        if req.method() != &self.method {
            return Err(AssertionError::MethodMismatch {
                expected: self.method.to_string(),
                actual: req.method().to_string(),
            });
        }

        let request_url = req.uri().to_string();
        let normalized_url = normalize_url(&request_url, base_url);
        if !url_matches(&self.url, &normalized_url) {
            return Err(AssertionError::UrlMismatch {
                pattern: self.url.to_string(),
                regex: self.url.is_regex(),
                actual: normalized_url,
            });
        }

        match &self.constraint {
            Some(RequestConstraint::Predicate(test)) => {
                if !test(req) {
                    return Err(AssertionError::PredicateFailed);
                }
            }
            Some(RequestConstraint::Reference(reference)) => {
                match_headers(&reference.headers, req.headers())?;
                match_query_params(&reference.url, &request_url)?;
            }
            None => {}
        }

        Ok(())
    }

    pub fn set_response(&self, response: Response<Bytes>) {
        *lock(&self.response) = Some(response);
    }

    /// The attached response, or the default `{}` response when nothing was attached.
    pub fn response(&self) -> Response<Bytes> {
        match lock(&self.response).as_ref() {
            Some(response) => response.clone(),
            None => default_response(),
        }
    }
}
