use bytes::Bytes;
use http::{Request, Response};
use std::sync::Mutex;

use crate::{
    client::WeakRestClient,
    common::{
        data::{default_response, AssertionError},
        util::lock,
    },
};

pub(crate) mod expectation;
pub(crate) mod matchers;
pub(crate) mod state;
pub(crate) mod transport;
pub(crate) mod url;

use expectation::Expectation;
use state::HarnessState;
use url::normalize_url;

/// Decides which declaration answers a request.
///
/// The dispatch step stores its decision in the request extensions, the substitute transport
/// copies it into the response extensions. Each request therefore carries its own selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The head of the expectation queue answers the request.
    Expectation,
    /// The standing stub with this registration id answers the request.
    Stub(usize),
    /// Nothing answers the request; the default response is served.
    Unmatched,
}

pub(crate) struct Engine {
    state: Mutex<HarnessState>,
    client: WeakRestClient,
    log: bool,
}

impl Engine {
    pub fn new(client: WeakRestClient, log: bool) -> Self {
        Self {
            state: Mutex::new(HarnessState::new()),
            client,
            log,
        }
    }

    fn base_url(&self) -> String {
        self.client
            .upgrade()
            .map(|client| client.base_url())
            .unwrap_or_default()
    }

    pub fn log_event(&self, message: &str) {
        if self.log {
            tracing::info!("{}", message);
        } else {
            tracing::trace!("{}", message);
        }
    }

    /// Decrements the pending counter on the way out: a failed request counts as resolved.
    fn fail(&self, err: AssertionError) -> AssertionError {
        lock(&self.state).resolve_request();
        tracing::debug!("Request assertion failed: {}", err);
        err
    }

    pub fn add_expectation(&self, expectation: Expectation) {
        self.log_event(&format!(
            "Preparing expectation on {} {}",
            expectation.method, expectation.url
        ));
        lock(&self.state).expectations.push_back(expectation);
    }

    pub fn add_stub(&self, stub: Expectation) -> usize {
        self.log_event(&format!("Preparing expectation on {} {}", stub.method, stub.url));
        lock(&self.state).add_stub(stub)
    }

    /// Counts the request as pending and selects what answers it. Pending expectations take
    /// precedence over stubs without looking at the request at all.
    pub fn dispatch(&self, req: &Request<Bytes>) -> Dispatch {
        let base_url = self.base_url();
        let mut state = lock(&self.state);
        state.pending_requests += 1;

        if !state.expectations.is_empty() {
            return Dispatch::Expectation;
        }

        let normalized_url = normalize_url(&req.uri().to_string(), &base_url);
        state
            .stubs
            .iter()
            .find(|(_, stub)| stub.applies_to(req.method(), &normalized_url))
            .map_or(Dispatch::Unmatched, |(id, _)| Dispatch::Stub(*id))
    }

    /// Produces the response for a dispatched request and runs the assertions of the selected
    /// declaration. The state lock is released while user provided predicates run.
    pub fn substitute(
        &self,
        req: &Request<Bytes>,
        dispatch: Dispatch,
    ) -> Result<Response<Bytes>, AssertionError> {
        let selected = match dispatch {
            Dispatch::Unmatched => return Ok(default_response()),
            Dispatch::Expectation => {
                let head = lock(&self.state).expectations.pop_front();
                match head {
                    Some(expectation) => expectation,
                    None => {
                        return Err(self.fail(AssertionError::UnexpectedRequest {
                            method: req.method().to_string(),
                            url: req.uri().to_string(),
                        }))
                    }
                }
            }
            Dispatch::Stub(id) => {
                let stub = lock(&self.state).stubs.get(&id).cloned();
                match stub {
                    Some(stub) => stub,
                    // Removed by a concurrent request: served like an unmatched request,
                    // so it stays pending and shows up in verify_no_outstanding_request.
                    None => return Ok(default_response()),
                }
            }
        };

        if let Err(err) = selected.check(req, &self.base_url()) {
            return Err(self.fail(err));
        }

        lock(&self.state).resolve_request();
        Ok(selected.response())
    }

    /// Forgets a standing stub once a response it produced went through the response chain.
    pub fn release(&self, dispatch: Dispatch) {
        if let Dispatch::Stub(id) = dispatch {
            if lock(&self.state).stubs.remove(&id).is_some() {
                tracing::debug!("Removed consumed stub with id={}", id);
            }
        }
    }

    pub fn reset_expectations(&self) {
        lock(&self.state).expectations.clear();
    }

    pub fn clear(&self) {
        let mut state = lock(&self.state);
        state.expectations.clear();
        state.stubs.clear();
        state.pending_requests = 0;
    }

    pub fn verify_no_outstanding_expectation(&self) -> Result<(), AssertionError> {
        match lock(&self.state).expectations.len() {
            0 => Ok(()),
            n => Err(AssertionError::OutstandingExpectations(n)),
        }
    }

    pub fn verify_no_outstanding_request(&self) -> Result<(), AssertionError> {
        match lock(&self.state).pending_requests {
            0 => Ok(()),
            n => Err(AssertionError::OutstandingRequests(n)),
        }
    }

    pub fn pending_requests(&self) -> usize {
        lock(&self.state).pending_requests
    }

    pub fn pending_expectations(&self) -> usize {
        lock(&self.state).expectations.len()
    }

    pub fn stub_count(&self) -> usize {
        lock(&self.state).stubs.len()
    }
}
