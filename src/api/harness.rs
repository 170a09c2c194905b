use http::Method;
use serde::{Deserialize, Serialize};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::{
    api::spec::Responder,
    client::{
        request_interceptor, response_interceptor, RequestInterceptor, ResponseInterceptor,
        RestClient, Transport,
    },
    common::{
        data::{AssertionError, RequestConstraint, UrlPattern},
        util::read_env,
    },
    engine::{expectation::Expectation, transport::SubstituteTransport, Dispatch, Engine},
};

/// Options of a [`RestMock`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestMockOptions {
    /// Emit every declaration and every substituted request at `info` level instead of `trace`.
    #[serde(default)]
    pub log: bool,
}

impl RestMockOptions {
    /// Reads the options from the environment. `RESTMOCK_LOG=true` (or `1`) enables logging.
    pub fn from_env() -> Self {
        let log = read_env("RESTMOCK_LOG", "false");
        Self {
            log: matches!(log.trim().to_ascii_lowercase().as_str(), "true" | "1"),
        }
    }
}

/// A request mocking harness attached to a [`RestClient`].
///
/// Creating a `RestMock` installs a request interceptor, a response interceptor and a
/// substitute transport into the client. From then on, no request sent through the client
/// reaches the network. Instead, each request is answered by
///
/// * the oldest pending **expectation** (declared with [`RestMock::expect`]) if there is any.
///   Expectations are consumed exactly once and assert that the request has the declared
///   method, URL and constraint,
/// * otherwise the first matching **stub** (declared with [`RestMock::when`]). Stubs never
///   assert and are removed once they produced a response,
/// * otherwise a default response: `{}` with status 200.
///
/// URLs are compared after removing the client's base URL, the query string and a trailing
/// slash.
///
/// # Example
/// ```
/// use restmock::prelude::*;
/// use serde_json::json;
///
/// let client = RestClient::new("http://localhost/api");
/// let mock = RestMock::new(&client);
///
/// mock.expect("GET", "foo").respond(json!({"foo": "bar", "id": 1}));
///
/// let response = client.get("foo").send_blocking().unwrap();
///
/// assert_eq!(response.body().as_ref(), br#"{"foo":"bar","id":1}"#);
/// mock.verify_no_outstanding_expectation().unwrap();
/// mock.verify_no_outstanding_request().unwrap();
/// ```
///
/// Dropping the harness detaches it from the client, see [`RestMock::destroy`].
pub struct RestMock {
    client: RestClient,
    engine: Arc<Engine>,
    request_interceptor: RequestInterceptor,
    response_interceptor: ResponseInterceptor,
    transport: Arc<dyn Transport + Send + Sync>,
    request_interceptor_index: usize,
    response_interceptor_index: usize,
    destroyed: AtomicBool,
}

impl RestMock {
    pub fn new(client: &RestClient) -> Self {
        Self::with_options(client, RestMockOptions::default())
    }

    pub fn with_options(client: &RestClient, options: RestMockOptions) -> Self {
        let engine = Arc::new(Engine::new(client.downgrade(), options.log));

        let router = engine.clone();
        let request_interceptor = request_interceptor(move |req| {
            let dispatch = router.dispatch(req);
            req.extensions_mut().insert(dispatch);
            Ok(())
        });

        let cleaner = engine.clone();
        let response_interceptor = response_interceptor(move |res| {
            if let Some(dispatch) = res.extensions().get::<Dispatch>() {
                cleaner.release(*dispatch);
            }
            Ok(())
        });

        let request_interceptor_index = client.add_request_interceptor(request_interceptor.clone());
        let transport: Arc<dyn Transport + Send + Sync> =
            Arc::new(SubstituteTransport::new(engine.clone()));
        client.set_transport(Some(transport.clone()));
        let response_interceptor_index =
            client.add_response_interceptor(response_interceptor.clone());

        tracing::debug!(
            "Attached mock harness at request interceptor {} and response interceptor {}",
            request_interceptor_index,
            response_interceptor_index
        );

        Self {
            client: client.clone(),
            engine,
            request_interceptor,
            response_interceptor,
            transport,
            request_interceptor_index,
            response_interceptor_index,
            destroyed: AtomicBool::new(false),
        }
    }

    fn declare(
        &self,
        method: &str,
        url: UrlPattern,
        constraint: Option<RequestConstraint>,
        assertive: bool,
    ) -> Expectation {
        let method = Method::from_bytes(method.to_uppercase().as_bytes())
            .expect("cannot parse HTTP method");
        Expectation::new(method, url, constraint, assertive)
    }

    /// Declares a one-shot expectation. The method is case-insensitive.
    ///
    /// # Panics
    /// Panics if `method` is not a valid HTTP method token.
    pub fn expect<M: AsRef<str>, IntoUrlPattern: Into<UrlPattern>>(
        &self,
        method: M,
        url: IntoUrlPattern,
    ) -> Responder {
        self.push_expectation(method.as_ref(), url.into(), None)
    }

    /// Declares a one-shot expectation that additionally checks `constraint`: either a
    /// predicate or a reference request whose headers and query parameters must be present.
    pub fn expect_with<M, IntoUrlPattern, IntoConstraint>(
        &self,
        method: M,
        url: IntoUrlPattern,
        constraint: IntoConstraint,
    ) -> Responder
    where
        M: AsRef<str>,
        IntoUrlPattern: Into<UrlPattern>,
        IntoConstraint: Into<RequestConstraint>,
    {
        self.push_expectation(method.as_ref(), url.into(), Some(constraint.into()))
    }

    fn push_expectation(
        &self,
        method: &str,
        url: UrlPattern,
        constraint: Option<RequestConstraint>,
    ) -> Responder {
        let expectation = self.declare(method, url, constraint, true);
        self.engine.add_expectation(expectation.clone());
        Responder::new(expectation)
    }

    pub fn expect_get<IntoUrlPattern: Into<UrlPattern>>(&self, url: IntoUrlPattern) -> Responder {
        self.expect("GET", url)
    }

    pub fn expect_post<IntoUrlPattern: Into<UrlPattern>>(&self, url: IntoUrlPattern) -> Responder {
        self.expect("POST", url)
    }

    pub fn expect_put<IntoUrlPattern: Into<UrlPattern>>(&self, url: IntoUrlPattern) -> Responder {
        self.expect("PUT", url)
    }

    pub fn expect_head<IntoUrlPattern: Into<UrlPattern>>(&self, url: IntoUrlPattern) -> Responder {
        self.expect("HEAD", url)
    }

    pub fn expect_patch<IntoUrlPattern: Into<UrlPattern>>(&self, url: IntoUrlPattern) -> Responder {
        self.expect("PATCH", url)
    }

    pub fn expect_delete<IntoUrlPattern: Into<UrlPattern>>(
        &self,
        url: IntoUrlPattern,
    ) -> Responder {
        self.expect("DELETE", url)
    }

    /// Declares a standing stub. Stubs answer matching requests while no expectation is
    /// pending, never fail, and are removed after they served a response.
    pub fn when<M: AsRef<str>, IntoUrlPattern: Into<UrlPattern>>(
        &self,
        method: M,
        url: IntoUrlPattern,
    ) -> Responder {
        self.push_stub(method.as_ref(), url.into(), None)
    }

    /// Like [`RestMock::when`]. The constraint is recorded but never enforced.
    pub fn when_with<M, IntoUrlPattern, IntoConstraint>(
        &self,
        method: M,
        url: IntoUrlPattern,
        constraint: IntoConstraint,
    ) -> Responder
    where
        M: AsRef<str>,
        IntoUrlPattern: Into<UrlPattern>,
        IntoConstraint: Into<RequestConstraint>,
    {
        self.push_stub(method.as_ref(), url.into(), Some(constraint.into()))
    }

    fn push_stub(
        &self,
        method: &str,
        url: UrlPattern,
        constraint: Option<RequestConstraint>,
    ) -> Responder {
        let stub = self.declare(method, url, constraint, false);
        self.engine.add_stub(stub.clone());
        Responder::new(stub)
    }

    pub fn when_get<IntoUrlPattern: Into<UrlPattern>>(&self, url: IntoUrlPattern) -> Responder {
        self.when("GET", url)
    }

    pub fn when_post<IntoUrlPattern: Into<UrlPattern>>(&self, url: IntoUrlPattern) -> Responder {
        self.when("POST", url)
    }

    pub fn when_put<IntoUrlPattern: Into<UrlPattern>>(&self, url: IntoUrlPattern) -> Responder {
        self.when("PUT", url)
    }

    pub fn when_head<IntoUrlPattern: Into<UrlPattern>>(&self, url: IntoUrlPattern) -> Responder {
        self.when("HEAD", url)
    }

    pub fn when_patch<IntoUrlPattern: Into<UrlPattern>>(&self, url: IntoUrlPattern) -> Responder {
        self.when("PATCH", url)
    }

    pub fn when_delete<IntoUrlPattern: Into<UrlPattern>>(&self, url: IntoUrlPattern) -> Responder {
        self.when("DELETE", url)
    }

    /// Drops all pending expectations. Stubs are kept.
    pub fn reset_expectations(&self) {
        self.engine.reset_expectations();
    }

    /// Fails with `There is <n> pending expectation` if declared expectations were not consumed.
    pub fn verify_no_outstanding_expectation(&self) -> Result<(), AssertionError> {
        self.engine.verify_no_outstanding_expectation()
    }

    /// Fails with `There is <n> pending request` if requests went through the client without
    /// being answered by an expectation or a stub.
    pub fn verify_no_outstanding_request(&self) -> Result<(), AssertionError> {
        self.engine.verify_no_outstanding_request()
    }

    pub fn pending_requests(&self) -> usize {
        self.engine.pending_requests()
    }

    pub fn pending_expectations(&self) -> usize {
        self.engine.pending_expectations()
    }

    pub fn stub_count(&self) -> usize {
        self.engine.stub_count()
    }

    /// Detaches the harness from the client: all expectations and stubs are dropped, the
    /// pending counter is reset and the two interceptors this harness installed are removed.
    /// The transport slot is only cleared while it still holds this harness's transport.
    /// Calling it more than once has no further effect.
    pub fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }

        self.engine.clear();
        self.client.remove_transport(&self.transport);
        self.client
            .remove_request_interceptor(&self.request_interceptor);
        self.client
            .remove_response_interceptor(&self.response_interceptor);

        tracing::debug!(
            "Detached mock harness from request interceptor {} and response interceptor {}",
            self.request_interceptor_index,
            self.response_interceptor_index
        );
    }
}

impl Drop for RestMock {
    fn drop(&mut self) {
        self.destroy();
    }
}
