//! A minimal interceptor-based REST client.
//!
//! [`RestClient`] only provides the surface a mocking harness needs to hook into: a base URL,
//! an ordered chain of request interceptors, an ordered chain of response interceptors and a
//! replaceable [`Transport`]. It does not ship a network transport of its own.
use async_trait::async_trait;
use bytes::Bytes;
use http::{
    header::{HeaderName, CONTENT_TYPE},
    HeaderValue, Method, Request, Response, Uri,
};
use serde::Serialize;
use std::{
    fmt,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak},
};
use thiserror::Error;

use crate::common::{data::AssertionError, util::Join};

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Assertion(#[from] AssertionError),
    #[error("no transport configured")]
    NoTransport,
    #[error("invalid base URL \"{0}\": expected an absolute URL with scheme and host, or an absolute path")]
    InvalidBaseUrl(String),
    #[error("interceptor error: {0}")]
    Interceptor(String),
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] http::Error),
    #[error("cannot serialize JSON body: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the assertion failure if this error was raised by an expectation.
    pub fn as_assertion(&self) -> Option<&AssertionError> {
        match self {
            Error::Assertion(err) => Some(err),
            _ => None,
        }
    }
}

pub type RequestInterceptor = Arc<dyn Fn(&mut Request<Bytes>) -> Result<(), Error> + Send + Sync>;
pub type ResponseInterceptor = Arc<dyn Fn(&Response<Bytes>) -> Result<(), Error> + Send + Sync>;

/// Wraps a closure into a [`RequestInterceptor`].
pub fn request_interceptor<F>(f: F) -> RequestInterceptor
where
    F: Fn(&mut Request<Bytes>) -> Result<(), Error> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wraps a closure into a [`ResponseInterceptor`].
pub fn response_interceptor<F>(f: F) -> ResponseInterceptor
where
    F: Fn(&Response<Bytes>) -> Result<(), Error> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Performs the actual exchange for a request that passed all request interceptors.
#[async_trait]
pub trait Transport {
    async fn fetch(&self, req: Request<Bytes>) -> Result<Response<Bytes>, Error>;
}

struct ClientConfig {
    base_url: String,
    request_interceptors: Vec<RequestInterceptor>,
    response_interceptors: Vec<ResponseInterceptor>,
    transport: Option<Arc<dyn Transport + Send + Sync>>,
}

/// A cheaply cloneable handle to a REST client configuration. All clones share the same
/// interceptor chains and transport.
#[derive(Clone)]
pub struct RestClient {
    config: Arc<RwLock<ClientConfig>>,
}

/// A non-owning handle to a [`RestClient`], used by components that live inside the
/// client's own interceptor chains.
#[derive(Clone)]
pub struct WeakRestClient {
    config: Weak<RwLock<ClientConfig>>,
}

impl WeakRestClient {
    pub fn upgrade(&self) -> Option<RestClient> {
        self.config.upgrade().map(|config| RestClient { config })
    }
}

impl RestClient {
    /// Creates a client. An empty base URL leaves request paths untouched.
    ///
    /// # Panics
    /// Panics if the base URL is not usable, see [`RestClient::try_new`].
    pub fn new<IntoString: Into<String>>(base_url: IntoString) -> Self {
        Self::try_new(base_url).expect("cannot create REST client")
    }

    /// Creates a client. The base URL must be empty, an absolute URL with scheme and host
    /// (`http://localhost/api`) or an absolute path (`/api`).
    pub fn try_new<IntoString: Into<String>>(base_url: IntoString) -> Result<Self, Error> {
        let base_url = base_url.into();
        validate_base_url(&base_url)?;

        Ok(Self {
            config: Arc::new(RwLock::new(ClientConfig {
                base_url,
                request_interceptors: Vec::new(),
                response_interceptors: Vec::new(),
                transport: None,
            })),
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, ClientConfig> {
        self.config.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ClientConfig> {
        self.config.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn downgrade(&self) -> WeakRestClient {
        WeakRestClient {
            config: Arc::downgrade(&self.config),
        }
    }

    pub fn base_url(&self) -> String {
        self.read().base_url.clone()
    }

    /// # Panics
    /// Panics if the base URL is not usable, see [`RestClient::try_set_base_url`].
    pub fn set_base_url<IntoString: Into<String>>(&self, base_url: IntoString) {
        self.try_set_base_url(base_url).expect("cannot set base URL");
    }

    pub fn try_set_base_url<IntoString: Into<String>>(
        &self,
        base_url: IntoString,
    ) -> Result<(), Error> {
        let base_url = base_url.into();
        validate_base_url(&base_url)?;
        self.write().base_url = base_url;
        Ok(())
    }

    /// Appends an interceptor to the request chain and returns its 1-based position.
    pub fn add_request_interceptor(&self, interceptor: RequestInterceptor) -> usize {
        let mut config = self.write();
        config.request_interceptors.push(interceptor);
        config.request_interceptors.len()
    }

    /// Appends an interceptor to the response chain and returns its 1-based position.
    pub fn add_response_interceptor(&self, interceptor: ResponseInterceptor) -> usize {
        let mut config = self.write();
        config.response_interceptors.push(interceptor);
        config.response_interceptors.len()
    }

    /// Removes this exact interceptor (compared by identity). Returns `true` if it was found.
    pub fn remove_request_interceptor(&self, interceptor: &RequestInterceptor) -> bool {
        let mut config = self.write();
        let before = config.request_interceptors.len();
        config
            .request_interceptors
            .retain(|i| !same_fn(i.as_ref(), interceptor.as_ref()));
        before != config.request_interceptors.len()
    }

    /// Removes this exact interceptor (compared by identity). Returns `true` if it was found.
    pub fn remove_response_interceptor(&self, interceptor: &ResponseInterceptor) -> bool {
        let mut config = self.write();
        let before = config.response_interceptors.len();
        config
            .response_interceptors
            .retain(|i| !same_fn(i.as_ref(), interceptor.as_ref()));
        before != config.response_interceptors.len()
    }

    pub fn request_interceptor_count(&self) -> usize {
        self.read().request_interceptors.len()
    }

    pub fn response_interceptor_count(&self) -> usize {
        self.read().response_interceptors.len()
    }

    pub fn set_transport(&self, transport: Option<Arc<dyn Transport + Send + Sync>>) {
        self.write().transport = transport;
    }

    /// Clears the transport slot if it still holds this exact transport (compared by
    /// identity). Returns `true` if it was removed.
    pub fn remove_transport(&self, transport: &Arc<dyn Transport + Send + Sync>) -> bool {
        let mut config = self.write();
        match &config.transport {
            Some(installed) if same_fn(installed.as_ref(), transport.as_ref()) => {
                config.transport = None;
                true
            }
            _ => false,
        }
    }

    pub fn has_transport(&self) -> bool {
        self.read().transport.is_some()
    }

    /// Starts building a request for `path`, which is resolved against the base URL.
    pub fn request<P: AsRef<str>>(&self, method: Method, path: P) -> RequestBuilder {
        RequestBuilder::new(self.clone(), method, join_url(&self.base_url(), path.as_ref()))
    }

    pub fn get<P: AsRef<str>>(&self, path: P) -> RequestBuilder {
        self.request(Method::GET, path)
    }

    pub fn post<P: AsRef<str>>(&self, path: P) -> RequestBuilder {
        self.request(Method::POST, path)
    }

    pub fn put<P: AsRef<str>>(&self, path: P) -> RequestBuilder {
        self.request(Method::PUT, path)
    }

    pub fn patch<P: AsRef<str>>(&self, path: P) -> RequestBuilder {
        self.request(Method::PATCH, path)
    }

    pub fn delete<P: AsRef<str>>(&self, path: P) -> RequestBuilder {
        self.request(Method::DELETE, path)
    }

    pub fn head<P: AsRef<str>>(&self, path: P) -> RequestBuilder {
        self.request(Method::HEAD, path)
    }

    /// Runs `req` through the request interceptors, the transport and the response
    /// interceptors, in this order. The first error stops the pipeline.
    pub async fn send(&self, mut req: Request<Bytes>) -> Result<Response<Bytes>, Error> {
        let request_interceptors = self.read().request_interceptors.clone();
        for interceptor in request_interceptors.iter() {
            interceptor(&mut req)?;
        }

        let transport = self.read().transport.clone().ok_or(Error::NoTransport)?;
        let res = transport.fetch(req).await?;

        let response_interceptors = self.read().response_interceptors.clone();
        for interceptor in response_interceptors.iter() {
            interceptor(&res)?;
        }

        Ok(res)
    }

    /// Blocking equivalent of [`RestClient::send`].
    pub fn send_blocking(&self, req: Request<Bytes>) -> Result<Response<Bytes>, Error> {
        self.send(req).join()
    }
}

impl fmt::Debug for RestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let config = self.read();
        f.debug_struct("RestClient")
            .field("base_url", &config.base_url)
            .field("request_interceptors", &config.request_interceptors.len())
            .field("response_interceptors", &config.response_interceptors.len())
            .field("transport", &config.transport.is_some())
            .finish()
    }
}

fn same_fn<T: ?Sized>(a: &T, b: &T) -> bool {
    std::ptr::eq(a as *const T as *const (), b as *const T as *const ())
}

fn validate_base_url(base_url: &str) -> Result<(), Error> {
    if base_url.is_empty() {
        return Ok(());
    }

    match base_url.parse::<Uri>() {
        Ok(uri) if uri.scheme().is_some() && uri.authority().is_some() => Ok(()),
        Ok(uri) if uri.authority().is_none() && base_url.starts_with('/') => Ok(()),
        _ => Err(Error::InvalidBaseUrl(base_url.to_string())),
    }
}

fn join_url(base_url: &str, path: &str) -> String {
    if base_url.is_empty() {
        return path.to_string();
    }

    if path.is_empty() {
        return base_url.to_string();
    }

    match (base_url.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base_url, &path[1..]),
        (false, false) => format!("{}/{}", base_url, path),
        _ => format!("{}{}", base_url, path),
    }
}

/// Builds a request and sends it through the [`RestClient`] it was created from.
pub struct RequestBuilder {
    client: RestClient,
    url: String,
    query: Vec<(String, String)>,
    inner: http::request::Builder,
    body: Result<Bytes, serde_json::Error>,
}

impl RequestBuilder {
    fn new(client: RestClient, method: Method, url: String) -> Self {
        Self {
            client,
            url,
            query: Vec::new(),
            inner: Request::builder().method(method),
            body: Ok(Bytes::new()),
        }
    }

    pub fn query<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn header<K, V>(mut self, name: K, value: V) -> Self
    where
        K: TryInto<HeaderName>,
        <K as TryInto<HeaderName>>::Error: Into<http::Error>,
        V: TryInto<HeaderValue>,
        <V as TryInto<HeaderValue>>::Error: Into<http::Error>,
    {
        self.inner = self.inner.header(name, value);
        self
    }

    pub fn body<B: Into<Bytes>>(mut self, body: B) -> Self {
        self.body = Ok(body.into());
        self
    }

    /// Serializes `body` to JSON and sets the `content-type` header accordingly.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Self {
        self.body = serde_json::to_vec(body).map(Bytes::from);
        self.inner = self.inner.header(CONTENT_TYPE, "application/json");
        self
    }

    pub fn build(self) -> Result<Request<Bytes>, Error> {
        let body = self.body?;
        let mut url = self.url;

        if !self.query.is_empty() {
            let query = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(self.query.iter())
                .finish();
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str(&query);
        }

        Ok(self.inner.uri(url).body(body)?)
    }

    pub async fn send(self) -> Result<Response<Bytes>, Error> {
        let client = self.client.clone();
        let req = self.build()?;
        client.send(req).await
    }

    pub fn send_blocking(self) -> Result<Response<Bytes>, Error> {
        self.send().join()
    }
}
