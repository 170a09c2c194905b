use http::Method;
use serde::Serialize;

use crate::{
    common::data::{Reply, UrlPattern},
    engine::expectation::Expectation,
};

/// Handle to a declared expectation or stub, used to attach the response it should produce.
///
/// # Example
/// ```
/// use restmock::prelude::*;
/// use serde_json::json;
///
/// let client = RestClient::new("http://localhost/api");
/// let mock = RestMock::new(&client);
///
/// mock.expect_get("users").respond(json!([{"id": 1}]));
/// mock.expect_delete("users/1").respond(204);
///
/// let response = client.get("users").send_blocking().unwrap();
/// assert_eq!(response.body().as_ref(), br#"[{"id":1}]"#);
/// ```
#[derive(Debug, Clone)]
pub struct Responder {
    expectation: Expectation,
}

impl Responder {
    pub(crate) fn new(expectation: Expectation) -> Self {
        Self { expectation }
    }

    /// The (uppercased) method of the declaration.
    pub fn method(&self) -> &Method {
        &self.expectation.method
    }

    pub fn url(&self) -> &UrlPattern {
        &self.expectation.url
    }

    /// Attaches the response that is served when this declaration answers a request.
    ///
    /// * a status code (`u16`, `i32` literal or [`http::StatusCode`]) produces a response with
    ///   that status, its standard reason phrase and `{}` as body,
    /// * an [`http::Response`] is served as is,
    /// * a [`serde_json::Value`] is serialized and served with status 200.
    ///
    /// Attaching a second response replaces the first one.
    ///
    /// # Panics
    /// Panics if a status code is not a valid HTTP status code.
    pub fn respond<IntoReply: Into<Reply>>(&self, reply: IntoReply) -> &Self {
        self.expectation.set_response(reply.into().into_response());
        self
    }

    /// Serializes `body` to JSON and attaches it with status 200.
    ///
    /// # Panics
    /// Panics if `body` cannot be serialized to JSON.
    pub fn respond_json<T: Serialize + ?Sized>(&self, body: &T) -> &Self {
        let value = serde_json::to_value(body).expect("cannot serialize response body to JSON");
        self.respond(value)
    }
}
