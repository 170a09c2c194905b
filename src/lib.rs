//! `restmock` lets you replace the network layer of an interceptor-based REST client in your
//! tests. Instead of starting a server, it hooks directly into the client:
//!
//! * a **request interceptor** decides, for every outgoing request, which declaration answers it,
//! * a **substitute transport** produces the canned response and runs the assertions, and
//! * a **response interceptor** forgets stubs once they were used.
//!
//! # Getting Started
//! Add `restmock` to your `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! restmock = "0.1"
//! ```
//!
//! You can then attach a [`RestMock`] to a [`RestClient`] like shown in the following example:
//! ```rust
//! use restmock::prelude::*;
//! use serde_json::json;
//!
//! let client = RestClient::new("http://localhost/api");
//! let mock = RestMock::new(&client);
//!
//! mock.expect_get("users").respond(json!([{"id": 1, "name": "Alice"}]));
//!
//! let response = client.get("users").send_blocking().unwrap();
//!
//! assert_eq!(response.status(), 200);
//! assert_eq!(
//!     serde_json::from_slice::<serde_json::Value>(response.body()).unwrap(),
//!     json!([{"id": 1, "name": "Alice"}])
//! );
//!
//! mock.verify_no_outstanding_expectation().unwrap();
//! mock.verify_no_outstanding_request().unwrap();
//! ```
//!
//! # Usage
//! There are two kinds of declarations:
//!
//! * **Expectations** are created with [`RestMock::expect`] (or one of the `expect_*` shortcuts).
//! They are kept in a queue and each of them answers exactly one request, in declaration order.
//! The request must have the declared method and URL. An optional [`RequestConstraint`] adds
//! either a predicate or a [`ReferenceRequest`] whose headers and query parameters must be
//! present on the request. If the request does not fit, sending it fails with an
//! [`AssertionError`] wrapped in [`client::Error::Assertion`].
//!
//! * **Stubs** are created with [`RestMock::when`] (or one of the `when_*` shortcuts). While no
//! expectation is pending, the first stub with a matching method and URL answers the request.
//! Stubs never fail and are removed after they served a response.
//!
//! Requests that neither an expectation nor a stub answers receive `{}` with status 200 and are
//! reported by [`RestMock::verify_no_outstanding_request`].
//!
//! URLs are declared relative to the client's base URL, e.g. `"users/1"`. The query string and
//! a trailing slash are ignored. A [`Regex`] matches anywhere in the relative URL.
//!
//! # Responses
//! [`Responder::respond`] accepts anything that converts into a [`Reply`]:
//! a status code, a prepared [`http::Response`] or a [`serde_json::Value`].
//! Status-only replies carry the standard reason phrase, which can be read with [`status_text`].
//!
//! # Logging
//! The crate logs through [`tracing`]. Declarations and substituted requests are logged at
//! `trace` level, or at `info` level when [`RestMockOptions::log`] is set. The environment
//! variable `RESTMOCK_LOG` is read by [`RestMockOptions::from_env`].
//!
//! # Cleanup
//! [`RestMock::destroy`] (called automatically when the harness is dropped) removes the
//! interceptors and the transport again, so a client can be reused by the next test.
mod api;
pub mod client;
mod common;
mod engine;

pub use api::{Responder, RestMock, RestMockOptions};
pub use client::{Error, RestClient, Transport};
pub use common::data::{
    default_response, status_text, AssertionError, ReferenceRequest, Reply, RequestConstraint,
    StatusText, UrlPattern,
};
pub use engine::Dispatch;
pub use http::Method;
pub use regex::Regex;

pub mod prelude {
    #[doc(no_inline)]
    pub use crate::{
        AssertionError, Method, ReferenceRequest, Regex, Reply, RequestConstraint, Responder,
        RestClient, RestMock, RestMockOptions, UrlPattern,
    };
}
