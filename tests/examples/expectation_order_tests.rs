use restmock::prelude::*;
use serde_json::{json, Value};

fn body(response: &http::Response<bytes::Bytes>) -> Value {
    serde_json::from_slice(response.body()).unwrap()
}

#[test]
fn expectations_are_consumed_in_declaration_order() {
    let _ = env_logger::try_init();
    let client = RestClient::new("http://localhost");
    let mock = RestMock::new(&client);

    mock.expect_get("first").respond(json!({"n": 1}));
    mock.expect_get("second").respond(json!({"n": 2}));

    let first = client.get("first").send_blocking().unwrap();
    let second = client.get("second").send_blocking().unwrap();

    assert_eq!(body(&first), json!({"n": 1}));
    assert_eq!(body(&second), json!({"n": 2}));
    assert_eq!(mock.pending_expectations(), 0);
}

#[test]
fn out_of_order_request_fails_against_queue_head() {
    let _ = env_logger::try_init();
    let client = RestClient::new("http://localhost");
    let mock = RestMock::new(&client);

    mock.expect_get("first");
    mock.expect_get("second");

    let err = client.get("second").send_blocking().unwrap_err();

    assert_eq!(err.to_string(), "URL should be \"first\", got \"second\"");
    assert_eq!(mock.pending_expectations(), 1);
    // A failed assertion still counts the request as resolved.
    assert_eq!(mock.pending_requests(), 0);
}

#[test]
fn pending_expectations_are_reported() {
    let _ = env_logger::try_init();
    let client = RestClient::new("http://localhost");
    let mock = RestMock::new(&client);

    mock.expect_with("GET", "foo", ReferenceRequest::new("foo"));
    mock.expect_with("POST", "bar", ReferenceRequest::new("foo"));

    client.get("foo").send_blocking().unwrap();

    let err = mock.verify_no_outstanding_expectation().unwrap_err();
    assert_eq!(err, AssertionError::OutstandingExpectations(1));
    assert_eq!(err.to_string(), "There is 1 pending expectation");

    mock.reset_expectations();
    assert_eq!(mock.verify_no_outstanding_expectation(), Ok(()));
}

#[test]
fn reset_expectations_is_idempotent_and_keeps_stubs() {
    let client = RestClient::new("http://localhost");
    let mock = RestMock::new(&client);

    mock.expect_get("foo");
    mock.when_get("bar");

    mock.reset_expectations();
    mock.reset_expectations();

    assert_eq!(mock.pending_expectations(), 0);
    assert_eq!(mock.stub_count(), 1);
}

#[tokio::test]
async fn every_shortcut_declares_its_method() {
    let client = RestClient::new("http://localhost");
    let mock = RestMock::new(&client);

    let declared = [
        mock.expect_get("items"),
        mock.expect_post("items"),
        mock.expect_put("items"),
        mock.expect_patch("items"),
        mock.expect_delete("items"),
        mock.expect_head("items"),
    ];
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::HEAD,
    ];

    for (responder, method) in declared.iter().zip(methods.iter()) {
        assert_eq!(responder.method(), method);
    }

    for method in methods {
        client.request(method, "items").send().await.unwrap();
    }

    assert_eq!(mock.verify_no_outstanding_expectation(), Ok(()));
    assert_eq!(mock.verify_no_outstanding_request(), Ok(()));
}
