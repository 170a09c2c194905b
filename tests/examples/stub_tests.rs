use restmock::prelude::*;
use serde_json::{json, Value};

#[test]
fn stubs_do_not_assert_test() {
    let _ = env_logger::try_init();
    let client = RestClient::new("http://localhost");
    let mock = RestMock::new(&client);

    mock.when_with(
        "get",
        "foo",
        ReferenceRequest::new("foo?test=foobar").header("content-type", "application/json"),
    );

    let response = client.get("foo").send_blocking();

    assert!(response.is_ok());
    assert_eq!(mock.verify_no_outstanding_request(), Ok(()));
}

#[test]
fn stub_response_test() {
    let _ = env_logger::try_init();
    let client = RestClient::new("http://localhost");
    let mock = RestMock::new(&client);

    mock.when("GET", "foo").respond(json!({"foo": "bar", "id": 1}));

    let response = client.get("foo").send_blocking().unwrap();

    assert_eq!(
        serde_json::from_slice::<Value>(response.body()).unwrap(),
        json!({"foo": "bar", "id": 1})
    );
}

#[test]
fn stubs_are_removed_after_serving_a_response_test() {
    let client = RestClient::new("http://localhost");
    let mock = RestMock::new(&client);

    mock.when_get("foo").respond(json!({"served": true}));
    assert_eq!(mock.stub_count(), 1);

    let first = client.get("foo").send_blocking().unwrap();
    let second = client.get("foo").send_blocking().unwrap();

    assert_eq!(mock.stub_count(), 0);
    assert_eq!(first.body().as_ref(), br#"{"served":true}"#);
    assert_eq!(second.body().as_ref(), b"{}");
    // The second request found nothing and stays pending.
    assert_eq!(
        mock.verify_no_outstanding_request(),
        Err(AssertionError::OutstandingRequests(1))
    );
}

#[test]
fn first_matching_stub_wins_test() {
    let client = RestClient::new("http://localhost");
    let mock = RestMock::new(&client);

    mock.when_post("foo").respond(json!("post"));
    mock.when_get(Regex::new("fo+").unwrap()).respond(json!("regex"));
    mock.when_get("foo").respond(json!("literal"));

    let response = client.get("foo").send_blocking().unwrap();

    assert_eq!(response.body().as_ref(), br#""regex""#);
    assert_eq!(mock.stub_count(), 2);
}

#[test]
fn expectations_take_precedence_over_stubs_test() {
    let client = RestClient::new("http://localhost");
    let mock = RestMock::new(&client);

    mock.when_get("foo").respond(json!("stub"));
    mock.expect_get("foo").respond(json!("expectation"));

    let first = client.get("foo").send_blocking().unwrap();
    let second = client.get("foo").send_blocking().unwrap();

    assert_eq!(first.body().as_ref(), br#""expectation""#);
    assert_eq!(second.body().as_ref(), br#""stub""#);
    assert_eq!(mock.verify_no_outstanding_request(), Ok(()));
}

#[test]
fn pending_request_test() {
    let _ = env_logger::try_init();
    let client = RestClient::new("http://localhost");
    let mock = RestMock::new(&client);

    let response = client.get("foo").send_blocking().unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.body().as_ref(), b"{}");

    let err = mock.verify_no_outstanding_request().unwrap_err();
    assert_eq!(err.to_string(), "There is 1 pending request");
}

#[tokio::test]
async fn concurrent_requests_to_stubs_test() {
    let client = RestClient::new("http://localhost");
    let mock = RestMock::new(&client);

    mock.when_get("a").respond(json!("a"));
    mock.when_get("b").respond(json!("b"));

    let (a, b) = tokio::join!(client.get("a").send(), client.get("b").send());

    assert_eq!(a.unwrap().body().as_ref(), br#""a""#);
    assert_eq!(b.unwrap().body().as_ref(), br#""b""#);
    assert_eq!(mock.stub_count(), 0);
    assert_eq!(mock.pending_requests(), 0);
}
