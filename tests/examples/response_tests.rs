use bytes::Bytes;
use restmock::{client::response_interceptor, prelude::*, status_text, Error};
use serde::Serialize;
use serde_json::{json, Value};

#[test]
fn status_code_response_test() {
    let _ = env_logger::try_init();
    let client = RestClient::new("http://localhost");
    let mock = RestMock::new(&client);

    mock.expect("GET", "foo").respond(500);

    let response = client.get("foo").send_blocking().unwrap();

    assert_eq!(response.status(), 500);
    assert_eq!(status_text(&response), Some("Internal Server Error"));
    assert_eq!(response.body().as_ref(), b"{}");
}

#[test]
fn array_response_test() {
    let client = RestClient::new("http://localhost");
    let mock = RestMock::new(&client);

    mock.expect_get("test")
        .respond(json!([{"a": "b", "id": 1}, {"a": "c", "id": 2}]));

    let response = client.get("test").send_blocking().unwrap();
    let items: Vec<Value> = serde_json::from_slice(response.body()).unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(items[1], json!({"a": "c", "id": 2}));
}

#[test]
fn serializable_response_test() {
    #[derive(Serialize)]
    struct User {
        id: u32,
        name: &'static str,
    }

    let client = RestClient::new("http://localhost");
    let mock = RestMock::new(&client);

    mock.expect_get("users/1").respond_json(&User { id: 1, name: "Alice" });

    let response = client.get("users/1").send_blocking().unwrap();

    assert_eq!(
        serde_json::from_slice::<Value>(response.body()).unwrap(),
        json!({"id": 1, "name": "Alice"})
    );
}

#[test]
fn prepared_response_is_served_as_is_test() {
    let client = RestClient::new("http://localhost");
    let mock = RestMock::new(&client);

    let prepared = http::Response::builder()
        .status(201)
        .header("location", "/users/2")
        .body(Bytes::from_static(b"created"))
        .unwrap();
    mock.expect_post("users").respond(prepared);

    let response = client.post("users").send_blocking().unwrap();

    assert_eq!(response.status(), 201);
    assert_eq!(response.headers()["location"], "/users/2");
    assert_eq!(response.body().as_ref(), b"created");
    assert_eq!(status_text(&response), Some("Created"));
}

#[test]
fn last_attached_response_wins_test() {
    let client = RestClient::new("http://localhost");
    let mock = RestMock::new(&client);

    mock.expect_get("foo").respond(404).respond(json!({"ok": true}));

    let response = client.get("foo").send_blocking().unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.body().as_ref(), br#"{"ok":true}"#);
}

#[test]
fn response_interceptor_error_is_propagated_test() {
    let _ = env_logger::try_init();
    let client = RestClient::new("http://localhost");
    let mock = RestMock::new(&client);

    let failing = response_interceptor(|res| match res.status().as_u16() {
        500 => Err(Error::Interceptor("fail".to_string())),
        _ => Ok(()),
    });
    client.add_response_interceptor(failing.clone());

    mock.expect_delete("test").respond(500);

    let err = client.delete("test").send_blocking().unwrap_err();

    assert!(matches!(&err, Error::Interceptor(message) if message == "fail"));
    assert_eq!(mock.verify_no_outstanding_expectation(), Ok(()));
    assert!(client.remove_response_interceptor(&failing));
}

#[test]
#[should_panic(expected = "cannot parse HTTP status code")]
fn invalid_status_code_panics_test() {
    let client = RestClient::new("http://localhost");
    let mock = RestMock::new(&client);

    mock.expect_get("foo").respond(42);
}
