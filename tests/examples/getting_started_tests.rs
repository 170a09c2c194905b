use restmock::prelude::*;
use serde_json::{json, Value};

#[test]
fn getting_started_test() {
    // Arrange
    let _ = env_logger::try_init();
    let client = RestClient::new("http://localhost");
    let mock = RestMock::new(&client);

    mock.expect("GET", "foo").respond(json!({"foo": "bar", "id": 1}));

    // Act: Send the request through the client. It never leaves the process.
    let response = client.get("foo").send_blocking().unwrap();

    // Assert
    assert_eq!(response.status(), 200);
    assert_eq!(
        serde_json::from_slice::<Value>(response.body()).unwrap(),
        json!({"foo": "bar", "id": 1})
    );
    assert_eq!(mock.verify_no_outstanding_expectation(), Ok(()));
    assert_eq!(mock.verify_no_outstanding_request(), Ok(()));
}

#[tokio::test]
async fn getting_started_test_async() {
    // Arrange
    let _ = env_logger::try_init();
    let client = RestClient::new("http://localhost/api");
    let mock = RestMock::new(&client);

    mock.expect_post("users").respond(json!({"id": 42}));

    // Act
    let response = client
        .post("users")
        .json(&json!({"name": "Alice"}))
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(
        serde_json::from_slice::<Value>(response.body()).unwrap(),
        json!({"id": 42})
    );
    assert_eq!(mock.pending_requests(), 0);
}
