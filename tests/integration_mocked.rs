/// Integration tests with a mocked SharpSpring API
/// Exercises request construction and transport without hitting the real service
use serde_json::{json, Value};
use sharpspring_lead_api::errors::ErrorKind;
use sharpspring_lead_api::settings_store::Credentials;
use sharpspring_lead_api::sharpspring_client::SharpSpringClient;
use sharpspring_lead_api::sharpspring_request::{RequestId, SharpSpringRequest, CREATE_LEADS};
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper function to create a client pointing at the mock server
fn create_test_client(mock_server: &MockServer) -> SharpSpringClient {
    SharpSpringClient::new(
        format!("{}/pubapi/v1", mock_server.uri()),
        Duration::from_secs(5),
    )
    .unwrap()
}

fn lead_params() -> Value {
    json!({
        "objects": [{
            "firstName": "Jane",
            "lastName": "Doe",
            "emailAddress": "jane@example.com",
            "trackingID": "",
            "campaignID": "42"
        }]
    })
}

#[tokio::test]
async fn test_create_leads_sends_signed_json_request() {
    let mock_server = MockServer::start().await;

    let remote = json!({
        "result": {"creates": [{"success": true, "error": null, "id": 123456}]},
        "error": null,
        "id": "req-1"
    });

    Mock::given(method("POST"))
        .and(path("/pubapi/v1/"))
        .and(query_param("accountID", "A"))
        .and(query_param("secretKey", "B"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&remote))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let request = SharpSpringRequest::new(
        client.api_url(),
        &Credentials::new("A", "B"),
        RequestId::new("req-1"),
        CREATE_LEADS,
        lead_params(),
    );

    let response = request.make_request(&client).await.unwrap();
    assert_eq!(response, remote);

    let received = mock_server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);

    let sent = &received[0];
    let query = sent.url.query().unwrap();
    assert_eq!(query.matches("accountID=").count(), 1);
    assert_eq!(query.matches("secretKey=").count(), 1);

    let content_length: usize = sent
        .headers
        .get("content-length")
        .unwrap()
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert_eq!(content_length, sent.body.len());

    let body: Value = serde_json::from_slice(&sent.body).unwrap();
    assert_eq!(
        body,
        json!({"id": "req-1", "method": "createLeads", "params": lead_params()})
    );
}

#[tokio::test]
async fn test_missing_credentials_never_reach_network() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let request = SharpSpringRequest::new(
        client.api_url(),
        &Credentials::default(),
        RequestId::generate(),
        CREATE_LEADS,
        lead_params(),
    );

    let errors = request.make_request(&client).await.unwrap_err();
    assert!(errors.contains_kind(ErrorKind::MissingCredential));

    let body = errors.to_json();
    assert_eq!(body["error"], json!(true));
    assert_eq!(body["details"][0]["code"], "account-id");
}

#[tokio::test]
async fn test_remote_error_is_passed_through() {
    let mock_server = MockServer::start().await;

    let remote = json!({
        "result": null,
        "error": {"code": 301, "message": "Invalid key", "data": {}},
        "id": "req-2"
    });

    Mock::given(method("POST"))
        .and(path("/pubapi/v1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&remote))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let request = SharpSpringRequest::new(
        client.api_url(),
        &Credentials::new("A", "wrong"),
        RequestId::new("req-2"),
        CREATE_LEADS,
        lead_params(),
    );

    let response = request.make_request(&client).await.unwrap();
    assert_eq!(response, remote);
}

#[tokio::test]
async fn test_non_success_status_with_json_is_passed_through() {
    let mock_server = MockServer::start().await;

    let remote = json!({"error": {"code": 500, "message": "Server error"}});

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_json(&remote))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let request = SharpSpringRequest::new(
        client.api_url(),
        &Credentials::new("A", "B"),
        RequestId::generate(),
        CREATE_LEADS,
        lead_params(),
    );

    assert_eq!(request.make_request(&client).await.unwrap(), remote);
}

#[tokio::test]
async fn test_non_json_body_is_a_transport_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let request = SharpSpringRequest::new(
        client.api_url(),
        &Credentials::new("A", "B"),
        RequestId::generate(),
        CREATE_LEADS,
        lead_params(),
    );

    let errors = request.make_request(&client).await.unwrap_err();
    assert!(errors.contains_kind(ErrorKind::TransportFailure));
    assert_eq!(errors.to_json()["details"][0]["context"]["status"], 502);
}

#[tokio::test]
async fn test_connection_failure_hides_secret() {
    // Nothing listens on port 1
    let client = SharpSpringClient::new(
        "http://127.0.0.1:1/pubapi/v1".to_string(),
        Duration::from_secs(5),
    )
    .unwrap();

    let request = SharpSpringRequest::new(
        client.api_url(),
        &Credentials::new("A", "super-secret"),
        RequestId::generate(),
        CREATE_LEADS,
        lead_params(),
    );

    let errors = request.make_request(&client).await.unwrap_err();
    assert!(errors.contains_kind(ErrorKind::TransportFailure));
    assert!(!errors.to_json().to_string().contains("super-secret"));
}
