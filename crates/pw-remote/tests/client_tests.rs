//! Remote API client contract tests
//!
//! Runs the client against a local mock server and checks authentication,
//! response classification and body encoding.

use pw_common::ApiCredentials;
use pw_remote::{ApiClient, RemoteClientConfig, RemoteError};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ApiClient {
    let credentials = ApiCredentials::new(server.uri(), "u", "p");
    ApiClient::new(&credentials, RemoteClientConfig::default()).unwrap()
}

#[tokio::test]
async fn get_sends_exact_basic_auth_header() {
    let server = MockServer::start().await;

    // base64("u:p") == "dTpw", byte-for-byte.
    Mock::given(method("GET"))
        .and(path("/api/v1/events"))
        .and(header("authorization", "Basic dTpw"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.get("api/v1/events", &[], &[]).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn get_public_sends_no_auth_header() {
    let server = MockServer::start().await;

    // Mounted first: a request carrying the Authorization header hits this
    // mock and the call fails.
    Mock::given(method("GET"))
        .and(path("/api/v1/pledge-definitions"))
        .and(header("authorization", "Basic dTpw"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/pledge-definitions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.get_public("api/v1/pledge-definitions", &[], &[]).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn get_passes_query_params() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/pledges"))
        .and(query_param("event", "7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client
        .get("api/v1/pledges", &[("event", "7".to_string())], &[])
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn status_404_with_valid_json_is_failure_for_reads() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/events"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "missing"})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.get("api/v1/events", &[], &[]).await;
    match result {
        Err(RemoteError::UnexpectedStatus { status, .. }) => assert_eq!(status, 404),
        other => panic!("expected UnexpectedStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn status_201_is_success_for_writes() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/events"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"data": 42})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client
        .post_json("api/v1/events", &json!({"title": "Beach Cleanup"}), &[])
        .await;
    assert_eq!(result.unwrap(), json!({"data": 42}));
}

#[tokio::test]
async fn status_201_is_failure_for_reads() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/events"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.get("api/v1/events", &[], &[]).await;
    assert!(matches!(
        result,
        Err(RemoteError::UnexpectedStatus { status: 201, .. })
    ));
}

#[tokio::test]
async fn non_json_body_is_decode_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/events"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.get("api/v1/events", &[], &[]).await;
    assert!(matches!(result, Err(RemoteError::Decode { .. })));
}

#[tokio::test]
async fn connection_refused_is_transport_failure() {
    // Reserved port with nothing listening.
    let credentials = ApiCredentials::new("http://127.0.0.1:9", "u", "p");
    let client = ApiClient::new(&credentials, RemoteClientConfig::default()).unwrap();

    let result = client.get("api/v1/events", &[], &[]).await;
    assert!(matches!(result, Err(RemoteError::Transport { .. })));
}

#[tokio::test]
async fn post_form_sends_form_encoded_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/pledges"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("description=Go+vegan"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client
        .post_form("api/v1/pledges", &json!({"description": "Go vegan"}), &[])
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn generic_request_json_encodes_post_bodies() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/events"))
        .and(header("content-type", "application/json"))
        .and(body_string_contains("\"title\":\"Beach Cleanup\""))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"data": 42})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client
        .request("api/v1/events", &json!({"title": "Beach Cleanup"}), "POST", &[])
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn extra_headers_are_forwarded() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/events"))
        .and(header("x-request-source", "pledgewire"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client
        .get("api/v1/events", &[], &[("x-request-source", "pledgewire")])
        .await;
    assert!(result.is_ok());
}
