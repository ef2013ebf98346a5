//! Integration tests for the EKDSend client against a mock HTTP server.

use ekdsend_client::config::USER_AGENT;
use ekdsend_client::{
    CreateCallParams, EkdSendClient, EkdSendError, ListEmailsParams, ListParams, RetryConfig,
    SendEmailParams, SendSmsParams,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "ek_test_integration_key";

async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

fn client(server: &MockServer) -> EkdSendClient {
    EkdSendClient::builder()
        .api_key(API_KEY)
        .base_url(format!("{}/v1", server.uri()))
        .retry(RetryConfig::new().initial_delay(Duration::from_millis(10)))
        .build()
        .expect("Failed to build client")
}

fn email_body(id: &str, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "status": status,
        "from": "hello@example.com",
        "to": ["user@example.com"],
        "subject": "Welcome!",
        "created_at": "2024-01-15T10:30:00Z"
    })
}

#[tokio::test]
async fn test_send_email_sends_headers_and_body() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/v1/emails"))
        .and(header("Authorization", format!("Bearer {}", API_KEY).as_str()))
        .and(header("Content-Type", "application/json"))
        .and(header("Accept", "application/json"))
        .and(header("User-Agent", USER_AGENT))
        .and(body_partial_json(json!({
            "from": "hello@example.com",
            "to": ["user@example.com"],
            "subject": "Welcome!"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": email_body("em_1", "queued")})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let params = SendEmailParams::new("hello@example.com", ["user@example.com"], "Welcome!")
        .html("<h1>Welcome!</h1>");
    let email = client(&mock_server)
        .emails()
        .send(&params, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(email.id, "em_1");
    assert_eq!(email.status, "queued");
}

#[tokio::test]
async fn test_list_emails_query_string() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/v1/emails"))
        .and(query_param("limit", "10"))
        .and(query_param("offset", "30"))
        .and(query_param("status", "delivered"))
        .and(query_param("tags", "welcome,beta"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [email_body("em_31", "delivered")],
            "total": 41,
            "limit": 10,
            "offset": 30
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let params = ListEmailsParams::new()
        .limit(10)
        .offset(30)
        .status("delivered")
        .tag("welcome")
        .tag("beta");
    let page = client(&mock_server)
        .emails()
        .list(Some(&params), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(page.len(), 1);
    assert!(page.has_more());
    assert_eq!(page.next_offset(), 40);
}

#[tokio::test]
async fn test_list_sms_defaults_to_first_page() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/v1/sms"))
        .and(query_param("limit", "20"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [],
            "total": 0,
            "limit": 20,
            "offset": 0
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let page = client(&mock_server)
        .sms()
        .list(None, &CancellationToken::new())
        .await
        .unwrap();

    assert!(page.is_empty());
    assert!(!page.has_more());
}

#[tokio::test]
async fn test_null_collections_decode_as_empty() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/v1/emails"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "total": 0,
            "limit": 20,
            "offset": 0
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut email = email_body("em_null", "sent");
    email["cc"] = json!(null);
    email["tags"] = json!(null);
    email["metadata"] = json!(null);
    Mock::given(method("GET"))
        .and(path("/v1/emails/em_null"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": email})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);
    let cancel = CancellationToken::new();

    let page = client.emails().list(None, &cancel).await.unwrap();
    assert!(page.is_empty());

    let email = client.emails().get("em_null", &cancel).await.unwrap();
    assert!(email.cc.is_empty());
    assert!(email.tags.is_empty());
    assert!(email.metadata.is_empty());
}

#[tokio::test]
async fn test_ids_are_encoded_into_one_path_segment() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/v1/sms/a%2Fb%3Fc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": "a/b?c",
                "status": "sent",
                "to": "+15551234567",
                "message": "hi",
                "created_at": "2024-01-15T10:30:00Z"
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let sms = client(&mock_server)
        .sms()
        .get("a/b?c", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(sms.id, "a/b?c");
}

#[tokio::test]
async fn test_send_sms_and_cancel() {
    let mock_server = setup_mock_server().await;
    let sms = json!({
        "id": "sms_1",
        "status": "scheduled",
        "to": "+15551234567",
        "message": "Reminder",
        "created_at": "2024-01-15T10:30:00Z"
    });

    Mock::given(method("POST"))
        .and(path("/v1/sms"))
        .and(body_partial_json(json!({"to": "+15551234567", "message": "Reminder"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": sms})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut cancelled = sms.clone();
    cancelled["status"] = json!("cancelled");
    Mock::given(method("DELETE"))
        .and(path("/v1/sms/sms_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": cancelled})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);
    let cancel = CancellationToken::new();

    let sent = client
        .sms()
        .send(&SendSmsParams::new("+15551234567", "Reminder"), &cancel)
        .await
        .unwrap();
    let cancelled = client.sms().cancel(&sent.id, &cancel).await.unwrap();

    assert_eq!(cancelled.status, "cancelled");
}

#[tokio::test]
async fn test_create_call_applies_defaults() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/v1/calls"))
        .and(body_partial_json(json!({
            "tts_message": "Hello from EKDSend",
            "voice": "alloy",
            "language": "en-US"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": "call_1",
                "status": "queued",
                "to": "+15551234567",
                "from": "+15557654321",
                "voice": "alloy",
                "language": "en-US",
                "created_at": "2024-01-15T10:30:00Z"
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let params = CreateCallParams::tts("+15551234567", "+15557654321", "Hello from EKDSend");
    let call = client(&mock_server)
        .calls()
        .create(&params, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(call.id, "call_1");
    assert_eq!(call.voice, "alloy");
}

#[tokio::test]
async fn test_get_recording() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/v1/calls/call_7/recording"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "url": "https://recordings.example.com/call_7.mp3",
                "duration": 63,
                "created_at": "2024-01-15T10:35:00Z"
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let recording = client(&mock_server)
        .calls()
        .get_recording("call_7", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(recording.duration, 63);
}

#[tokio::test]
async fn test_list_calls_with_filters() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/v1/calls"))
        .and(query_param("status", "completed"))
        .and(query_param("from_date", "2024-01-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [],
            "total": 0,
            "limit": 20,
            "offset": 0
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let params = ListParams::new().status("completed").from_date("2024-01-01");
    client(&mock_server)
        .calls()
        .list(Some(&params), &CancellationToken::new())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_transport_timeout() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/v1/emails/em_slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": email_body("em_slow", "sent")}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let client = EkdSendClient::builder()
        .api_key(API_KEY)
        .base_url(format!("{}/v1", mock_server.uri()))
        .timeout(Duration::from_millis(200))
        .retry(RetryConfig::no_retries())
        .build()
        .unwrap();

    let err = client
        .emails()
        .get("em_slow", &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, EkdSendError::Transport(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_cancellation_returns_promptly() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/v1/calls/call_1"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let start = std::time::Instant::now();
    let err = client.calls().get("call_1", &cancel).await.unwrap_err();

    assert!(err.is_cancellation());
    assert!(start.elapsed() < Duration::from_secs(5));
}
