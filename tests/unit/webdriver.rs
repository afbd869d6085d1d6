use serde_json::json;
use std::time::Duration;
use whatsapp_reminder::drivers::webdriver::WebDriverClient;
use whatsapp_reminder::error::WebDriverError;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn with_session(server: &MockServer) -> WebDriverClient {
    Mock::given(method("POST"))
        .and(path("/session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": {"sessionId": "s1", "capabilities": {}}
        })))
        .mount(server)
        .await;
    let mut client = WebDriverClient::new(&server.uri());
    client.new_session("/tmp/profile").await.unwrap();
    client
}

#[tokio::test]
async fn test_new_session_stores_id() {
    let server = MockServer::start().await;
    let client = with_session(&server).await;
    assert_eq!(client.session_id(), Some("s1"));
}

#[tokio::test]
async fn test_calls_without_session_fail() {
    let client = WebDriverClient::new("http://127.0.0.1:1");
    let err = client.navigate("https://example.com").await.unwrap_err();
    assert!(matches!(err, WebDriverError::NoSession));
}

#[tokio::test]
async fn test_navigate_posts_url() {
    let server = MockServer::start().await;
    let client = with_session(&server).await;
    Mock::given(method("POST"))
        .and(path("/session/s1/url"))
        .and(body_json(json!({"url": "https://web.whatsapp.com"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": null})))
        .expect(1)
        .mount(&server)
        .await;

    client.navigate("https://web.whatsapp.com").await.unwrap();
}

#[tokio::test]
async fn test_find_element_found() {
    let server = MockServer::start().await;
    let client = with_session(&server).await;
    Mock::given(method("POST"))
        .and(path("/session/s1/element"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": {"element-6066-11e4-a52e-4f735466cecf": "e1"}
        })))
        .mount(&server)
        .await;

    let found = client.find_element("//div").await.unwrap();
    assert_eq!(found, Some("e1".to_string()));
}

#[tokio::test]
async fn test_find_element_missing() {
    let server = MockServer::start().await;
    let client = with_session(&server).await;
    Mock::given(method("POST"))
        .and(path("/session/s1/element"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "value": {"error": "no such element", "message": "nothing", "stacktrace": ""}
        })))
        .mount(&server)
        .await;

    assert_eq!(client.find_element("//div").await.unwrap(), None);
}

#[tokio::test]
async fn test_protocol_error_surfaces() {
    let server = MockServer::start().await;
    let client = with_session(&server).await;
    Mock::given(method("POST"))
        .and(path("/session/s1/element"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "value": {"error": "invalid session id", "message": "gone"}
        })))
        .mount(&server)
        .await;

    let err = client.find_element("//div").await.unwrap_err();
    assert!(matches!(
        err,
        WebDriverError::Protocol { status: 404, ref error, .. } if error == "invalid session id"
    ));
}

#[tokio::test]
async fn test_wait_for_element_times_out() {
    let server = MockServer::start().await;
    let client = with_session(&server).await;
    Mock::given(method("POST"))
        .and(path("/session/s1/element"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "value": {"error": "no such element", "message": ""}
        })))
        .mount(&server)
        .await;

    let err = client
        .wait_for_element("//div", Duration::from_millis(50), Duration::from_millis(10))
        .await
        .unwrap_err();
    assert!(matches!(err, WebDriverError::ElementTimeout { .. }));
}

#[tokio::test]
async fn test_send_keys_and_delete_session() {
    let server = MockServer::start().await;
    let mut client = with_session(&server).await;
    Mock::given(method("POST"))
        .and(path("/session/s1/element/e1/value"))
        .and(body_json(json!({"text": "hello"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": null})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/session/s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": null})))
        .expect(1)
        .mount(&server)
        .await;

    client.send_keys("e1", "hello").await.unwrap();
    client.delete_session().await.unwrap();
    assert!(client.session_id().is_none());
    client.delete_session().await.unwrap();
}
