use async_trait::async_trait;
use serde_json::json;
use std::sync::Mutex;
use whatsapp_reminder::config::BrowserConfig;
use whatsapp_reminder::drivers::browser::{BrowserDriver, BrowserState};
use whatsapp_reminder::drivers::DeliveryDriver;
use whatsapp_reminder::error::DriverError;
use whatsapp_reminder::operator::Operator;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct RecordingOperator {
    notes: Mutex<Vec<String>>,
}

#[async_trait]
impl Operator for RecordingOperator {
    async fn notify(&self, _title: &str, body: &str) {
        self.notes.lock().unwrap().push(body.to_string());
    }

    async fn confirm(&self, _question: &str) -> bool {
        true
    }
}

fn config(server: &MockServer) -> BrowserConfig {
    BrowserConfig {
        webdriver_url: server.uri(),
        web_url: "https://web.whatsapp.com".to_string(),
        profile_dir: "/tmp/wa-profile".to_string(),
        session_timeout_seconds: 0,
        login_timeout_seconds: 0,
        chat_timeout_seconds: 0,
        poll_interval_ms: 10,
        chat_settle_ms: 0,
        before_send_ms: 0,
        after_send_seconds: 0,
        chat_list_selector: "//chats".to_string(),
        message_box_selector: "//box".to_string(),
    }
}

fn ok_null() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"value": null}))
}

fn element(id: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "value": {"element-6066-11e4-a52e-4f735466cecf": id}
    }))
}

fn no_such_element() -> ResponseTemplate {
    ResponseTemplate::new(404).set_body_json(json!({
        "value": {"error": "no such element", "message": "not found"}
    }))
}

async fn mount_session(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": {"sessionId": "s1", "capabilities": {}}
        })))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/session/s1/window/maximize"))
        .respond_with(ok_null())
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/session/s1/url"))
        .respond_with(ok_null())
        .mount(server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/session/s1"))
        .respond_with(ok_null())
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_selector(server: &MockServer, selector: &str, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/session/s1/element"))
        .and(body_json(json!({"using": "xpath", "value": selector})))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_login_and_deliver_multiline() {
    let server = MockServer::start().await;
    mount_session(&server).await;
    mount_selector(&server, "//chats", element("list")).await;
    mount_selector(&server, "//box", element("e1")).await;
    Mock::given(method("POST"))
        .and(path("/session/s1/url"))
        .and(body_json(json!({"url": "https://web.whatsapp.com/send?phone=905321234567"})))
        .respond_with(ok_null())
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/session/s1/element/e1/value"))
        .respond_with(ok_null())
        .expect(4)
        .mount(&server)
        .await;

    let operator = RecordingOperator::default();
    let mut driver = BrowserDriver::new(config(&server));
    driver.start(&operator).await.unwrap();
    assert_eq!(driver.state(), BrowserState::Ready);
    assert_eq!(*operator.notes.lock().unwrap(), vec!["Login successful".to_string()]);

    assert!(driver.deliver("905321234567", "Hello\nSee you", "Ayşe").await);
    assert_eq!(driver.state(), BrowserState::Sent);

    driver.close().await;
    assert_eq!(driver.state(), BrowserState::Disconnected);
}

#[tokio::test]
async fn test_line_break_uses_shift_enter() {
    let server = MockServer::start().await;
    mount_session(&server).await;
    mount_selector(&server, "//chats", element("list")).await;
    mount_selector(&server, "//box", element("e1")).await;
    Mock::given(method("POST"))
        .and(path("/session/s1/element/e1/value"))
        .and(body_json(json!({"text": "\u{E008}\u{E007}"})))
        .respond_with(ok_null())
        .with_priority(1)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/session/s1/element/e1/value"))
        .respond_with(ok_null())
        .mount(&server)
        .await;

    let operator = RecordingOperator::default();
    let mut driver = BrowserDriver::new(config(&server));
    driver.start(&operator).await.unwrap();
    assert!(driver.deliver("905321234567", "a\nb\nc", "Mehmet").await);
    driver.close().await;
}

#[tokio::test]
async fn test_login_timeout_is_fatal() {
    let server = MockServer::start().await;
    mount_session(&server).await;
    mount_selector(&server, "//chats", no_such_element()).await;

    let operator = RecordingOperator::default();
    let mut driver = BrowserDriver::new(config(&server));
    let err = driver.start(&operator).await.unwrap_err();
    assert!(matches!(err, DriverError::LoginTimeout(_)));
    assert_eq!(driver.state(), BrowserState::AwaitingLogin);
    assert_eq!(
        *operator.notes.lock().unwrap(),
        vec!["Login required: scan the QR code".to_string()]
    );

    driver.close().await;
    assert_eq!(driver.state(), BrowserState::Disconnected);
}

#[tokio::test]
async fn test_chat_timeout_fails_only_that_item() {
    let server = MockServer::start().await;
    mount_session(&server).await;
    mount_selector(&server, "//chats", element("list")).await;
    mount_selector(&server, "//box", no_such_element()).await;

    let operator = RecordingOperator::default();
    let mut driver = BrowserDriver::new(config(&server));
    driver.start(&operator).await.unwrap();

    assert!(!driver.deliver("905321234567", "Hello", "Ayşe").await);
    assert_eq!(driver.state(), BrowserState::Ready);

    driver.close().await;
}

#[tokio::test]
async fn test_deliver_before_start_fails() {
    let mut driver = BrowserDriver::new(BrowserConfig::default());
    assert!(!driver.deliver("905321234567", "Hello", "Ayşe").await);
    assert_eq!(driver.state(), BrowserState::Disconnected);
}
