//! Just enough of the W3C WebDriver protocol to drive one Chrome session.

use crate::error::WebDriverError;
use reqwest::{Client, Method};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::{sleep, Instant};

const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

pub mod keys {
    pub const ENTER: char = '\u{E007}';
    pub const SHIFT: char = '\u{E008}';
}

pub struct WebDriverClient {
    http: Client,
    base_url: String,
    session_id: Option<String>,
}

impl WebDriverClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            session_id: None,
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Opens Chrome with a persistent profile so the login survives restarts.
    pub async fn new_session(&mut self, profile_dir: &str) -> Result<String, WebDriverError> {
        let capabilities = json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": {
                        "args": [
                            format!("user-data-dir={profile_dir}"),
                            "--disable-blink-features=AutomationControlled",
                        ],
                        "excludeSwitches": ["enable-automation"],
                    }
                }
            }
        });
        let url = format!("{}/session", self.base_url);
        let value = self.call(Method::POST, &url, Some(capabilities)).await?;
        let session_id = value
            .get("sessionId")
            .and_then(|v| v.as_str())
            .ok_or(WebDriverError::UnexpectedResponse("sessionId"))?
            .to_string();
        self.session_id = Some(session_id.clone());
        Ok(session_id)
    }

    pub async fn maximize(&self) -> Result<(), WebDriverError> {
        let url = self.session_url("window/maximize")?;
        self.call(Method::POST, &url, Some(json!({}))).await?;
        Ok(())
    }

    pub async fn navigate(&self, target: &str) -> Result<(), WebDriverError> {
        let url = self.session_url("url")?;
        self.call(Method::POST, &url, Some(json!({ "url": target }))).await?;
        Ok(())
    }

    /// Returns `None` when nothing matches the XPath yet.
    pub async fn find_element(&self, xpath: &str) -> Result<Option<String>, WebDriverError> {
        let url = self.session_url("element")?;
        let body = json!({ "using": "xpath", "value": xpath });
        match self.call(Method::POST, &url, Some(body)).await {
            Ok(value) => value
                .get(ELEMENT_KEY)
                .and_then(|v| v.as_str())
                .map(|id| Some(id.to_string()))
                .ok_or(WebDriverError::UnexpectedResponse("element reference")),
            Err(WebDriverError::Protocol { error, .. }) if error == "no such element" => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Polls `find_element` until it matches or `timeout` elapses.
    pub async fn wait_for_element(
        &self,
        xpath: &str,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<String, WebDriverError> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(id) = self.find_element(xpath).await? {
                return Ok(id);
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(WebDriverError::ElementTimeout {
                    selector: xpath.to_string(),
                    timeout,
                });
            }
            sleep(poll_interval.min(deadline - now)).await;
        }
    }

    pub async fn send_keys(&self, element_id: &str, text: &str) -> Result<(), WebDriverError> {
        let url = self.session_url(&format!("element/{element_id}/value"))?;
        self.call(Method::POST, &url, Some(json!({ "text": text }))).await?;
        Ok(())
    }

    /// Ends the session if one is open. Idempotent.
    pub async fn delete_session(&mut self) -> Result<(), WebDriverError> {
        let Some(session_id) = self.session_id.take() else {
            return Ok(());
        };
        let url = format!("{}/session/{}", self.base_url, session_id);
        self.call(Method::DELETE, &url, None).await?;
        Ok(())
    }

    fn session_url(&self, path: &str) -> Result<String, WebDriverError> {
        let session_id = self.session_id.as_ref().ok_or(WebDriverError::NoSession)?;
        Ok(format!("{}/session/{}/{}", self.base_url, session_id, path))
    }

    async fn call(
        &self,
        method: Method,
        url: &str,
        body: Option<Value>,
    ) -> Result<Value, WebDriverError> {
        let mut req = self.http.request(method, url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let resp = req.send().await?;
        let status = resp.status();
        let value: Value = resp.json().await.unwrap_or(Value::Null);
        let payload = value.get("value").cloned().unwrap_or(Value::Null);

        if !status.is_success() {
            return Err(WebDriverError::Protocol {
                status: status.as_u16(),
                error: payload
                    .get("error")
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown error")
                    .to_string(),
                message: payload
                    .get("message")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
            });
        }
        Ok(payload)
    }
}
