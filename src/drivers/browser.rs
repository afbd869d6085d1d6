use super::webdriver::{keys, WebDriverClient};
use super::DeliveryDriver;
use crate::config::{expand_tilde, BrowserConfig};
use crate::error::{DriverError, WebDriverError};
use crate::operator::Operator;
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserState {
    Disconnected,
    AwaitingLogin,
    Ready,
    ChatOpen,
    Sent,
}

/// Drives WhatsApp Web in a Chrome session controlled over WebDriver.
pub struct BrowserDriver {
    config: BrowserConfig,
    client: WebDriverClient,
    state: BrowserState,
}

impl BrowserDriver {
    pub fn new(config: BrowserConfig) -> Self {
        let client = WebDriverClient::new(&config.webdriver_url);
        Self {
            config,
            client,
            state: BrowserState::Disconnected,
        }
    }

    pub fn state(&self) -> BrowserState {
        self.state
    }

    pub fn chat_url(&self, phone: &str) -> String {
        format!("{}/send?phone={}", self.config.web_url.trim_end_matches('/'), phone)
    }

    async fn login(&mut self, operator: &dyn Operator) -> Result<(), DriverError> {
        let profile_dir = expand_tilde(&self.config.profile_dir);
        self.client.new_session(&profile_dir.to_string_lossy()).await?;
        if let Err(err) = self.client.maximize().await {
            warn!("could not maximize browser window: {err}");
        }

        info!("opening {}", self.config.web_url);
        self.client.navigate(&self.config.web_url).await?;
        self.state = BrowserState::AwaitingLogin;

        let selector = self.config.chat_list_selector.clone();
        let poll = self.config.poll_interval();
        match self
            .client
            .wait_for_element(&selector, self.config.session_timeout(), poll)
            .await
        {
            Ok(_) => {}
            Err(WebDriverError::ElementTimeout { .. }) => {
                println!("Waiting for WhatsApp Web login, scan the QR code with your phone");
                operator
                    .notify("WhatsApp Web", "Login required: scan the QR code")
                    .await;
                match self
                    .client
                    .wait_for_element(&selector, self.config.login_timeout(), poll)
                    .await
                {
                    Ok(_) => {}
                    Err(WebDriverError::ElementTimeout { .. }) => {
                        return Err(DriverError::LoginTimeout(self.config.login_timeout()));
                    }
                    Err(err) => return Err(err.into()),
                }
            }
            Err(err) => return Err(err.into()),
        }

        self.state = BrowserState::Ready;
        info!("logged in to WhatsApp Web");
        operator.notify("WhatsApp Web", "Login successful").await;
        Ok(())
    }

    async fn send(&mut self, phone: &str, message: &str) -> Result<(), DriverError> {
        if matches!(
            self.state,
            BrowserState::Disconnected | BrowserState::AwaitingLogin
        ) {
            return Err(DriverError::NotStarted);
        }

        self.client.navigate(&self.chat_url(phone)).await?;
        let input = self
            .client
            .wait_for_element(
                &self.config.message_box_selector,
                self.config.chat_timeout(),
                self.config.poll_interval(),
            )
            .await?;
        self.state = BrowserState::ChatOpen;
        sleep(Duration::from_millis(self.config.chat_settle_ms)).await;

        // A bare Enter would send early; Shift+Enter keeps the line break.
        let line_break: String = [keys::SHIFT, keys::ENTER].iter().collect();
        let lines: Vec<&str> = message.split('\n').collect();
        for (i, line) in lines.iter().enumerate() {
            if !line.is_empty() {
                self.client.send_keys(&input, line).await?;
            }
            if i + 1 < lines.len() {
                self.client.send_keys(&input, &line_break).await?;
            }
        }

        sleep(Duration::from_millis(self.config.before_send_ms)).await;
        self.client.send_keys(&input, &keys::ENTER.to_string()).await?;
        self.state = BrowserState::Sent;
        sleep(Duration::from_secs(self.config.after_send_seconds)).await;
        Ok(())
    }
}

#[async_trait]
impl DeliveryDriver for BrowserDriver {
    async fn start(&mut self, operator: &dyn Operator) -> Result<(), DriverError> {
        println!("Starting browser session");
        self.login(operator).await
    }

    async fn deliver(&mut self, phone: &str, message: &str, label: &str) -> bool {
        println!("  -> opening chat: {label} (+{phone})");
        match self.send(phone, message).await {
            Ok(()) => {
                println!("  sent: {label}");
                true
            }
            Err(err) => {
                error!("delivery to {label} failed: {err}");
                if matches!(self.state, BrowserState::ChatOpen | BrowserState::Sent) {
                    self.state = BrowserState::Ready;
                }
                false
            }
        }
    }

    async fn close(&mut self) {
        if let Err(err) = self.client.delete_session().await {
            warn!("closing browser session failed: {err}");
        }
        self.state = BrowserState::Disconnected;
        println!("Browser closed");
    }
}
