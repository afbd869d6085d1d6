pub mod browser;
pub mod desktop;
pub mod webdriver;

use crate::config::Config;
use crate::error::DriverError;
use crate::operator::Operator;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A UI session able to open a chat with a phone number and send text into it.
#[async_trait]
pub trait DeliveryDriver: Send {
    /// Acquires the UI session. Failing here aborts the run.
    async fn start(&mut self, operator: &dyn Operator) -> Result<(), DriverError>;

    /// Sends `message` to the normalized `phone`. Errors are logged and
    /// reported as `false`.
    async fn deliver(&mut self, phone: &str, message: &str, label: &str) -> bool;

    /// Releases the session. Safe to call when `start` failed or never ran.
    async fn close(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    Browser,
    Desktop,
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverKind::Browser => f.write_str("browser"),
            DriverKind::Desktop => f.write_str("desktop"),
        }
    }
}

impl FromStr for DriverKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "browser" | "web" => Ok(DriverKind::Browser),
            "desktop" | "app" => Ok(DriverKind::Desktop),
            other => Err(format!("unknown driver kind: {other}")),
        }
    }
}

pub fn build_driver(config: &Config) -> Box<dyn DeliveryDriver> {
    match config.dispatch.driver {
        DriverKind::Browser => Box::new(browser::BrowserDriver::new(config.browser.clone())),
        DriverKind::Desktop => Box::new(desktop::DesktopDriver::new(
            config.desktop.clone(),
            desktop::MacHost,
        )),
    }
}
