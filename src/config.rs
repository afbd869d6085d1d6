use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::drivers::DriverKind;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub dispatch: DispatchConfig,
    pub browser: BrowserConfig,
    pub desktop: DesktopConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub action: String,
    pub timeout_seconds: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            api_key: None,
            action: "getTodayWhatsAppReminders".to_string(),
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub driver: DriverKind,
    pub require_confirmation: bool,
    pub preflight_delay_seconds: u64,
    pub between_messages_seconds: u64,
    pub closing_delay_seconds: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            driver: DriverKind::Desktop,
            require_confirmation: false,
            preflight_delay_seconds: 5,
            between_messages_seconds: 12,
            closing_delay_seconds: 3,
        }
    }
}

impl DispatchConfig {
    /// Zero delays everywhere, for fakes.
    pub fn immediate(driver: DriverKind) -> Self {
        Self {
            driver,
            require_confirmation: false,
            preflight_delay_seconds: 0,
            between_messages_seconds: 0,
            closing_delay_seconds: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub webdriver_url: String,
    pub web_url: String,
    pub profile_dir: String,
    pub session_timeout_seconds: u64,
    pub login_timeout_seconds: u64,
    pub chat_timeout_seconds: u64,
    pub poll_interval_ms: u64,
    pub chat_settle_ms: u64,
    pub before_send_ms: u64,
    pub after_send_seconds: u64,
    pub chat_list_selector: String,
    pub message_box_selector: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://127.0.0.1:9515".to_string(),
            web_url: "https://web.whatsapp.com".to_string(),
            profile_dir: "~/.whatsapp_automation".to_string(),
            session_timeout_seconds: 15,
            login_timeout_seconds: 60,
            chat_timeout_seconds: 20,
            poll_interval_ms: 500,
            chat_settle_ms: 2000,
            before_send_ms: 1000,
            after_send_seconds: 3,
            chat_list_selector: r#"//div[@aria-label="Chat list"]"#.to_string(),
            message_box_selector: r#"//div[@contenteditable="true"][@data-tab="10"]"#.to_string(),
        }
    }
}

impl BrowserConfig {
    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_seconds)
    }

    pub fn login_timeout(&self) -> Duration {
        Duration::from_secs(self.login_timeout_seconds)
    }

    pub fn chat_timeout(&self) -> Duration {
        Duration::from_secs(self.chat_timeout_seconds)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DesktopConfig {
    pub app_name: String,
    pub launch_delay_ms: u64,
    pub activate_delay_ms: u64,
    pub open_chat_delay_ms: u64,
    pub search_delay_ms: u64,
    pub clipboard_delay_ms: u64,
    pub paste_delay_ms: u64,
}

impl Default for DesktopConfig {
    fn default() -> Self {
        Self {
            app_name: "WhatsApp".to_string(),
            launch_delay_ms: 3000,
            activate_delay_ms: 1000,
            open_chat_delay_ms: 2000,
            search_delay_ms: 3000,
            clipboard_delay_ms: 500,
            paste_delay_ms: 1000,
        }
    }
}

impl DesktopConfig {
    pub fn immediate() -> Self {
        Self {
            launch_delay_ms: 0,
            activate_delay_ms: 0,
            open_chat_delay_ms: 0,
            search_delay_ms: 0,
            clipboard_delay_ms: 0,
            paste_delay_ms: 0,
            ..Self::default()
        }
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

pub fn resolve_config_path() -> PathBuf {
    env::var("WHATSAPP_REMINDER_CONFIG")
        .ok()
        .map(PathBuf::from)
        .unwrap_or_else(|| expand_tilde("~/.whatsapp-reminder/config.json"))
}

pub fn load_config() -> Config {
    let mut cfg = load_config_file(&resolve_config_path());
    apply_env_overrides(&mut cfg);
    cfg
}

/// Reads a config file, falling back to defaults when it is absent or invalid.
pub fn load_config_file(path: &std::path::Path) -> Config {
    if !path.exists() {
        return Config::default();
    }
    match fs::read_to_string(path) {
        Ok(raw) => match serde_json::from_str::<Config>(&raw) {
            Ok(cfg) => cfg,
            Err(err) => {
                tracing::warn!("ignoring invalid config {}: {err}", path.display());
                Config::default()
            }
        },
        Err(err) => {
            tracing::warn!("could not read config {}: {err}", path.display());
            Config::default()
        }
    }
}

pub fn apply_env_overrides(cfg: &mut Config) {
    if let Some(url) = non_empty_var("WHATSAPP_REMINDER_API_URL") {
        cfg.backend.api_url = Some(url);
    }

    if let Some(key) = non_empty_var("WHATSAPP_REMINDER_API_KEY") {
        cfg.backend.api_key = Some(key);
    }

    if let Some(kind) = non_empty_var("WHATSAPP_REMINDER_DRIVER") {
        match kind.parse::<DriverKind>() {
            Ok(kind) => cfg.dispatch.driver = kind,
            Err(err) => tracing::warn!("ignoring WHATSAPP_REMINDER_DRIVER: {err}"),
        }
    }

    if let Some(url) = non_empty_var("WHATSAPP_REMINDER_WEBDRIVER_URL") {
        cfg.browser.webdriver_url = url;
    }

    if let Some(flag) = non_empty_var("WHATSAPP_REMINDER_REQUIRE_CONFIRMATION") {
        match parse_flag(&flag) {
            Some(value) => cfg.dispatch.require_confirmation = value,
            None => tracing::warn!("ignoring WHATSAPP_REMINDER_REQUIRE_CONFIRMATION={flag}"),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
