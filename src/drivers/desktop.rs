use super::DeliveryDriver;
use crate::config::DesktopConfig;
use crate::error::DriverError;
use crate::operator::{applescript_quote, Operator};
use crate::phone::display_phone;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::sleep;
use tracing::{debug, error};

pub const RETURN_SCRIPT: &str = r#"tell application "System Events" to key code 36"#;

/// Keyboard, clipboard and process control of the machine running the app.
#[async_trait]
pub trait DesktopHost: Send + Sync {
    async fn launch(&self, app: &str) -> Result<()>;
    async fn run_script(&self, script: &str) -> Result<()>;
    async fn set_clipboard(&self, text: &str) -> Result<()>;
}

/// macOS host: `open`, `osascript` and `pbcopy`.
pub struct MacHost;

#[async_trait]
impl DesktopHost for MacHost {
    async fn launch(&self, app: &str) -> Result<()> {
        let status = Command::new("open")
            .args(["-a", app])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .context("running open")?;
        if !status.success() {
            bail!("open -a {app} exited with {status}");
        }
        Ok(())
    }

    async fn run_script(&self, script: &str) -> Result<()> {
        let output = Command::new("osascript")
            .arg("-e")
            .arg(script)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .context("running osascript")?;
        if !output.status.success() {
            bail!(
                "osascript failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }

    async fn set_clipboard(&self, text: &str) -> Result<()> {
        let mut child = pbcopy_command().spawn().context("running pbcopy")?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).await?;
        }
        let status = child.wait().await?;
        if !status.success() {
            bail!("pbcopy exited with {status}");
        }
        Ok(())
    }
}

/// `pbcopy` decodes stdin per `LANG`, which is unset under launchd and cron.
pub fn pbcopy_command() -> Command {
    let mut cmd = Command::new("pbcopy");
    cmd.env("LANG", "en_US.UTF-8").stdin(Stdio::piped());
    cmd
}

pub fn activate_script(app: &str) -> String {
    format!("tell application {} to activate", applescript_quote(app))
}

pub fn keystroke_script(text: &str, with_command: bool) -> String {
    let modifier = if with_command { " using command down" } else { "" };
    format!(
        "tell application \"System Events\" to keystroke {}{}",
        applescript_quote(text),
        modifier
    )
}

/// Drives the WhatsApp Desktop app with shortcuts: new chat, search the
/// number, paste the message from the clipboard, send.
pub struct DesktopDriver<H> {
    config: DesktopConfig,
    host: H,
}

impl<H: DesktopHost> DesktopDriver<H> {
    pub fn new(config: DesktopConfig, host: H) -> Self {
        Self { config, host }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    async fn pause(&self, millis: u64) {
        sleep(Duration::from_millis(millis)).await;
    }

    async fn activate(&self) -> Result<()> {
        self.host.run_script(&activate_script(&self.config.app_name)).await?;
        self.pause(self.config.activate_delay_ms).await;
        Ok(())
    }

    async fn launch(&self) -> Result<()> {
        self.host.launch(&self.config.app_name).await?;
        self.pause(self.config.launch_delay_ms).await;
        self.activate().await
    }

    async fn send(&self, phone: &str, message: &str) -> Result<()> {
        self.activate().await?;

        debug!("opening new chat");
        self.host.run_script(&keystroke_script("n", true)).await?;
        self.pause(self.config.open_chat_delay_ms).await;

        let target = display_phone(phone);
        println!("  -> searching {target}");
        self.host.run_script(&keystroke_script(&target, false)).await?;
        self.pause(self.config.search_delay_ms).await;
        self.host.run_script(RETURN_SCRIPT).await?;
        self.pause(self.config.open_chat_delay_ms).await;

        // Typing would mangle non-ASCII text and send at the first newline.
        self.host.set_clipboard(message).await?;
        self.pause(self.config.clipboard_delay_ms).await;
        self.host.run_script(&keystroke_script("v", true)).await?;
        self.pause(self.config.paste_delay_ms).await;
        self.host.run_script(RETURN_SCRIPT).await?;
        Ok(())
    }
}

#[async_trait]
impl<H: DesktopHost + 'static> DeliveryDriver for DesktopDriver<H> {
    async fn start(&mut self, _operator: &dyn Operator) -> Result<(), DriverError> {
        println!("Opening {}", self.config.app_name);
        self.launch().await.map_err(|source| DriverError::Launch {
            app: self.config.app_name.clone(),
            source,
        })
    }

    async fn deliver(&mut self, phone: &str, message: &str, label: &str) -> bool {
        println!("  -> new chat: {label}");
        match self.send(phone, message).await {
            Ok(()) => {
                println!("  sent: {label}");
                true
            }
            Err(err) => {
                let err = DriverError::Delivery(err);
                error!("delivery to {label} failed: {err}");
                false
            }
        }
    }

    async fn close(&mut self) {
        debug!("desktop driver holds no session to release");
    }
}
