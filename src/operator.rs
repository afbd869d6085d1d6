use async_trait::async_trait;
use std::io::{BufRead, Write};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// The human running the batch: OS notifications and yes/no prompts.
#[async_trait]
pub trait Operator: Send + Sync {
    /// Fire-and-forget; failures are swallowed.
    async fn notify(&self, title: &str, body: &str);

    async fn confirm(&self, question: &str) -> bool;
}

/// Host notification center plus an interactive stdin prompt.
pub struct ConsoleOperator;

#[async_trait]
impl Operator for ConsoleOperator {
    async fn notify(&self, title: &str, body: &str) {
        let mut cmd = if cfg!(target_os = "macos") {
            let script = format!(
                "display notification {} with title {}",
                applescript_quote(body),
                applescript_quote(title)
            );
            let mut cmd = Command::new("osascript");
            cmd.arg("-e").arg(script);
            cmd
        } else {
            let mut cmd = Command::new("notify-send");
            cmd.arg(title).arg(body);
            cmd
        };
        let status = cmd
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;
        if let Err(err) = status {
            debug!("notification not shown: {err}");
        }
    }

    async fn confirm(&self, question: &str) -> bool {
        let question = question.to_string();
        let answer = tokio::task::spawn_blocking(move || {
            print!("{question} (Y/n) ");
            let _ = std::io::stdout().flush();
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line).map(|_| line)
        })
        .await;
        match answer {
            Ok(Ok(line)) => is_affirmative(&line),
            _ => false,
        }
    }
}

/// Empty input defaults to yes.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(
        answer.trim().to_lowercase().as_str(),
        "" | "y" | "yes" | "e" | "evet"
    )
}

/// Renders `value` as an AppleScript string literal.
pub fn applescript_quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}
