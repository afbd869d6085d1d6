use crate::config::BackendConfig;
use crate::error::FetchError;
use crate::types::{Reminder, ReminderEnvelope};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use std::time::Duration;
use tracing::{error, info};

#[async_trait]
pub trait ReminderSource: Send + Sync {
    /// Never fails: problems are logged and yield an empty list.
    async fn fetch(&self, date: NaiveDate) -> Vec<Reminder>;
}

pub struct BackendClient {
    client: Client,
    config: BackendConfig,
}

impl BackendClient {
    pub fn new(config: BackendConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self { client, config })
    }

    pub async fn try_fetch(&self, date: NaiveDate) -> Result<Vec<Reminder>, FetchError> {
        let url = self.config.api_url.as_deref().ok_or(FetchError::MissingUrl)?;
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(FetchError::MissingApiKey)?;

        let date = date.format("%Y-%m-%d").to_string();
        let resp = self
            .client
            .get(url)
            .query(&[
                ("action", self.config.action.as_str()),
                ("date", date.as_str()),
                ("apiKey", api_key),
            ])
            .send()
            .await?;

        let body = resp.text().await?;
        let envelope: ReminderEnvelope = serde_json::from_str(&body)?;
        if !envelope.success {
            return Err(FetchError::Backend(
                envelope.error.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        Ok(envelope.data.unwrap_or_default())
    }
}

#[async_trait]
impl ReminderSource for BackendClient {
    async fn fetch(&self, date: NaiveDate) -> Vec<Reminder> {
        info!("fetching reminders for {date}");
        match self.try_fetch(date).await {
            Ok(reminders) => {
                info!("backend returned {} reminders", reminders.len());
                reminders
            }
            Err(err) => {
                error!("reminder fetch failed: {err}");
                Vec::new()
            }
        }
    }
}
