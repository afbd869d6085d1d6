use crate::config::DispatchConfig;
use crate::drivers::DeliveryDriver;
use crate::error::{DispatchError, DriverError, LinkError};
use crate::fetcher::ReminderSource;
use crate::link::decode_link;
use crate::operator::Operator;
use crate::phone::normalize_phone;
use crate::types::{DispatchResult, Reminder, RunOutcome};
use chrono::NaiveDate;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info};

pub const NOTIFICATION_TITLE: &str = "WhatsApp Reminder";

/// Fetches the day's reminders and pushes each one through a delivery driver.
pub struct Dispatcher {
    config: DispatchConfig,
    source: Box<dyn ReminderSource>,
    driver: Box<dyn DeliveryDriver>,
    operator: Box<dyn Operator>,
}

impl Dispatcher {
    pub fn new(
        config: DispatchConfig,
        source: Box<dyn ReminderSource>,
        driver: Box<dyn DeliveryDriver>,
        operator: Box<dyn Operator>,
    ) -> Self {
        Self {
            config,
            source,
            driver,
            operator,
        }
    }

    pub async fn run(&mut self, date: NaiveDate) -> Result<RunOutcome, DispatchError> {
        self.run_until(date, std::future::pending()).await
    }

    /// Like [`Dispatcher::run`], but stops early once `shutdown` resolves.
    /// The driver is closed exactly once on every path after it was acquired.
    pub async fn run_until<F>(
        &mut self,
        date: NaiveDate,
        shutdown: F,
    ) -> Result<RunOutcome, DispatchError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let reminders = tokio::select! {
            biased;
            reminders = self.source.fetch(date) => reminders,
            _ = &mut shutdown => return Ok(interrupted_before_start()),
        };
        if reminders.is_empty() {
            println!("No appointments found for {date}");
            self.operator
                .notify(NOTIFICATION_TITLE, "No appointments found for this date")
                .await;
            return Ok(RunOutcome::NothingToDo);
        }

        print_manifest(&reminders, self.config.between_messages_seconds);

        if self.config.require_confirmation {
            let accepted = tokio::select! {
                accepted = self.operator.confirm("Continue?") => accepted,
                _ = &mut shutdown => return Ok(interrupted_before_start()),
            };
            if !accepted {
                println!("Cancelled");
                return Ok(RunOutcome::Declined);
            }
        }

        println!(
            "Starting in {} seconds...",
            self.config.preflight_delay_seconds
        );
        tokio::select! {
            _ = sleep(Duration::from_secs(self.config.preflight_delay_seconds)) => {}
            _ = &mut shutdown => return Ok(interrupted_before_start()),
        }

        let mut tally = DispatchResult::default();
        let delivered = tokio::select! {
            res = deliver_all(
                self.driver.as_mut(),
                self.operator.as_ref(),
                &self.config,
                &reminders,
                &mut tally,
            ) => Some(res),
            _ = &mut shutdown => None,
        };

        let outcome = match delivered {
            Some(Ok(())) => {
                print_summary(&tally);
                self.operator
                    .notify(
                        NOTIFICATION_TITLE,
                        &format!("{} sent, {} failed", tally.succeeded, tally.failed),
                    )
                    .await;
                sleep(Duration::from_secs(self.config.closing_delay_seconds)).await;
                Ok(RunOutcome::Completed(tally))
            }
            Some(Err(err)) => Err(DispatchError::from(err)),
            None => {
                println!("Cancelled by user");
                print_summary(&tally);
                Ok(RunOutcome::Interrupted(tally))
            }
        };

        self.driver.close().await;
        outcome
    }
}

fn interrupted_before_start() -> RunOutcome {
    println!("Cancelled by user");
    RunOutcome::Interrupted(DispatchResult::default())
}

async fn deliver_all(
    driver: &mut dyn DeliveryDriver,
    operator: &dyn Operator,
    config: &DispatchConfig,
    reminders: &[Reminder],
    tally: &mut DispatchResult,
) -> Result<(), DriverError> {
    driver.start(operator).await?;
    println!("Sending messages...");

    let total = reminders.len();
    for (i, reminder) in reminders.iter().enumerate() {
        println!("\n[{}/{}] {}", i + 1, total, reminder.customer_name);
        let sent = match decode_link(&reminder.link) {
            // An empty phone segment would normalize to the bare country code.
            Ok(decoded) if !decoded.phone.chars().any(|c| c.is_ascii_digit()) => {
                let err = LinkError::MissingPhone {
                    link: reminder.link.clone(),
                };
                error!("skipping {}: {err}", reminder.customer_name);
                false
            }
            Ok(decoded) => {
                let phone = normalize_phone(&decoded.phone);
                driver
                    .deliver(&phone, &decoded.message, &reminder.customer_name)
                    .await
            }
            Err(err) => {
                error!("skipping {}: {err}", reminder.customer_name);
                false
            }
        };
        tally.record(sent);
        info!(
            "{} processed ({} sent, {} failed)",
            tally.total(),
            tally.succeeded,
            tally.failed
        );

        if i + 1 < total && config.between_messages_seconds > 0 {
            println!("  waiting {} seconds...", config.between_messages_seconds);
            sleep(Duration::from_secs(config.between_messages_seconds)).await;
        }
    }
    Ok(())
}

pub fn estimated_minutes(count: usize, between_messages_seconds: u64) -> u64 {
    count as u64 * between_messages_seconds / 60
}

fn print_manifest(reminders: &[Reminder], between_messages_seconds: u64) {
    println!("\n{} customers will be messaged:", reminders.len());
    for (i, reminder) in reminders.iter().enumerate() {
        println!("  {}. {} - {}", i + 1, reminder.customer_name, reminder.start_time);
    }
    println!(
        "\nEstimated time: ~{} minutes",
        estimated_minutes(reminders.len(), between_messages_seconds)
    );
}

fn print_summary(tally: &DispatchResult) {
    println!("\n{}", "=".repeat(50));
    println!("DONE");
    println!("{}", "=".repeat(50));
    println!("Sent:   {}", tally.succeeded);
    println!("Failed: {}", tally.failed);
    println!("Total:  {}", tally.total());
}
