use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use std::future::Future;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;
use whatsapp_reminder::config::load_config;
use whatsapp_reminder::dispatch::NOTIFICATION_TITLE;
use whatsapp_reminder::{
    build_driver, BackendClient, ConsoleOperator, DispatchError, Dispatcher, Operator, RunOutcome,
};

/// Sends today's appointment reminders over WhatsApp.
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    /// Appointment date (YYYY-MM-DD), defaults to today
    date: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            let body = match err.downcast_ref::<DispatchError>() {
                Some(DispatchError::Login(_)) => "WhatsApp Web login failed",
                _ => "The reminder run stopped with an unexpected error",
            };
            println!("\nError: {err:#}");
            ConsoleOperator.notify("Error", body).await;
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("whatsapp_reminder=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<RunOutcome> {
    let date = match cli.date.as_deref() {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .with_context(|| format!("invalid date {raw:?}, expected YYYY-MM-DD"))?,
        None => Local::now().date_naive(),
    };

    let config = load_config();
    println!("\n{}", "=".repeat(50));
    println!("{NOTIFICATION_TITLE} ({} mode)", config.dispatch.driver);
    println!("{}", "=".repeat(50));
    println!("\nDate: {date}");
    if !config.dispatch.require_confirmation {
        println!("Automatic mode: messages are sent without confirmation");
    }

    let source = BackendClient::new(config.backend.clone())?;
    let mut dispatcher = Dispatcher::new(
        config.dispatch.clone(),
        Box::new(source),
        build_driver(&config),
        Box::new(ConsoleOperator),
    );

    let shutdown = interrupt_signal().await;
    let outcome = dispatcher.run_until(date, shutdown).await?;
    Ok(outcome)
}

/// Resolves on Ctrl-C. The handler is live once this returns, so an interrupt
/// during the fetch or the prompt reaches the dispatcher instead of killing
/// the process.
async fn interrupt_signal() -> impl Future<Output = ()> {
    let mut ctrl_c = Box::pin(tokio::signal::ctrl_c());
    // The first poll registers the handler.
    let early = tokio::select! {
        biased;
        res = &mut ctrl_c => Some(res),
        _ = std::future::ready(()) => None,
    };
    async move {
        let res = match early {
            Some(res) => res,
            None => ctrl_c.await,
        };
        if res.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
