pub mod config;
pub mod dispatch;
pub mod drivers;
pub mod error;
pub mod fetcher;
pub mod link;
pub mod operator;
pub mod phone;
pub mod types;

pub use config::Config;
pub use dispatch::Dispatcher;
pub use drivers::{build_driver, DeliveryDriver, DriverKind};
pub use error::{DispatchError, DriverError, FetchError, LinkError};
pub use fetcher::{BackendClient, ReminderSource};
pub use operator::{ConsoleOperator, Operator};
pub use types::{DispatchResult, Reminder, RunOutcome};
