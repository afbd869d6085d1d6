use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("backend url is not configured")]
    MissingUrl,
    #[error("API key missing")]
    MissingApiKey,
    #[error("backend request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend returned invalid JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("malformed link {link:?}: expected at least 4 path segments")]
    Malformed { link: String },
    #[error("link {link:?} carries no phone digits")]
    MissingPhone { link: String },
}

#[derive(Debug, Error)]
pub enum WebDriverError {
    #[error("webdriver request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("webdriver error {status}: {error}: {message}")]
    Protocol {
        status: u16,
        error: String,
        message: String,
    },
    #[error("webdriver response missing {0}")]
    UnexpectedResponse(&'static str),
    #[error("no webdriver session")]
    NoSession,
    #[error("element {selector:?} did not appear within {timeout:?}")]
    ElementTimeout { selector: String, timeout: Duration },
}

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("login was not completed within {0:?}")]
    LoginTimeout(Duration),
    #[error("driver is not started")]
    NotStarted,
    #[error("could not launch {app}: {source}")]
    Launch {
        app: String,
        source: anyhow::Error,
    },
    #[error(transparent)]
    WebDriver(#[from] WebDriverError),
    #[error("delivery failed: {0}")]
    Delivery(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("login failed: {0}")]
    Login(DriverError),
    #[error("could not start delivery driver: {0}")]
    Driver(DriverError),
}

impl From<DriverError> for DispatchError {
    fn from(err: DriverError) -> Self {
        match err {
            DriverError::LoginTimeout(_) => DispatchError::Login(err),
            other => DispatchError::Driver(other),
        }
    }
}
