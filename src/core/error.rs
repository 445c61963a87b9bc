use std::fmt;

use crate::client::ClientError;
use crate::core::config::ConfigError;

/// Any failure that ends up on the error screen.
#[derive(Debug)]
pub enum AppError {
    Client(ClientError),
    Config(ConfigError),
    Clipboard(String),
    /// A state the code does not expect to reach, reported instead of panicking.
    Invariant(String),
}

impl AppError {
    /// True when the error only signals cancelled work.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, AppError::Client(ClientError::Cancelled))
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Client(e) => write!(f, "{e}"),
            AppError::Config(e) => write!(f, "{e}"),
            AppError::Clipboard(msg) => write!(f, "clipboard error: {msg}"),
            AppError::Invariant(msg) => write!(f, "unexpected state: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<ClientError> for AppError {
    fn from(e: ClientError) -> Self {
        AppError::Client(e)
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::Config(e)
    }
}
