use thiserror::Error;

#[derive(Error, Debug)]
pub enum SentinelError {
    #[error("RPC error: {0}")]
    Rpc(String),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("Not found on chain")]
    NotFound,
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Retry budget exhausted: {0}")]
    RetryExhausted(String),
    #[error("Config error: {0}")]
    Config(String),
    #[error("Record store error: {0}")]
    Store(String),
    #[error("Decode error: {0}")]
    Decode(String),
}

impl SentinelError {
    /// Transient failures are worth retrying; everything else is definitive.
    pub fn is_transient(&self) -> bool {
        matches!(self, SentinelError::Rpc(_) | SentinelError::Http(_))
    }
}

impl From<reqwest::Error> for SentinelError {
    fn from(e: reqwest::Error) -> Self {
        SentinelError::Http(e.to_string())
    }
}
