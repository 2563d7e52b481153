use thiserror::Error;

/// Top-level error type for the entire application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Ledger client error: {0}")]
    Client(#[from] ClientError),

    #[error("Wallet error: {0}")]
    Wallet(#[from] WalletError),

    #[error("Transaction encoding error: {0}")]
    Codec(#[from] CodecError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors raised by the WebSocket ledger client
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Connection closed by peer")]
    Closed,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Retries exhausted after {0} attempts")]
    RetriesExhausted(u32),

    #[error("Server rejected request: {0}")]
    Rejected(String),

    #[error("Malformed server response: {0}")]
    MalformedResponse(String),
}

/// Errors raised while decoding seeds or deriving key material
#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Invalid seed: must start with 's'")]
    BadSeedPrefix,

    #[error("Invalid seed: {0}")]
    InvalidSeed(String),

    #[error("Unsupported key algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

/// Errors raised by the canonical binary serializer
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Invalid currency code: {0}")]
    InvalidCurrency(String),

    #[error("Invalid account address: {0}")]
    InvalidAddress(String),

    #[error("Amount out of range: {0}")]
    AmountOutOfRange(String),
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        AppError::Internal(format!("JSON error: {:?}", error))
    }
}

/// Result type alias for the application
pub type AppResult<T> = Result<T, AppError>;
