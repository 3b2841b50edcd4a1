use thiserror::Error;

/// Main error type for the SignalTune tuning core
#[derive(Error, Debug)]
pub enum TuneError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Search timed out after {timeout_seconds} seconds")]
    Timeout { timeout_seconds: u64 },

    #[error("Search error: {0}")]
    Search(String),

    #[error("Invalid parameters for {model}: expected a mapping, found {found}")]
    InvalidParameterShape { model: String, found: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Parameter-store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Malformed record for {model_id}: {message}")]
    MalformedRecord { model_id: String, message: String },
}

/// Result type alias for tuning operations
pub type TuneResult<T> = Result<T, TuneError>;

/// Result type alias for parameter-store operations
pub type StoreResult<T> = Result<T, StoreError>;
