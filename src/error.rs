use thiserror::Error;

/// Single error taxonomy for everything above the detector layer. Detectors never return
/// this — they return `Option`/`Vec` of results, never an error, for any non-match input.
#[derive(Debug, Error)]
pub enum SentinelError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("persistence failure: {0}")]
    Persistence(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("lifecycle error: {0}")]
    Lifecycle(String),
}

pub type Result<T> = std::result::Result<T, SentinelError>;
