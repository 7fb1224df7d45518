//! Error types for finmail.
//!
//! Decode failures and per-field extraction gaps are deliberately NOT
//! errors — they degrade to best-effort text and `None` fields inside the
//! pipeline. A missing amount surfaces as `process()` returning `None`,
//! never as an `Err`.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Entity model error: {0}")]
    Model(#[from] ModelError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Entity-tagger construction errors.
///
/// The tagger is built once at startup; a failure here is fatal for the
/// process, since extraction quality depends on the entity fallback.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Failed to compile entity pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Transaction-store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Store returned status {code}: {body}")]
    Status { code: u16, body: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        StoreError::Http(e.to_string())
    }
}

/// Pipeline boundary errors (mail fetch, batch poll).
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Mail fetch failed: {0}")]
    Fetch(String),

    #[error("Store write failed: {0}")]
    Store(#[from] StoreError),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
