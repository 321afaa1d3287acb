use thiserror::Error;

/// Top-level error type for Culina.
///
/// Subsystem crates define their own error types and implement
/// `From<SubsystemError> for CulinaError` so that `?` works across crate
/// boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CulinaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<toml::de::Error> for CulinaError {
    fn from(err: toml::de::Error) -> Self {
        CulinaError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for CulinaError {
    fn from(err: toml::ser::Error) -> Self {
        CulinaError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for CulinaError {
    fn from(err: serde_json::Error) -> Self {
        CulinaError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Culina operations.
pub type Result<T> = std::result::Result<T, CulinaError>;
