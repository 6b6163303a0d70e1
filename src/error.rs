//! Error types for hotswap-store.

/// Result type alias for hotswap-store operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when working with the configuration store.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No configuration address was supplied.
    #[error("No configuration address supplied")]
    ConfigAddressMissing,

    /// No data source factory is registered for the address scheme.
    #[error("Unknown configuration scheme: {0}")]
    UnknownScheme(String),

    /// Source bytes could not be decoded into a table.
    #[error("Failed to decode configuration: {0}")]
    DecodeError(String),

    /// The requested key does not resolve to any value.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// The value under a key could not be deserialized into the target type.
    #[error("Failed to deserialize key '{key}': {message}")]
    DeserializationError {
        /// Key that was being decoded
        key: String,
        /// Underlying serde message
        message: String,
    },

    /// A data source failed to read or fetch its content.
    #[error("Data source error: {0}")]
    SourceError(String),

    /// The watch primitive of a data source failed to initialize.
    #[error("Watch error: {0}")]
    WatchError(String),

    /// IO error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Generic error for other cases.
    #[error("Configuration error: {0}")]
    Other(String),
}

impl ConfigError {
    /// Build a [`ConfigError::DecodeError`] from any displayable error.
    pub fn decode(err: impl std::fmt::Display) -> Self {
        Self::DecodeError(err.to_string())
    }

    /// Returns the key carried by an [`ConfigError::InvalidKey`] error.
    pub fn invalid_key(&self) -> Option<&str> {
        match self {
            Self::InvalidKey(key) => Some(key),
            _ => None,
        }
    }
}
