use thiserror::Error;

/// Core error type for the etlsmith domain layer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A flow definition could not be parsed
    #[error("Invalid flow definition: {0}")]
    InvalidDefinition(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Catalog lookup or construction error
    #[error("Catalog error: {0}")]
    CatalogError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for CoreError {
    fn from(err: serde_yaml::Error) -> Self {
        CoreError::SerializationError(err.to_string())
    }
}

impl From<String> for CoreError {
    fn from(err: String) -> Self {
        CoreError::Other(err)
    }
}

impl From<&str> for CoreError {
    fn from(err: &str) -> Self {
        CoreError::Other(err.to_string())
    }
}
