use thiserror::Error;

/// Core error types for gateway configuration
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid service name: {0:?}")]
    InvalidServiceName(String),

    #[error("Duplicate service name: {0}")]
    DuplicateServiceName(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("URL parsing error: {0}")]
    UrlError(#[from] url::ParseError),
}

impl CoreError {
    /// Create a new InvalidServiceName error
    pub fn invalid_service_name(name: impl Into<String>) -> Self {
        Self::InvalidServiceName(name.into())
    }

    /// Create a new DuplicateServiceName error
    pub fn duplicate_service_name(name: impl Into<String>) -> Self {
        Self::DuplicateServiceName(name.into())
    }

    /// Create a new Configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

/// Convenience result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
