//! Error types for connector operations

/// Result type alias using the connector Error
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error raised by a host engine
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced through the connector contract
///
/// Host engine rejections are carried in [`Error::Host`] without
/// translation: `Display` and `source()` are those of the original error,
/// and [`Error::host_error`] recovers the concrete engine type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Rejection raised by the host engine
    #[error(transparent)]
    Host(BoxError),

    /// Invalid configuration parameter
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The host engine does not implement the requested operation
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl Error {
    /// Wrap a host engine error
    pub fn host<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Error::Host(err.into())
    }

    /// Borrow the host error as its concrete type, if it is one
    pub fn host_error<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        match self {
            Error::Host(err) => err.downcast_ref::<E>(),
            _ => None,
        }
    }

    /// Check if this error was raised by the host engine
    pub fn is_host_error(&self) -> bool {
        matches!(self, Error::Host(_))
    }

    /// Check if this error is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(self, Error::InvalidConfig(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}
