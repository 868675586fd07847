use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures every storage backend reports in the same shape.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No object exists at the requested key.
    #[error("Object not found: {key}")]
    NotFound { key: String },

    /// Any other provider or transport failure (auth, network, quota, bad request).
    #[error("{provider} backend error: {message}")]
    Backend {
        provider: String,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Missing or invalid options, rejected credentials, failed session setup.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Local filesystem failure while writing a download target.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification callers branch on instead of provider status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Backend,
    Configuration,
    Io,
}

impl StorageError {
    pub fn not_found(key: impl Into<String>) -> Self {
        StorageError::NotFound { key: key.into() }
    }

    /// Wrap a provider failure, keeping the original error as the source.
    pub fn backend<E>(provider: impl Into<String>, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StorageError::Backend {
            provider: provider.into(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    /// Provider failure with no underlying error value (e.g. an unexpected status).
    pub fn backend_msg(provider: impl Into<String>, message: impl Into<String>) -> Self {
        StorageError::Backend {
            provider: provider.into(),
            message: message.into(),
            source: None,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        StorageError::Configuration(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            StorageError::NotFound { .. } => ErrorKind::NotFound,
            StorageError::Backend { .. } => ErrorKind::Backend,
            StorageError::Configuration(_) => ErrorKind::Configuration,
            StorageError::Io(_) => ErrorKind::Io,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;
