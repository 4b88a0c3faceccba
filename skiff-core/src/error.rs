use thiserror::Error;

/// Every failure surfaced by Skiff.
///
/// Provider failures are wrapped exactly once into [`Error::Execution`], the
/// original error stays reachable through [`std::error::Error::source`].
#[derive(Debug, Error)]
pub enum Error {
    /// The session or transaction was already disposed.
    #[error("Cannot access a disposed {0}")]
    Disposed(&'static str),

    /// Operation not allowed in the current state (for example committing twice).
    #[error("Invalid operation: {0}")]
    InvalidState(String),

    /// A required argument is missing or invalid.
    #[error("Invalid argument `{parameter}`: {message}")]
    Argument {
        parameter: &'static str,
        message: String,
    },

    /// The statement could not be built (placeholder count mismatch, unsupported feature).
    #[error("Statement error: {0}")]
    Statement(String),

    /// The mapping metadata is invalid or a value could not be mapped.
    #[error("Mapping error: {0}")]
    Mapping(String),

    /// The provider failed while opening, executing or reading.
    #[error("{message}")]
    Execution {
        message: String,
        #[source]
        source: anyhow::Error,
    },

    /// Zero rows affected by a statement guarded by a version column.
    #[error("Optimistic concurrency violation: {0}")]
    Concurrency(String),

    /// The operation was cancelled before it completed.
    #[error("The operation was cancelled")]
    Cancelled,

    /// The session factory could not be configured.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl Error {
    pub fn argument(parameter: &'static str, message: impl Into<String>) -> Self {
        Error::Argument {
            parameter,
            message: message.into(),
        }
    }

    pub fn argument_null(parameter: &'static str) -> Self {
        Error::argument(parameter, "value cannot be null or empty")
    }

    /// Wrap a provider error, the message is copied from the original.
    ///
    /// Errors that already are a Skiff [`Error`] (travelling inside an `anyhow::Error`) are
    /// returned as they are instead of being wrapped a second time.
    pub fn execution(source: anyhow::Error) -> Self {
        match source.downcast::<Error>() {
            Ok(error) => error,
            Err(source) => {
                let message = source.to_string();
                log::error!("{:#}", source);
                Error::Execution { message, source }
            }
        }
    }

    pub fn is_concurrency(&self) -> bool {
        matches!(self, Error::Concurrency(..))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
