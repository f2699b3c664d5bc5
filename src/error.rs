//! Error handling for the load collector crate.

/// A specialized `Result` type for load collector operations.
pub type Result<T> = std::result::Result<T, LoadError>;

/// The main error type for load collector operations.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The number of logical CPUs could not be determined
    #[error("Failed to resolve CPU count: {0}")]
    Resolution(String),

    /// The load source could not be sampled
    #[error("Failed to sample load source: {0}")]
    Source(String),

    /// The load source produced a reading that does not parse
    #[error("Wrong load source format: {message} (raw: {raw:?})")]
    Format {
        /// What was wrong with the reading
        message: String,
        /// The offending raw content
        raw: String,
    },

    /// A requested namespace is malformed or names no known metric
    #[error("Invalid namespace {namespace}: {reason}")]
    Namespace {
        /// The offending namespace, rendered as a string
        namespace: String,
        /// Why it was rejected
        reason: String,
    },

    /// A field name does not exist on the load sample
    #[error("Requested stat {0} is not available")]
    UnknownField(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl LoadError {
    /// Create a new CPU count resolution error
    pub fn resolution_error(msg: impl Into<String>) -> Self {
        Self::Resolution(msg.into())
    }

    /// Create a new load source error
    pub fn source_error(msg: impl Into<String>) -> Self {
        Self::Source(msg.into())
    }

    /// Create a new format error carrying the raw reading
    pub fn format_error(msg: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::Format {
            message: msg.into(),
            raw: raw.into(),
        }
    }

    /// Create a new namespace error
    pub fn namespace_error(namespace: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Namespace {
            namespace: namespace.into(),
            reason: reason.into(),
        }
    }

    /// Create a new configuration error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error came from sampling the load source.
    ///
    /// Format errors are a kind of source error.
    pub fn is_source_error(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Source(_) | Self::Format { .. })
    }
}
