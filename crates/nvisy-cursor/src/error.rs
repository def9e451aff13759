//! Error types for cursor streaming.

use strum::{AsRefStr, IntoStaticStr};

/// Type alias for boxed dynamic errors that can be sent across threads.
///
/// Page sources and batch transformers report their failures through this
/// type so that any backend error can be carried as the source of an [`Error`].
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for all cursor streaming operations in this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Categories of errors surfaced by a cursor stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// The stream could not be constructed from the given arguments.
    Configuration,
    /// The page source failed to return a page.
    Fetch,
    /// The batch transformer rejected a page.
    Transform,
    /// A fetched record could not be used as the next anchor.
    Cursor,
}

/// Unified error type for cursor streaming.
///
/// Configuration errors are returned synchronously when a stream is opened.
/// Every other variant terminates the stream it occurred in.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The field-selection clause omits the cursor field.
    #[error("Must select cursor field \"{field}\"")]
    MissingCursorField { field: String },

    /// Invalid stream configuration.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// The page source failed.
    #[error("Page fetch failed: {0}")]
    Fetch(#[source] BoxedError),

    /// The batch transformer failed.
    #[error("Batch transform failed: {0}")]
    Transform(#[source] BoxedError),

    /// The last record of a full page has no value for the cursor field.
    #[error("Record is missing a value for cursor field \"{field}\"")]
    MissingCursorValue { field: String },
}

impl Error {
    /// Create a missing cursor field error
    pub fn missing_cursor_field(field: impl Into<String>) -> Self {
        Self::MissingCursorField {
            field: field.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create a fetch error wrapping the page source failure
    pub fn fetch(source: impl Into<BoxedError>) -> Self {
        Self::Fetch(source.into())
    }

    /// Create a transform error wrapping the transformer failure
    pub fn transform(source: impl Into<BoxedError>) -> Self {
        Self::Transform(source.into())
    }

    /// Create a missing cursor value error
    pub fn missing_cursor_value(field: impl Into<String>) -> Self {
        Self::MissingCursorValue {
            field: field.into(),
        }
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingCursorField { .. } | Self::InvalidConfig { .. } => {
                ErrorKind::Configuration
            }
            Self::Fetch(_) => ErrorKind::Fetch,
            Self::Transform(_) => ErrorKind::Transform,
            Self::MissingCursorValue { .. } => ErrorKind::Cursor,
        }
    }

    /// Returns the error kind as a string.
    pub fn kind_str(&self) -> &'static str {
        self.kind().into()
    }

    /// Returns true if the error was raised before any page was fetched.
    pub fn is_configuration(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }
}
