//! Cursor stream configuration.
//!
//! Holds the defaults applied when a query specification leaves page size or
//! cursor field unset, and the buffer capacity of the streaming adapter.

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::{Error, Result, TRACING_TARGET_STREAM};

/// Page size used when the query specification does not set `take`.
pub const DEFAULT_TAKE: usize = 100;

/// Field used as the cursor when the query specification has no cursor seed.
pub const DEFAULT_IDENTITY_FIELD: &str = "id";

/// Largest buffer capacity a stream accepts.
///
/// Matches the permit limit of `tokio::sync::mpsc` bounded channels.
pub const MAX_BUFFER_CAPACITY: usize = usize::MAX >> 3;

/// Configuration shared by all cursor streams opened with it.
///
/// ## Example
///
/// ```rust
/// use nvisy_cursor::CursorConfig;
///
/// let config = CursorConfig::default()
///     .with_default_take(500)
///     .with_buffer_capacity(2_000);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "cursor configurations must be used to open streams"]
pub struct CursorConfig {
    /// Page size applied when the query does not specify `take`
    #[cfg_attr(
        feature = "config",
        arg(
            long = "cursor-default-take",
            env = "CURSOR_DEFAULT_TAKE",
            default_value = "100"
        )
    )]
    #[serde(default = "default_take")]
    pub default_take: usize,

    /// Maximum number of fetched records buffered ahead of the consumer
    /// (defaults to twice the page size)
    #[cfg_attr(
        feature = "config",
        arg(long = "cursor-buffer-capacity", env = "CURSOR_BUFFER_CAPACITY")
    )]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffer_capacity: Option<usize>,

    /// Field used as the cursor when the query has no cursor seed
    #[cfg_attr(
        feature = "config",
        arg(
            long = "cursor-identity-field",
            env = "CURSOR_IDENTITY_FIELD",
            default_value = "id"
        )
    )]
    #[serde(default = "default_identity_field")]
    pub identity_field: String,
}

fn default_take() -> usize {
    DEFAULT_TAKE
}

fn default_identity_field() -> String {
    DEFAULT_IDENTITY_FIELD.to_string()
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            default_take: DEFAULT_TAKE,
            buffer_capacity: None,
            identity_field: default_identity_field(),
        }
    }
}

impl CursorConfig {
    /// Sets the page size used when the query does not set `take`.
    pub fn with_default_take(mut self, take: usize) -> Self {
        self.default_take = take;
        self
    }

    /// Sets an explicit buffer capacity.
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = Some(capacity);
        self
    }

    /// Sets the identity field used when the query has no cursor seed.
    pub fn with_identity_field(mut self, field: impl Into<String>) -> Self {
        self.identity_field = field.into();
        self
    }

    /// Returns the buffer capacity for streams paging by `take` records.
    ///
    /// A missing or zero capacity falls back to `2 * take`.
    #[inline]
    pub fn buffer_capacity_for(&self, take: usize) -> usize {
        match self.buffer_capacity {
            Some(capacity) if capacity > 0 => capacity,
            _ => take.saturating_mul(2),
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.default_take == 0 {
            return Err(Error::invalid_config("default page size must be at least 1"));
        }

        if self.identity_field.is_empty() {
            return Err(Error::invalid_config("identity field must not be empty"));
        }

        if let Some(capacity) = self.buffer_capacity
            && capacity > MAX_BUFFER_CAPACITY
        {
            return Err(Error::invalid_config(format!(
                "buffer capacity {capacity} exceeds {MAX_BUFFER_CAPACITY}"
            )));
        }

        tracing::trace!(
            target: TRACING_TARGET_STREAM,
            default_take = self.default_take,
            buffer_capacity = ?self.buffer_capacity,
            identity_field = %self.identity_field,
            "Validated cursor configuration"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = CursorConfig::default();
        assert_eq!(config.default_take, 100);
        assert_eq!(config.buffer_capacity, None);
        assert_eq!(config.identity_field, "id");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn buffer_capacity_falls_back_to_twice_take() {
        let config = CursorConfig::default();
        assert_eq!(config.buffer_capacity_for(100), 200);

        let config = config.with_buffer_capacity(0);
        assert_eq!(config.buffer_capacity_for(25), 50);

        let config = config.with_buffer_capacity(7);
        assert_eq!(config.buffer_capacity_for(25), 7);
    }

    #[test]
    fn rejects_zero_take_and_empty_identity() {
        let config = CursorConfig::default().with_default_take(0);
        assert!(config.validate().unwrap_err().is_configuration());

        let config = CursorConfig::default().with_identity_field("");
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_oversized_buffer_capacity() {
        let config = CursorConfig::default().with_buffer_capacity(usize::MAX / 2);
        assert!(config.validate().unwrap_err().is_configuration());

        let config = CursorConfig::default().with_buffer_capacity(MAX_BUFFER_CAPACITY);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn deserializes_partial_json() {
        let config: CursorConfig =
            serde_json::from_str(r#"{"buffer_capacity": 64}"#).unwrap();
        assert_eq!(config.default_take, 100);
        assert_eq!(config.buffer_capacity, Some(64));
        assert_eq!(config.identity_field, "id");
    }
}
