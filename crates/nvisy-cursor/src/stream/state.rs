//! Lifecycle states of a cursor stream.

use strum::{AsRefStr, Display, IntoStaticStr};

/// Lifecycle state of a [`CursorStream`] producer.
///
/// `Idle -> Fetching -> {Idle | Completed | Errored}`, with `Cancelled`
/// reachable from any non-terminal state. Terminal states are absorbing.
///
/// [`CursorStream`]: super::CursorStream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, AsRefStr, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum StreamState {
    /// Waiting for buffer capacity before the next fetch.
    #[default]
    Idle,
    /// A page fetch or transform is in flight.
    Fetching,
    /// A short page was emitted; no further fetches occur.
    Completed,
    /// A fetch or transform failed; the error was delivered to the consumer.
    Errored,
    /// The stream was cancelled or dropped by its consumer.
    Cancelled,
}

impl StreamState {
    /// Returns true for absorbing states.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Errored | Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(!StreamState::Idle.is_terminal());
        assert!(!StreamState::Fetching.is_terminal());
        assert!(StreamState::Completed.is_terminal());
        assert!(StreamState::Errored.is_terminal());
        assert!(StreamState::Cancelled.is_terminal());
    }

    #[test]
    fn display_is_snake_case() {
        assert_eq!(StreamState::Fetching.to_string(), "fetching");
        assert_eq!(StreamState::Cancelled.as_ref(), "cancelled");
    }
}
