//! Streaming adapter exposing a cursor pager as a [`futures::Stream`].

mod builder;
mod cursor_stream;
mod producer;
mod state;

pub use builder::CursorStreamBuilder;
pub use cursor_stream::CursorStream;
pub use state::StreamState;
