//! Cursor-paginated record streaming for the data layer.
//!
//! This crate turns a paginated "find many" capability into a continuous,
//! backpressure-aware [`futures::Stream`] of records, so large tables can be
//! exported, migrated or transformed without loading them into memory.
//!
//! # Architecture
//!
//! The stream is split into two parts:
//! - **Pager**: issues bounded page fetches anchored on the last seen cursor
//!   value, applies an optional batch transformer, detects the short page.
//! - **Stream**: runs the pager in a background task gated by a bounded
//!   buffer and exposes the records as a pull-based stream.
//!
//! Data stores plug in by implementing [`PageSource`].
//!
//! # Example
//!
//! ```rust,ignore
//! use futures::TryStreamExt;
//! use nvisy_cursor::{FindManyArgs, PageSourceExt, Selection};
//!
//! let args = FindManyArgs::new()
//!     .with_select(Selection::fields(["id", "email"]))
//!     .with_take(1_000);
//!
//! let emails: Vec<_> = source
//!     .cursor_stream_with(args, |rows| async move { Ok::<_, Error>(normalize(rows)) })?
//!     .try_collect()
//!     .await?;
//! ```

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

/// Tracing target for page fetches.
///
/// Use this target for logging page requests, page sizes and cursor advances.
pub const TRACING_TARGET_PAGER: &str = "nvisy_cursor::pager";

/// Tracing target for stream lifecycle.
///
/// Use this target for logging stream construction, completion, cancellation and errors.
pub const TRACING_TARGET_STREAM: &str = "nvisy_cursor::stream";

mod config;
mod error;
mod record;
mod source;
mod transform;

pub mod pager;
pub mod query;
pub mod stream;

#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub mod mock;

#[doc(hidden)]
pub mod prelude;

pub use config::{CursorConfig, DEFAULT_IDENTITY_FIELD, DEFAULT_TAKE, MAX_BUFFER_CAPACITY};
pub use error::{BoxedError, Error, ErrorKind, Result};
pub use query::{CursorAnchor, FindManyArgs, PageRequest, Selection};
pub use record::{CursorRecord, Record};
pub use source::{PageSource, PageSourceExt};
pub use stream::{CursorStream, CursorStreamBuilder, StreamState};
pub use transform::BatchTransformer;
