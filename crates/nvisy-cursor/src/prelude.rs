//! Convenient re-exports for common use.

pub use crate::config::{CursorConfig, MAX_BUFFER_CAPACITY};
pub use crate::error::{BoxedError, Error, ErrorKind, Result};
pub use crate::query::{CursorAnchor, FindManyArgs, PageRequest, Selection};
pub use crate::record::{CursorRecord, Record};
pub use crate::source::{PageSource, PageSourceExt};
pub use crate::stream::{CursorStream, CursorStreamBuilder, StreamState};
pub use crate::transform::BatchTransformer;
