//! Query specification and per-page request types.

mod find_many;
mod page_request;

pub use find_many::{FindManyArgs, Selection};
pub use page_request::{CursorAnchor, PageRequest};
