//! Mock page sources for testing.
//!
//! This module is only available when the `test-utils` feature is enabled:
//!
//! ```toml
//! [dev-dependencies]
//! nvisy-cursor = { version = "...", features = ["test-utils"] }
//! ```
//!
//! - [`ScriptedSource`] replays a fixed list of pages regardless of the
//!   request, which makes request assertions straightforward.
//! - [`MemoryTable`] serves an in-memory table and honors `take`, `skip`,
//!   `cursor`, `select` and equality filters like a real store would.

mod memory;
mod scripted;

pub use memory::MemoryTable;
pub use scripted::ScriptedSource;
