//! Storage layer: collections, the database that owns them, update operators
//! and query cursors.
//!
//! Data lives in-memory in `Collection` instances grouped by a `Database`.
//! Nothing is written to disk.

/// Collection and database data structures.
pub mod collection;
/// Lazy, re-scanning query cursors with sort and limit.
pub mod cursor;
/// Update operators (`$set`, `$inc`, `$currentDate`, `$max`).
pub mod update;

pub use collection::{Collection, Database};
pub use cursor::Cursor;
pub use update::{apply_update, Update};
