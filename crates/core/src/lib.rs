//! # elysian-core
//!
//! Embeddable in-memory document store and the learner progress engine built
//! on top of it: experience and levels, daily streaks, weakness tracking and
//! answer recording for the Elysian language-learning backend.
//!
//! This is a synchronous library with no async dependencies. Request
//! handlers share one [`Database`] handle (it is cheap to clone) and call
//! into [`progress::ProgressService`] or the collections directly.

/// Injectable wall clock driving `$currentDate` and streak days.
pub mod clock;
/// Global configuration constants: collection names, rewards, and defaults.
pub mod config;
/// Core document types: `Document` struct and `Value` enum.
pub mod document;
/// Store error type shared by every fallible operation.
pub mod error;
/// Filter types used by search and storage layers.
pub mod filter_types;
/// Learner progress: XP, levels, streaks, weaknesses, and answers.
pub mod progress;
/// Query primitives: filter matching and value ordering.
pub mod search;
/// Storage layer: collections, database, cursors, and update operators.
pub mod storage;

pub use clock::{Clock, ManualClock, SystemClock};
pub use document::{Document, Value};
pub use error::{Result, StoreError};
pub use filter_types::{Condition, Filter};
pub use progress::ProgressService;
pub use search::SortDirection;
pub use storage::{Collection, Cursor, Database, Update};
