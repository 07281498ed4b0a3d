//! Query primitives: filter matching and sort ordering over documents.

/// Filter evaluation against a single document.
pub mod filter;
/// Total ordering of field values for cursor sorts.
pub mod ordering;

pub use filter::matches_filter;
pub use ordering::{compare_values, SortDirection};
