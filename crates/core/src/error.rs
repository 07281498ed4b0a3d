//! Error type shared by the store and the progress engine.
//!
//! Every failure in the core is synchronous and caused by caller input or by
//! the shape of stored data; there is no transient I/O failure mode.

/// Errors produced by collection operations, the update applicator and the
/// progress engine built on top of them.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An insert carried an identity already present in the collection.
    #[error("document with id '{id}' already exists in collection '{collection}'")]
    DuplicateId { collection: String, id: String },

    /// An update tried to change a field that may not change after insert.
    #[error("field '{0}' is immutable")]
    ImmutableField(String),

    /// An operator met a stored value of a type it cannot work with.
    #[error("type mismatch on field '{field}': expected {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A dotted path was malformed or descended through a non-mapping value.
    #[error("invalid field path '{0}'")]
    InvalidPath(String),

    /// A JSON filter could not be parsed.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// A JSON update could not be parsed.
    #[error("invalid update: {0}")]
    InvalidUpdate(String),

    /// A document could not be built or carried an unusable identity.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// An integer increment left the representable range.
    #[error("integer overflow on field '{0}'")]
    Overflow(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
