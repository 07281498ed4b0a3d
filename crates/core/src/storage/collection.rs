//! Collection and database data structures.
//!
//! A [`Collection`] holds the documents of one named collection behind a
//! single `RwLock`; every public operation takes the lock exactly once, so
//! each operation is atomic with respect to the others on that collection.
//! [`Database`] manages named collections, creating them on first reference.

use crate::clock::{Clock, SystemClock};
use crate::config::ID_FIELD;
use crate::document::{Document, Value};
use crate::error::{Result, StoreError};
use crate::filter_types::Filter;
use crate::search::matches_filter;
use crate::storage::cursor::Cursor;
use crate::storage::update::{apply_update, Update};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Internal data for a collection, protected by a `RwLock`.
#[derive(Debug, Default)]
pub struct CollectionData {
    pub name: String,
    /// Documents in insertion order. Scans iterate in this order.
    pub documents: Vec<Arc<Document>>,
    /// Identity → index into `documents`.
    pub id_to_position: HashMap<String, usize>,
}

impl CollectionData {
    pub fn new(name: String) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    fn position_of_first(&self, filter: &Filter) -> Option<usize> {
        self.documents
            .iter()
            .position(|doc| matches_filter(doc, filter))
    }

    /// Checks that the identity index agrees with the document list.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.id_to_position.len() != self.documents.len() {
            return Err(format!(
                "Collection '{}': {} documents but {} indexed ids",
                self.name,
                self.documents.len(),
                self.id_to_position.len()
            ));
        }
        for (id, &pos) in &self.id_to_position {
            match self.documents.get(pos).and_then(|d| d.id()) {
                Some(stored) if stored == id => {}
                _ => {
                    return Err(format!(
                        "Collection '{}': id '{}' does not point at its document",
                        self.name, id
                    ))
                }
            }
        }
        Ok(())
    }
}

/// A thread-safe handle to one collection.
///
/// Cloning a `Collection` produces a new handle to the same shared data.
#[derive(Debug, Clone)]
pub struct Collection {
    pub data: Arc<RwLock<CollectionData>>,
    clock: Arc<dyn Clock>,
}

impl Collection {
    /// Creates a new empty collection.
    pub fn new(name: String, clock: Arc<dyn Clock>) -> Self {
        Self {
            data: Arc::new(RwLock::new(CollectionData::new(name))),
            clock,
        }
    }

    pub fn name(&self) -> String {
        self.data.read().name.clone()
    }

    /// Returns the first document (in insertion order) matching the filter.
    pub fn find_one(&self, filter: &Filter) -> Option<Arc<Document>> {
        let data = self.data.read();
        data.position_of_first(filter)
            .map(|pos| Arc::clone(&data.documents[pos]))
    }

    /// Point lookup by identity.
    pub fn get_by_id(&self, id: &str) -> Option<Arc<Document>> {
        let data = self.data.read();
        data.id_to_position
            .get(id)
            .map(|&pos| Arc::clone(&data.documents[pos]))
    }

    /// Inserts a document and returns its identity.
    ///
    /// A document without an identity is assigned a fresh UUID v4. A
    /// non-string identity, or one already present in the collection, is
    /// rejected and nothing is written.
    pub fn insert_one(&self, mut doc: Document) -> Result<String> {
        let id = match doc.get(ID_FIELD) {
            None => {
                let id = Uuid::new_v4().to_string();
                doc.insert(ID_FIELD, id.clone());
                id
            }
            Some(Value::String(id)) => id.clone(),
            Some(other) => {
                return Err(StoreError::InvalidDocument(format!(
                    "identity must be a string, got {}",
                    other.type_name()
                )))
            }
        };

        let mut data = self.data.write();
        if data.id_to_position.contains_key(&id) {
            return Err(StoreError::DuplicateId {
                collection: data.name.clone(),
                id,
            });
        }
        let position = data.documents.len();
        data.documents.push(Arc::new(doc));
        data.id_to_position.insert(id.clone(), position);
        tracing::debug!(collection = %data.name, id = %id, "Inserted document");
        Ok(id)
    }

    /// Applies `update` to the first document matching `filter`.
    ///
    /// Returns `Ok(false)` when nothing matched. The update is applied to a
    /// copy and committed only if every operator succeeds, so a failed update
    /// leaves the stored document untouched.
    pub fn update_one(&self, filter: &Filter, update: &Update) -> Result<bool> {
        self.update_one_with(filter, |_| Ok((update.clone(), ())))
            .map(|applied| applied.is_some())
    }

    /// Read-modify-write on the first document matching `filter`.
    ///
    /// `build` sees the current document and returns the update to apply plus
    /// a caller-defined result. Reading, building and committing all happen
    /// under one write lock. Returns `Ok(None)` when nothing matched; an error
    /// from `build` or from the update leaves the document untouched.
    pub fn update_one_with<T, F>(&self, filter: &Filter, build: F) -> Result<Option<T>>
    where
        F: FnOnce(&Document) -> Result<(Update, T)>,
    {
        let mut data = self.data.write();
        let Some(pos) = data.position_of_first(filter) else {
            tracing::debug!(collection = %data.name, "update matched no document");
            return Ok(None);
        };

        let (update, outcome) = build(data.documents[pos].as_ref())?;
        let mut working = Document::clone(&data.documents[pos]);
        apply_update(&mut working, &update, self.clock.now())?;
        data.documents[pos] = Arc::new(working);
        Ok(Some(outcome))
    }

    /// Number of documents matching the filter.
    pub fn count_documents(&self, filter: &Filter) -> usize {
        self.data
            .read()
            .documents
            .iter()
            .filter(|doc| matches_filter(doc, filter))
            .count()
    }

    /// Starts a cursor over the documents matching `filter`.
    pub fn find(&self, filter: Filter) -> Cursor {
        Cursor::new(self.clone(), filter)
    }

    /// Snapshot of all matching documents in insertion order, taken under one
    /// read lock.
    pub(crate) fn scan(&self, filter: &Filter) -> Vec<Arc<Document>> {
        self.data
            .read()
            .documents
            .iter()
            .filter(|doc| matches_filter(doc, filter))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.data.read().documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Database holds all collections and the clock they stamp time with.
///
/// Constructed once at process start and shared by handle; clones refer to
/// the same collections.
#[derive(Debug, Clone)]
pub struct Database {
    pub collections: Arc<RwLock<HashMap<String, Collection>>>,
    clock: Arc<dyn Clock>,
}

impl Default for Database {
    fn default() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }
}

impl Database {
    /// Creates a new empty database on the system clock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new empty database on the given clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            collections: Arc::new(RwLock::new(HashMap::new())),
            clock,
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Returns a handle to the named collection, creating it if needed.
    pub fn collection(&self, name: &str) -> Collection {
        if let Some(existing) = self.collections.read().get(name) {
            return existing.clone();
        }
        let mut collections = self.collections.write();
        collections
            .entry(name.to_string())
            .or_insert_with(|| {
                tracing::debug!(collection = %name, "Created collection");
                Collection::new(name.to_string(), Arc::clone(&self.clock))
            })
            .clone()
    }

    /// Returns the names of all collections, sorted.
    pub fn list_collections(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.read().keys().cloned().collect();
        names.sort();
        names
    }
}
