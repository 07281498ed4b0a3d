//! Lazy query cursors.
//!
//! A [`Cursor`] records a filter plus optional sort and limit and only reads
//! the collection when [`Cursor::to_list`] is called. Each call re-scans the
//! live collection, so two calls may return different documents if writes
//! happened in between.

use crate::document::Document;
use crate::filter_types::Filter;
use crate::search::ordering::sort_key;
use crate::search::{compare_values, SortDirection};
use crate::storage::collection::Collection;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Cursor {
    collection: Collection,
    filter: Filter,
    sort: Option<(String, SortDirection)>,
    limit: Option<usize>,
}

impl Cursor {
    pub(crate) fn new(collection: Collection, filter: Filter) -> Self {
        Self {
            collection,
            filter,
            sort: None,
            limit: None,
        }
    }

    /// Orders results by `field`. Documents without the field sort as if it
    /// held integer zero; equal keys keep insertion order.
    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort = Some((field.into(), direction));
        self
    }

    /// Caps the number of results. A limit of zero means no limit.
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = if n == 0 { None } else { Some(n) };
        self
    }

    /// Materializes at most `max_count` documents.
    ///
    /// Pipeline: filter → sort → limit → truncate to `max_count`. An empty
    /// collection (or an empty match set) yields an empty list.
    pub fn to_list(&self, max_count: usize) -> Vec<Arc<Document>> {
        let mut results = self.collection.scan(&self.filter);

        if let Some((field, direction)) = &self.sort {
            // sort_by is stable: ties stay in insertion order in both directions.
            results.sort_by(|a, b| {
                let ord = compare_values(&sort_key(a, field), &sort_key(b, field));
                match direction {
                    SortDirection::Ascending => ord,
                    SortDirection::Descending => ord.reverse(),
                }
            });
        }

        if let Some(limit) = self.limit {
            results.truncate(limit);
        }
        results.truncate(max_count);
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;
    use serde_json::json;

    fn weaknesses(freqs: &[i64]) -> Collection {
        let col = Database::new().collection("user_weaknesses");
        for (i, f) in freqs.iter().enumerate() {
            col.insert_one(
                Document::from_json(json!({
                    "id": format!("w{}", i),
                    "user_id": "u1",
                    "frequency": f,
                }))
                .unwrap(),
            )
            .unwrap();
        }
        col
    }

    fn ids(docs: &[Arc<Document>]) -> Vec<String> {
        docs.iter().filter_map(|d| d.id().map(String::from)).collect()
    }

    #[test]
    fn test_sort_desc_limit() {
        let col = weaknesses(&[5, 1, 3]);
        let docs = col
            .find(Filter::all())
            .sort("frequency", SortDirection::Descending)
            .limit(2)
            .to_list(10);
        let freqs: Vec<i64> = docs.iter().filter_map(|d| d.get_i64("frequency")).collect();
        assert_eq!(freqs, vec![5, 3]);
    }

    #[test]
    fn test_sort_ascending() {
        let col = weaknesses(&[5, 1, 3]);
        let docs = col
            .find(Filter::all())
            .sort("frequency", SortDirection::Ascending)
            .to_list(10);
        assert_eq!(ids(&docs), vec!["w1", "w2", "w0"]);
    }

    #[test]
    fn test_unsorted_keeps_insertion_order() {
        let col = weaknesses(&[2, 9, 4]);
        assert_eq!(ids(&col.find(Filter::all()).to_list(10)), vec!["w0", "w1", "w2"]);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let col = weaknesses(&[2, 7, 2, 7]);
        let docs = col
            .find(Filter::all())
            .sort("frequency", SortDirection::Descending)
            .to_list(10);
        assert_eq!(ids(&docs), vec!["w1", "w3", "w0", "w2"]);
    }

    #[test]
    fn test_missing_sort_field_sorts_as_zero() {
        let col = weaknesses(&[-1, 1]);
        col.insert_one(Document::with_id("bare")).unwrap();
        let docs = col
            .find(Filter::all())
            .sort("frequency", SortDirection::Ascending)
            .to_list(10);
        assert_eq!(ids(&docs), vec!["w0", "bare", "w1"]);
    }

    #[test]
    fn test_sort_on_field_absent_from_first_result() {
        let col = Database::new().collection("c");
        col.insert_one(Document::with_id("a")).unwrap();
        col.insert_one(Document::with_id("b").with("rank", 3i64)).unwrap();
        let docs = col
            .find(Filter::all())
            .sort("rank", SortDirection::Descending)
            .to_list(10);
        assert_eq!(ids(&docs), vec!["b", "a"]);
    }

    #[test]
    fn test_empty_collection_with_sort() {
        let col = Database::new().collection("empty");
        let docs = col
            .find(Filter::all())
            .sort("frequency", SortDirection::Descending)
            .limit(3)
            .to_list(3);
        assert!(docs.is_empty());
    }

    #[test]
    fn test_max_count_truncates_after_limit() {
        let col = weaknesses(&[1, 2, 3, 4]);
        let docs = col.find(Filter::all()).limit(3).to_list(2);
        assert_eq!(docs.len(), 2);
        let docs = col.find(Filter::all()).limit(0).to_list(10);
        assert_eq!(docs.len(), 4);
    }

    #[test]
    fn test_rescans_live_state() {
        let col = weaknesses(&[1]);
        let cursor = col.find(Filter::all().eq("user_id", "u1"));
        assert_eq!(cursor.to_list(10).len(), 1);
        col.insert_one(
            Document::from_json(json!({"id": "late", "user_id": "u1", "frequency": 9})).unwrap(),
        )
        .unwrap();
        assert_eq!(cursor.to_list(10).len(), 2);
    }
}
