//! Weakness tracking.
//!
//! A weakness is a (uid, type, item) triple with an occurrence count. Each
//! triple maps to a deterministic document identity (UUID v5 over the
//! triple), so two racing first occurrences cannot create two records: the
//! loser of the insert race gets a duplicate-id error and folds into an
//! increment instead.

use crate::config::{
    LESSON_WEAKNESS_COUNT, MAX_RECOMMENDATIONS, RECOMMENDATION_WEAKNESS_COUNT,
};
use crate::document::Document;
use crate::error::{Result, StoreError};
use crate::filter_types::Filter;
use crate::progress::{read_count, ProgressService};
use crate::search::SortDirection;
use crate::storage::Update;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

pub const USER_FIELD: &str = "user_id";
pub const TYPE_FIELD: &str = "type";
pub const ITEM_FIELD: &str = "item";
pub const FREQUENCY_FIELD: &str = "frequency";
pub const LAST_ENCOUNTERED_FIELD: &str = "last_encountered";

/// Typed view of a weakness record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Weakness {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub item: String,
    pub frequency: u64,
    pub last_encountered: Option<DateTime<Utc>>,
}

impl Weakness {
    pub fn from_document(doc: &Document) -> Result<Self> {
        Ok(Self {
            id: doc.id().unwrap_or_default().to_string(),
            user_id: doc.get_str(USER_FIELD).unwrap_or_default().to_string(),
            kind: doc.get_str(TYPE_FIELD).unwrap_or_default().to_string(),
            item: doc.get_str(ITEM_FIELD).unwrap_or_default().to_string(),
            frequency: read_count(doc, FREQUENCY_FIELD, 1)?,
            last_encountered: doc.get_timestamp(LAST_ENCOUNTERED_FIELD),
        })
    }

    /// `"<type>: <item>"`, the form fed to lesson generation.
    pub fn label(&self) -> String {
        format!("{}: {}", self.kind, self.item)
    }

    /// Study advice for this weakness.
    pub fn recommendation(&self) -> String {
        match self.kind.as_str() {
            "grammar" => format!("Practice {} in today's lesson", self.item),
            "pronunciation_accuracy" => "Focus on pronunciation in the Speaking Lab".to_string(),
            _ => format!("Review {}", self.label()),
        }
    }
}

/// Identity of the record for one triple.
pub fn weakness_id(uid: &str, kind: &str, item: &str) -> String {
    let key = format!("{}\u{1f}{}\u{1f}{}", uid, kind, item);
    Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes()).to_string()
}

fn triple_filter(uid: &str, kind: &str, item: &str) -> Filter {
    Filter::all()
        .eq(USER_FIELD, uid)
        .eq(TYPE_FIELD, kind)
        .eq(ITEM_FIELD, item)
}

const DEFAULT_RECOMMENDATIONS: [&str; 3] = [
    "Complete today's lesson for personalized practice",
    "Try a speaking exercise to improve pronunciation",
    "Chat with Elysian to practice conversation",
];

impl ProgressService {
    /// Records one occurrence of a weakness and returns its new frequency.
    pub fn track_weakness(&self, uid: &str, kind: &str, item: &str) -> Result<u64> {
        if let Some(frequency) = self.bump_weakness(uid, kind, item)? {
            return Ok(frequency);
        }

        let now = self.database().clock().now();
        let doc = Document::with_id(weakness_id(uid, kind, item))
            .with(USER_FIELD, uid)
            .with(TYPE_FIELD, kind)
            .with(ITEM_FIELD, item)
            .with(FREQUENCY_FIELD, 1i64)
            .with(LAST_ENCOUNTERED_FIELD, now)
            .with("created_at", now);

        match self.weaknesses().insert_one(doc) {
            Ok(_) => {
                tracing::info!(uid = %uid, kind = %kind, item = %item, "New weakness tracked");
                Ok(1)
            }
            Err(StoreError::DuplicateId { .. }) => {
                self.bump_weakness(uid, kind, item)?.ok_or_else(|| {
                    StoreError::InvalidDocument(format!(
                        "weakness record for '{}' clashes with an unrelated document",
                        uid
                    ))
                })
            }
            Err(e) => Err(e),
        }
    }

    fn bump_weakness(&self, uid: &str, kind: &str, item: &str) -> Result<Option<u64>> {
        self.weaknesses()
            .update_one_with(&triple_filter(uid, kind, item), |doc| {
                let next = read_count(doc, FREQUENCY_FIELD, 1)?.saturating_add(1);
                let update = Update::new()
                    .inc(FREQUENCY_FIELD, 1i64)
                    .current_date(LAST_ENCOUNTERED_FIELD);
                Ok((update, next))
            })
    }

    /// The learner's `n` most frequent weaknesses, most frequent first. Equal
    /// frequencies keep the order in which the weaknesses were first seen.
    pub fn top_weaknesses(&self, uid: &str, n: usize) -> Result<Vec<Weakness>> {
        if n == 0 {
            return Ok(Vec::new());
        }
        self.weaknesses()
            .find(Filter::all().eq(USER_FIELD, uid))
            .sort(FREQUENCY_FIELD, SortDirection::Descending)
            .limit(n)
            .to_list(n)
            .iter()
            .map(|doc| Weakness::from_document(doc))
            .collect()
    }

    /// Labels of the weaknesses that lesson generation should target.
    pub fn weakness_labels(&self, uid: &str) -> Result<Vec<String>> {
        Ok(self
            .top_weaknesses(uid, LESSON_WEAKNESS_COUNT)?
            .iter()
            .map(Weakness::label)
            .collect())
    }

    /// Dashboard study recommendations, falling back to general advice for
    /// learners with no tracked weaknesses.
    pub fn recommendations(&self, uid: &str) -> Result<Vec<String>> {
        let mut advice: Vec<String> = self
            .top_weaknesses(uid, RECOMMENDATION_WEAKNESS_COUNT)?
            .iter()
            .map(Weakness::recommendation)
            .collect();
        if advice.is_empty() {
            advice = DEFAULT_RECOMMENDATIONS.iter().map(|s| s.to_string()).collect();
        }
        advice.truncate(MAX_RECOMMENDATIONS);
        Ok(advice)
    }
}
