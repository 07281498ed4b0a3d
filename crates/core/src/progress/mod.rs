//! Learner progress built on the document store: experience and levels,
//! daily streaks, weakness tracking, answer and practice recording, and the
//! dashboard aggregates.
//!
//! [`ProgressService`] is a thin handle over a [`Database`]; every method is
//! a short sequence of single-collection operations. Sequences are not
//! transactional: if one step fails, earlier steps stay applied and the
//! error is returned to the caller.

/// Answer grading and recording.
pub mod answers;
/// Today's activities and the weekly summary.
pub mod dashboard;
/// Pure XP / level functions and the dashboard summary type.
pub mod gamification;
/// Speaking, listening and reading practice.
pub mod practice;
/// Daily streak state machine.
pub mod streak;
/// Learner documents: creation, typed view, XP and skill updates.
pub mod user;
/// Weakness frequency tracking and recommendations.
pub mod weakness;

pub use answers::{grade_objective, AnswerOutcome, Exercise, ExerciseKind, Verdict};
pub use dashboard::{ActivityKind, DailyActivity, DashboardStats, WeeklyStats};
pub use gamification::{award_xp, level_from_xp, xp_for_next_level, GamificationSummary};
pub use practice::{PracticeOutcome, QuizScore, ReadingAttempt, SpeakingAttempt};
pub use streak::StreakOutcome;
pub use user::{UserProfile, XpAward};
pub use weakness::Weakness;

use crate::config::{USERS_COLLECTION, WEAKNESSES_COLLECTION};
use crate::document::{Document, Value};
use crate::error::{Result, StoreError};
use crate::filter_types::Filter;
use crate::storage::{Collection, Database};

/// Progress operations for all learners.
#[derive(Debug, Clone)]
pub struct ProgressService {
    db: Database,
}

impl ProgressService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn users(&self) -> Collection {
        self.db.collection(USERS_COLLECTION)
    }

    fn weaknesses(&self) -> Collection {
        self.db.collection(WEAKNESSES_COLLECTION)
    }
}

/// Filter selecting a learner by external uid.
pub(crate) fn user_filter(uid: &str) -> Filter {
    Filter::all().eq(user::UID_FIELD, uid)
}

/// Reads a non-negative counter. Missing or null counts as `default`;
/// negative stored values clamp to zero; anything non-numeric is an error.
pub(crate) fn read_count(doc: &Document, field: &str, default: u64) -> Result<u64> {
    match doc.get(field) {
        None | Some(Value::Null) => Ok(default),
        Some(v) => v
            .as_i64()
            .map(|n| u64::try_from(n).unwrap_or(0))
            .ok_or_else(|| StoreError::TypeMismatch {
                field: field.to_string(),
                expected: "number",
                found: v.type_name(),
            }),
    }
}

/// Converts a counter for storage as an integer field.
pub(crate) fn to_stored(field: &str, n: u64) -> Result<Value> {
    i64::try_from(n)
        .map(Value::Integer)
        .map_err(|_| StoreError::Overflow(field.to_string()))
}
