//! Daily streak state machine.
//!
//! Days are local calendar days derived from the database clock. For a
//! learner whose last activity fell on day `L`, an action on day `T` does:
//!
//! | `T - L`        | streak          | longest            | bonus XP      |
//! |----------------|-----------------|--------------------|---------------|
//! | no activity    | 1               | max(longest, 1)    | none          |
//! | 1              | streak + 1      | max(longest, new)  | 50 every 7th day, else 10 |
//! | > 1            | 1               | max(longest, 1)    | none          |
//! | ≤ 0            | unchanged       | unchanged          | none          |
//!
//! Every transition except the last stamps `last_activity_date` with now.

use crate::config::{STREAK_DAILY_BONUS_XP, STREAK_WEEKLY_BONUS_XP, STREAK_WEEKLY_PERIOD};
use crate::document::{Document, Value};
use crate::error::{Result, StoreError};
use crate::progress::user::{DAILY_STREAK_FIELD, LAST_ACTIVITY_FIELD, LONGEST_STREAK_FIELD};
use crate::progress::{read_count, to_stored, user_filter, ProgressService};
use crate::storage::Update;
use chrono::{Local, NaiveDate};

/// What a streak update did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakOutcome {
    /// First recorded activity; streak is now 1.
    Started,
    /// Activity on the day after the last one.
    Extended { streak: u64, bonus_xp: u64 },
    /// Gap of more than one day; streak is back to 1.
    Reset { previous: u64 },
    /// Activity already counted today; nothing changed.
    Unchanged { streak: u64 },
}

impl StreakOutcome {
    /// XP owed for this transition.
    pub fn bonus_xp(&self) -> u64 {
        match self {
            StreakOutcome::Extended { bonus_xp, .. } => *bonus_xp,
            _ => 0,
        }
    }
}

/// Bonus for reaching `streak` consecutive days.
pub fn streak_bonus_xp(streak: u64) -> u64 {
    if streak % STREAK_WEEKLY_PERIOD == 0 {
        STREAK_WEEKLY_BONUS_XP
    } else {
        STREAK_DAILY_BONUS_XP
    }
}

/// Decides the transition for one learner document and builds its update.
fn plan(doc: &Document, today: NaiveDate) -> Result<(Update, StreakOutcome)> {
    let last_day = match doc.get(LAST_ACTIVITY_FIELD) {
        None | Some(Value::Null) => None,
        Some(v) => match v.as_timestamp() {
            Some(ts) => Some(ts.with_timezone(&Local).date_naive()),
            None => {
                return Err(StoreError::TypeMismatch {
                    field: LAST_ACTIVITY_FIELD.to_string(),
                    expected: "timestamp",
                    found: v.type_name(),
                })
            }
        },
    };
    let streak = read_count(doc, DAILY_STREAK_FIELD, 0)?;

    let restart = || {
        Update::new()
            .set(DAILY_STREAK_FIELD, 1i64)
            .max(LONGEST_STREAK_FIELD, 1i64)
            .current_date(LAST_ACTIVITY_FIELD)
    };

    let Some(last_day) = last_day else {
        return Ok((restart(), StreakOutcome::Started));
    };

    match (today - last_day).num_days() {
        1 => {
            let next = streak.saturating_add(1);
            let stored = to_stored(DAILY_STREAK_FIELD, next)?;
            let update = Update::new()
                .set(DAILY_STREAK_FIELD, stored.clone())
                .max(LONGEST_STREAK_FIELD, stored)
                .current_date(LAST_ACTIVITY_FIELD);
            let outcome = StreakOutcome::Extended {
                streak: next,
                bonus_xp: streak_bonus_xp(next),
            };
            Ok((update, outcome))
        }
        gap if gap > 1 => Ok((restart(), StreakOutcome::Reset { previous: streak })),
        _ => Ok((Update::new(), StreakOutcome::Unchanged { streak })),
    }
}

impl ProgressService {
    /// Records a qualifying action for today's streak.
    ///
    /// Safe to call any number of times per day: only the first call of a
    /// day changes state. Extending a streak also awards the bonus XP, as a
    /// separate step after the streak is saved. Returns `Ok(None)` for an
    /// unknown uid.
    pub fn update_daily_streak(&self, uid: &str) -> Result<Option<StreakOutcome>> {
        let today = self.database().clock().now().with_timezone(&Local).date_naive();
        let outcome = self
            .users()
            .update_one_with(&user_filter(uid), |doc| plan(doc, today))?;

        match outcome {
            None => tracing::warn!(uid = %uid, "Streak update for unknown learner ignored"),
            Some(StreakOutcome::Reset { previous }) => {
                tracing::info!(uid = %uid, previous, "Streak broken, reset to 1")
            }
            Some(StreakOutcome::Extended { streak, bonus_xp }) => {
                tracing::debug!(uid = %uid, streak, bonus_xp, "Streak extended");
                self.add_xp(uid, bonus_xp)?;
            }
            Some(_) => {}
        }
        Ok(outcome)
    }
}
