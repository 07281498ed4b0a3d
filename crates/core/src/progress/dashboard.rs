//! Dashboard aggregates: today's activities and the weekly summary.
//!
//! "Today" and "this week" are expressed as `$gte` / `$lt` range conditions
//! on the activity timestamps. Range conditions are permissive (see
//! [`Condition::Range`](crate::filter_types::Condition::Range)), so an
//! activity counts as done today once the learner has any record of that
//! kind, and the weekly lesson count covers every lesson.

use crate::config::{
    CONSISTENCY_POINTS_PER_LESSON, CONVERSATION_MESSAGES_COLLECTION, DAILY_CONVERSATION_XP_REWARD,
    DAILY_LESSON_XP_REWARD, DAILY_SPEAKING_XP_REWARD, LESSONS_COLLECTION,
    SPEAKING_ATTEMPTS_COLLECTION, WEEKLY_XP_ESTIMATE_CAP,
};
use crate::document::Value;
use crate::error::Result;
use crate::filter_types::Filter;
use crate::progress::gamification::GamificationSummary;
use crate::progress::ProgressService;
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Learn,
    Speak,
    Converse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyActivity {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub completed: bool,
    /// 100 when completed, else 0.
    pub progress: u8,
    pub description: &'static str,
    pub xp_reward: u64,
}

impl DailyActivity {
    fn new(kind: ActivityKind, completed: bool) -> Self {
        let (description, xp_reward) = match kind {
            ActivityKind::Learn => (
                "Complete your personalized daily lesson",
                DAILY_LESSON_XP_REWARD,
            ),
            ActivityKind::Speak => (
                "Practice pronunciation and fluency",
                DAILY_SPEAKING_XP_REWARD,
            ),
            ActivityKind::Converse => (
                "Chat with Elysian in natural conversation",
                DAILY_CONVERSATION_XP_REWARD,
            ),
        };
        Self {
            kind,
            completed,
            progress: if completed { 100 } else { 0 },
            description,
            xp_reward,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeeklyStats {
    pub lessons_completed: u64,
    /// `min(100, lessons * 15)`.
    pub consistency_score: u64,
    /// Rough estimate: total XP capped at 350.
    pub xp_this_week: u64,
}

impl WeeklyStats {
    pub fn new(lessons_completed: u64, total_xp: u64) -> Self {
        Self {
            lessons_completed,
            consistency_score: lessons_completed
                .saturating_mul(CONSISTENCY_POINTS_PER_LESSON)
                .min(100),
            xp_this_week: total_xp.min(WEEKLY_XP_ESTIMATE_CAP),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub daily_activities: Vec<DailyActivity>,
    pub weekly_stats: WeeklyStats,
    pub skill_overview: std::collections::BTreeMap<String, f64>,
    pub recommendations: Vec<String>,
    pub gamification: GamificationSummary,
}

/// Start of `day` in local time, as a UTC instant.
fn local_midnight(day: NaiveDate) -> Option<DateTime<Utc>> {
    Local
        .from_local_datetime(&day.and_time(NaiveTime::MIN))
        .earliest()
        .map(|t| t.with_timezone(&Utc))
}

fn since(field: &str, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Filter {
    Filter::all().range(field, from.map(Value::from), to.map(Value::from))
}

impl ProgressService {
    /// Everything the dashboard shows for one learner, or `None` for an
    /// unknown uid.
    pub fn dashboard_stats(&self, uid: &str) -> Result<Option<DashboardStats>> {
        let Some(user) = self.get_user(uid)? else {
            return Ok(None);
        };

        let db = self.database();
        let today = db.clock().now().with_timezone(&Local).date_naive();
        let start = local_midnight(today);
        let end = today.succ_opt().and_then(local_midnight);
        let week_ago = local_midnight(today - Duration::days(7));

        let lesson_today = db
            .collection(LESSONS_COLLECTION)
            .find_one(&since("created_at", start, end).eq("user_id", uid))
            .is_some();
        let speaking_today = db
            .collection(SPEAKING_ATTEMPTS_COLLECTION)
            .find_one(&since("timestamp", start, end).eq("user_id", uid))
            .is_some();
        let conversation_today = db
            .collection(CONVERSATION_MESSAGES_COLLECTION)
            .find_one(
                &since("timestamp", start, end)
                    .contains("conversation_id", uid)
                    .eq("sender", "user"),
            )
            .is_some();

        let weekly_lessons = db
            .collection(LESSONS_COLLECTION)
            .count_documents(&since("created_at", week_ago, None).eq("user_id", uid));

        Ok(Some(DashboardStats {
            daily_activities: vec![
                DailyActivity::new(ActivityKind::Learn, lesson_today),
                DailyActivity::new(ActivityKind::Speak, speaking_today),
                DailyActivity::new(ActivityKind::Converse, conversation_today),
            ],
            weekly_stats: WeeklyStats::new(weekly_lessons as u64, user.xp),
            skill_overview: user.skill_profile.clone(),
            recommendations: self.recommendations(uid)?,
            gamification: user.gamification(),
        }))
    }
}
