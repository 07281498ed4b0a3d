//! Learner documents in the `users` collection.
//!
//! Learners are looked up by their external uid (the identity supplied by the
//! authentication layer), not by the document identity.

use crate::config::{
    DEFAULT_CEFR_LEVEL, DEFAULT_LEARNER_NAME, DEFAULT_SKILL_SCORE, MAX_LEVEL, SKILLS,
};
use crate::document::{Document, Value};
use crate::error::{Result, StoreError};
use crate::progress::gamification::{level_from_xp, xp_for_next_level, GamificationSummary};
use crate::progress::{read_count, to_stored, user_filter, ProgressService};
use crate::storage::Update;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

pub const UID_FIELD: &str = "firebase_uid";
pub const XP_FIELD: &str = "xp";
pub const LEVEL_FIELD: &str = "level";
pub const SKILL_PROFILE_FIELD: &str = "skill_profile";
pub const DAILY_STREAK_FIELD: &str = "daily_streak";
pub const LONGEST_STREAK_FIELD: &str = "longest_streak";
pub const LAST_ACTIVITY_FIELD: &str = "last_activity_date";
pub const LESSONS_COMPLETED_FIELD: &str = "total_lessons_completed";
pub const SPEAKING_ATTEMPTS_FIELD: &str = "total_speaking_attempts";
pub const LISTENING_ATTEMPTS_FIELD: &str = "total_listening_attempts";
pub const READING_ATTEMPTS_FIELD: &str = "total_reading_attempts";

/// Typed view of a learner document.
///
/// Missing fields take their defaults; progress counters holding a
/// non-numeric value are reported as a type mismatch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    pub id: String,
    pub uid: String,
    pub email: String,
    pub name: String,
    pub current_cefr_level: String,
    pub skill_profile: BTreeMap<String, f64>,
    pub xp: u64,
    pub level: u32,
    pub daily_streak: u64,
    pub longest_streak: u64,
    pub total_lessons_completed: u64,
    pub total_speaking_attempts: u64,
    pub total_listening_attempts: u64,
    pub total_reading_attempts: u64,
    pub last_activity_date: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    pub fn from_document(doc: &Document) -> Result<Self> {
        let skill_profile = match doc.get(SKILL_PROFILE_FIELD) {
            None | Some(Value::Null) => BTreeMap::new(),
            Some(Value::Map(skills)) => skills
                .iter()
                .filter_map(|(skill, score)| score.as_f64().map(|s| (skill.clone(), s)))
                .collect(),
            Some(other) => {
                return Err(StoreError::TypeMismatch {
                    field: SKILL_PROFILE_FIELD.to_string(),
                    expected: "map",
                    found: other.type_name(),
                })
            }
        };
        let level = read_count(doc, LEVEL_FIELD, 1)?;

        Ok(Self {
            id: doc.id().unwrap_or_default().to_string(),
            uid: doc.get_str(UID_FIELD).unwrap_or_default().to_string(),
            email: doc.get_str("email").unwrap_or_default().to_string(),
            name: doc.get_str("name").unwrap_or_default().to_string(),
            current_cefr_level: doc
                .get_str("current_cefr_level")
                .unwrap_or(DEFAULT_CEFR_LEVEL)
                .to_string(),
            skill_profile,
            xp: read_count(doc, XP_FIELD, 0)?,
            level: u32::try_from(level).unwrap_or(MAX_LEVEL),
            daily_streak: read_count(doc, DAILY_STREAK_FIELD, 0)?,
            longest_streak: read_count(doc, LONGEST_STREAK_FIELD, 0)?,
            total_lessons_completed: read_count(doc, LESSONS_COMPLETED_FIELD, 0)?,
            total_speaking_attempts: read_count(doc, SPEAKING_ATTEMPTS_FIELD, 0)?,
            total_listening_attempts: read_count(doc, LISTENING_ATTEMPTS_FIELD, 0)?,
            total_reading_attempts: read_count(doc, READING_ATTEMPTS_FIELD, 0)?,
            last_activity_date: doc.get_timestamp(LAST_ACTIVITY_FIELD),
            created_at: doc.get_timestamp("created_at"),
        })
    }

    pub fn gamification(&self) -> GamificationSummary {
        GamificationSummary {
            current_level: self.level,
            current_xp: self.xp,
            xp_for_next_level: xp_for_next_level(self.level),
            daily_streak: self.daily_streak,
            longest_streak: self.longest_streak,
        }
    }
}

/// Result of an XP award.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct XpAward {
    pub xp_earned: u64,
    /// `new_level` is above the level stored before this award.
    pub level_up: bool,
    pub new_level: u32,
    pub new_xp: u64,
}

fn new_user_document(
    uid: &str,
    email: Option<&str>,
    name: Option<&str>,
    now: DateTime<Utc>,
) -> Document {
    let skills: BTreeMap<String, Value> = SKILLS
        .iter()
        .map(|skill| (skill.to_string(), Value::Float(DEFAULT_SKILL_SCORE)))
        .collect();
    let email = email.map_or_else(|| format!("{}@example.com", uid), str::to_string);

    Document::new()
        .with(UID_FIELD, uid)
        .with("email", email)
        .with("name", name.unwrap_or(DEFAULT_LEARNER_NAME))
        .with("created_at", now)
        .with("primary_goal", Value::Null)
        .with("target_proficiency", Value::Null)
        .with("current_cefr_level", DEFAULT_CEFR_LEVEL)
        .with("interests", Value::Array(Vec::new()))
        .with(SKILL_PROFILE_FIELD, skills)
        .with("assessment_completed", false)
        .with(SPEAKING_ATTEMPTS_FIELD, 0i64)
        .with(LISTENING_ATTEMPTS_FIELD, 0i64)
        .with(READING_ATTEMPTS_FIELD, 0i64)
        .with(XP_FIELD, 0i64)
        .with(LEVEL_FIELD, 1i64)
        .with(LESSONS_COMPLETED_FIELD, 0i64)
        .with(DAILY_STREAK_FIELD, 0i64)
        .with(LONGEST_STREAK_FIELD, 0i64)
        .with(LAST_ACTIVITY_FIELD, Value::Null)
}

impl ProgressService {
    /// Loads a learner by uid.
    pub fn get_user(&self, uid: &str) -> Result<Option<UserProfile>> {
        self.users()
            .find_one(&user_filter(uid))
            .map(|doc| UserProfile::from_document(&doc))
            .transpose()
    }

    /// Loads a learner by uid, creating a fresh profile on first sight.
    pub fn get_or_create_user(
        &self,
        uid: &str,
        email: Option<&str>,
        name: Option<&str>,
    ) -> Result<UserProfile> {
        if let Some(existing) = self.get_user(uid)? {
            return Ok(existing);
        }
        let users = self.users();
        let doc = new_user_document(uid, email, name, self.database().clock().now());
        let id = users.insert_one(doc)?;
        tracing::info!(uid = %uid, id = %id, "Created learner profile");
        match users.get_by_id(&id) {
            Some(doc) => UserProfile::from_document(&doc),
            None => Err(StoreError::InvalidDocument(format!(
                "learner '{}' vanished after insert",
                uid
            ))),
        }
    }

    /// Adds XP to a learner and recomputes their level.
    ///
    /// The read of the current xp/level and the write of the new values
    /// happen under one collection lock, so concurrent awards never lose
    /// points and `level_up` always compares against the level stored
    /// immediately before this award. Returns `Ok(None)` for an unknown uid.
    ///
    /// `last_activity_date` is left alone: it belongs to the streak tracker,
    /// and stamping it here would make the next streak update of the same
    /// day see no elapsed days. Call
    /// [`update_daily_streak`](ProgressService::update_daily_streak) to count
    /// an action as activity.
    pub fn add_xp(&self, uid: &str, xp_to_add: u64) -> Result<Option<XpAward>> {
        let award = self.users().update_one_with(&user_filter(uid), |doc| {
            let old_xp = read_count(doc, XP_FIELD, 0)?;
            let old_level = read_count(doc, LEVEL_FIELD, 1)?;
            let new_xp = old_xp
                .checked_add(xp_to_add)
                .ok_or_else(|| StoreError::Overflow(XP_FIELD.to_string()))?;
            let new_level = level_from_xp(new_xp);

            let update = Update::new()
                .set(XP_FIELD, to_stored(XP_FIELD, new_xp)?)
                .set(LEVEL_FIELD, new_level);
            let award = XpAward {
                xp_earned: xp_to_add,
                level_up: u64::from(new_level) > old_level,
                new_level,
                new_xp,
            };
            Ok((update, award))
        })?;

        match &award {
            None => tracing::warn!(uid = %uid, "XP award for unknown learner ignored"),
            Some(a) if a.level_up => {
                tracing::info!(
                    uid = %uid,
                    level = a.new_level,
                    xp = a.new_xp,
                    "Learner levelled up"
                )
            }
            Some(_) => {}
        }
        Ok(award)
    }

    /// Adds `delta` to `skill_profile.<skill>`, creating the entry if needed.
    /// Returns `false` for an unknown uid.
    pub fn increment_skill(&self, uid: &str, skill: &str, delta: f64) -> Result<bool> {
        if skill.is_empty() || skill.contains('.') {
            return Err(StoreError::InvalidPath(format!(
                "{}.{}",
                SKILL_PROFILE_FIELD, skill
            )));
        }
        let path = format!("{}.{}", SKILL_PROFILE_FIELD, skill);
        self.users()
            .update_one(&user_filter(uid), &Update::new().inc(path, delta))
    }

    /// Dashboard gamification block for a learner.
    pub fn gamification_summary(&self, uid: &str) -> Result<Option<GamificationSummary>> {
        Ok(self.get_user(uid)?.map(|user| user.gamification()))
    }
}
