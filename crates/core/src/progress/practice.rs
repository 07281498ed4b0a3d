//! Skill practice outside lessons: speaking, listening and reading.
//!
//! Raw scoring (audio analysis, question grading) happens upstream. These
//! operations take the resulting scores, bump the learner's skill profile and
//! attempt counter in one update, then award XP as a second step. Like
//! [`ProgressService::add_xp`], none of them stamp `last_activity_date`.
//!
//! Speaking: pronunciation `+max(0.5, p/50)`, fluency `+max(0.3, acc/100)`,
//! XP `max(5, 20 + trunc(p/20))`.
//!
//! Listening: listening `+max(1, s/25)`, XP `25 + trunc(s/100 * 15)`.
//!
//! Reading: reading `+max(1, s/25)`, vocabulary `+max(0.5, (10 - lookups)/10)`,
//! XP `30 + trunc(s/100 * 20) + min(10, trunc(wpm/50))`.

use crate::config::{
    LISTENING_BASE_XP, LISTENING_MAX_BONUS_XP, READING_BASE_XP,
    READING_COMPREHENSION_MAX_BONUS_XP, READING_SPEED_MAX_BONUS_XP, SPEAKING_ATTEMPTS_COLLECTION,
    SPEAKING_BASE_XP, SPEAKING_MIN_XP,
};
use crate::document::{Document, Value};
use crate::error::{Result, StoreError};
use crate::progress::user::{
    LISTENING_ATTEMPTS_FIELD, READING_ATTEMPTS_FIELD, SKILL_PROFILE_FIELD,
    SPEAKING_ATTEMPTS_FIELD,
};
use crate::progress::{user_filter, ProgressService};
use crate::storage::Update;
use serde::Serialize;

/// Output of the speech analysis layer for one recording.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeakingAttempt {
    /// Text the learner was asked to say.
    pub content: String,
    pub transcription: String,
    /// Percentage of expected words heard, 0 to 100.
    pub word_accuracy: f64,
    /// 0 to 100.
    pub pronunciation_score: f64,
    pub intonation_score: Option<f64>,
}

/// Questions answered correctly out of a quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizScore {
    pub correct: u32,
    pub total: u32,
}

impl QuizScore {
    /// Score as a percentage. An empty quiz cannot be scored.
    pub fn percent(&self) -> Result<f64> {
        if self.total == 0 {
            return Err(StoreError::InvalidDocument(
                "quiz has no questions".to_string(),
            ));
        }
        Ok(f64::from(self.correct) / f64::from(self.total) * 100.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadingAttempt {
    pub quiz: QuizScore,
    /// Length of the passage.
    pub words: u32,
    pub reading_time_secs: f64,
    /// Number of words the learner looked up while reading.
    pub vocabulary_lookups: usize,
}

impl ReadingAttempt {
    /// Reading speed in words per minute.
    pub fn words_per_minute(&self) -> Result<f64> {
        if !(self.reading_time_secs.is_finite() && self.reading_time_secs > 0.0) {
            return Err(StoreError::InvalidDocument(format!(
                "reading time must be positive, got {}",
                self.reading_time_secs
            )));
        }
        Ok(f64::from(self.words) / (self.reading_time_secs / 60.0))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PracticeOutcome {
    /// 0 to 100.
    pub score: f64,
    pub feedback: String,
    pub xp_earned: u64,
    pub level_up: bool,
}

pub fn speaking_xp(pronunciation_score: f64) -> u64 {
    let bonus = (pronunciation_score / 20.0) as i64;
    SPEAKING_BASE_XP.saturating_add(bonus).max(SPEAKING_MIN_XP) as u64
}

pub fn listening_xp(score: f64) -> u64 {
    LISTENING_BASE_XP + (score / 100.0 * LISTENING_MAX_BONUS_XP) as u64
}

pub fn reading_xp(score: f64, words_per_minute: f64) -> u64 {
    let comprehension = (score / 100.0 * READING_COMPREHENSION_MAX_BONUS_XP) as u64;
    let speed = ((words_per_minute / 50.0) as u64).min(READING_SPEED_MAX_BONUS_XP);
    READING_BASE_XP + comprehension + speed
}

pub fn speaking_feedback(word_accuracy: f64) -> &'static str {
    if word_accuracy >= 90.0 {
        "Excellent pronunciation! Your speech is very clear and natural."
    } else if word_accuracy >= 75.0 {
        "Very good pronunciation. Most words were pronounced clearly."
    } else if word_accuracy >= 60.0 {
        "Good pronunciation. Some words could be pronounced more clearly."
    } else if word_accuracy >= 40.0 {
        "Fair pronunciation. Focus on speaking more slowly and clearly."
    } else {
        "Keep practicing! Try to speak more slowly and focus on each sound."
    }
}

pub fn listening_feedback(score: f64) -> &'static str {
    if score >= 90.0 {
        "Outstanding listening comprehension! Your understanding is excellent."
    } else if score >= 80.0 {
        "Great job! You understood most of the content clearly."
    } else if score >= 70.0 {
        "Good work! You're making solid progress in listening skills."
    } else if score >= 60.0 {
        "Fair performance. Try listening to the audio multiple times to catch more details."
    } else {
        "Keep practicing! Focus on key words and main ideas when listening."
    }
}

pub fn reading_feedback(score: f64, words_per_minute: f64, vocabulary_lookups: usize) -> String {
    let comprehension = if score >= 90.0 && words_per_minute > 200.0 {
        "Excellent reading comprehension and speed! You're a skilled reader."
    } else if score >= 80.0 {
        "Great comprehension! You understood the main ideas and details well."
    } else if score >= 70.0 {
        "Good reading skills. Focus on identifying key information more precisely."
    } else if score >= 60.0 {
        "Fair comprehension. Try reading more slowly and re-reading difficult sections."
    } else {
        "Keep practicing! Focus on understanding main ideas before worrying about details."
    };
    let vocabulary = match vocabulary_lookups {
        0 => String::new(),
        n @ 1..=3 => format!(" You looked up {} words - great vocabulary level!", n),
        n @ 4..=7 => format!(
            " You looked up {} words - good effort to understand new vocabulary!",
            n
        ),
        n => format!(
            " You looked up {} words - try reading at a slightly easier level \
             to build confidence.",
            n
        ),
    };
    format!("{}{}", comprehension, vocabulary)
}

fn skill_path(skill: &str) -> String {
    format!("{}.{}", SKILL_PROFILE_FIELD, skill)
}

fn require_score(name: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(StoreError::InvalidDocument(format!(
            "{} must be a finite number, got {}",
            name, value
        )))
    }
}

impl ProgressService {
    /// Records a speaking attempt in `speaking_attempts`, then credits
    /// pronunciation and fluency and awards XP.
    pub fn record_speaking(
        &self,
        uid: &str,
        attempt: &SpeakingAttempt,
    ) -> Result<PracticeOutcome> {
        let pronunciation = require_score("pronunciation_score", attempt.pronunciation_score)?;
        let word_accuracy = require_score("word_accuracy", attempt.word_accuracy)?;

        let doc = Document::new()
            .with("user_id", uid)
            .with("content", attempt.content.as_str())
            .with("transcription", attempt.transcription.as_str())
            .with("word_accuracy", word_accuracy)
            .with("pronunciation_score", pronunciation)
            .with(
                "intonation_score",
                attempt.intonation_score.map_or(Value::Null, Value::Float),
            )
            .with("timestamp", self.database().clock().now());
        self.database()
            .collection(SPEAKING_ATTEMPTS_COLLECTION)
            .insert_one(doc)?;

        let update = Update::new()
            .inc(skill_path("pronunciation_accuracy"), (pronunciation / 50.0).max(0.5))
            .inc(skill_path("speaking_fluency"), (word_accuracy / 100.0).max(0.3))
            .inc(SPEAKING_ATTEMPTS_FIELD, 1i64);
        self.finish_practice(
            uid,
            update,
            pronunciation,
            speaking_feedback(word_accuracy).to_string(),
            speaking_xp(pronunciation),
        )
    }

    /// Credits listening comprehension for a graded listening quiz and
    /// awards XP.
    pub fn record_listening(&self, uid: &str, quiz: QuizScore) -> Result<PracticeOutcome> {
        let score = quiz.percent()?;
        let update = Update::new()
            .inc(skill_path("listening_comprehension"), (score / 25.0).max(1.0))
            .inc(LISTENING_ATTEMPTS_FIELD, 1i64);
        self.finish_practice(
            uid,
            update,
            score,
            listening_feedback(score).to_string(),
            listening_xp(score),
        )
    }

    /// Credits reading comprehension and vocabulary for a graded reading
    /// exercise and awards XP. Fewer lookups earn more vocabulary credit.
    pub fn record_reading(
        &self,
        uid: &str,
        attempt: &ReadingAttempt,
    ) -> Result<PracticeOutcome> {
        let score = attempt.quiz.percent()?;
        let wpm = attempt.words_per_minute()?;
        let lookups = attempt.vocabulary_lookups as f64;
        let update = Update::new()
            .inc(skill_path("reading_comprehension"), (score / 25.0).max(1.0))
            .inc(skill_path("vocabulary"), ((10.0 - lookups) / 10.0).max(0.5))
            .inc(READING_ATTEMPTS_FIELD, 1i64);
        self.finish_practice(
            uid,
            update,
            score,
            reading_feedback(score, wpm, attempt.vocabulary_lookups),
            reading_xp(score, wpm),
        )
    }

    fn finish_practice(
        &self,
        uid: &str,
        update: Update,
        score: f64,
        feedback: String,
        xp: u64,
    ) -> Result<PracticeOutcome> {
        if self.users().update_one(&user_filter(uid), &update)? {
            tracing::debug!(uid = %uid, score, xp, "Practice recorded");
        }
        let award = self.add_xp(uid, xp)?;
        Ok(PracticeOutcome {
            score,
            feedback,
            xp_earned: award.map_or(0, |a| a.xp_earned),
            level_up: award.is_some_and(|a| a.level_up),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter_types::Filter;
    use crate::storage::Database;

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-9, "{} != {}", actual, expected);
    }

    fn service_with_user() -> ProgressService {
        let svc = ProgressService::new(Database::new());
        svc.get_or_create_user("u1", None, None).unwrap();
        svc
    }

    fn speaking(pronunciation: f64, accuracy: f64) -> SpeakingAttempt {
        SpeakingAttempt {
            content: "The weather is nice today".into(),
            transcription: "the weather is nice today".into(),
            word_accuracy: accuracy,
            pronunciation_score: pronunciation,
            intonation_score: Some(70.0),
        }
    }

    fn reading(correct: u32, secs: f64, lookups: usize) -> ReadingAttempt {
        ReadingAttempt {
            quiz: QuizScore { correct, total: 4 },
            words: 195,
            reading_time_secs: secs,
            vocabulary_lookups: lookups,
        }
    }

    // ── XP formulas ────────────────────────────────────────────────────

    #[test]
    fn test_speaking_xp() {
        assert_eq!(speaking_xp(0.0), 20);
        assert_eq!(speaking_xp(85.0), 24);
        assert_eq!(speaking_xp(100.0), 25);
        assert_eq!(speaking_xp(-400.0), 5);
    }

    #[test]
    fn test_listening_xp() {
        assert_eq!(listening_xp(0.0), 25);
        assert_eq!(listening_xp(75.0), 36);
        assert_eq!(listening_xp(100.0), 40);
    }

    #[test]
    fn test_reading_xp() {
        assert_eq!(reading_xp(50.0, 120.0), 30 + 10 + 2);
        assert_eq!(reading_xp(100.0, 900.0), 30 + 20 + 10);
    }

    #[test]
    fn test_quiz_percent_rejects_empty() {
        assert_eq!(QuizScore { correct: 3, total: 4 }.percent().unwrap(), 75.0);
        assert!(QuizScore { correct: 0, total: 0 }.percent().is_err());
    }

    #[test]
    fn test_words_per_minute() {
        assert_eq!(reading(4, 60.0, 0).words_per_minute().unwrap(), 195.0);
        assert!(reading(4, 0.0, 0).words_per_minute().is_err());
    }

    #[test]
    fn test_reading_feedback_includes_vocabulary() {
        let fb = reading_feedback(95.0, 250.0, 0);
        assert_eq!(fb, "Excellent reading comprehension and speed! You're a skilled reader.");
        let fb = reading_feedback(95.0, 150.0, 5);
        assert!(fb.starts_with("Great comprehension!"));
        assert!(fb.ends_with("5 words - good effort to understand new vocabulary!"));
    }

    // ── Store effects ──────────────────────────────────────────────────

    #[test]
    fn test_record_speaking_updates_profile() {
        let svc = service_with_user();
        let outcome = svc.record_speaking("u1", &speaking(80.0, 90.0)).unwrap();
        assert_eq!(outcome.xp_earned, 24);
        assert_eq!(
            outcome.feedback,
            "Excellent pronunciation! Your speech is very clear and natural."
        );

        let user = svc.get_user("u1").unwrap().unwrap();
        assert_close(user.skill_profile["pronunciation_accuracy"], 51.6);
        assert_close(user.skill_profile["speaking_fluency"], 50.9);
        assert_eq!(user.total_speaking_attempts, 1);
        assert_eq!(user.xp, 24);
        let attempts = svc.database().collection("speaking_attempts");
        assert_eq!(attempts.count_documents(&Filter::all().eq("user_id", "u1")), 1);
    }

    #[test]
    fn test_record_speaking_minimum_increments() {
        let svc = service_with_user();
        svc.record_speaking("u1", &speaking(10.0, 10.0)).unwrap();
        let user = svc.get_user("u1").unwrap().unwrap();
        assert_close(user.skill_profile["pronunciation_accuracy"], 50.5);
        assert_close(user.skill_profile["speaking_fluency"], 50.3);
    }

    #[test]
    fn test_record_speaking_rejects_nan() {
        let svc = service_with_user();
        assert!(svc.record_speaking("u1", &speaking(f64::NAN, 50.0)).is_err());
        assert!(svc.database().collection("speaking_attempts").is_empty());
    }

    #[test]
    fn test_record_listening() {
        let svc = service_with_user();
        let outcome = svc
            .record_listening("u1", QuizScore { correct: 3, total: 4 })
            .unwrap();
        assert_eq!(outcome.score, 75.0);
        assert_eq!(outcome.xp_earned, 36);
        let user = svc.get_user("u1").unwrap().unwrap();
        assert_close(user.skill_profile["listening_comprehension"], 53.0);
        assert_eq!(user.total_listening_attempts, 1);
        svc.record_listening("u1", QuizScore { correct: 0, total: 4 }).unwrap();
        let user = svc.get_user("u1").unwrap().unwrap();
        assert_close(user.skill_profile["listening_comprehension"], 54.0);
        assert_eq!(user.total_listening_attempts, 2);
    }

    #[test]
    fn test_record_reading() {
        let svc = service_with_user();
        let outcome = svc.record_reading("u1", &reading(2, 60.0, 2)).unwrap();
        assert_eq!(outcome.score, 50.0);
        assert_eq!(outcome.xp_earned, 30 + 10 + 3);
        let user = svc.get_user("u1").unwrap().unwrap();
        assert_close(user.skill_profile["reading_comprehension"], 52.0);
        assert_close(user.skill_profile["vocabulary"], 50.8);
        assert_eq!(user.total_reading_attempts, 1);
    }

    #[test]
    fn test_record_reading_many_lookups_floor() {
        let svc = service_with_user();
        svc.record_reading("u1", &reading(4, 60.0, 15)).unwrap();
        let user = svc.get_user("u1").unwrap().unwrap();
        assert_close(user.skill_profile["vocabulary"], 50.5);
    }

    #[test]
    fn test_practice_for_unknown_learner_earns_nothing() {
        let svc = ProgressService::new(Database::new());
        let outcome = svc
            .record_listening("ghost", QuizScore { correct: 4, total: 4 })
            .unwrap();
        assert_eq!(outcome.xp_earned, 0);
        assert!(!outcome.level_up);
        assert!(svc.database().collection("users").is_empty());
    }
}
