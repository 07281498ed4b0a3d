//! Global configuration constants for elysian-core.
//!
//! Collection names, gamification tuning and default values for new learners
//! are defined here. These are compile-time constants; the only runtime
//! injection point is the [`Clock`](crate::clock::Clock) handed to the
//! [`Database`](crate::storage::Database).

/// Name of the identity field carried by every stored document.
pub const ID_FIELD: &str = "id";

/// Collection holding one document per learner.
pub const USERS_COLLECTION: &str = "users";

/// Collection holding one document per (user, type, item) weakness.
pub const WEAKNESSES_COLLECTION: &str = "user_weaknesses";

/// Collection holding one document per graded lesson answer.
pub const LESSON_ATTEMPTS_COLLECTION: &str = "lesson_attempts";

/// Collection holding generated lessons, one per learner per day.
pub const LESSONS_COLLECTION: &str = "lessons";

/// Collection holding one document per speaking exercise attempt.
pub const SPEAKING_ATTEMPTS_COLLECTION: &str = "speaking_attempts";

/// Collection holding conversation messages from learners and the tutor.
pub const CONVERSATION_MESSAGES_COLLECTION: &str = "conversation_messages";

/// Experience points needed per level step.
pub const XP_PER_LEVEL: u64 = 100;

/// Highest reachable level.
///
/// Levels are derived as `floor(xp / XP_PER_LEVEL) + 1` and clamped here.
pub const MAX_LEVEL: u32 = 50;

/// Bonus XP for extending a streak on an ordinary day.
pub const STREAK_DAILY_BONUS_XP: u64 = 10;

/// Bonus XP for extending a streak to a multiple of [`STREAK_WEEKLY_PERIOD`].
pub const STREAK_WEEKLY_BONUS_XP: u64 = 50;

/// Streak length, in days, that earns the weekly bonus.
pub const STREAK_WEEKLY_PERIOD: u64 = 7;

/// XP for a correct lesson answer.
pub const CORRECT_ANSWER_XP: u64 = 5;

/// XP for an incorrect lesson answer (effort still counts).
pub const INCORRECT_ANSWER_XP: u64 = 2;

/// Skill score increment applied on a correct answer.
pub const CORRECT_ANSWER_SKILL_DELTA: f64 = 1.0;

/// Starting score for every skill in a new learner's profile.
pub const DEFAULT_SKILL_SCORE: f64 = 50.0;

/// Skills tracked in every learner's profile.
pub const SKILLS: [&str; 8] = [
    "grammar",
    "vocabulary",
    "speaking_fluency",
    "listening_comprehension",
    "reading_comprehension",
    "writing_accuracy",
    "pronunciation_accuracy",
    "intonation_score",
];

/// CEFR level assigned to new learners.
pub const DEFAULT_CEFR_LEVEL: &str = "A1";

/// Display name assigned when a learner is created without one.
pub const DEFAULT_LEARNER_NAME: &str = "Elysian Learner";

/// Number of weaknesses fed into lesson generation.
pub const LESSON_WEAKNESS_COUNT: usize = 5;

/// Number of weaknesses considered when building recommendations.
pub const RECOMMENDATION_WEAKNESS_COUNT: usize = 3;

/// Maximum number of recommendations returned.
pub const MAX_RECOMMENDATIONS: usize = 2;

/// Maximum length, in characters, of a weakness item derived from a question.
pub const WEAKNESS_ITEM_MAX_CHARS: usize = 50;

/// Base XP for a speaking exercise, before the pronunciation bonus.
pub const SPEAKING_BASE_XP: i64 = 20;

/// Floor on speaking XP, whatever the pronunciation score.
pub const SPEAKING_MIN_XP: i64 = 5;

/// Base XP for a listening exercise.
pub const LISTENING_BASE_XP: u64 = 25;

/// Bonus XP for a perfect listening score, scaled down linearly.
pub const LISTENING_MAX_BONUS_XP: f64 = 15.0;

/// Base XP for a reading exercise.
pub const READING_BASE_XP: u64 = 30;

/// Bonus XP for a perfect reading comprehension score, scaled down linearly.
pub const READING_COMPREHENSION_MAX_BONUS_XP: f64 = 20.0;

/// Cap on the reading-speed bonus (one XP per 50 words per minute).
pub const READING_SPEED_MAX_BONUS_XP: u64 = 10;

/// XP advertised on the dashboard for each daily activity.
pub const DAILY_LESSON_XP_REWARD: u64 = 50;
pub const DAILY_SPEAKING_XP_REWARD: u64 = 20;
pub const DAILY_CONVERSATION_XP_REWARD: u64 = 15;

/// Weekly consistency score per lesson, capped at 100.
pub const CONSISTENCY_POINTS_PER_LESSON: u64 = 15;

/// Upper bound on the dashboard's "XP this week" estimate.
pub const WEEKLY_XP_ESTIMATE_CAP: u64 = 350;
