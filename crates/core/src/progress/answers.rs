//! Grading and recording lesson answers.
//!
//! Objective exercises are graded here by normalized string comparison.
//! Subjective ones are graded by the language-model layer, which passes its
//! [`Verdict`] in; without a verdict a minimal-effort heuristic applies.

use crate::config::{
    CORRECT_ANSWER_SKILL_DELTA, CORRECT_ANSWER_XP, INCORRECT_ANSWER_XP,
    LESSON_ATTEMPTS_COLLECTION, WEAKNESS_ITEM_MAX_CHARS,
};
use crate::document::Document;
use crate::error::Result;
use crate::progress::ProgressService;
use serde::Serialize;

/// Exercise formats produced by lesson generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExerciseKind {
    FillInTheBlank,
    SentenceScramble,
    MultipleChoice,
    ErrorSpotting,
    ImageDescription,
    Other(String),
}

impl ExerciseKind {
    pub fn parse(kind: &str) -> Self {
        match kind {
            "fill-in-the-blank" => ExerciseKind::FillInTheBlank,
            "sentence-scramble" => ExerciseKind::SentenceScramble,
            "multiple-choice" => ExerciseKind::MultipleChoice,
            "error-spotting" => ExerciseKind::ErrorSpotting,
            "image-description" => ExerciseKind::ImageDescription,
            other => ExerciseKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ExerciseKind::FillInTheBlank => "fill-in-the-blank",
            ExerciseKind::SentenceScramble => "sentence-scramble",
            ExerciseKind::MultipleChoice => "multiple-choice",
            ExerciseKind::ErrorSpotting => "error-spotting",
            ExerciseKind::ImageDescription => "image-description",
            ExerciseKind::Other(kind) => kind,
        }
    }

    /// Whether the answer has exactly one right spelling.
    pub fn is_objective(&self) -> bool {
        matches!(
            self,
            ExerciseKind::FillInTheBlank
                | ExerciseKind::SentenceScramble
                | ExerciseKind::MultipleChoice
        )
    }
}

/// The parts of an exercise the core needs to grade and record an answer.
#[derive(Debug, Clone)]
pub struct Exercise {
    pub id: String,
    pub kind: ExerciseKind,
    pub question: String,
    pub correct_answer: String,
    /// Teaching note appended to objective feedback.
    pub explanation: String,
    /// Skill credited on success and blamed on failure.
    pub skill_target: String,
}

/// An external grader's decision on a subjective answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub is_correct: bool,
    pub feedback: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerOutcome {
    pub is_correct: bool,
    pub feedback: String,
    pub correct_answer: String,
    pub xp_earned: u64,
    pub level_up: bool,
}

/// Trimmed, case-insensitive comparison.
pub fn grade_objective(user_answer: &str, correct_answer: &str) -> bool {
    user_answer.trim().to_lowercase() == correct_answer.trim().to_lowercase()
}

fn weakness_item(question: &str) -> String {
    question.chars().take(WEAKNESS_ITEM_MAX_CHARS).collect()
}

fn objective_feedback(exercise: &Exercise, is_correct: bool) -> String {
    if is_correct {
        format!("Excellent! {}", exercise.explanation)
    } else {
        format!(
            "Not quite right. The correct answer is '{}'. {}",
            exercise.correct_answer, exercise.explanation
        )
    }
}

fn effort_feedback(is_correct: bool) -> String {
    if is_correct {
        "Great effort! Keep practicing!".to_string()
    } else {
        "Try to provide a more detailed answer.".to_string()
    }
}

impl ProgressService {
    /// Grades an answer and applies its consequences.
    ///
    /// Steps, each a separate store operation: store the attempt in
    /// `lesson_attempts`; on success bump the targeted skill, on a graded
    /// failure track a weakness keyed by the question's first 50 characters;
    /// award XP (5 correct, 2 incorrect).
    ///
    /// `verdict` is the external grader's decision and feedback, and is only
    /// consulted for subjective exercises. Without one, any answer longer
    /// than three characters counts as correct and no weakness is recorded.
    /// The feedback is stored with the attempt and returned.
    pub fn record_answer(
        &self,
        uid: &str,
        lesson_id: &str,
        exercise: &Exercise,
        user_answer: &str,
        verdict: Option<Verdict>,
    ) -> Result<AnswerOutcome> {
        let (is_correct, feedback, graded) = if exercise.kind.is_objective() {
            let is_correct = grade_objective(user_answer, &exercise.correct_answer);
            (is_correct, objective_feedback(exercise, is_correct), true)
        } else {
            match verdict {
                Some(v) => (v.is_correct, v.feedback, true),
                None => {
                    let is_correct = user_answer.trim().chars().count() > 3;
                    (is_correct, effort_feedback(is_correct), false)
                }
            }
        };

        let attempt = Document::new()
            .with("lesson_id", lesson_id)
            .with("user_id", uid)
            .with("exercise_id", exercise.id.as_str())
            .with("exercise_type", exercise.kind.as_str())
            .with("user_answer", user_answer)
            .with("is_correct", is_correct)
            .with("feedback", feedback.as_str())
            .with("timestamp", self.database().clock().now());
        self.database()
            .collection(LESSON_ATTEMPTS_COLLECTION)
            .insert_one(attempt)?;

        if is_correct {
            self.increment_skill(uid, &exercise.skill_target, CORRECT_ANSWER_SKILL_DELTA)?;
        } else if graded {
            self.track_weakness(uid, &exercise.skill_target, &weakness_item(&exercise.question))?;
        }

        let base_xp = if is_correct {
            CORRECT_ANSWER_XP
        } else {
            INCORRECT_ANSWER_XP
        };
        let award = self.add_xp(uid, base_xp)?;

        Ok(AnswerOutcome {
            is_correct,
            feedback,
            correct_answer: exercise.correct_answer.clone(),
            xp_earned: award.map_or(0, |a| a.xp_earned),
            level_up: award.is_some_and(|a| a.level_up),
        })
    }
}
