use chrono::{TimeZone, Utc};
use elysian_core::progress::{
    Exercise, ExerciseKind, QuizScore, ReadingAttempt, SpeakingAttempt, StreakOutcome,
};
use elysian_core::{Database, ManualClock, ProgressService};
use std::sync::Arc;
use std::thread;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("elysian_core=debug")
        .with_test_writer()
        .try_init();
}

fn service_at_noon() -> (ProgressService, Arc<ManualClock>) {
    init_tracing();
    let start = Utc.with_ymd_and_hms(2024, 3, 4, 12, 0, 0).unwrap();
    let clock = Arc::new(ManualClock::new(start));
    let db = Database::with_clock(clock.clone());
    (ProgressService::new(db), clock)
}

// ── Streaks ────────────────────────────────────────────────────────────

#[test]
fn test_streak_week_then_gap() {
    let (svc, clock) = service_at_noon();
    svc.get_or_create_user("u1", None, None).unwrap();

    assert_eq!(svc.update_daily_streak("u1").unwrap(), Some(StreakOutcome::Started));
    let user = svc.get_user("u1").unwrap().unwrap();
    assert_eq!((user.daily_streak, user.longest_streak, user.xp), (1, 1, 0));

    clock.advance_days(1);
    assert_eq!(
        svc.update_daily_streak("u1").unwrap(),
        Some(StreakOutcome::Extended { streak: 2, bonus_xp: 10 })
    );
    assert_eq!(svc.get_user("u1").unwrap().unwrap().xp, 10);

    for _ in 3..=6 {
        clock.advance_days(1);
        svc.update_daily_streak("u1").unwrap();
    }
    clock.advance_days(1);
    assert_eq!(
        svc.update_daily_streak("u1").unwrap(),
        Some(StreakOutcome::Extended { streak: 7, bonus_xp: 50 })
    );
    let user = svc.get_user("u1").unwrap().unwrap();
    assert_eq!((user.daily_streak, user.longest_streak), (7, 7));
    assert_eq!((user.xp, user.level), (100, 2));

    clock.advance_days(3);
    assert_eq!(
        svc.update_daily_streak("u1").unwrap(),
        Some(StreakOutcome::Reset { previous: 7 })
    );
    let user = svc.get_user("u1").unwrap().unwrap();
    assert_eq!((user.daily_streak, user.longest_streak, user.xp), (1, 7, 100));
}

#[test]
fn test_streak_same_day_is_idempotent() {
    let (svc, clock) = service_at_noon();
    svc.get_or_create_user("u1", None, None).unwrap();
    svc.update_daily_streak("u1").unwrap();
    clock.advance_days(1);
    svc.update_daily_streak("u1").unwrap();
    let before = svc.get_user("u1").unwrap().unwrap();

    for _ in 0..3 {
        assert_eq!(
            svc.update_daily_streak("u1").unwrap(),
            Some(StreakOutcome::Unchanged { streak: 2 })
        );
    }
    assert_eq!(svc.get_user("u1").unwrap().unwrap(), before);
}

#[test]
fn test_streak_for_unknown_learner() {
    let (svc, _) = service_at_noon();
    assert_eq!(svc.update_daily_streak("ghost").unwrap(), None);
    assert!(svc.database().collection("users").is_empty());
}

// ── Weaknesses ─────────────────────────────────────────────────────────

#[test]
fn test_repeated_weakness_ranks_first() {
    let (svc, _) = service_at_noon();
    svc.track_weakness("u1", "vocabulary", "idioms").unwrap();
    for _ in 0..3 {
        svc.track_weakness("u1", "grammar", "past tense").unwrap();
    }
    let top = svc.top_weaknesses("u1", 1).unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].label(), "grammar: past tense");
    assert_eq!(top[0].frequency, 3);
}

#[test]
fn test_concurrent_weakness_tracking_keeps_one_record() {
    let (svc, _) = service_at_noon();
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let svc = svc.clone();
            thread::spawn(move || {
                for _ in 0..25 {
                    svc.track_weakness("u1", "grammar", "articles").unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    let all = svc.top_weaknesses("u1", 10).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].frequency, 200);
}

// ── XP ─────────────────────────────────────────────────────────────────

#[test]
fn test_concurrent_xp_awards_are_not_lost() {
    let (svc, _) = service_at_noon();
    svc.get_or_create_user("u1", None, None).unwrap();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let svc = svc.clone();
            thread::spawn(move || {
                (0..50)
                    .filter(|_| svc.add_xp("u1", 5).unwrap().unwrap().level_up)
                    .count()
            })
        })
        .collect();
    let level_ups: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

    let user = svc.get_user("u1").unwrap().unwrap();
    assert_eq!(user.xp, 1000);
    assert_eq!(user.level, 11);
    assert_eq!(level_ups, 10);
}

// ── Lesson flow ────────────────────────────────────────────────────────

#[test]
fn test_lesson_answers_feed_dashboard() {
    let (svc, _) = service_at_noon();
    svc.get_or_create_user("u1", Some("ana@example.org"), Some("Ana")).unwrap();
    svc.update_daily_streak("u1").unwrap();

    let exercise = Exercise {
        id: "e1".into(),
        kind: ExerciseKind::parse("fill-in-the-blank"),
        question: "I _____ to the store yesterday.".into(),
        correct_answer: "went".into(),
        explanation: "Yesterday calls for the simple past.".into(),
        skill_target: "grammar".into(),
    };
    assert!(!svc.record_answer("u1", "l1", &exercise, "goed", None).unwrap().is_correct);
    assert!(!svc.record_answer("u1", "l1", &exercise, "go", None).unwrap().is_correct);
    assert!(svc.record_answer("u1", "l1", &exercise, " WENT ", None).unwrap().is_correct);

    let summary = svc.gamification_summary("u1").unwrap().unwrap();
    assert_eq!(summary.current_xp, 9);
    assert_eq!(summary.daily_streak, 1);

    assert_eq!(
        svc.weakness_labels("u1").unwrap(),
        vec!["grammar: I _____ to the store yesterday.".to_string()]
    );
    assert_eq!(
        svc.recommendations("u1").unwrap(),
        vec!["Practice I _____ to the store yesterday. in today's lesson".to_string()]
    );
    assert_eq!(svc.database().collection("lesson_attempts").len(), 3);
}

// ── Practice ───────────────────────────────────────────────────────────

#[test]
fn test_practice_feeds_counters_and_dashboard() {
    let (svc, _) = service_at_noon();
    svc.get_or_create_user("u1", None, None).unwrap();
    svc.update_daily_streak("u1").unwrap();

    let speaking = SpeakingAttempt {
        content: "The weather is nice today.".into(),
        transcription: "The weather is nice today.".into(),
        word_accuracy: 100.0,
        pronunciation_score: 80.0,
        intonation_score: None,
    };
    assert_eq!(svc.record_speaking("u1", &speaking).unwrap().xp_earned, 24);
    let quiz = QuizScore { correct: 3, total: 4 };
    assert_eq!(svc.record_listening("u1", quiz).unwrap().xp_earned, 36);
    let reading = ReadingAttempt {
        quiz: QuizScore { correct: 4, total: 4 },
        words: 300,
        reading_time_secs: 120.0,
        vocabulary_lookups: 2,
    };
    assert_eq!(svc.record_reading("u1", &reading).unwrap().xp_earned, 53);

    let user = svc.get_user("u1").unwrap().unwrap();
    assert_eq!(
        (
            user.total_speaking_attempts,
            user.total_listening_attempts,
            user.total_reading_attempts,
        ),
        (1, 1, 1)
    );
    assert_eq!(user.xp, 113);
    assert_eq!(user.level, 2);

    // Practice leaves the streak day alone.
    assert_eq!(
        svc.update_daily_streak("u1").unwrap(),
        Some(StreakOutcome::Unchanged { streak: 1 })
    );

    let stats = svc.dashboard_stats("u1").unwrap().unwrap();
    let done: Vec<bool> = stats.daily_activities.iter().map(|a| a.completed).collect();
    assert_eq!(done, vec![false, true, false]);
    assert_eq!(stats.weekly_stats.xp_this_week, 113);
    assert_eq!(stats.gamification.current_level, 2);
}
