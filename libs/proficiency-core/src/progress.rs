//! Progression state machine for learning events.
//!
//! The caller loads a [`ProgressSnapshot`] for one learner, applies an event,
//! and persists everything the snapshot now holds. The orchestrator never
//! performs I/O; atomicity is the caller's job.

use chrono::{DateTime, NaiveDate, Utc};

use crate::achievements::{AchievementEngine, AchievementLedger, UserCounters};
use crate::algorithm::{get_algorithm, sm2::Sm2, SpacedRepetitionAlgorithm};
use crate::error::{CoreError, Result};
use crate::level::{predict_level, IcaoCriteria, LevelInputs, LevelWeights, PredictedLevel};
use crate::streak::{record_practice, StreakUpdate};
use crate::types::{
    AchievementDefinition, ActivityKind, DailyProgress, Quality, ReviewState, StreakState, MAX_DAILY_COUNT,
};
use crate::xp::{listening_xp, review_xp, session_xp, speaking_xp, SessionCounts};

/// Everything an event may read or modify for one learner.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    /// The learner's study date for the event.
    pub today: NaiveDate,
    /// Aggregate for `today`; a fresh record when nothing was logged yet.
    pub daily: DailyProgress,
    pub streak: StreakState,
    pub counters: UserCounters,
    pub total_practice_minutes: u64,
    pub achievements: AchievementLedger,
    /// Zero disables the daily goal.
    pub daily_goal_minutes: u32,
}

impl ProgressSnapshot {
    pub fn new(today: NaiveDate, daily_goal_minutes: u32) -> Self {
        Self {
            today,
            daily: DailyProgress::new(today),
            streak: StreakState::default(),
            counters: UserCounters::default(),
            total_practice_minutes: 0,
            achievements: AchievementLedger::new(),
            daily_goal_minutes,
        }
    }

    /// Progress towards today's goal in percent, capped at 100.
    pub fn goal_progress_percent(&self) -> f64 {
        if self.daily_goal_minutes == 0 {
            return 100.0;
        }
        let percent = f64::from(self.daily.practice_minutes) / f64::from(self.daily_goal_minutes) * 100.0;
        ((percent * 10.0).round() / 10.0).min(100.0)
    }
}

/// A completed learning activity.
#[derive(Debug, Clone, PartialEq)]
pub enum LearningEvent {
    VocabularyReview {
        quality: Quality,
        /// The learner had never reviewed this term before.
        first_review: bool,
    },
    ListeningCompleted {
        score_percent: f64,
        difficulty: i32,
        /// No earlier completed attempt on this exercise.
        first_attempt: bool,
    },
    SpeakingCompleted {
        criteria: IcaoCriteria,
        difficulty: i32,
        /// No earlier completed submission for this scenario.
        first_submission: bool,
    },
    PracticeSession(SessionCounts),
}

/// New values produced by one event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventOutcome {
    /// XP earned by the activity itself.
    pub xp_earned: u32,
    /// XP granted by achievements unlocked during this event.
    pub achievement_xp: u64,
    pub daily: DailyProgress,
    pub goal_progress_percent: f64,
    pub streak: StreakUpdate,
    pub new_achievements: Vec<AchievementDefinition>,
    /// Achievement codes whose ledger entries must be written.
    pub changed_achievements: Vec<String>,
}

impl EventOutcome {
    pub fn streak_maintained(&self) -> bool {
        self.streak.outcome.maintained()
    }

    pub fn streak_increased(&self) -> bool {
        self.streak.outcome.increased()
    }
}

/// Coordinates scheduler, streak tracker and achievement engine for each event.
pub struct ProgressOrchestrator {
    scheduler: Box<dyn SpacedRepetitionAlgorithm>,
    engine: AchievementEngine,
    weights: LevelWeights,
}

impl Default for ProgressOrchestrator {
    fn default() -> Self {
        Self::new(Box::new(Sm2::default()), AchievementEngine::with_default_catalog())
    }
}

impl ProgressOrchestrator {
    pub fn new(scheduler: Box<dyn SpacedRepetitionAlgorithm>, engine: AchievementEngine) -> Self {
        Self {
            scheduler,
            engine,
            weights: LevelWeights::default(),
        }
    }

    /// Build an orchestrator using the scheduler registered under `name`.
    pub fn with_algorithm(name: &str, engine: AchievementEngine) -> Result<Self> {
        let scheduler = get_algorithm(name).ok_or_else(|| CoreError::UnknownAlgorithm(name.to_string()))?;
        Ok(Self::new(scheduler, engine))
    }

    pub fn with_weights(mut self, weights: LevelWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn scheduler(&self) -> &dyn SpacedRepetitionAlgorithm {
        self.scheduler.as_ref()
    }

    pub fn engine(&self) -> &AchievementEngine {
        &self.engine
    }

    /// Apply one learning event to the snapshot.
    pub fn apply(&self, snapshot: &mut ProgressSnapshot, event: &LearningEvent, now: DateTime<Utc>) -> EventOutcome {
        let xp = match event {
            LearningEvent::VocabularyReview { quality, first_review } => {
                snapshot.daily.record_activity(ActivityKind::Vocabulary, 1);
                if *first_review {
                    snapshot.counters.vocab_count += 1;
                }
                review_xp(*quality)
            }
            LearningEvent::ListeningCompleted { score_percent, difficulty, first_attempt } => {
                snapshot.daily.record_activity(ActivityKind::Listening, 1);
                if *first_attempt {
                    snapshot.counters.listening_count += 1;
                }
                listening_xp(*score_percent, *difficulty, *first_attempt)
            }
            LearningEvent::SpeakingCompleted { criteria, difficulty, first_submission } => {
                snapshot.daily.record_activity(ActivityKind::Speaking, 1);
                if *first_submission {
                    snapshot.counters.speaking_count += 1;
                }
                speaking_xp(criteria.clamped().average(), *difficulty, *first_submission)
            }
            LearningEvent::PracticeSession(counts) => {
                let daily = &mut snapshot.daily;
                daily.record_activity(ActivityKind::Vocabulary, counts.vocab_reviewed);
                daily.record_activity(ActivityKind::Listening, counts.listening_completed);
                daily.record_activity(ActivityKind::Speaking, counts.speaking_completed);
                daily.add_minutes(counts.practice_minutes);
                snapshot.total_practice_minutes = snapshot
                    .total_practice_minutes
                    .saturating_add(u64::from(counts.practice_minutes));
                session_xp(counts)
            }
        };

        snapshot.daily.xp_earned = snapshot.daily.xp_earned.saturating_add(xp).min(MAX_DAILY_COUNT);
        snapshot.counters.total_xp += u64::from(xp);

        if snapshot.daily_goal_minutes > 0 && snapshot.daily.practice_minutes >= snapshot.daily_goal_minutes {
            snapshot.daily.goal_met = true;
        }

        let streak = record_practice(&snapshot.streak, snapshot.today);
        snapshot.streak = streak.state.clone();
        snapshot.counters.current_streak = snapshot.streak.current_streak;
        snapshot.counters.longest_streak = snapshot.streak.longest_streak;

        let evaluation = self.engine.evaluate(&snapshot.counters, &mut snapshot.achievements, now);
        snapshot.counters.total_xp += evaluation.xp_awarded;

        EventOutcome {
            xp_earned: xp,
            achievement_xp: evaluation.xp_awarded,
            daily: snapshot.daily.clone(),
            goal_progress_percent: snapshot.goal_progress_percent(),
            streak,
            new_achievements: evaluation.newly_unlocked,
            changed_achievements: evaluation.changed,
        }
    }

    /// Schedule a vocabulary review and apply its progression side effects.
    pub fn submit_review(
        &self,
        snapshot: &mut ProgressSnapshot,
        prior: Option<&ReviewState>,
        quality: Quality,
        now: DateTime<Utc>,
    ) -> (ReviewState, EventOutcome) {
        let state = self.scheduler.review(prior, quality, now);
        let event = LearningEvent::VocabularyReview {
            quality,
            first_review: prior.is_none(),
        };
        let outcome = self.apply(snapshot, &event, now);
        (state, outcome)
    }

    pub fn predicted_level(&self, inputs: &LevelInputs) -> PredictedLevel {
        predict_level(inputs, &self.weights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streak::StreakOutcome;
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, 15).unwrap()
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-04-15T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn first_review_starts_everything() {
        let orchestrator = ProgressOrchestrator::default();
        let mut snapshot = ProgressSnapshot::new(today(), 15);

        let (state, outcome) = orchestrator.submit_review(&mut snapshot, None, Quality::new(5), now());

        assert_eq!(state.repetitions, 1);
        assert_eq!(state.next_review_at, now() + Duration::days(1));
        assert_eq!(outcome.xp_earned, 10);
        assert_eq!(outcome.daily.vocab_reviewed, 1);
        assert_eq!(outcome.streak.outcome, StreakOutcome::Started);
        assert_eq!(snapshot.counters.vocab_count, 1);

        let codes: Vec<_> = outcome.new_achievements.iter().map(|d| d.code.as_str()).collect();
        assert_eq!(codes, vec!["first_word"]);
        assert_eq!(outcome.achievement_xp, 50);
        assert_eq!(snapshot.counters.total_xp, 60);
        // achievement XP is lifetime only
        assert_eq!(snapshot.daily.xp_earned, 10);
    }

    #[test]
    fn oversized_session_saturates_daily_counts() {
        let orchestrator = ProgressOrchestrator::default();
        let mut snapshot = ProgressSnapshot::new(today(), 15);
        snapshot.daily.vocab_reviewed = 3;
        snapshot.daily.practice_minutes = 10;

        let counts = SessionCounts::clamped(i64::MAX, 0, 0, i64::MAX);
        let outcome = orchestrator.apply(&mut snapshot, &LearningEvent::PracticeSession(counts), now());

        assert_eq!(outcome.daily.vocab_reviewed, MAX_DAILY_COUNT);
        assert_eq!(outcome.daily.practice_minutes, MAX_DAILY_COUNT);
        assert!(outcome.daily.goal_met);
        assert_eq!(outcome.goal_progress_percent, 100.0);
        assert_eq!(snapshot.total_practice_minutes, u64::from(MAX_DAILY_COUNT));
        assert_eq!(outcome.daily.xp_earned, MAX_DAILY_COUNT);
    }

    #[test]
    fn practice_yesterday_extends_streak() {
        let orchestrator = ProgressOrchestrator::default();
        let mut snapshot = ProgressSnapshot::new(today(), 15);
        snapshot.streak = StreakState {
            current_streak: 4,
            longest_streak: 6,
            last_practice_date: today().pred_opt(),
        };

        let outcome = orchestrator.apply(
            &mut snapshot,
            &LearningEvent::PracticeSession(SessionCounts::default()),
            now(),
        );

        assert_eq!(snapshot.streak.current_streak, 5);
        assert!(outcome.streak_maintained());
        assert!(outcome.streak_increased());
    }

    #[test]
    fn practice_after_gap_breaks_streak() {
        let orchestrator = ProgressOrchestrator::default();
        let mut snapshot = ProgressSnapshot::new(today(), 15);
        snapshot.streak = StreakState {
            current_streak: 8,
            longest_streak: 8,
            last_practice_date: Some(today() - Duration::days(3)),
        };

        let outcome = orchestrator.apply(
            &mut snapshot,
            &LearningEvent::PracticeSession(SessionCounts::default()),
            now(),
        );

        assert_eq!(snapshot.streak.current_streak, 1);
        assert_eq!(snapshot.streak.longest_streak, 8);
        assert!(!outcome.streak_maintained());
    }

    #[test]
    fn session_meets_goal_and_accumulates() {
        let orchestrator = ProgressOrchestrator::default();
        let mut snapshot = ProgressSnapshot::new(today(), 20);
        let counts = SessionCounts::clamped(5, 1, 0, 12);

        let first = orchestrator.apply(&mut snapshot, &LearningEvent::PracticeSession(counts), now());
        assert!(!first.daily.goal_met);
        assert_eq!(first.goal_progress_percent, 60.0);
        assert_eq!(first.xp_earned, 10 + 10 + 2);

        let second = orchestrator.apply(&mut snapshot, &LearningEvent::PracticeSession(counts), now());
        assert!(second.daily.goal_met);
        assert_eq!(second.goal_progress_percent, 100.0);
        assert_eq!(second.daily.vocab_reviewed, 10);
        assert_eq!(second.daily.practice_minutes, 24);
        assert_eq!(snapshot.total_practice_minutes, 24);
        assert_eq!(second.streak.outcome, StreakOutcome::SameDay);
    }

    #[test]
    fn zero_goal_is_never_met() {
        let orchestrator = ProgressOrchestrator::default();
        let mut snapshot = ProgressSnapshot::new(today(), 0);
        let outcome = orchestrator.apply(
            &mut snapshot,
            &LearningEvent::PracticeSession(SessionCounts::clamped(0, 0, 0, 90)),
            now(),
        );
        assert!(!outcome.daily.goal_met);
        assert_eq!(outcome.goal_progress_percent, 100.0);
    }

    #[test]
    fn tenth_distinct_term_unlocks_collector_once() {
        let orchestrator = ProgressOrchestrator::default();
        let mut snapshot = ProgressSnapshot::new(today(), 15);
        snapshot.counters.vocab_count = 8;

        let ninth = orchestrator.apply(
            &mut snapshot,
            &LearningEvent::VocabularyReview { quality: Quality::new(4), first_review: true },
            now(),
        );
        assert!(!ninth.new_achievements.iter().any(|d| d.code == "vocab_10"));
        assert_eq!(snapshot.achievements["vocab_10"].progress, 9);

        let tenth = orchestrator.apply(
            &mut snapshot,
            &LearningEvent::VocabularyReview { quality: Quality::new(4), first_review: true },
            now(),
        );
        assert!(tenth.new_achievements.iter().any(|d| d.code == "vocab_10"));
        let xp_after_unlock = snapshot.counters.total_xp;

        let again = orchestrator.engine().evaluate(&snapshot.counters, &mut snapshot.achievements, now());
        assert!(again.newly_unlocked.is_empty());
        assert_eq!(again.xp_awarded, 0);
        assert_eq!(snapshot.counters.total_xp, xp_after_unlock);
    }

    #[test]
    fn speaking_uses_criteria_average() {
        let orchestrator = ProgressOrchestrator::default();
        let mut snapshot = ProgressSnapshot::new(today(), 15);
        let criteria = IcaoCriteria {
            pronunciation: 4.0,
            structure: 4.0,
            vocabulary: 4.0,
            fluency: 4.0,
            comprehension: 4.0,
            interaction: 4.0,
        };

        let outcome = orchestrator.apply(
            &mut snapshot,
            &LearningEvent::SpeakingCompleted { criteria, difficulty: 2, first_submission: false },
            now(),
        );
        assert_eq!(outcome.xp_earned, 15);
        assert_eq!(outcome.daily.speaking_completed, 1);
        assert_eq!(snapshot.counters.speaking_count, 0);
    }

    #[test]
    fn unknown_algorithm_is_rejected() {
        let result = ProgressOrchestrator::with_algorithm("leitner", AchievementEngine::default());
        assert!(matches!(result, Err(CoreError::UnknownAlgorithm(name)) if name == "leitner"));
    }
}
