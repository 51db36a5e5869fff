//! Learning event processing.
//!
//! Each event runs in one transaction: lock the user row, load the progress
//! snapshot, let the orchestrator compute the new state, persist it, and
//! refresh the predicted level. Any failure rolls the whole event back.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use proficiency_core::date_utils::study_date;
use proficiency_core::{
    EventOutcome, LearningEvent, PredictedLevel, ProgressOrchestrator, ProgressSnapshot, Quality, SessionCounts,
    StreakSummary,
};

use crate::db::{progress as queries, Database};
use crate::error::{ApiError, Result};
use crate::models::*;

pub struct ProgressService {
    db: Arc<Database>,
    orchestrator: ProgressOrchestrator,
}

impl ProgressService {
    pub fn new(db: Arc<Database>, orchestrator: ProgressOrchestrator) -> Self {
        Self { db, orchestrator }
    }

    pub fn orchestrator(&self) -> &ProgressOrchestrator {
        &self.orchestrator
    }

    /// Persist the snapshot, recompute the predicted level and build the
    /// shared part of the event response.
    async fn finish_event(
        &self,
        conn: &mut PgConnection,
        user: &DbUser,
        snapshot: &ProgressSnapshot,
        outcome: &EventOutcome,
        now: DateTime<Utc>,
    ) -> Result<ProgressUpdate> {
        queries::save_snapshot(&mut *conn, user.id, snapshot, &outcome.changed_achievements, now).await?;

        let inputs = queries::load_level_inputs(&mut *conn, user.id).await?;
        let level = self.orchestrator.predicted_level(&inputs);
        queries::update_predicted_level(&mut *conn, user.id, level.level).await?;

        for achievement in &outcome.new_achievements {
            tracing::info!(
                user_id = %user.id,
                code = %achievement.code,
                xp = achievement.xp_reward,
                "achievement unlocked"
            );
        }

        Ok(ProgressUpdate {
            xp_earned: outcome.xp_earned,
            achievement_xp: outcome.achievement_xp,
            total_xp: snapshot.counters.total_xp,
            daily_progress: DailyProgressItem::from(&outcome.daily),
            streak_maintained: outcome.streak_maintained(),
            streak_increased: outcome.streak_increased(),
            current_streak: snapshot.streak.current_streak,
            goal_met: outcome.daily.goal_met,
            goal_progress_percent: outcome.goal_progress_percent,
            new_achievements: outcome.new_achievements.iter().map(UnlockedAchievement::from).collect(),
            predicted_level: level.level,
            level_change: ((level.level - user.predicted_icao_level) * 10.0).round() / 10.0,
        })
    }

    /// Schedule a vocabulary review and apply its progression side effects
    pub async fn submit_vocabulary_review(
        &self,
        user_id: Uuid,
        term_id: Uuid,
        quality: Quality,
    ) -> Result<SubmitReviewResponse> {
        self.db
            .get_term(term_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Vocabulary term not found".to_string()))?;

        let now = Utc::now();
        let mut tx = self.db.begin().await?;
        let user = queries::lock_user(&mut tx, user_id).await?;
        let mut snapshot =
            queries::load_snapshot(&mut tx, &user, study_date(now, user.utc_offset_minutes)).await?;

        let prior = queries::get_review_state(&mut tx, user_id, term_id)
            .await?
            .map(|row| row.to_core_state());

        let (state, outcome) = self
            .orchestrator
            .submit_review(&mut snapshot, prior.as_ref(), quality, now);

        queries::upsert_review_state(&mut tx, &DbReviewState::from_core_state(user_id, term_id, &state)).await?;
        let progress = self.finish_event(&mut tx, &user, &snapshot, &outcome, now).await?;
        tx.commit().await?;

        tracing::info!(
            user_id = %user_id,
            term_id = %term_id,
            quality = quality.value(),
            interval = state.interval_days,
            xp = outcome.xp_earned,
            "vocabulary review recorded"
        );

        Ok(SubmitReviewResponse {
            term_id,
            new_ease: state.ease_factor,
            new_interval: state.interval_days,
            new_reps: state.repetitions,
            next_review_at: state.next_review_at,
            mastery_percent: state.mastery_percent(),
            is_mastered: state.is_mastered(),
            progress,
        })
    }

    /// Record a completed listening attempt
    pub async fn record_listening_result(
        &self,
        user_id: Uuid,
        exercise_id: Uuid,
        score_percent: f64,
    ) -> Result<ListeningResultResponse> {
        let score_percent = if score_percent.is_finite() {
            score_percent.clamp(0.0, 100.0)
        } else {
            0.0
        };

        let now = Utc::now();
        let mut tx = self.db.begin().await?;
        let user = queries::lock_user(&mut tx, user_id).await?;

        let exercise = queries::get_listening_exercise(&mut tx, exercise_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Listening exercise not found".to_string()))?;

        let mut snapshot =
            queries::load_snapshot(&mut tx, &user, study_date(now, user.utc_offset_minutes)).await?;
        let first_attempt = !queries::has_listening_attempt(&mut tx, user_id, exercise_id).await?;

        let event = LearningEvent::ListeningCompleted {
            score_percent,
            difficulty: exercise.difficulty,
            first_attempt,
        };
        let outcome = self.orchestrator.apply(&mut snapshot, &event, now);

        let attempt_id = queries::insert_listening_attempt(
            &mut tx,
            user_id,
            exercise_id,
            score_percent,
            outcome.xp_earned,
            now,
        )
        .await?;
        let progress = self.finish_event(&mut tx, &user, &snapshot, &outcome, now).await?;
        tx.commit().await?;

        tracing::info!(
            user_id = %user_id,
            exercise_id = %exercise_id,
            score = score_percent,
            xp = outcome.xp_earned,
            "listening result recorded"
        );

        Ok(ListeningResultResponse {
            attempt_id,
            exercise_id,
            score_percent,
            first_attempt,
            progress,
        })
    }

    /// Record a speaking submission. Only completed submissions move progress.
    pub async fn record_speaking_result(
        &self,
        user_id: Uuid,
        scenario_id: Uuid,
        request: SpeakingResultRequest,
    ) -> Result<SpeakingResultResponse> {
        let criteria = request.criteria.map(|c| c.clamped());
        if request.status.awards_progress() && criteria.is_none() {
            return Err(ApiError::BadRequest(
                "criteria are required for a completed submission".to_string(),
            ));
        }

        let now = Utc::now();
        let mut tx = self.db.begin().await?;
        let user = queries::lock_user(&mut tx, user_id).await?;

        let scenario = queries::get_speaking_scenario(&mut tx, scenario_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Speaking scenario not found".to_string()))?;

        let first_submission = !queries::has_completed_submission(&mut tx, user_id, scenario_id).await?;
        let overall_score = criteria.map(|c| (c.average() * 10.0).round() / 10.0);

        let completed = match criteria {
            Some(criteria) if request.status.awards_progress() => {
                let mut snapshot =
                    queries::load_snapshot(&mut tx, &user, study_date(now, user.utc_offset_minutes)).await?;
                let event = LearningEvent::SpeakingCompleted {
                    criteria,
                    difficulty: scenario.difficulty,
                    first_submission,
                };
                let outcome = self.orchestrator.apply(&mut snapshot, &event, now);
                Some((snapshot, outcome))
            }
            _ => None,
        };
        let xp_earned = completed.as_ref().map_or(0, |(_, outcome)| outcome.xp_earned);

        let submission_id = queries::insert_speaking_submission(
            &mut tx,
            &queries::NewSubmission {
                user_id,
                scenario_id,
                status: request.status.as_str(),
                criteria,
                overall_score,
                xp_earned,
                completed_at: request.status.awards_progress().then_some(now),
            },
        )
        .await?;

        let progress = match &completed {
            Some((snapshot, outcome)) => Some(self.finish_event(&mut tx, &user, snapshot, outcome, now).await?),
            None => None,
        };
        tx.commit().await?;

        tracing::info!(
            user_id = %user_id,
            scenario_id = %scenario_id,
            status = request.status.as_str(),
            xp = xp_earned,
            "speaking result recorded"
        );

        Ok(SpeakingResultResponse {
            submission_id,
            scenario_id,
            status: request.status,
            overall_score,
            weakest_criterion: criteria.map(|c| c.weakest()),
            first_submission,
            progress,
        })
    }

    /// Log a free-form practice session
    pub async fn log_practice_session(
        &self,
        user_id: Uuid,
        request: &PracticeSessionRequest,
    ) -> Result<PracticeSessionResponse> {
        let counts = SessionCounts::clamped(
            request.vocab_reviewed,
            request.listening_completed,
            request.speaking_completed,
            request.practice_minutes,
        );

        let now = Utc::now();
        let mut tx = self.db.begin().await?;
        let user = queries::lock_user(&mut tx, user_id).await?;
        let today = study_date(now, user.utc_offset_minutes);
        let mut snapshot = queries::load_snapshot(&mut tx, &user, today).await?;

        let outcome = self
            .orchestrator
            .apply(&mut snapshot, &LearningEvent::PracticeSession(counts), now);
        let progress = self.finish_event(&mut tx, &user, &snapshot, &outcome, now).await?;
        tx.commit().await?;

        tracing::info!(
            user_id = %user_id,
            minutes = counts.practice_minutes,
            xp = outcome.xp_earned,
            streak = snapshot.streak.current_streak,
            "practice session logged"
        );

        Ok(PracticeSessionResponse {
            streak: StreakSummary::new(&snapshot.streak, today),
            progress,
        })
    }

    /// Predicted level from the learner's stored aggregates
    pub async fn predicted_level(&self, user_id: Uuid) -> Result<(PredictedLevel, proficiency_core::LevelInputs)> {
        let mut conn = self.db.pool().acquire().await?;
        let inputs = queries::load_level_inputs(&mut conn, user_id).await?;
        Ok((self.orchestrator.predicted_level(&inputs), inputs))
    }
}
