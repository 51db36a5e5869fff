//! Queries run inside a learning-event transaction.
//!
//! Every function takes a plain connection so it can be driven by either a
//! transaction (`&mut *tx`) or a pooled connection for read paths.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use proficiency_core::{
    AchievementLedger, DailyProgress, IcaoCriteria, LevelInputs, ProgressSnapshot, StreakState, UserCounters,
};

use crate::error::{ApiError, Result};
use crate::models::*;

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

// === Locking ===

/// Lock the user row for the rest of the transaction.
///
/// Every write path takes this lock first, so events for one learner are
/// applied one at a time while different learners never contend.
pub async fn lock_user(conn: &mut PgConnection, user_id: Uuid) -> Result<DbUser> {
    sqlx::query_as::<_, DbUser>(
        r#"
        SELECT id, display_name, daily_goal_minutes, utc_offset_minutes, target_icao_level,
               predicted_icao_level, total_xp, total_practice_minutes, last_practice_at,
               created_at, last_seen_at
        FROM users
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(user_id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

// === Snapshot ===

pub async fn load_streak(conn: &mut PgConnection, user_id: Uuid) -> Result<Option<DbStreak>> {
    let streak = sqlx::query_as::<_, DbStreak>(
        r#"
        SELECT current_streak, longest_streak, last_practice_date
        FROM streaks
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(conn)
    .await?;

    Ok(streak)
}

pub async fn load_ledger(conn: &mut PgConnection, user_id: Uuid) -> Result<AchievementLedger> {
    let rows = sqlx::query_as::<_, DbUserAchievement>(
        r#"
        SELECT a.code, ua.progress, ua.unlocked, ua.unlocked_at
        FROM user_achievements ua
        JOIN achievements a ON a.id = ua.achievement_id
        WHERE ua.user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_all(conn)
    .await?;

    Ok(rows.into_iter().map(|r| (r.code.clone(), r.to_core())).collect())
}

/// Distinct completion counts that achievements are measured against
async fn load_activity_counts(conn: &mut PgConnection, user_id: Uuid) -> Result<(i64, i64, i64)> {
    let counts = sqlx::query_as::<_, (i64, i64, i64)>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM vocabulary_progress WHERE user_id = $1),
            (SELECT COUNT(DISTINCT exercise_id) FROM listening_attempts WHERE user_id = $1),
            (SELECT COUNT(DISTINCT scenario_id) FROM speaking_submissions
             WHERE user_id = $1 AND status = 'completed')
        "#,
    )
    .bind(user_id)
    .fetch_one(conn)
    .await?;

    Ok(counts)
}

/// Load everything an event may change for a locked user
pub async fn load_snapshot(conn: &mut PgConnection, user: &DbUser, today: NaiveDate) -> Result<ProgressSnapshot> {
    let daily = sqlx::query_as::<_, DbDailyProgress>(
        r#"
        SELECT date, vocab_reviewed, listening_completed, speaking_completed,
               practice_minutes, xp_earned, goal_met
        FROM daily_progress
        WHERE user_id = $1 AND date = $2
        "#,
    )
    .bind(user.id)
    .bind(today)
    .fetch_optional(&mut *conn)
    .await?
    .map(|row| row.to_core())
    .unwrap_or_else(|| DailyProgress::new(today));

    let streak = load_streak(&mut *conn, user.id)
        .await?
        .map(|row| row.to_core())
        .unwrap_or_default();

    let (vocab, listening, speaking) = load_activity_counts(&mut *conn, user.id).await?;
    let achievements = load_ledger(&mut *conn, user.id).await?;

    let clamp = |v: i64| u32::try_from(v.max(0)).unwrap_or(u32::MAX);

    Ok(ProgressSnapshot {
        today,
        daily,
        counters: UserCounters {
            vocab_count: clamp(vocab),
            listening_count: clamp(listening),
            speaking_count: clamp(speaking),
            current_streak: streak.current_streak,
            longest_streak: streak.longest_streak,
            total_xp: u64::try_from(user.total_xp).unwrap_or(0),
        },
        streak,
        total_practice_minutes: u64::try_from(user.total_practice_minutes).unwrap_or(0),
        achievements,
        daily_goal_minutes: u32::try_from(user.daily_goal_minutes).unwrap_or(0),
    })
}

/// Persist the snapshot after an event. `changed` names the achievement
/// codes whose ledger entries moved.
pub async fn save_snapshot(
    conn: &mut PgConnection,
    user_id: Uuid,
    snapshot: &ProgressSnapshot,
    changed: &[String],
    now: DateTime<Utc>,
) -> Result<()> {
    let daily = &snapshot.daily;
    sqlx::query(
        r#"
        INSERT INTO daily_progress (user_id, date, vocab_reviewed, listening_completed,
                                    speaking_completed, practice_minutes, xp_earned, goal_met)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (user_id, date) DO UPDATE SET
            vocab_reviewed = EXCLUDED.vocab_reviewed,
            listening_completed = EXCLUDED.listening_completed,
            speaking_completed = EXCLUDED.speaking_completed,
            practice_minutes = EXCLUDED.practice_minutes,
            xp_earned = EXCLUDED.xp_earned,
            goal_met = EXCLUDED.goal_met,
            updated_at = NOW()
        "#,
    )
    .bind(user_id)
    .bind(daily.date)
    .bind(to_i32(daily.vocab_reviewed))
    .bind(to_i32(daily.listening_completed))
    .bind(to_i32(daily.speaking_completed))
    .bind(to_i32(daily.practice_minutes))
    .bind(to_i32(daily.xp_earned))
    .bind(daily.goal_met)
    .execute(&mut *conn)
    .await?;

    save_streak(&mut *conn, user_id, &snapshot.streak).await?;

    sqlx::query(
        r#"
        UPDATE users
        SET total_xp = $2,
            total_practice_minutes = $3,
            last_practice_at = $4
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .bind(to_i64(snapshot.counters.total_xp))
    .bind(to_i64(snapshot.total_practice_minutes))
    .bind(now)
    .execute(&mut *conn)
    .await?;

    for code in changed {
        let Some(progress) = snapshot.achievements.get(code) else {
            continue;
        };
        sqlx::query(
            r#"
            INSERT INTO user_achievements (user_id, achievement_id, progress, unlocked, unlocked_at)
            SELECT $1, id, $3, $4, $5 FROM achievements WHERE code = $2
            ON CONFLICT (user_id, achievement_id) DO UPDATE SET
                progress = EXCLUDED.progress,
                unlocked = EXCLUDED.unlocked,
                unlocked_at = EXCLUDED.unlocked_at
            "#,
        )
        .bind(user_id)
        .bind(code)
        .bind(to_i32(progress.progress))
        .bind(progress.unlocked)
        .bind(progress.unlocked_at)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

async fn save_streak(conn: &mut PgConnection, user_id: Uuid, streak: &StreakState) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO streaks (user_id, current_streak, longest_streak, last_practice_date)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id) DO UPDATE SET
            current_streak = EXCLUDED.current_streak,
            longest_streak = EXCLUDED.longest_streak,
            last_practice_date = EXCLUDED.last_practice_date,
            updated_at = NOW()
        "#,
    )
    .bind(user_id)
    .bind(to_i32(streak.current_streak))
    .bind(to_i32(streak.longest_streak))
    .bind(streak.last_practice_date)
    .execute(conn)
    .await?;

    Ok(())
}

// === Review State ===

pub async fn get_review_state(conn: &mut PgConnection, user_id: Uuid, term_id: Uuid) -> Result<Option<DbReviewState>> {
    let state = sqlx::query_as::<_, DbReviewState>(
        r#"
        SELECT user_id, term_id, ease_factor, interval_days, repetitions, next_review_at,
               total_reviews, correct_reviews, last_quality, last_reviewed_at
        FROM vocabulary_progress
        WHERE user_id = $1 AND term_id = $2
        "#,
    )
    .bind(user_id)
    .bind(term_id)
    .fetch_optional(conn)
    .await?;

    Ok(state)
}

pub async fn upsert_review_state(conn: &mut PgConnection, state: &DbReviewState) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO vocabulary_progress (user_id, term_id, ease_factor, interval_days, repetitions,
                                         next_review_at, total_reviews, correct_reviews,
                                         last_quality, last_reviewed_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (user_id, term_id) DO UPDATE SET
            ease_factor = EXCLUDED.ease_factor,
            interval_days = EXCLUDED.interval_days,
            repetitions = EXCLUDED.repetitions,
            next_review_at = EXCLUDED.next_review_at,
            total_reviews = EXCLUDED.total_reviews,
            correct_reviews = EXCLUDED.correct_reviews,
            last_quality = EXCLUDED.last_quality,
            last_reviewed_at = EXCLUDED.last_reviewed_at,
            updated_at = NOW()
        "#,
    )
    .bind(state.user_id)
    .bind(state.term_id)
    .bind(state.ease_factor)
    .bind(state.interval_days)
    .bind(state.repetitions)
    .bind(state.next_review_at)
    .bind(state.total_reviews)
    .bind(state.correct_reviews)
    .bind(state.last_quality)
    .bind(state.last_reviewed_at)
    .execute(conn)
    .await?;

    Ok(())
}

// === Listening / Speaking ===

pub async fn get_listening_exercise(conn: &mut PgConnection, exercise_id: Uuid) -> Result<Option<DbActivity>> {
    let exercise = sqlx::query_as::<_, DbActivity>(
        r#"
        SELECT id, title, category, difficulty
        FROM listening_exercises
        WHERE id = $1
        "#,
    )
    .bind(exercise_id)
    .fetch_optional(conn)
    .await?;

    Ok(exercise)
}

pub async fn get_speaking_scenario(conn: &mut PgConnection, scenario_id: Uuid) -> Result<Option<DbActivity>> {
    let scenario = sqlx::query_as::<_, DbActivity>(
        r#"
        SELECT id, title, category, difficulty
        FROM speaking_scenarios
        WHERE id = $1
        "#,
    )
    .bind(scenario_id)
    .fetch_optional(conn)
    .await?;

    Ok(scenario)
}

pub async fn has_listening_attempt(conn: &mut PgConnection, user_id: Uuid, exercise_id: Uuid) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM listening_attempts WHERE user_id = $1 AND exercise_id = $2
        )
        "#,
    )
    .bind(user_id)
    .bind(exercise_id)
    .fetch_one(conn)
    .await?;

    Ok(exists)
}

pub async fn insert_listening_attempt(
    conn: &mut PgConnection,
    user_id: Uuid,
    exercise_id: Uuid,
    score_percent: f64,
    xp_earned: u32,
    now: DateTime<Utc>,
) -> Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO listening_attempts (id, user_id, exercise_id, score_percent, xp_earned, completed_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(exercise_id)
    .bind(score_percent)
    .bind(to_i32(xp_earned))
    .bind(now)
    .execute(conn)
    .await?;

    Ok(id)
}

pub async fn has_completed_submission(conn: &mut PgConnection, user_id: Uuid, scenario_id: Uuid) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM speaking_submissions
            WHERE user_id = $1 AND scenario_id = $2 AND status = 'completed'
        )
        "#,
    )
    .bind(user_id)
    .bind(scenario_id)
    .fetch_one(conn)
    .await?;

    Ok(exists)
}

/// Speaking submission to be recorded
pub struct NewSubmission<'a> {
    pub user_id: Uuid,
    pub scenario_id: Uuid,
    pub status: &'a str,
    pub criteria: Option<IcaoCriteria>,
    pub overall_score: Option<f64>,
    pub xp_earned: u32,
    pub completed_at: Option<DateTime<Utc>>,
}

pub async fn insert_speaking_submission(conn: &mut PgConnection, submission: &NewSubmission<'_>) -> Result<Uuid> {
    let id = Uuid::new_v4();
    let c = submission.criteria;
    sqlx::query(
        r#"
        INSERT INTO speaking_submissions (id, user_id, scenario_id, status, pronunciation, structure,
                                          vocabulary, fluency, comprehension, interaction,
                                          overall_score, xp_earned, completed_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        "#,
    )
    .bind(id)
    .bind(submission.user_id)
    .bind(submission.scenario_id)
    .bind(submission.status)
    .bind(c.map(|c| c.pronunciation))
    .bind(c.map(|c| c.structure))
    .bind(c.map(|c| c.vocabulary))
    .bind(c.map(|c| c.fluency))
    .bind(c.map(|c| c.comprehension))
    .bind(c.map(|c| c.interaction))
    .bind(submission.overall_score)
    .bind(to_i32(submission.xp_earned))
    .bind(submission.completed_at)
    .execute(conn)
    .await?;

    Ok(id)
}

// === Predicted Level ===

/// Aggregates behind the predicted ICAO level
pub async fn load_level_inputs(conn: &mut PgConnection, user_id: Uuid) -> Result<LevelInputs> {
    let reviews = sqlx::query_as::<_, (f64, i32, i32, i32)>(
        r#"
        SELECT ease_factor, repetitions, correct_reviews, total_reviews
        FROM vocabulary_progress
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;

    let vocabulary_mastery_percent = if reviews.is_empty() {
        0.0
    } else {
        let mastered = reviews
            .iter()
            .filter(|(ease, reps, correct, total)| {
                let percent = proficiency_core::mastery_percent(
                    *ease,
                    u32::try_from(*reps).unwrap_or(0),
                    u32::try_from(*correct).unwrap_or(0),
                    u32::try_from(*total).unwrap_or(0),
                );
                proficiency_core::meets_stats_threshold(percent)
            })
            .count();
        mastered as f64 / reviews.len() as f64 * 100.0
    };

    let listening_average_score: Option<f64> = sqlx::query_scalar(
        r#"
        SELECT AVG(score_percent) FROM listening_attempts WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_one(&mut *conn)
    .await?;

    let speaking = sqlx::query_as::<_, DbSpeakingAverages>(
        r#"
        SELECT COUNT(*) AS completed,
               AVG(pronunciation) AS pronunciation,
               AVG(structure) AS structure,
               AVG(vocabulary) AS vocabulary,
               AVG(fluency) AS fluency,
               AVG(comprehension) AS comprehension,
               AVG(interaction) AS interaction
        FROM speaking_submissions
        WHERE user_id = $1 AND status = 'completed'
        "#,
    )
    .bind(user_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(LevelInputs {
        vocabulary_mastery_percent,
        listening_average_score: listening_average_score.unwrap_or(0.0),
        speaking: speaking.to_criteria(),
    })
}

pub async fn update_predicted_level(conn: &mut PgConnection, user_id: Uuid, level: f64) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE users
        SET predicted_icao_level = $2
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .bind(level)
    .execute(conn)
    .await?;

    Ok(())
}
