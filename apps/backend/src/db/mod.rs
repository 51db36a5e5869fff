//! PostgreSQL database operations

pub mod progress;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Transaction};
use uuid::Uuid;

use proficiency_core::{AchievementDefinition, AchievementLedger};

use crate::error::{ApiError, Result};
use crate::models::*;

/// Database wrapper with connection pool
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to PostgreSQL and create connection pool
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Create a pool that connects on first use
    pub fn connect_lazy(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new().connect_lazy(database_url)?;
        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| ApiError::Migration(e.to_string()))?;
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Start a transaction for one learning event
    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>> {
        Ok(self.pool.begin().await?)
    }

    // === User Repository ===

    /// Create a learner identified by the digest of their bearer token
    pub async fn create_user(
        &self,
        token_hash: &str,
        display_name: Option<&str>,
        daily_goal_minutes: i32,
        utc_offset_minutes: i32,
        target_icao_level: i32,
    ) -> Result<DbUser> {
        let user = sqlx::query_as::<_, DbUser>(
            r#"
            INSERT INTO users (id, token_hash, display_name, daily_goal_minutes,
                               utc_offset_minutes, target_icao_level)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, display_name, daily_goal_minutes, utc_offset_minutes, target_icao_level,
                      predicted_icao_level, total_xp, total_practice_minutes, last_practice_at,
                      created_at, last_seen_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(token_hash)
        .bind(display_name)
        .bind(daily_goal_minutes)
        .bind(utc_offset_minutes)
        .bind(target_icao_level)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Get user by token digest
    pub async fn get_user_by_token_hash(&self, token_hash: &str) -> Result<Option<DbUser>> {
        let user = sqlx::query_as::<_, DbUser>(
            r#"
            SELECT id, display_name, daily_goal_minutes, utc_offset_minutes, target_icao_level,
                   predicted_icao_level, total_xp, total_practice_minutes, last_practice_at,
                   created_at, last_seen_at
            FROM users
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<DbUser>> {
        let user = sqlx::query_as::<_, DbUser>(
            r#"
            SELECT id, display_name, daily_goal_minutes, utc_offset_minutes, target_icao_level,
                   predicted_icao_level, total_xp, total_practice_minutes, last_practice_at,
                   created_at, last_seen_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Update user last_seen_at timestamp
    pub async fn update_last_seen(&self, user_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET last_seen_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // === Achievement Repository ===

    /// Insert or refresh catalog entries by code
    pub async fn seed_achievements(&self, catalog: &[AchievementDefinition]) -> Result<usize> {
        let mut tx = self.pool.begin().await?;

        for definition in catalog {
            sqlx::query(
                r#"
                INSERT INTO achievements (id, code, title, description, icon, category,
                                          requirement_type, requirement_value, xp_reward,
                                          is_hidden, sort_order)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                ON CONFLICT (code) DO UPDATE SET
                    title = EXCLUDED.title,
                    description = EXCLUDED.description,
                    icon = EXCLUDED.icon,
                    category = EXCLUDED.category,
                    requirement_type = EXCLUDED.requirement_type,
                    requirement_value = EXCLUDED.requirement_value,
                    xp_reward = EXCLUDED.xp_reward,
                    is_hidden = EXCLUDED.is_hidden,
                    sort_order = EXCLUDED.sort_order
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(&definition.code)
            .bind(&definition.title)
            .bind(&definition.description)
            .bind(&definition.icon)
            .bind(definition.category.as_str())
            .bind(definition.requirement_type.as_str())
            .bind(definition.requirement_value as i32)
            .bind(definition.xp_reward as i32)
            .bind(definition.is_hidden)
            .bind(definition.sort_order)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(catalog.len())
    }

    /// Load every stored achievement definition
    pub async fn get_achievement_catalog(&self) -> Result<Vec<AchievementDefinition>> {
        let rows = sqlx::query_as::<_, DbAchievement>(
            r#"
            SELECT id, code, title, description, icon, category, requirement_type,
                   requirement_value, xp_reward, is_hidden, sort_order
            FROM achievements
            ORDER BY sort_order, code
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let catalog = rows
            .iter()
            .map(DbAchievement::to_definition)
            .collect::<proficiency_core::Result<Vec<_>>>()?;
        Ok(catalog)
    }

    pub async fn get_achievement_ledger(&self, user_id: Uuid) -> Result<AchievementLedger> {
        let mut conn = self.pool.acquire().await?;
        progress::load_ledger(&mut conn, user_id).await
    }

    // === Content Repository ===

    pub async fn get_term(&self, term_id: Uuid) -> Result<Option<DbVocabularyTerm>> {
        let term = sqlx::query_as::<_, DbVocabularyTerm>(
            r#"
            SELECT id, term, definition, example_sentence, category, difficulty
            FROM vocabulary_terms
            WHERE id = $1
            "#,
        )
        .bind(term_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(term)
    }

    // === Review Queue Repository ===

    /// Terms with review state due at or before `now`
    pub async fn get_due_terms(
        &self,
        user_id: Uuid,
        category: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Vec<DbDueTerm>> {
        let terms = sqlx::query_as::<_, DbDueTerm>(
            r#"
            SELECT t.id, t.term, t.definition, t.category, t.difficulty,
                   p.ease_factor, p.repetitions, p.next_review_at,
                   p.total_reviews, p.correct_reviews
            FROM vocabulary_progress p
            JOIN vocabulary_terms t ON t.id = p.term_id
            WHERE p.user_id = $1
              AND p.next_review_at <= $2
              AND ($3::TEXT IS NULL OR t.category = $3)
            ORDER BY p.next_review_at, t.id
            "#,
        )
        .bind(user_id)
        .bind(now)
        .bind(category)
        .fetch_all(&self.pool)
        .await?;

        Ok(terms)
    }

    /// Terms the learner has never reviewed, easiest first
    pub async fn get_new_terms(
        &self,
        user_id: Uuid,
        category: Option<&str>,
        limit: i64,
    ) -> Result<Vec<DbVocabularyTerm>> {
        let terms = sqlx::query_as::<_, DbVocabularyTerm>(
            r#"
            SELECT t.id, t.term, t.definition, t.example_sentence, t.category, t.difficulty
            FROM vocabulary_terms t
            LEFT JOIN vocabulary_progress p ON p.term_id = t.id AND p.user_id = $1
            WHERE p.term_id IS NULL
              AND ($2::TEXT IS NULL OR t.category = $2)
            ORDER BY t.difficulty, t.term
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(category)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(terms)
    }

    pub async fn count_new_terms(&self, user_id: Uuid, category: Option<&str>) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM vocabulary_terms t
            LEFT JOIN vocabulary_progress p ON p.term_id = t.id AND p.user_id = $1
            WHERE p.term_id IS NULL
              AND ($2::TEXT IS NULL OR t.category = $2)
            "#,
        )
        .bind(user_id)
        .bind(category)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Every term with the learner's review state, if any
    pub async fn get_term_progress(&self, user_id: Uuid) -> Result<Vec<DbTermProgress>> {
        let rows = sqlx::query_as::<_, DbTermProgress>(
            r#"
            SELECT t.category, p.ease_factor, p.repetitions, p.next_review_at,
                   p.total_reviews, p.correct_reviews
            FROM vocabulary_terms t
            LEFT JOIN vocabulary_progress p ON p.term_id = t.id AND p.user_id = $1
            ORDER BY t.category
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    // === Daily Progress Repository ===

    pub async fn get_daily_progress_range(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DbDailyProgress>> {
        let rows = sqlx::query_as::<_, DbDailyProgress>(
            r#"
            SELECT date, vocab_reviewed, listening_completed, speaking_completed,
                   practice_minutes, xp_earned, goal_met
            FROM daily_progress
            WHERE user_id = $1 AND date >= $2 AND date <= $3
            ORDER BY date
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    // === Streak Repository ===

    pub async fn get_streak(&self, user_id: Uuid) -> Result<Option<DbStreak>> {
        let mut conn = self.pool.acquire().await?;
        progress::load_streak(&mut conn, user_id).await
    }
}
