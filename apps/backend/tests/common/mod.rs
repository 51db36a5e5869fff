//! Shared harness for the HTTP integration tests.
//!
//! # Requirements
//! Integration tests require a PostgreSQL database (set DATABASE_URL).

pub mod fixtures;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use aviation_english_backend::config::Config;
use aviation_english_backend::db::Database;
use aviation_english_backend::routes::auth::hash_token;
use aviation_english_backend::{build_router, AppState};
use proficiency_core::catalog::default_catalog;
use proficiency_core::{AchievementEngine, ProgressOrchestrator};

/// Test context containing database connection and router.
pub struct TestContext {
    pub db: Arc<Database>,
    app: Router,
}

impl TestContext {
    /// Create a new test context with migrations applied and the
    /// achievement catalog seeded.
    ///
    /// # Panics
    /// Panics if DATABASE_URL is not set or database connection fails.
    pub async fn new() -> Self {
        let config = Config::from_env().expect("DATABASE_URL must be set for integration tests");

        let db = Database::connect(&config.database_url, 5)
            .await
            .expect("Failed to connect to test database");
        db.run_migrations().await.expect("Failed to run migrations");
        db.seed_achievements(&default_catalog())
            .await
            .expect("Failed to seed achievements");

        let catalog = db.get_achievement_catalog().await.expect("Failed to load catalog");
        let orchestrator = ProgressOrchestrator::with_algorithm("sm2", AchievementEngine::new(catalog))
            .expect("sm2 is always available");

        let state = AppState::new(db, orchestrator, config);
        let db = state.db.clone();

        Self {
            db,
            app: build_router(state),
        }
    }

    /// Get the router for use with axum-test.
    pub fn router(&self) -> Router {
        self.app.clone()
    }

    /// Create a learner directly and return their id and bearer token.
    pub async fn create_test_user(&self, daily_goal_minutes: i32) -> (Uuid, String) {
        let token = Uuid::new_v4().simple().to_string();
        let user = self
            .db
            .create_user(&hash_token(&token), Some("Test Pilot"), daily_goal_minutes, 0, 4)
            .await
            .expect("Failed to create test user");
        (user.id, token)
    }

    /// Format authorization header value.
    pub fn auth_header_value(token: &str) -> HeaderValue {
        HeaderValue::from_str(&format!("Bearer {}", token)).expect("token is ASCII")
    }

    pub async fn insert_term(&self, term: &str, category: &str, difficulty: i32) -> Uuid {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO vocabulary_terms (id, term, definition, category, difficulty)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id)
        .bind(term)
        .bind(format!("Definition of {}", term))
        .bind(category)
        .bind(difficulty)
        .execute(self.db.pool())
        .await
        .expect("Failed to insert term");
        id
    }

    pub async fn insert_listening_exercise(&self, difficulty: i32) -> Uuid {
        self.insert_activity("listening_exercises", "ATIS broadcast", difficulty).await
    }

    pub async fn insert_speaking_scenario(&self, difficulty: i32) -> Uuid {
        self.insert_activity("speaking_scenarios", "Engine failure on climb-out", difficulty)
            .await
    }

    async fn insert_activity(&self, table: &str, title: &str, difficulty: i32) -> Uuid {
        let id = Uuid::new_v4();
        sqlx::query(&format!(
            "INSERT INTO {} (id, title, category, difficulty) VALUES ($1, $2, 'test', $3)",
            table
        ))
        .bind(id)
        .bind(title)
        .bind(difficulty)
        .execute(self.db.pool())
        .await
        .expect("Failed to insert activity");
        id
    }

    /// Store an existing review state for a term.
    pub async fn insert_review_state(
        &self,
        user_id: Uuid,
        term_id: Uuid,
        ease_factor: f64,
        repetitions: i32,
        next_review_at: DateTime<Utc>,
    ) {
        sqlx::query(
            r#"
            INSERT INTO vocabulary_progress (user_id, term_id, ease_factor, interval_days,
                                             repetitions, next_review_at, total_reviews,
                                             correct_reviews)
            VALUES ($1, $2, $3, 1, $4, $5, $4, $4)
            "#,
        )
        .bind(user_id)
        .bind(term_id)
        .bind(ease_factor)
        .bind(repetitions)
        .bind(next_review_at)
        .execute(self.db.pool())
        .await
        .expect("Failed to insert review state");
    }

    /// Remove a learner; their progress rows cascade.
    pub async fn cleanup_user(&self, user_id: Uuid) {
        let _ = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(self.db.pool())
            .await;
    }

    /// Remove content rows created by a test.
    pub async fn cleanup_category(&self, category: &str) {
        let _ = sqlx::query("DELETE FROM vocabulary_terms WHERE category = $1")
            .bind(category)
            .execute(self.db.pool())
            .await;
    }
}
