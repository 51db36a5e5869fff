//! Vocabulary queue, review and stats API tests.
//!
//! These tests require a running PostgreSQL database.
//! Set DATABASE_URL environment variable before running.

mod common;

use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::{Duration, Utc};
use uuid::Uuid;

use common::fixtures;
use common::TestContext;

/// Test that overdue terms come first and new terms fill the rest, easiest first.
#[tokio::test]
#[ignore = "requires database"]
async fn test_queue_orders_due_before_new() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let (user_id, token) = ctx.create_test_user(15).await;
    let category = fixtures::unique_category("queue");

    let slightly_due = ctx.insert_term("squawk", &category, 1).await;
    let very_due = ctx.insert_term("mayday", &category, 1).await;
    let hard_new = ctx.insert_term("wind shear", &category, 3).await;
    let easy_new = ctx.insert_term("roger", &category, 1).await;

    let now = Utc::now();
    ctx.insert_review_state(user_id, slightly_due, 2.5, 2, now - Duration::hours(1)).await;
    ctx.insert_review_state(user_id, very_due, 2.5, 2, now - Duration::days(5)).await;

    let response = server
        .get("/api/vocabulary/queue")
        .add_query_param("category", &category)
        .add_header(
            axum::http::header::AUTHORIZATION,
            TestContext::auth_header_value(&token),
        )
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let ids: Vec<Uuid> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["term_id"].as_str().unwrap().parse().unwrap())
        .collect();
    assert_eq!(ids, vec![very_due, slightly_due, easy_new, hard_new]);
    assert_eq!(body["total_due"], 2);
    assert_eq!(body["total_new"], 2);
    assert_eq!(body["items"][0]["overdue_days"], 5);
    assert_eq!(body["items"][2]["is_new"], true);

    ctx.cleanup_user(user_id).await;
    ctx.cleanup_category(&category).await;
}

/// Test that include_new=false leaves new terms out.
#[tokio::test]
#[ignore = "requires database"]
async fn test_queue_without_new_terms() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let (user_id, token) = ctx.create_test_user(15).await;
    let category = fixtures::unique_category("queue");

    ctx.insert_term("holding point", &category, 1).await;

    let response = server
        .get("/api/vocabulary/queue")
        .add_query_param("category", &category)
        .add_query_param("include_new", false)
        .add_header(
            axum::http::header::AUTHORIZATION,
            TestContext::auth_header_value(&token),
        )
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert!(body["items"].as_array().unwrap().is_empty());
    assert_eq!(body["total_new"], 1);

    ctx.cleanup_user(user_id).await;
    ctx.cleanup_category(&category).await;
}

/// Test the first review of a term: SM-2 state, XP and the first achievement.
#[tokio::test]
#[ignore = "requires database"]
async fn test_first_review_awards_progress() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let (user_id, token) = ctx.create_test_user(15).await;
    let category = fixtures::unique_category("review");
    let term_id = ctx.insert_term("go around", &category, 1).await;

    let response = server
        .post(&format!("/api/vocabulary/{}/review", term_id))
        .add_header(
            axum::http::header::AUTHORIZATION,
            TestContext::auth_header_value(&token),
        )
        .json(&fixtures::review_request(4))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["new_ease"], 2.5);
    assert_eq!(body["new_interval"], 1);
    assert_eq!(body["new_reps"], 1);
    assert_eq!(body["xp_earned"], 8);
    assert_eq!(body["achievement_xp"], 50);
    assert_eq!(body["total_xp"], 58);
    assert_eq!(body["current_streak"], 1);
    assert_eq!(body["streak_increased"], true);
    assert_eq!(body["new_achievements"][0]["code"], "first_word");

    // A second review the same day keeps the streak and unlocks nothing new
    let response = server
        .post(&format!("/api/vocabulary/{}/review", term_id))
        .add_header(
            axum::http::header::AUTHORIZATION,
            TestContext::auth_header_value(&token),
        )
        .json(&fixtures::review_request(5))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["new_reps"], 2);
    assert_eq!(body["new_interval"], 6);
    assert_eq!(body["current_streak"], 1);
    assert_eq!(body["streak_maintained"], true);
    assert_eq!(body["streak_increased"], false);
    assert!(body["new_achievements"].as_array().unwrap().is_empty());
    assert_eq!(body["daily_progress"]["vocab_reviewed"], 2);

    ctx.cleanup_user(user_id).await;
    ctx.cleanup_category(&category).await;
}

/// Test that a failed recall resets repetitions.
#[tokio::test]
#[ignore = "requires database"]
async fn test_failed_review_resets_repetitions() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let (user_id, token) = ctx.create_test_user(15).await;
    let category = fixtures::unique_category("review");
    let term_id = ctx.insert_term("pan pan", &category, 2).await;
    ctx.insert_review_state(user_id, term_id, 2.5, 3, Utc::now()).await;

    let response = server
        .post(&format!("/api/vocabulary/{}/review", term_id))
        .add_header(
            axum::http::header::AUTHORIZATION,
            TestContext::auth_header_value(&token),
        )
        .json(&fixtures::review_request(1))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["new_reps"], 0);
    assert_eq!(body["new_interval"], 1);
    assert_eq!(body["new_ease"], 1.96);
    assert_eq!(body["xp_earned"], 2);

    ctx.cleanup_user(user_id).await;
    ctx.cleanup_category(&category).await;
}

/// Test reviewing a term that does not exist.
#[tokio::test]
#[ignore = "requires database"]
async fn test_review_unknown_term() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let (user_id, token) = ctx.create_test_user(15).await;

    let response = server
        .post(&format!("/api/vocabulary/{}/review", Uuid::new_v4()))
        .add_header(
            axum::http::header::AUTHORIZATION,
            TestContext::auth_header_value(&token),
        )
        .json(&fixtures::review_request(3))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);

    ctx.cleanup_user(user_id).await;
}

/// Test vocabulary stats count learned, mastered and due terms.
#[tokio::test]
#[ignore = "requires database"]
async fn test_vocabulary_stats() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let (user_id, token) = ctx.create_test_user(15).await;
    let category = fixtures::unique_category("stats");

    let learned = ctx.insert_term("taxi", &category, 1).await;
    let mastered = ctx.insert_term("line up", &category, 1).await;
    ctx.insert_term("vacate", &category, 1).await;
    ctx.insert_review_state(user_id, learned, 2.5, 2, Utc::now() - Duration::hours(2)).await;
    ctx.insert_review_state(user_id, mastered, 3.0, 5, Utc::now() + Duration::days(10)).await;

    let response = server
        .get("/api/vocabulary/stats")
        .add_header(
            axum::http::header::AUTHORIZATION,
            TestContext::auth_header_value(&token),
        )
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let stats = body["categories"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["category"] == category.as_str())
        .unwrap()
        .clone();
    assert_eq!(stats["total_terms"], 3);
    assert_eq!(stats["learned"], 2);
    assert_eq!(stats["due"], 1);
    assert_eq!(stats["mastered"], 1);
    // Averages cover learned terms only: (73.2 + 100.0) / 2
    assert_eq!(stats["average_mastery"], 86.6);
    // The learner has review state only in this category
    assert_eq!(body["learned"], 2);
    assert_eq!(body["mastery_percent"], 50.0);

    ctx.cleanup_user(user_id).await;
    ctx.cleanup_category(&category).await;
}
