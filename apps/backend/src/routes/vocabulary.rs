//! Vocabulary review endpoints

use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::Utc;
use uuid::Uuid;

use proficiency_core::{build_queue, is_mastered, mastery_percent, meets_stats_threshold, DueItem, NewItem, Quality};

use crate::error::Result;
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::AppState;

const DEFAULT_QUEUE_LIMIT: usize = 20;
const MAX_QUEUE_LIMIT: usize = 100;

/// Queue payload before it is flattened into a response item
enum QueuedTerm {
    Due(DbDueTerm),
    New(DbVocabularyTerm),
}

/// GET /api/vocabulary/queue
pub async fn queue(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Query(query): Query<ReviewQueueQuery>,
) -> Result<Json<ReviewQueueResponse>> {
    let limit = query.limit.unwrap_or(DEFAULT_QUEUE_LIMIT).clamp(1, MAX_QUEUE_LIMIT);
    let include_new = query.include_new.unwrap_or(true);
    let category = query.category.as_deref();
    let now = Utc::now();

    let due_terms = state.db.get_due_terms(auth.user_id, category, now).await?;
    let total_due = due_terms.len() as i64;
    let total_new = state.db.count_new_terms(auth.user_id, category).await?;

    let new_terms = if include_new {
        state.db.get_new_terms(auth.user_id, category, limit as i64).await?
    } else {
        Vec::new()
    };

    let due = due_terms
        .into_iter()
        .map(|term| DueItem {
            next_review_at: term.next_review_at,
            ease_factor: term.ease_factor,
            repetitions: term.repetitions.max(0) as u32,
            item: QueuedTerm::Due(term),
        })
        .collect();
    let fresh = new_terms
        .into_iter()
        .map(|term| NewItem {
            difficulty: term.difficulty,
            sort_key: term.term.clone(),
            item: QueuedTerm::New(term),
        })
        .collect();

    let items = build_queue(due, fresh, limit, include_new, now)
        .into_iter()
        .map(|entry| match entry.item {
            QueuedTerm::Due(term) => {
                let (reps, correct, total) = (
                    term.repetitions.max(0) as u32,
                    term.correct_reviews.max(0) as u32,
                    term.total_reviews.max(0) as u32,
                );
                ReviewQueueItem {
                    term_id: term.id,
                    term: term.term,
                    definition: term.definition,
                    category: term.category,
                    difficulty: term.difficulty,
                    priority: entry.priority,
                    overdue_days: entry.overdue_days,
                    is_new: false,
                    mastery_percent: mastery_percent(term.ease_factor, reps, correct, total),
                    is_mastered: is_mastered(term.ease_factor, reps, correct, total),
                    next_review_at: Some(term.next_review_at),
                }
            }
            QueuedTerm::New(term) => ReviewQueueItem {
                term_id: term.id,
                term: term.term,
                definition: term.definition,
                category: term.category,
                difficulty: term.difficulty,
                priority: entry.priority,
                overdue_days: 0,
                is_new: true,
                mastery_percent: 0.0,
                is_mastered: false,
                next_review_at: None,
            },
        })
        .collect();

    Ok(Json(ReviewQueueResponse {
        items,
        total_due,
        total_new,
    }))
}

/// POST /api/vocabulary/:term_id/review
pub async fn review(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(term_id): Path<Uuid>,
    Json(payload): Json<SubmitReviewRequest>,
) -> Result<Json<SubmitReviewResponse>> {
    let response = state
        .progress
        .submit_vocabulary_review(auth.user_id, term_id, Quality::new(payload.quality))
        .await?;

    Ok(Json(response))
}

/// GET /api/vocabulary/stats
pub async fn stats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<VocabularyStatsResponse>> {
    let rows = state.db.get_term_progress(auth.user_id).await?;
    let now = Utc::now();

    let mut categories: BTreeMap<String, (CategoryStats, f64)> = BTreeMap::new();
    for row in &rows {
        let (stats, mastery_sum) = categories.entry(row.category.clone()).or_insert_with(|| {
            (
                CategoryStats {
                    category: row.category.clone(),
                    total_terms: 0,
                    learned: 0,
                    mastered: 0,
                    due: 0,
                    average_mastery: 0.0,
                },
                0.0,
            )
        });
        stats.total_terms += 1;

        let (Some(ease), Some(reps), Some(next), Some(total), Some(correct)) = (
            row.ease_factor,
            row.repetitions,
            row.next_review_at,
            row.total_reviews,
            row.correct_reviews,
        ) else {
            continue;
        };

        let mastery = mastery_percent(ease, reps.max(0) as u32, correct.max(0) as u32, total.max(0) as u32);
        stats.learned += 1;
        if meets_stats_threshold(mastery) {
            stats.mastered += 1;
        }
        if next <= now {
            stats.due += 1;
        }
        *mastery_sum += mastery;
    }

    let categories: Vec<CategoryStats> = categories
        .into_values()
        .map(|(mut stats, mastery_sum)| {
            stats.average_mastery = share(mastery_sum, stats.learned);
            stats
        })
        .collect();

    let learned = categories.iter().map(|c| c.learned).sum::<u32>();
    let mastered = categories.iter().map(|c| c.mastered).sum::<u32>();

    Ok(Json(VocabularyStatsResponse {
        total_terms: categories.iter().map(|c| c.total_terms).sum(),
        learned,
        mastered,
        due: categories.iter().map(|c| c.due).sum(),
        mastery_percent: share(f64::from(mastered) * 100.0, learned),
        categories,
    }))
}

/// `total / learned` rounded to one decimal. Averages cover learned terms
/// only, matching the level read; zero when nothing is learned.
fn share(total: f64, learned: u32) -> f64 {
    if learned == 0 {
        return 0.0;
    }
    (total / f64::from(learned) * 10.0).round() / 10.0
}
