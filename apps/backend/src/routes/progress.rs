//! Progress, streak, achievement and level endpoints

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::Utc;

use proficiency_core::date_utils::{study_date, trailing_window};
use proficiency_core::{AchievementBoard, StreakState, StreakSummary, XpLevel};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::AppState;

/// Default reporting window for daily progress
const DAILY_WINDOW_DAYS: u32 = 30;

/// POST /api/progress/practice-session
pub async fn practice_session(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(payload): Json<PracticeSessionRequest>,
) -> Result<Json<PracticeSessionResponse>> {
    let response = state.progress.log_practice_session(auth.user_id, &payload).await?;
    Ok(Json(response))
}

/// GET /api/progress/streak
pub async fn streak(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<StreakSummary>> {
    let today = study_date(Utc::now(), auth.utc_offset_minutes);
    let streak = load_streak_state(&state, &auth).await?;

    Ok(Json(StreakSummary::new(&streak, today)))
}

/// GET /api/progress/daily
pub async fn daily(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Query(query): Query<DailyProgressQuery>,
) -> Result<Json<DailyProgressResponse>> {
    let today = study_date(Utc::now(), auth.utc_offset_minutes);
    let (default_start, default_end) = trailing_window(today, DAILY_WINDOW_DAYS);
    let start_date = query.start_date.unwrap_or(default_start);
    let end_date = query.end_date.unwrap_or(default_end);

    if start_date > end_date {
        return Err(ApiError::BadRequest(
            "start_date must not be after end_date".to_string(),
        ));
    }

    let items: Vec<DailyProgressItem> = state
        .db
        .get_daily_progress_range(auth.user_id, start_date, end_date)
        .await?
        .iter()
        .map(|row| DailyProgressItem::from(&row.to_core()))
        .collect();

    let active_days = items.iter().filter(|item| item.total_activities > 0).count();
    let streak = load_streak_state(&state, &auth).await?;

    Ok(Json(DailyProgressResponse {
        items,
        start_date,
        end_date,
        active_days,
        total_days: (end_date - start_date).num_days() + 1,
        streak: StreakSummary::new(&streak, today),
    }))
}

/// GET /api/progress/achievements
pub async fn achievements(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<AchievementBoard>> {
    let ledger = state.db.get_achievement_ledger(auth.user_id).await?;
    let board = state.progress.orchestrator().engine().board(&ledger);

    Ok(Json(board))
}

/// GET /api/progress/level
pub async fn level(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<LevelResponse>> {
    let user = state
        .db
        .get_user(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let (predicted, inputs) = state.progress.predicted_level(auth.user_id).await?;
    let on_track_for_goal = predicted.level >= f64::from(user.target_icao_level) - 0.5;

    Ok(Json(LevelResponse {
        predicted,
        target_icao_level: user.target_icao_level,
        on_track_for_goal,
        vocabulary_mastery_percent: inputs.vocabulary_mastery_percent,
        listening_average_score: inputs.listening_average_score,
        speaking: inputs.speaking,
        xp: XpLevel::from_total(u64::try_from(user.total_xp).unwrap_or(0)),
    }))
}

async fn load_streak_state(state: &AppState, auth: &AuthenticatedUser) -> Result<StreakState> {
    Ok(state
        .db
        .get_streak(auth.user_id)
        .await?
        .map(|row| row.to_core())
        .unwrap_or_default())
}
