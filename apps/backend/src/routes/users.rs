//! Learner registration

use axum::{extract::State, Json};
use uuid::Uuid;

use proficiency_core::date_utils::MAX_UTC_OFFSET_MINUTES;

use crate::error::{ApiError, Result};
use crate::models::{RegisterRequest, RegisterResponse};
use crate::routes::auth::hash_token;
use crate::AppState;

/// POST /api/users/register
/// Creates a learner and returns the bearer token. The token is shown once.
pub async fn register(
    State(state): State<AppState>,
    payload: Option<Json<RegisterRequest>>,
) -> Result<Json<RegisterResponse>> {
    let request = payload.map(|Json(p)| p).unwrap_or_default();

    let daily_goal_minutes = request
        .daily_goal_minutes
        .unwrap_or(state.config.default_daily_goal_minutes as i32);
    if !(0..=24 * 60).contains(&daily_goal_minutes) {
        return Err(ApiError::BadRequest(
            "daily_goal_minutes must be between 0 and 1440".to_string(),
        ));
    }

    let utc_offset_minutes = request.utc_offset_minutes.unwrap_or(0);
    if utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
        return Err(ApiError::BadRequest(
            "utc_offset_minutes must be within ±840".to_string(),
        ));
    }

    let target_icao_level = request.target_icao_level.unwrap_or(4).clamp(1, 6);

    let token = Uuid::new_v4().simple().to_string();
    let user = state
        .db
        .create_user(
            &hash_token(&token),
            request.display_name.as_deref(),
            daily_goal_minutes,
            utc_offset_minutes,
            target_icao_level,
        )
        .await?;

    tracing::info!(user_id = %user.id, "registered new user");

    Ok(Json(RegisterResponse {
        user_id: user.id,
        token,
        daily_goal_minutes: user.daily_goal_minutes,
    }))
}
