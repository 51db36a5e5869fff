//! Speaking scenario endpoints

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::AppState;

/// POST /api/speaking/:scenario_id/result
/// Submissions that are not completed are stored without touching progress.
pub async fn submit_result(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(scenario_id): Path<Uuid>,
    Json(payload): Json<SpeakingResultRequest>,
) -> Result<Json<SpeakingResultResponse>> {
    let response = state
        .progress
        .record_speaking_result(auth.user_id, scenario_id, payload)
        .await?;

    Ok(Json(response))
}
