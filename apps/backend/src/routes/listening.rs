//! Listening exercise endpoints

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::AppState;

/// POST /api/listening/:exercise_id/result
pub async fn submit_result(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(exercise_id): Path<Uuid>,
    Json(payload): Json<ListeningResultRequest>,
) -> Result<Json<ListeningResultResponse>> {
    let response = state
        .progress
        .record_listening_result(auth.user_id, exercise_id, payload.score_percent)
        .await?;

    Ok(Json(response))
}
