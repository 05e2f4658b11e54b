use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use tracing::debug;

use super::{found, non_blank};
use crate::database::AppState;
use crate::error::AppError;
use crate::model::{ViewRequest, ViewStats};

/// Records one profile view
///
/// Increments `viewCount`, appends a reach record and reports how many
/// views fall within the last seven days (the new one included).
///
/// # Request Body
///
/// ```json
/// { "email": "ada@example.com" }
/// ```
pub async fn record_view(
    State(state): State<AppState>,
    Json(payload): Json<ViewRequest>,
) -> Result<Json<ViewStats>, AppError> {
    let email = non_blank(&payload.email)
        .ok_or_else(|| AppError::validation("Email is required"))?;

    let outcome = found(state.store.update(email, |profile| {
        let now = Utc::now();
        profile.record_view(now);
        Ok::<_, AppError>(ViewStats::of(profile, now))
    })?)?;

    debug!("Recorded view {} for {}", outcome.value.view_count, email);
    Ok(Json(outcome.value))
}

/// Reports the view counter without incrementing it
pub async fn get_views(
    Path(email): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ViewStats>, AppError> {
    if email.trim().is_empty() {
        return Err(AppError::validation("Email is required"));
    }

    let profile = state
        .store
        .find(&email)?
        .ok_or_else(AppError::user_not_found)?;

    Ok(Json(ViewStats::of(&profile, Utc::now())))
}
