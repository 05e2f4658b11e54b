use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{info, warn};

use super::non_blank;
use crate::database::AppState;
use crate::error::AppError;
use crate::model::{CreateUserRequest, Profile, ProfileView, TokenParams, TokenResponse};

/// Creates a minimal profile
///
/// # Request Body
///
/// ```json
/// { "name": "Ada", "email": "ada@example.com" }
/// ```
///
/// # Response
///
/// - **201 Created** - the stored profile
/// - **400 Bad Request** - name or email missing
/// - **409 Conflict** - a profile already exists for this email
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<Profile>), AppError> {
    let (Some(name), Some(email)) = (non_blank(&payload.name), non_blank(&payload.email)) else {
        return Err(AppError::validation("Name and email are required"));
    };

    let profile = Profile::new(name, email);
    if !state.store.insert(&profile)? {
        return Err(AppError::conflict("A user with this email already exists"));
    }

    info!("Created profile for {}", profile.email);
    Ok((StatusCode::CREATED, Json(profile)))
}

/// Lists every stored profile
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<Profile>>, AppError> {
    Ok(Json(state.store.list()?))
}

/// Returns the defaulted projection of one profile
///
/// Every key is present: unset scalars are empty strings (the image is
/// `null`) and unset lists are empty arrays.
pub async fn get_user(
    Path(email): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ProfileView>, AppError> {
    let profile = state.store.find(&email)?.ok_or_else(|| {
        warn!("User with email {} not found", email);
        AppError::user_not_found()
    })?;

    Ok(Json(ProfileView::from(profile)))
}

/// Issues a one-hour access token for an existing profile
///
/// `GET /users/jwt?email=...` answers **403** with an empty token when no
/// profile matches.
pub async fn issue_token(
    State(state): State<AppState>,
    Query(params): Query<TokenParams>,
) -> Result<Response, AppError> {
    let profile = match non_blank(&params.email) {
        Some(email) => state.store.find(email)?,
        None => None,
    };

    let Some(profile) = profile else {
        return Ok((
            StatusCode::FORBIDDEN,
            Json(TokenResponse {
                access_token: String::new(),
            }),
        )
            .into_response());
    };

    let access_token = state.tokens.issue(&profile.email)?;
    Ok(Json(TokenResponse { access_token }).into_response())
}
