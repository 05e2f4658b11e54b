use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use serde_json::{json, Value};
use tracing::info;

use super::{change_message, found, NO_CHANGES};
use crate::database::AppState;
use crate::error::AppError;
use crate::form::FormData;
use crate::merge::{upload_all, ProfileUpdate};
use crate::model::{IndexInput, RemoveEducationRequest, RemoveExperienceRequest};
use crate::uploader::UploadOptions;

/// Combined profile update
///
/// Multipart form fields:
/// - scalars: `name`, `bio`, `gender`, `dob`, `profession`, `phone`,
///   `linkedin`, `facebook`, `youtube`, `address`
/// - `newEducation` / `newExperience`: one JSON entry to append
/// - `removeEducationIndex` / `removeExperienceIndex`: index to drop
///   (out of range is ignored here, unlike the dedicated removal routes)
/// - `education` / `experience`: JSON arrays replacing the whole list
/// - files: `image` and `education[N][logo]`
///
/// All JSON is parsed before anything is uploaded; an upload failure aborts
/// the request without writing.
pub async fn update_profile(
    Path(email): Path<String>,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let form = FormData::read(multipart).await?;
    let mut update = ProfileUpdate::from_form(form)?;

    let current = state
        .store
        .find(&email)?
        .ok_or_else(AppError::user_not_found)?;
    update.discard_unplaced_logos(&current.education);

    let uploads = upload_all(state.uploader.as_ref(), &update).await?;

    let outcome = found(state.store.update(&email, |profile| {
        update.apply(profile, &uploads);
        Ok::<_, AppError>(())
    })?)?;

    info!("Profile update for {} (modified: {})", email, outcome.modified);
    Ok(Json(change_message(outcome.modified, "User updated successfully")))
}

/// Removes one education entry by index
///
/// # Response
///
/// - **200 OK** - entry removed
/// - **400 Bad Request** - index missing, not a number, or out of range
/// - **404 Not Found** - no such user
pub async fn remove_education(
    Path(email): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<RemoveEducationRequest>,
) -> Result<Json<Value>, AppError> {
    let outcome = found(state.store.update(&email, |profile| {
        let index = valid_index(
            payload.remove_education_index.as_ref(),
            profile.education.len(),
        )
        .ok_or_else(|| AppError::validation("Invalid education index"))?;
        profile.education.remove(index);
        Ok::<_, AppError>(())
    })?)?;

    Ok(Json(change_message(
        outcome.modified,
        "Education entry removed successfully",
    )))
}

/// Removes one experience entry by index; mirrors `remove_education`
pub async fn remove_experience(
    Path(email): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<RemoveExperienceRequest>,
) -> Result<Json<Value>, AppError> {
    let outcome = found(state.store.update(&email, |profile| {
        let index = valid_index(
            payload.remove_experience_index.as_ref(),
            profile.experience.len(),
        )
        .ok_or_else(|| AppError::validation("Invalid experience index"))?;
        profile.experience.remove(index);
        Ok::<_, AppError>(())
    })?)?;

    Ok(Json(change_message(
        outcome.modified,
        "Experience entry removed successfully",
    )))
}

/// Replaces the profile logo with the single uploaded `logo` file
pub async fn update_logo(
    Path(email): Path<String>,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let mut form = FormData::read(multipart).await?;
    let logo = form
        .take_file("logo")
        .ok_or_else(|| AppError::validation("No logo file uploaded"))?;

    if state.store.find(&email)?.is_none() {
        return Err(AppError::user_not_found());
    }

    let url = state.uploader.upload(&logo, UploadOptions::AUTO).await?;

    let outcome = found(state.store.update(&email, |profile| {
        profile.logo = Some(url.clone());
        Ok::<_, AppError>(())
    })?)?;

    let message = if outcome.modified {
        "Logo updated successfully"
    } else {
        NO_CHANGES
    };
    Ok(Json(json!({ "message": message, "url": url })))
}

fn valid_index(input: Option<&IndexInput>, len: usize) -> Option<usize> {
    input
        .and_then(IndexInput::as_index)
        .filter(|index| *index < len)
}
