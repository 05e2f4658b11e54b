//! Deleted-item archive
//!
//! The client moves entries here before removing them from a live list,
//! so they can be browsed and restored later.

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use tracing::{debug, info};

use super::found;
use crate::database::AppState;
use crate::error::AppError;
use crate::model::{ArchivedItemMatch, StoreDeletedItemRequest};

/// Appends `item` to the user's archive
pub async fn store_deleted_item(
    Path(email): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<StoreDeletedItemRequest>,
) -> Result<Json<Value>, AppError> {
    if payload.item.is_null() {
        return Err(AppError::validation("item is required"));
    }

    found(state.store.update(&email, |profile| {
        profile.deleted_items.push(payload.item.clone());
        Ok::<_, AppError>(())
    })?)?;

    debug!(
        "Archived {} item for {}",
        payload.item_type.as_deref().unwrap_or("untyped"),
        email
    );
    Ok(Json(json!({ "message": "Deleted item stored successfully" })))
}

pub async fn list_deleted_items(
    Path(email): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let profile = state
        .store
        .find(&email)?
        .ok_or_else(AppError::user_not_found)?;

    Ok(Json(json!({ "deletedItems": profile.deleted_items })))
}

/// Drops archived entries whose `image`, `video` or `title` matches the body
pub async fn delete_archived_item(
    Path(email): Path<String>,
    State(state): State<AppState>,
    Json(target): Json<ArchivedItemMatch>,
) -> Result<Json<Value>, AppError> {
    if target.is_empty() {
        return Err(AppError::validation("Provide an image, video or title to delete"));
    }

    let removed = state
        .store
        .update(&email, |profile| Ok::<_, AppError>(profile.pull_archived(&target)))?
        .map_or(0, |outcome| outcome.value);

    if removed == 0 {
        return Err(AppError::not_found("Item not found or already deleted"));
    }

    info!("Removed {} archived item(s) for {}", removed, email);
    Ok(Json(json!({ "message": "Item deleted successfully" })))
}

/// Returns the bare `deletedNews` list
pub async fn list_deleted_news(
    Path(email): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Value>>, AppError> {
    let profile = state
        .store
        .find(&email)?
        .ok_or_else(AppError::user_not_found)?;

    Ok(Json(profile.deleted_news))
}

/// Returns the profile's embedded `draft` list
pub async fn list_profile_drafts(
    Path(email): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let profile = state
        .store
        .find(&email)?
        .ok_or_else(AppError::user_not_found)?;

    Ok(Json(json!({ "drafts": profile.draft })))
}
