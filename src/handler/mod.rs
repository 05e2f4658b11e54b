//! HTTP request handlers for the portfolio API
//!
//! Each handler translates one route into a single document store
//! operation, optionally preceded by media uploads:
//! - `users`: profile creation, listing, lookup and token issuance
//! - `profile`: the combined profile update and its single-purpose variants
//! - `views`: the profile view counter
//! - `media`: gallery, video, blog and news lists (live and draft routes)
//! - `inbox`: notifications and calendar events
//! - `archive`: deleted-item archive and legacy draft projections
//! - `drafts`: saved draft snapshots

pub mod archive;
pub mod drafts;
pub mod inbox;
pub mod media;
pub mod profile;
pub mod users;
pub mod views;

use futures::future::try_join_all;
use serde_json::{json, Value};

use crate::database::Updated;
use crate::error::AppError;
use crate::uploader::{MediaUploader, UploadError, UploadOptions, UploadedFile};

/// Message returned when an update matched a profile but changed nothing
pub const NO_CHANGES: &str = "No changes made to the user";

/// Uploads files concurrently; the returned URLs follow the input order
pub async fn upload_batch(
    uploader: &dyn MediaUploader,
    files: &[UploadedFile],
    options: UploadOptions,
) -> Result<Vec<String>, UploadError> {
    try_join_all(files.iter().map(|file| uploader.upload(file, options))).await
}

/// Turns a missing profile into a 404
pub fn found<T>(updated: Option<Updated<T>>) -> Result<Updated<T>, AppError> {
    updated.ok_or_else(AppError::user_not_found)
}

/// `{"message": ...}` body reflecting whether the document changed
pub fn change_message(modified: bool, success: &str) -> Value {
    let message = if modified { success } else { NO_CHANGES };
    json!({ "message": message })
}

/// Returns the value if present and not blank
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
