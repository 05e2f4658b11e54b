use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use rand::{distr::Alphanumeric, Rng};
use serde_json::{json, Value};
use tracing::info;

use super::upload_batch;
use crate::database::AppState;
use crate::error::AppError;
use crate::form::FormData;
use crate::model::{Draft, DraftData, DraftFile};
use crate::uploader::{ResourceType, UploadOptions};

const DRAFT_UPLOADS: UploadOptions = UploadOptions {
    resource_type: ResourceType::Auto,
    folder: Some("user_drafts_files"),
};

/// Saves a new draft snapshot
///
/// Multipart fields: `files` (one or more) and `draftData`, a JSON object
/// such as
///
/// ```json
/// { "activeSection": "gallery", "gallery": { "files": [{ "title": "Cover" }] } }
/// ```
///
/// File `i` is titled from `draftData[activeSection].files[i].title`,
/// falling back to `"File {i+1}"`. Every save inserts a new record.
pub async fn save_draft(
    Path(email): Path<String>,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let mut form = FormData::read(multipart).await?;

    let raw = form
        .text("draftData")
        .ok_or_else(|| AppError::validation("draftData is required"))?;
    let draft_data: Value = serde_json::from_str(raw)
        .map_err(|e| AppError::validation(format!("Invalid draftData payload: {}", e)))?;
    let active_section = draft_data
        .get("activeSection")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let files = form.take_files("files")?;
    if files.is_empty() {
        return Err(AppError::validation("No files uploaded"));
    }

    let urls = upload_batch(state.uploader.as_ref(), &files, DRAFT_UPLOADS).await?;
    let files = urls
        .into_iter()
        .enumerate()
        .map(|(index, url)| DraftFile {
            title: draft_title(&draft_data, &active_section, index),
            url,
            active_section: active_section.clone(),
        })
        .collect();

    let draft = Draft {
        id: rand::rng()
            .sample_iter(&Alphanumeric)
            .take(12)
            .map(char::from)
            .collect(),
        email,
        draft_data: DraftData { files },
        created_at: Utc::now(),
    };
    state.store.insert_draft(&draft)?;

    info!("Saved draft {} for {}", draft.id, draft.email);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "New draft saved successfully", "draft": draft })),
    ))
}

/// Lists a user's saved drafts, oldest first
pub async fn list_drafts(
    Path(email): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Draft>>, AppError> {
    Ok(Json(state.store.drafts_for(&email)?))
}

fn draft_title(draft_data: &Value, section: &str, index: usize) -> String {
    draft_data
        .get(section)
        .and_then(|s| s.get("files"))
        .and_then(|files| files.get(index))
        .and_then(|file| file.get("title"))
        .and_then(Value::as_str)
        .filter(|title| !title.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("File {}", index + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titles_come_from_the_active_section_or_fall_back() {
        let data = json!({
            "activeSection": "gallery",
            "gallery": { "files": [{ "title": "Cover" }, {}] }
        });
        assert_eq!(draft_title(&data, "gallery", 0), "Cover");
        assert_eq!(draft_title(&data, "gallery", 1), "File 2");
        assert_eq!(draft_title(&data, "gallery", 5), "File 6");
        assert_eq!(draft_title(&data, "", 0), "File 1");
    }
}
