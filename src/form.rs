//! Multipart form reading
//!
//! Buffers a whole multipart body into memory: text fields are grouped by
//! name (a trailing `[]` is ignored, so `titles` and `titles[]` collect into
//! the same list) and file fields become `UploadedFile`s in arrival order.

use axum::extract::Multipart;
use std::collections::HashMap;
use tracing::debug;

use crate::error::AppError;
use crate::uploader::UploadedFile;

/// Largest single file accepted
pub const MAX_FILE_BYTES: usize = 20 * 1024 * 1024;

/// Largest number of files accepted under one field name
pub const MAX_FILES_PER_FIELD: usize = 10;

/// Request body limit that fits a full batch of maximum-size files
pub const MAX_BODY_BYTES: usize = MAX_FILE_BYTES * MAX_FILES_PER_FIELD + 1024 * 1024;

#[derive(Debug, Default)]
pub struct FormData {
    texts: HashMap<String, Vec<String>>,
    files: Vec<UploadedFile>,
}

impl FormData {
    /// Drains the multipart stream
    ///
    /// Files must be images or videos no larger than `MAX_FILE_BYTES`.
    /// Empty file inputs (no name, no content) are skipped.
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = FormData::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::validation(format!("Malformed multipart body: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);

            if file_name.is_none() {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::validation(format!("Unreadable field {}: {}", name, e)))?;
                form.texts
                    .entry(normalize(&name).to_string())
                    .or_default()
                    .push(text);
                continue;
            }

            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::validation(format!("Unreadable file {}: {}", name, e)))?;

            if bytes.is_empty() && file_name.as_deref().is_none_or(str::is_empty) {
                continue;
            }
            if !is_media(content_type.as_deref()) {
                return Err(AppError::validation("Only image and video files are allowed"));
            }
            if bytes.len() > MAX_FILE_BYTES {
                return Err(AppError::validation("File exceeds the 20MB limit"));
            }

            debug!(
                "Received file {} under {} ({} bytes)",
                file_name.as_deref().unwrap_or(""),
                name,
                bytes.len()
            );
            form.files.push(UploadedFile {
                field: name,
                file_name,
                content_type,
                bytes: bytes.to_vec(),
            });
        }

        Ok(form)
    }

    /// First value of a text field, if present and not blank
    pub fn text(&self, name: &str) -> Option<&str> {
        self.texts
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    /// Every value sent under a text field, in order
    pub fn texts(&self, name: &str) -> &[String] {
        self.texts.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Removes and returns the files sent under `field`, rejecting oversize batches
    pub fn take_files(&mut self, field: &str) -> Result<Vec<UploadedFile>, AppError> {
        let (taken, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.files)
            .into_iter()
            .partition(|file| normalize(&file.field) == field);
        self.files = rest;

        if taken.len() > MAX_FILES_PER_FIELD {
            return Err(AppError::validation(format!(
                "At most {} files may be uploaded at once",
                MAX_FILES_PER_FIELD
            )));
        }
        Ok(taken)
    }

    /// Removes and returns the first file sent under `field`
    pub fn take_file(&mut self, field: &str) -> Option<UploadedFile> {
        let position = self.files.iter().position(|file| file.field == field)?;
        Some(self.files.remove(position))
    }

    /// Removes and returns every file, leaving none behind
    pub fn take_all_files(&mut self) -> Vec<UploadedFile> {
        std::mem::take(&mut self.files)
    }
}

fn normalize(name: &str) -> &str {
    name.strip_suffix("[]").unwrap_or(name)
}

fn is_media(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| ct.starts_with("image/") || ct.starts_with("video/"))
}

#[cfg(test)]
impl FormData {
    /// Builds a form directly, bypassing the multipart stream
    pub fn from_parts(texts: &[(&str, &str)], files: Vec<UploadedFile>) -> Self {
        let mut form = FormData::default();
        for (name, value) in texts {
            form.texts
                .entry(normalize(name).to_string())
                .or_default()
                .push(value.to_string());
        }
        form.files = files;
        form
    }
}
