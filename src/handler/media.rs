//! Gallery, video, blog and news lists
//!
//! Upload routes accept up to ten files plus parallel metadata lists
//! (`titles`, and for posts `desc` and `date`). Metadata lists shorter
//! than the file list are padded with defaults so every file yields
//! exactly one entry, in upload order.

use axum::{
    extract::{Multipart, Path, Query, State},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};
use std::iter;
use tracing::info;

use super::{found, non_blank, upload_batch, NO_CHANGES};
use crate::database::AppState;
use crate::error::AppError;
use crate::form::FormData;
use crate::model::{
    Category, DeleteItemRequest, GalleryItem, MediaItemKind, PermanentDeleteParams, Post, Profile,
    VideoItem,
};
use crate::uploader::UploadOptions;

pub const DEFAULT_TITLE: &str = "Untitled";
pub const DEFAULT_DESCRIPTION: &str = "No description";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Gallery,
    Videos,
    Blog,
    News,
}

/// Live routes append to the public lists; draft routes additionally
/// require at least one file and store uploads in separate folders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Live,
    Draft,
}

impl Section {
    /// Multipart field carrying the files, also the JSON key in responses
    fn key(self) -> &'static str {
        match self {
            Self::Gallery => "gallery",
            Self::Videos => "videos",
            Self::Blog => "blog",
            Self::News => "news",
        }
    }

    fn upload_options(self, mode: Mode) -> UploadOptions {
        match (self, mode) {
            (Self::Gallery, _) => UploadOptions::image("user_gallery"),
            (Self::Videos, _) => UploadOptions::video("user_videos"),
            (Self::Blog, Mode::Live) => UploadOptions::image("user_blog_images"),
            (Self::Blog, Mode::Draft) => UploadOptions::image("user_blogs"),
            (Self::News, Mode::Live) => UploadOptions::image("user_news_images"),
            (Self::News, Mode::Draft) => UploadOptions::image("user_news"),
        }
    }

    fn updated_message(self) -> &'static str {
        match self {
            Self::Gallery => "Gallery updated successfully",
            Self::Videos => "Videos updated successfully",
            Self::Blog => "Blog updated successfully",
            Self::News => "News updated successfully",
        }
    }

    fn fetched_messages(self) -> (&'static str, &'static str) {
        match self {
            Self::Gallery => ("Gallery fetched successfully", "No gallery items found for this user"),
            Self::Videos => ("Videos fetched successfully", "No videos found for this user"),
            Self::Blog => ("Blog fetched successfully", "No blogs found for this user"),
            Self::News => ("News fetched successfully", "No news found for this user"),
        }
    }

    fn entries(self, profile: &Profile) -> Value {
        match self {
            Self::Gallery => json!(profile.gallery),
            Self::Videos => json!(profile.videos),
            Self::Blog => json!(profile.blog),
            Self::News => json!(profile.news),
        }
    }
}

/// Entries built from one upload request
#[derive(Debug, Clone, PartialEq)]
enum NewEntries {
    Gallery(Vec<GalleryItem>),
    Videos(Vec<VideoItem>),
    Blog(Vec<Post>),
    News(Vec<Post>),
}

impl NewEntries {
    /// Pairs each uploaded URL with its padded metadata
    fn build(section: Section, urls: Vec<String>, form: &FormData) -> Self {
        let count = urls.len();
        let titles = padded(form.texts("titles"), count, || DEFAULT_TITLE.to_string());

        match section {
            Section::Gallery => Self::Gallery(
                urls.into_iter()
                    .zip(titles)
                    .map(|(image, title)| GalleryItem { image, title })
                    .collect(),
            ),
            Section::Videos => Self::Videos(
                urls.into_iter()
                    .zip(titles)
                    .map(|(video, title)| VideoItem { video, title })
                    .collect(),
            ),
            Section::Blog => Self::Blog(posts(urls, titles, form)),
            Section::News => Self::News(posts(urls, titles, form)),
        }
    }

    fn append_to(&self, profile: &mut Profile) {
        match self {
            Self::Gallery(items) => profile.gallery.extend(items.iter().cloned()),
            Self::Videos(items) => profile.videos.extend(items.iter().cloned()),
            Self::Blog(items) => profile.blog.extend(items.iter().cloned()),
            Self::News(items) => profile.news.extend(items.iter().cloned()),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Self::Gallery(items) => json!(items),
            Self::Videos(items) => json!(items),
            Self::Blog(items) | Self::News(items) => json!(items),
        }
    }
}

fn posts(urls: Vec<String>, titles: Vec<String>, form: &FormData) -> Vec<Post> {
    let count = urls.len();
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    let descriptions = padded(form.texts("desc"), count, || DEFAULT_DESCRIPTION.to_string());
    let dates = padded(form.texts("date"), count, || now.clone());

    urls.into_iter()
        .zip(titles)
        .zip(descriptions)
        .zip(dates)
        .map(|(((image, title), desc), date)| Post {
            image,
            title,
            desc,
            date,
        })
        .collect()
}

/// Returns exactly `len` values: the supplied ones first, then defaults
pub fn padded(values: &[String], len: usize, default: impl FnMut() -> String) -> Vec<String> {
    values
        .iter()
        .cloned()
        .chain(iter::repeat_with(default))
        .take(len)
        .collect()
}

async fn upload_section(
    state: AppState,
    email: String,
    multipart: Multipart,
    section: Section,
    mode: Mode,
) -> Result<Json<Value>, AppError> {
    let mut form = FormData::read(multipart).await?;
    let files = form.take_files(section.key())?;

    if state.store.find(&email)?.is_none() {
        return Err(AppError::user_not_found());
    }
    if mode == Mode::Draft && files.is_empty() {
        return Err(AppError::validation("No files uploaded"));
    }

    let urls = upload_batch(state.uploader.as_ref(), &files, section.upload_options(mode)).await?;
    let entries = NewEntries::build(section, urls, &form);

    let outcome = found(state.store.update(&email, |profile| {
        entries.append_to(profile);
        Ok::<_, AppError>(())
    })?)?;

    if !outcome.modified {
        return Ok(Json(json!({ "message": NO_CHANGES })));
    }

    info!("Added {} {} entries for {}", files.len(), section.key(), email);
    let mut body = json!({ "message": section.updated_message() });
    body[section.key()] = entries.to_json();
    Ok(Json(body))
}

async fn list_section(state: AppState, email: String, section: Section) -> Result<Json<Value>, AppError> {
    let profile = state
        .store
        .find(&email)?
        .ok_or_else(AppError::user_not_found)?;

    let mut body = json!({});
    body[section.key()] = section.entries(&profile);
    Ok(Json(body))
}

async fn list_draft_section(
    state: AppState,
    email: String,
    section: Section,
) -> Result<Json<Value>, AppError> {
    let profile = state
        .store
        .find(&email)?
        .ok_or_else(AppError::user_not_found)?;

    let entries = section.entries(&profile);
    let empty = entries.as_array().is_none_or(Vec::is_empty);
    let (found_message, empty_message) = section.fetched_messages();

    let mut body = json!({ "message": if empty { empty_message } else { found_message } });
    body[section.key()] = entries;
    Ok(Json(body))
}

pub async fn upload_gallery(
    Path(email): Path<String>,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    upload_section(state, email, multipart, Section::Gallery, Mode::Live).await
}

pub async fn upload_videos(
    Path(email): Path<String>,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    upload_section(state, email, multipart, Section::Videos, Mode::Live).await
}

pub async fn upload_blog(
    Path(email): Path<String>,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    upload_section(state, email, multipart, Section::Blog, Mode::Live).await
}

pub async fn upload_news(
    Path(email): Path<String>,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    upload_section(state, email, multipart, Section::News, Mode::Live).await
}

pub async fn upload_draft_gallery(
    Path(email): Path<String>,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    upload_section(state, email, multipart, Section::Gallery, Mode::Draft).await
}

pub async fn upload_draft_videos(
    Path(email): Path<String>,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    upload_section(state, email, multipart, Section::Videos, Mode::Draft).await
}

pub async fn upload_draft_blog(
    Path(email): Path<String>,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    upload_section(state, email, multipart, Section::Blog, Mode::Draft).await
}

pub async fn upload_draft_news(
    Path(email): Path<String>,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    upload_section(state, email, multipart, Section::News, Mode::Draft).await
}

pub async fn get_gallery(
    Path(email): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    list_section(state, email, Section::Gallery).await
}

pub async fn get_videos(
    Path(email): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    list_section(state, email, Section::Videos).await
}

pub async fn get_blog(
    Path(email): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    list_section(state, email, Section::Blog).await
}

pub async fn get_news(
    Path(email): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    list_section(state, email, Section::News).await
}

pub async fn get_draft_gallery(
    Path(email): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    list_draft_section(state, email, Section::Gallery).await
}

pub async fn get_draft_videos(
    Path(email): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    list_draft_section(state, email, Section::Videos).await
}

pub async fn get_draft_blog(
    Path(email): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    list_draft_section(state, email, Section::Blog).await
}

pub async fn get_draft_news(
    Path(email): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    list_draft_section(state, email, Section::News).await
}

/// Deletes one media entry by URL
///
/// `itemType` picks the list and the matched field:
/// `image` → gallery by `image`, `video` → videos by `video`,
/// `blog` and `news` → their lists by `image`.
pub async fn delete_item(
    Path(email): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<DeleteItemRequest>,
) -> Result<Json<Value>, AppError> {
    let outcome = found(state.store.update(&email, |profile| {
        let kind = payload
            .item_type
            .as_deref()
            .and_then(MediaItemKind::parse)
            .ok_or_else(|| AppError::validation("Invalid item type"))?;
        let url = non_blank(&payload.item_url)
            .ok_or_else(|| AppError::validation("itemUrl is required"))?;
        Ok::<_, AppError>((kind, profile.pull_media(kind, url)))
    })?)?;

    let (kind, removed) = outcome.value;
    if removed == 0 {
        return Err(AppError::not_found(format!("{} not found", kind.label())));
    }

    info!("Deleted {} {} entry for {}", removed, kind.label(), email);
    Ok(Json(json!({ "message": format!("{} deleted successfully", kind.label()) })))
}

/// Removes every entry titled `title` from the list named by `category`
pub async fn permanent_delete(
    Path(email): Path<String>,
    State(state): State<AppState>,
    Query(params): Query<PermanentDeleteParams>,
) -> Result<Json<Value>, AppError> {
    let category = params
        .category
        .as_deref()
        .and_then(Category::parse)
        .ok_or_else(|| AppError::validation("Invalid category"))?;
    let title = non_blank(&params.title).ok_or_else(|| AppError::validation("Title is required"))?;

    let removed = state
        .store
        .update(&email, |profile| {
            Ok::<_, AppError>(profile.pull_titled(category, title))
        })?
        .map_or(0, |outcome| outcome.value);

    if removed == 0 {
        return Err(AppError::not_found("User or image not found"));
    }
    Ok(Json(json!({ "message": "Image permanently deleted successfully" })))
}
