//! Data models for the portfolio backend
//!
//! This module defines the stored profile document, its nested entries,
//! and the request/response bodies exchanged over HTTP.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A user's portfolio document, keyed by email
///
/// Every field except `email` may be absent in storage. Lists default to
/// empty and scalars to `None`, so documents written by older versions
/// (or by the minimal create route) always deserialize.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Primary key, matched exactly
    pub email: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dob: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profession: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facebook: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    /// Profile picture URL, as returned by the media host
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Brand logo URL, as returned by the media host
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,

    /// Total number of recorded profile views
    #[serde(default)]
    pub view_count: u64,
    /// One record per recorded view, oldest first
    #[serde(default)]
    pub reach_history: Vec<ReachRecord>,

    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub experience: Vec<Experience>,
    #[serde(default)]
    pub gallery: Vec<GalleryItem>,
    #[serde(default)]
    pub videos: Vec<VideoItem>,
    #[serde(default)]
    pub blog: Vec<Post>,
    #[serde(default)]
    pub news: Vec<Post>,
    #[serde(default)]
    pub notifications: Vec<Notification>,
    #[serde(default)]
    pub events: Vec<Event>,

    /// Archive of entries the owner removed but may restore
    #[serde(default)]
    pub deleted_items: Vec<Value>,
    #[serde(default)]
    pub deleted_news: Vec<Value>,
    #[serde(default)]
    pub draft: Vec<Value>,
}

/// A single education entry
///
/// Degree fields are free-form and preserved as sent by the client.
/// The logo is tracked separately because it is resolved through the
/// media host rather than taken from the payload.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Education {
    #[serde(
        default,
        deserialize_with = "url_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub logo: Option<String>,

    #[serde(flatten)]
    pub details: Map<String, Value>,
}

/// A single experience entry with free-form role fields
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Experience {
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GalleryItem {
    pub image: String,
    pub title: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct VideoItem {
    pub video: String,
    pub title: String,
}

/// Blog and news posts share one shape
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Post {
    pub image: String,
    pub title: String,
    pub desc: String,
    pub date: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub sender_name: String,
    pub sender_email: String,
    pub subject: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Event {
    pub email: String,
    pub title: String,
    pub date: DateTime<Utc>,
}

/// One profile view
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReachRecord {
    pub date: DateTime<Utc>,
    /// The profile's view count right after this view
    pub view_count: u64,
}

/// A saved work-in-progress snapshot, stored apart from the profile
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub id: String,
    pub email: String,
    pub draft_data: DraftData,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DraftData {
    pub files: Vec<DraftFile>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DraftFile {
    pub title: String,
    pub url: String,
    pub active_section: String,
}

/// Profile list fields addressable by name from the permanent-delete route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Gallery,
    Videos,
    Blog,
    News,
    Notifications,
    Events,
    DeletedItems,
}

impl Category {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "gallery" => Some(Self::Gallery),
            "videos" => Some(Self::Videos),
            "blog" => Some(Self::Blog),
            "news" => Some(Self::News),
            "notifications" => Some(Self::Notifications),
            "events" => Some(Self::Events),
            "deletedItems" => Some(Self::DeletedItems),
            _ => None,
        }
    }
}

/// Media kinds addressable by the delete route, each matched by its URL field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaItemKind {
    Image,
    Video,
    Blog,
    News,
}

impl MediaItemKind {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "image" => Some(Self::Image),
            "video" => Some(Self::Video),
            "blog" => Some(Self::Blog),
            "news" => Some(Self::News),
            _ => None,
        }
    }

    /// Capitalized label used in response messages
    pub fn label(self) -> &'static str {
        match self {
            Self::Image => "Image",
            Self::Video => "Video",
            Self::Blog => "Blog",
            Self::News => "News",
        }
    }
}

impl Profile {
    /// Creates the minimal profile inserted by `POST /users`
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Records one view at `now` and returns the new count
    ///
    /// Record timestamps never go backwards, even if the wall clock does.
    pub fn record_view(&mut self, now: DateTime<Utc>) -> u64 {
        let date = match self.reach_history.last() {
            Some(last) if last.date > now => last.date,
            _ => now,
        };
        self.view_count += 1;
        self.reach_history.push(ReachRecord {
            date,
            view_count: self.view_count,
        });
        self.view_count
    }

    /// Counts reach records dated within the seven days ending at `now`
    ///
    /// A record exactly seven days old is included.
    pub fn views_in_week_before(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now - Duration::days(7);
        self.reach_history
            .iter()
            .filter(|record| record.date >= cutoff)
            .count()
    }

    /// Removes every entry of `category` whose title equals `title`
    pub fn pull_titled(&mut self, category: Category, title: &str) -> usize {
        match category {
            Category::Gallery => retain_counting(&mut self.gallery, |item| item.title != title),
            Category::Videos => retain_counting(&mut self.videos, |item| item.title != title),
            Category::Blog => retain_counting(&mut self.blog, |item| item.title != title),
            Category::News => retain_counting(&mut self.news, |item| item.title != title),
            Category::Notifications => {
                retain_counting(&mut self.notifications, |item| item.subject != title)
            }
            Category::Events => retain_counting(&mut self.events, |item| item.title != title),
            Category::DeletedItems => retain_counting(&mut self.deleted_items, |item| {
                item.get("title").and_then(Value::as_str) != Some(title)
                    && item.as_str() != Some(title)
            }),
        }
    }

    /// Removes media entries whose URL field equals `url`
    pub fn pull_media(&mut self, kind: MediaItemKind, url: &str) -> usize {
        match kind {
            MediaItemKind::Image => retain_counting(&mut self.gallery, |item| item.image != url),
            MediaItemKind::Video => retain_counting(&mut self.videos, |item| item.video != url),
            MediaItemKind::Blog => retain_counting(&mut self.blog, |item| item.image != url),
            MediaItemKind::News => retain_counting(&mut self.news, |item| item.image != url),
        }
    }

    /// Removes archived entries matching any of the supplied fields
    pub fn pull_archived(&mut self, target: &ArchivedItemMatch) -> usize {
        retain_counting(&mut self.deleted_items, |item| !target.matches(item))
    }
}

/// Keeps elements satisfying `keep` and returns how many were dropped
fn retain_counting<T>(items: &mut Vec<T>, mut keep: impl FnMut(&T) -> bool) -> usize {
    let before = items.len();
    items.retain(|item| keep(item));
    before - items.len()
}

/// Accepts a string URL and treats anything else (null, `{}`) as absent
fn url_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(url) if !url.is_empty() => Some(url),
        _ => None,
    })
}

/// Defaulted projection returned by `GET /users/{email}`
///
/// Unset scalars become empty strings (the image becomes `null`) and unset
/// lists become empty arrays, so every key is always present.
#[derive(Serialize, Debug, Clone)]
pub struct ProfileView {
    pub name: String,
    pub bio: String,
    pub gender: String,
    pub dob: String,
    pub profession: String,
    pub phone: String,
    pub linkedin: String,
    pub facebook: String,
    pub youtube: String,
    pub address: String,
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
    pub image: Option<String>,
    pub logo: String,
    pub gallery: Vec<GalleryItem>,
    pub videos: Vec<VideoItem>,
    pub blog: Vec<Post>,
    pub news: Vec<Post>,
}

impl From<Profile> for ProfileView {
    fn from(profile: Profile) -> Self {
        Self {
            name: profile.name.unwrap_or_default(),
            bio: profile.bio.unwrap_or_default(),
            gender: profile.gender.unwrap_or_default(),
            dob: profile.dob.unwrap_or_default(),
            profession: profile.profession.unwrap_or_default(),
            phone: profile.phone.unwrap_or_default(),
            linkedin: profile.linkedin.unwrap_or_default(),
            facebook: profile.facebook.unwrap_or_default(),
            youtube: profile.youtube.unwrap_or_default(),
            address: profile.address.unwrap_or_default(),
            experience: profile.experience,
            education: profile.education,
            image: profile.image,
            logo: profile.logo.unwrap_or_default(),
            gallery: profile.gallery,
            videos: profile.videos,
            blog: profile.blog,
            news: profile.news,
        }
    }
}

/// View counter snapshot returned by the `/view` routes
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ViewStats {
    pub email: String,
    pub view_count: u64,
    pub views_last_week: usize,
    pub reach_history: Vec<ReachRecord>,
}

impl ViewStats {
    pub fn of(profile: &Profile, now: DateTime<Utc>) -> Self {
        Self {
            email: profile.email.clone(),
            view_count: profile.view_count,
            views_last_week: profile.views_in_week_before(now),
            reach_history: profile.reach_history.clone(),
        }
    }
}

/// An index sent either as a JSON number or as a numeric string
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum IndexInput {
    Number(i64),
    Text(String),
}

impl IndexInput {
    /// Returns the index if it is a non-negative integer
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Number(n) => usize::try_from(*n).ok(),
            Self::Text(s) => s.trim().parse::<usize>().ok(),
        }
    }
}

/// Request payload for `POST /users`
#[derive(Deserialize, Debug)]
pub struct CreateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Request payload for `POST /view`
#[derive(Deserialize, Debug)]
pub struct ViewRequest {
    pub email: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RemoveEducationRequest {
    pub remove_education_index: Option<IndexInput>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RemoveExperienceRequest {
    pub remove_experience_index: Option<IndexInput>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequest {
    pub sender_name: Option<String>,
    pub sender_email: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
    /// Recipient; the path email is used when absent
    pub to_email: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct EventRequest {
    pub title: Option<String>,
    pub date: Option<String>,
}

/// Request payload for `DELETE /users/{email}/delete`
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DeleteItemRequest {
    pub item_type: Option<String>,
    pub item_url: Option<String>,
}

/// Request payload for `POST /users/{email}/store-deleted-item`
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct StoreDeletedItemRequest {
    pub item_type: Option<String>,
    #[serde(default)]
    pub item: Value,
}

/// Fields identifying archived entries to drop; any supplied field may match
#[derive(Deserialize, Debug, Default)]
pub struct ArchivedItemMatch {
    pub image: Option<String>,
    pub video: Option<String>,
    pub title: Option<String>,
}

impl ArchivedItemMatch {
    pub fn is_empty(&self) -> bool {
        self.image.is_none() && self.video.is_none() && self.title.is_none()
    }

    fn matches(&self, item: &Value) -> bool {
        let field_eq = |key: &str, wanted: &Option<String>| match wanted {
            Some(wanted) => item.get(key).and_then(Value::as_str) == Some(wanted.as_str()),
            None => false,
        };
        field_eq("image", &self.image) || field_eq("video", &self.video) || field_eq("title", &self.title)
    }
}

/// Query parameters for `DELETE /users/{email}/permanent-delete`
#[derive(Deserialize, Debug)]
pub struct PermanentDeleteParams {
    pub category: Option<String>,
    pub title: Option<String>,
}

/// Query parameters for `GET /users/jwt`
#[derive(Deserialize, Debug)]
pub struct TokenParams {
    pub email: Option<String>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
}
