use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{json, Value};
use tracing::info;

use super::{change_message, found, non_blank};
use crate::database::AppState;
use crate::error::AppError;
use crate::model::{Event, EventRequest, Notification, NotificationRequest};

/// Delivers a contact message to a profile owner
///
/// The recipient is `toEmail` when supplied, otherwise the path email.
///
/// # Request Body
///
/// ```json
/// {
///   "senderName": "Grace",
///   "senderEmail": "grace@example.com",
///   "subject": "Hello",
///   "message": "Loved your gallery",
///   "toEmail": "ada@example.com"
/// }
/// ```
pub async fn send_notification(
    Path(email): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<NotificationRequest>,
) -> Result<Json<Value>, AppError> {
    let (Some(sender_name), Some(sender_email), Some(subject), Some(message)) = (
        non_blank(&payload.sender_name),
        non_blank(&payload.sender_email),
        non_blank(&payload.subject),
        non_blank(&payload.message),
    ) else {
        return Err(AppError::validation("All fields are required"));
    };
    let recipient = non_blank(&payload.to_email).unwrap_or(email.as_str());

    let notification = Notification {
        sender_name: sender_name.to_string(),
        sender_email: sender_email.to_string(),
        subject: subject.to_string(),
        message: message.to_string(),
        timestamp: Utc::now(),
    };

    let outcome = found(state.store.update(recipient, |profile| {
        profile.notifications.push(notification.clone());
        Ok::<_, AppError>(())
    })?)?;

    info!("Notification from {} delivered to {}", sender_email, recipient);
    let mut body = change_message(outcome.modified, "Notification sent successfully");
    if outcome.modified {
        body["notification"] = json!(notification);
    }
    Ok(Json(body))
}

pub async fn list_notifications(
    Path(email): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let profile = state
        .store
        .find(&email)?
        .ok_or_else(AppError::user_not_found)?;

    Ok(Json(json!({ "notifications": profile.notifications })))
}

/// Adds a calendar event
///
/// `date` accepts RFC 3339 timestamps or plain `YYYY-MM-DD` dates
/// (taken as midnight UTC).
pub async fn add_event(
    Path(email): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<EventRequest>,
) -> Result<Json<Event>, AppError> {
    let (Some(title), Some(date)) = (non_blank(&payload.title), non_blank(&payload.date)) else {
        return Err(AppError::validation("All fields are required"));
    };
    let date = parse_event_date(date).ok_or_else(|| AppError::validation("Invalid event date"))?;

    let event = Event {
        email: email.clone(),
        title: title.to_string(),
        date,
    };

    found(state.store.update(&email, |profile| {
        profile.events.push(event.clone());
        Ok::<_, AppError>(())
    })?)?;

    Ok(Json(event))
}

/// Returns the bare list of a user's events
pub async fn list_events(
    Path(email): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Event>>, AppError> {
    let profile = state
        .store
        .find(&email)?
        .ok_or_else(AppError::user_not_found)?;

    Ok(Json(profile.events))
}

fn parse_event_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
}
