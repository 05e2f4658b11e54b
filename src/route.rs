//! Route definitions for the portfolio API
//!
//! This module maps every HTTP verb + path to its handler and wires the
//! shared layers (auth guard, body limit, CORS).

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{delete, get, patch, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::database::AppState;
use crate::form::MAX_BODY_BYTES;
use crate::handler::{archive, drafts, inbox, media, profile, users, views};
use crate::middleware::auth_middleware;

/// Creates and configures the Axum application router with all routes
///
/// # Route Definitions
///
/// Public:
/// - `POST /view`, `GET /view/{email}` - profile view counter
/// - `GET|POST /users` - list profiles / create a profile
/// - `GET /users/jwt?email=` - issue an access token
/// - `GET /users/{email}` and the `GET /users/{email}/...` list projections
/// - `PATCH /users/{email}/notifications` - contact form
///
/// Guarded by `auth_middleware` (enforced when `require_auth` is set):
/// - `PATCH /users/{email}` and every other mutating `/users/{email}/...` route
pub fn create_app(state: AppState) -> Router {
    let owner_routes = Router::new()
        .route("/users/{email}", patch(profile::update_profile))
        .route("/users/{email}/remove-education", patch(profile::remove_education))
        .route("/users/{email}/remove-experience", patch(profile::remove_experience))
        .route("/users/{email}/update-logo", patch(profile::update_logo))
        .route("/users/{email}/gallery", patch(media::upload_gallery))
        .route("/users/{email}/video", patch(media::upload_videos))
        .route("/users/{email}/blog", patch(media::upload_blog))
        .route("/users/{email}/news", patch(media::upload_news))
        .route("/users/{email}/draft/gallery", patch(media::upload_draft_gallery))
        .route("/users/{email}/draft/video", patch(media::upload_draft_videos))
        .route("/users/{email}/draft/blog", patch(media::upload_draft_blog))
        .route("/users/{email}/draft/news", patch(media::upload_draft_news))
        .route("/users/{email}/delete", delete(media::delete_item))
        .route("/users/{email}/permanent-delete", delete(media::permanent_delete))
        .route("/users/{email}/store-deleted-item", post(archive::store_deleted_item))
        .route("/users/{email}/delete-item", delete(archive::delete_archived_item))
        .route("/users/{email}/events", patch(inbox::add_event))
        .route("/users/{email}/updatedDraft", patch(drafts::save_draft))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let public_routes = Router::new()
        .route("/view", post(views::record_view))
        .route("/view/{email}", get(views::get_views))
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/jwt", get(users::issue_token))
        .route("/users/{email}", get(users::get_user))
        .route("/users/{email}/gallery", get(media::get_gallery))
        .route("/users/{email}/video", get(media::get_videos))
        .route("/users/{email}/blog", get(media::get_blog))
        .route("/users/{email}/news", get(media::get_news))
        .route("/users/{email}/draft", get(archive::list_profile_drafts))
        .route("/users/{email}/draft/gallery", get(media::get_draft_gallery))
        .route("/users/{email}/draft/videos", get(media::get_draft_videos))
        .route("/users/{email}/draft/blog", get(media::get_draft_blog))
        .route("/users/{email}/draft/news", get(media::get_draft_news))
        .route("/users/{email}/store-deleted-item", get(archive::list_deleted_items))
        .route("/users/{email}/deleted-news", get(archive::list_deleted_news))
        .route(
            "/users/{email}/notifications",
            get(inbox::list_notifications).patch(inbox::send_notification),
        )
        .route("/users/{email}/events", get(inbox::list_events))
        .route("/users/{email}/updatedDraft", get(drafts::list_drafts));

    Router::new()
        .merge(public_routes)
        .merge(owner_routes)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        // Inject the application state into all handlers
        .with_state(state)
}
