mod common;

use axum::http::{header::AUTHORIZATION, StatusCode};
use serde_json::json;

use common::{empty_request, json_request, setup_test_app, setup_with_auth, MultipartBody};
use portfolio::auth::TokenKeys;

const EVENT_URI: &str = "/users/ada@example.com/events";

fn event_payload() -> serde_json::Value {
    json!({ "title": "Talk", "date": "2024-05-01" })
}

#[tokio::test]
async fn test_issue_token_for_existing_user() {
    let test = setup_test_app();
    test.create_user("Ada", "ada@example.com").await;

    let (status, body) = test
        .send(empty_request("GET", "/users/jwt?email=ada@example.com"))
        .await;

    assert_eq!(status, StatusCode::OK);
    let token = body["accessToken"].as_str().unwrap();
    let claims = TokenKeys::new(common::TEST_SECRET).verify(token).unwrap();
    assert_eq!(claims.email, "ada@example.com");
}

#[tokio::test]
async fn test_issue_token_for_unknown_user() {
    let test = setup_test_app();

    let (status, body) = test
        .send(empty_request("GET", "/users/jwt?email=nobody@example.com"))
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["accessToken"], "");
}

#[tokio::test]
async fn test_auth_disabled_allows_owner_routes() {
    let test = setup_test_app();
    test.create_user("Ada", "ada@example.com").await;

    let (status, _) = test
        .send(json_request("PATCH", EVENT_URI, event_payload()))
        .await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_auth_enabled_missing_header() {
    let test = setup_with_auth();
    test.create_user("Ada", "ada@example.com").await;

    let (status, _) = test
        .send(json_request("PATCH", EVENT_URI, event_payload()))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = test
        .send(
            MultipartBody::new()
                .text("bio", "x")
                .into_request("PATCH", "/users/ada@example.com"),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_enabled_invalid_token() {
    let test = setup_with_auth();
    test.create_user("Ada", "ada@example.com").await;

    let forged = TokenKeys::new("some_other_secret")
        .issue("ada@example.com")
        .unwrap();
    let mut request = json_request("PATCH", EVENT_URI, event_payload());
    request.headers_mut().insert(
        AUTHORIZATION,
        format!("Bearer {}", forged).parse().unwrap(),
    );

    let (status, body) = test.send(request).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Invalid or expired token");
}

#[tokio::test]
async fn test_auth_enabled_valid_token() {
    let test = setup_with_auth();
    test.create_user("Ada", "ada@example.com").await;

    let (_, body) = test
        .send(empty_request("GET", "/users/jwt?email=ada@example.com"))
        .await;
    let token = body["accessToken"].as_str().unwrap().to_string();

    let mut request = json_request("PATCH", EVENT_URI, event_payload());
    request.headers_mut().insert(
        AUTHORIZATION,
        format!("Bearer {}", token).parse().unwrap(),
    );

    let (status, body) = test.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Talk");
}

#[tokio::test]
async fn test_auth_enabled_public_routes_stay_open() {
    let test = setup_with_auth();
    test.create_user("Ada", "ada@example.com").await;

    let (status, _) = test.send(empty_request("GET", "/users/ada@example.com")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = test
        .send(json_request("POST", "/view", json!({ "email": "ada@example.com" })))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = test
        .send(json_request(
            "PATCH",
            "/users/ada@example.com/notifications",
            json!({
                "senderName": "Grace",
                "senderEmail": "grace@example.com",
                "subject": "Hello",
                "message": "Hi"
            }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
}
