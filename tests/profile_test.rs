//! Integration tests for the combined profile update and its single-purpose routes

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{
    empty_request, json_request, media_url, setup_test_app, setup_with_uploader, FakeUploader,
    MultipartBody,
};

const ADA: &str = "/users/ada@example.com";

#[tokio::test]
async fn test_update_scalars_only_touches_named_fields() {
    let test = setup_test_app();
    test.create_user("Ada", "ada@example.com").await;

    let (status, body) = test
        .send(
            MultipartBody::new()
                .text("bio", "Mathematician")
                .text("phone", "555-0100")
                .into_request("PATCH", ADA),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User updated successfully");

    let (_, profile) = test.send(empty_request("GET", ADA)).await;
    assert_eq!(profile["name"], "Ada");
    assert_eq!(profile["bio"], "Mathematician");
    assert_eq!(profile["phone"], "555-0100");
    assert_eq!(profile["address"], "");
}

#[tokio::test]
async fn test_update_with_identical_values_reports_no_changes() {
    let test = setup_test_app();
    test.create_user("Ada", "ada@example.com").await;

    let (status, body) = test
        .send(MultipartBody::new().text("name", "Ada").into_request("PATCH", ADA))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "No changes made to the user");
}

#[tokio::test]
async fn test_update_unknown_user() {
    let test = setup_test_app();

    let (status, body) = test
        .send(
            MultipartBody::new()
                .text("bio", "x")
                .into_request("PATCH", "/users/nobody@example.com"),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");
}

#[tokio::test]
async fn test_new_education_is_appended() {
    let test = setup_test_app();
    test.create_user("Ada", "ada@example.com").await;

    for school in ["Cambridge", "Oxford"] {
        let (status, _) = test
            .send(
                MultipartBody::new()
                    .text("newEducation", &json!({ "school": school }).to_string())
                    .into_request("PATCH", ADA),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, profile) = test.send(empty_request("GET", ADA)).await;
    assert_eq!(
        profile["education"],
        json!([{ "school": "Cambridge" }, { "school": "Oxford" }])
    );
}

#[tokio::test]
async fn test_image_and_education_logos_land_on_their_targets() {
    let test = setup_test_app();
    test.create_user("Ada", "ada@example.com").await;

    let education = json!([
        { "school": "First" },
        { "school": "Second" },
        { "school": "Third" }
    ]);
    let (status, _) = test
        .send(
            MultipartBody::new()
                .text("education", &education.to_string())
                .image("education[2][logo]", "third.png")
                .image("image", "portrait.png")
                .image("education[0][logo]", "first.png")
                .into_request("PATCH", ADA),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, profile) = test.send(empty_request("GET", ADA)).await;
    assert_eq!(profile["image"], media_url("auto", "portrait.png"));
    assert_eq!(profile["education"][0]["logo"], media_url("auto", "first.png"));
    assert!(profile["education"][1].get("logo").is_none());
    assert_eq!(profile["education"][2]["logo"], media_url("auto", "third.png"));
    assert_eq!(test.uploader.calls().len(), 3);

    // a later replacement list without files keeps the stored logos by index
    let (status, _) = test
        .send(
            MultipartBody::new()
                .text(
                    "education",
                    &json!([{ "school": "First, renamed" }, { "school": "Second" }]).to_string(),
                )
                .into_request("PATCH", ADA),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, profile) = test.send(empty_request("GET", ADA)).await;
    let education = profile["education"].as_array().unwrap();
    assert_eq!(education.len(), 2);
    assert_eq!(education[0]["school"], "First, renamed");
    assert_eq!(education[0]["logo"], media_url("auto", "first.png"));
    assert!(education[1].get("logo").is_none());
}

#[tokio::test]
async fn test_malformed_json_is_rejected_before_any_upload() {
    let test = setup_test_app();
    test.create_user("Ada", "ada@example.com").await;

    let (status, _) = test
        .send(
            MultipartBody::new()
                .text("newExperience", "{not json")
                .image("image", "portrait.png")
                .into_request("PATCH", ADA),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(test.uploader.calls().is_empty());
}

#[tokio::test]
async fn test_upload_failure_leaves_profile_unchanged() {
    let test = setup_with_uploader(FakeUploader::failing());
    test.create_user("Ada", "ada@example.com").await;

    let (status, body) = test
        .send(
            MultipartBody::new()
                .text("bio", "should not persist")
                .image("image", "portrait.png")
                .into_request("PATCH", ADA),
        )
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());

    let (_, profile) = test.send(empty_request("GET", ADA)).await;
    assert_eq!(profile["bio"], "");
    assert!(profile["image"].is_null());
}

#[tokio::test]
async fn test_non_media_files_are_rejected() {
    let test = setup_test_app();
    test.create_user("Ada", "ada@example.com").await;

    let (status, body) = test
        .send(
            MultipartBody::new()
                .file("image", "notes.pdf", "application/pdf")
                .into_request("PATCH", ADA),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Only image and video files are allowed");
}

#[tokio::test]
async fn test_remove_education_by_index() {
    let test = setup_test_app();
    test.create_user("Ada", "ada@example.com").await;
    test.send(
        MultipartBody::new()
            .text("education", &json!([{ "school": "A" }, { "school": "B" }]).to_string())
            .into_request("PATCH", ADA),
    )
    .await;

    let (status, body) = test
        .send(json_request(
            "PATCH",
            "/users/ada@example.com/remove-education",
            json!({ "removeEducationIndex": 5 }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid education index");

    let (status, body) = test
        .send(json_request(
            "PATCH",
            "/users/ada@example.com/remove-education",
            json!({ "removeEducationIndex": "0" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Education entry removed successfully");

    let (_, profile) = test.send(empty_request("GET", ADA)).await;
    assert_eq!(profile["education"], json!([{ "school": "B" }]));

    let (status, _) = test
        .send(json_request(
            "PATCH",
            "/users/nobody@example.com/remove-education",
            json!({ "removeEducationIndex": 0 }),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_remove_experience_by_index() {
    let test = setup_test_app();
    test.create_user("Ada", "ada@example.com").await;
    test.send(
        MultipartBody::new()
            .text("newExperience", &json!({ "role": "Analyst" }).to_string())
            .into_request("PATCH", ADA),
    )
    .await;

    let (status, _) = test
        .send(json_request(
            "PATCH",
            "/users/ada@example.com/remove-experience",
            json!({}),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = test
        .send(json_request(
            "PATCH",
            "/users/ada@example.com/remove-experience",
            json!({ "removeExperienceIndex": 0 }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, profile) = test.send(empty_request("GET", ADA)).await;
    assert_eq!(profile["experience"], json!([]));
}

#[tokio::test]
async fn test_update_logo() {
    let test = setup_test_app();
    test.create_user("Ada", "ada@example.com").await;

    let (status, body) = test
        .send(
            MultipartBody::new()
                .text("note", "no file")
                .into_request("PATCH", "/users/ada@example.com/update-logo"),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No logo file uploaded");

    let (status, body) = test
        .send(
            MultipartBody::new()
                .image("logo", "brand.png")
                .into_request("PATCH", "/users/ada@example.com/update-logo"),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["url"], media_url("auto", "brand.png"));

    let (_, profile) = test.send(empty_request("GET", ADA)).await;
    assert_eq!(profile["logo"], media_url("auto", "brand.png"));
}

#[tokio::test]
async fn test_logo_for_missing_education_entry_is_not_uploaded() {
    let test = setup_test_app();
    test.create_user("Ada", "ada@example.com").await;

    let (status, _) = test
        .send(
            MultipartBody::new()
                .text("newEducation", &json!({ "school": "Cambridge" }).to_string())
                .image("education[0][logo]", "kept.png")
                .image("education[5][logo]", "stray.png")
                .into_request("PATCH", ADA),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let uploaded: Vec<String> = test
        .uploader
        .calls()
        .into_iter()
        .map(|call| call.file_name)
        .collect();
    assert_eq!(uploaded, vec!["kept.png".to_string()]);

    let (_, profile) = test.send(empty_request("GET", ADA)).await;
    assert_eq!(profile["education"][0]["logo"], media_url("auto", "kept.png"));
}
