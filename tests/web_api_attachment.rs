//! Web API attachment tests.

mod common;

use axum::http::{header::AUTHORIZATION, StatusCode};
use axum_test::multipart::{MultipartForm, Part};
use serde_json::Value;

use common::{bearer, register_user, send, spawn_app, spawn_app_with, TestApp, TestOptions};

const NOTES: &[u8] = b"meeting notes: ship it";

fn file_form(name: &str, mime: &str, content: &[u8]) -> MultipartForm {
    MultipartForm::new().add_part(
        "file",
        Part::bytes(content.to_vec())
            .file_name(name)
            .mime_type(mime),
    )
}

/// Alice sends Bob a message; returns `(alice, bob, message_id)`.
async fn conversation(app: &TestApp) -> (String, String, i64) {
    let (alice, _) = register_user(&app.server, "alice@example.com", "Alice").await;
    let (bob, _) = register_user(&app.server, "bob@example.com", "Bob").await;
    let id = send(&app.server, &alice, "bob@example.com", "Notes").await["id"]
        .as_i64()
        .unwrap();
    (alice, bob, id)
}

async fn upload(app: &TestApp, token: &str, message_id: i64, form: MultipartForm) -> axum_test::TestResponse {
    app.server
        .post(&format!("/api/email/{}/attachments", message_id))
        .add_header(AUTHORIZATION, bearer(token))
        .multipart(form)
        .await
}

#[tokio::test]
async fn test_upload_and_download() {
    let app = spawn_app().await;
    let (alice, bob, id) = conversation(&app).await;

    let response = upload(&app, &alice, id, file_form("notes.txt", "text/plain", NOTES)).await;
    response.assert_status_ok();
    let attachment: Value = response.json();
    assert_eq!(attachment["fileName"], "notes.txt");
    assert_eq!(attachment["contentType"], "text/plain");
    assert_eq!(attachment["fileSize"], NOTES.len());
    let attachment_id = attachment["id"].as_i64().unwrap();

    let message: Value = app
        .server
        .get(&format!("/api/email/{}", id))
        .add_header(AUTHORIZATION, bearer(&bob))
        .await
        .json();
    assert_eq!(message["attachments"][0]["id"], attachment_id);

    let response = app
        .server
        .get(&format!("/api/email/attachments/{}/download", attachment_id))
        .add_header(AUTHORIZATION, bearer(&bob))
        .await;
    response.assert_status_ok();
    assert_eq!(response.as_bytes().as_ref(), NOTES);
    assert_eq!(response.header("content-type"), "text/plain");
    assert_eq!(
        response.header("content-disposition"),
        "attachment; filename=\"notes.txt\""
    );
}

#[tokio::test]
async fn test_download_with_query_token() {
    let app = spawn_app().await;
    let (alice, bob, id) = conversation(&app).await;

    let attachment: Value = upload(&app, &alice, id, file_form("notes.txt", "text/plain", NOTES))
        .await
        .json();

    let response = app
        .server
        .get(&format!("/api/email/attachments/{}/download", attachment["id"]))
        .add_query_param("token", &bob)
        .await;
    response.assert_status_ok();
    assert_eq!(response.as_bytes().as_ref(), NOTES);
}

#[tokio::test]
async fn test_file_name_reduced_to_last_component() {
    let app = spawn_app().await;
    let (alice, _bob, id) = conversation(&app).await;

    let attachment: Value = upload(
        &app,
        &alice,
        id,
        file_form("../../etc/passwd.txt", "text/plain", NOTES),
    )
    .await
    .json();
    assert_eq!(attachment["fileName"], "passwd.txt");
}

#[tokio::test]
async fn test_attachment_metadata_access() {
    let app = spawn_app().await;
    let (alice, bob, id) = conversation(&app).await;
    let (mallory, _) = register_user(&app.server, "mallory@example.com", "Mallory").await;

    let attachment: Value = upload(&app, &alice, id, file_form("a.csv", "text/csv", b"a,b\n1,2\n"))
        .await
        .json();
    let url = format!("/api/email/attachments/{}", attachment["id"]);

    let response = app.server.get(&url).add_header(AUTHORIZATION, bearer(&bob)).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["fileName"], "a.csv");

    app.server
        .get(&url)
        .add_header(AUTHORIZATION, bearer(&mallory))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    app.server
        .get(&format!("{}/download", url))
        .add_header(AUTHORIZATION, bearer(&mallory))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_rules() {
    let app = spawn_app().await;
    let (alice, bob, id) = conversation(&app).await;

    // Only the sender attaches files.
    upload(&app, &bob, id, file_form("x.txt", "text/plain", NOTES))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    upload(&app, &alice, 9999, file_form("x.txt", "text/plain", NOTES))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let form = MultipartForm::new().add_text("note", "no file here");
    let response = upload(&app, &alice, id, form).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["message"], "No file uploaded");
}

#[tokio::test]
async fn test_upload_too_large() {
    let app = spawn_app_with(TestOptions {
        max_upload_size: 16,
        ..TestOptions::default()
    })
    .await;
    let (alice, _bob, id) = conversation(&app).await;

    upload(&app, &alice, id, file_form("big.bin", "application/octet-stream", &[7u8; 64]))
        .await
        .assert_status(StatusCode::PAYLOAD_TOO_LARGE);

    upload(&app, &alice, id, file_form("small.bin", "application/octet-stream", &[7u8; 16]))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_delete_message_removes_attachments() {
    let app = spawn_app().await;
    let (alice, _bob, id) = conversation(&app).await;

    let attachment: Value = upload(&app, &alice, id, file_form("notes.txt", "text/plain", NOTES))
        .await
        .json();
    assert_eq!(std::fs::read_dir(app.storage_dir.path()).unwrap().count(), 1);

    app.server
        .delete(&format!("/api/email/{}", id))
        .add_header(AUTHORIZATION, bearer(&alice))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    app.server
        .get(&format!("/api/email/attachments/{}", attachment["id"]))
        .add_header(AUTHORIZATION, bearer(&alice))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    assert_eq!(std::fs::read_dir(app.storage_dir.path()).unwrap().count(), 0);
}
