//! Web API message tests.

mod common;

use axum::http::{header::AUTHORIZATION, StatusCode};
use serde_json::{json, Value};

use common::{bearer, register_user, send, spawn_app};

#[tokio::test]
async fn test_send_and_read_between_users() {
    let app = spawn_app().await;
    let (alice, _) = register_user(&app.server, "alice@example.com", "Alice").await;
    let (bob, bob_id) = register_user(&app.server, "bob@example.com", "Bob").await;

    let sent = send(&app.server, &alice, "BOB@example.com", "Lunch?").await;
    assert_eq!(sent["subject"], "Lunch?");
    assert_eq!(sent["sender"], "alice@example.com");
    assert_eq!(sent["recipient"], "bob@example.com");
    assert_eq!(sent["recipientId"], bob_id);
    assert_eq!(sent["isRead"], false);
    assert_eq!(sent["isDraft"], false);
    let id = sent["id"].as_i64().unwrap();

    let inbox: Value = app
        .server
        .get("/api/email/inbox")
        .add_header(AUTHORIZATION, bearer(&bob))
        .await
        .json();
    assert_eq!(inbox.as_array().unwrap().len(), 1);
    assert_eq!(inbox[0]["id"], id);

    let alice_sent: Value = app
        .server
        .get("/api/email/sent")
        .add_header(AUTHORIZATION, bearer(&alice))
        .await
        .json();
    assert_eq!(alice_sent.as_array().unwrap().len(), 1);

    let alice_inbox: Value = app
        .server
        .get("/api/email/inbox")
        .add_header(AUTHORIZATION, bearer(&alice))
        .await
        .json();
    assert!(alice_inbox.as_array().unwrap().is_empty());

    app.server
        .put(&format!("/api/email/{}/read", id))
        .add_header(AUTHORIZATION, bearer(&bob))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    for token in [&alice, &bob] {
        let message: Value = app
            .server
            .get(&format!("/api/email/{}", id))
            .add_header(AUTHORIZATION, bearer(token))
            .await
            .json();
        assert_eq!(message["isRead"], true);
    }
}

#[tokio::test]
async fn test_inbox_newest_first() {
    let app = spawn_app().await;
    let (alice, _) = register_user(&app.server, "alice@example.com", "Alice").await;
    let (bob, _) = register_user(&app.server, "bob@example.com", "Bob").await;

    let first = send(&app.server, &alice, "bob@example.com", "First").await;
    let second = send(&app.server, &alice, "bob@example.com", "Second").await;

    let inbox: Value = app
        .server
        .get("/api/email/inbox")
        .add_header(AUTHORIZATION, bearer(&bob))
        .await
        .json();
    assert_eq!(inbox[0]["id"], second["id"]);
    assert_eq!(inbox[1]["id"], first["id"]);
}

#[tokio::test]
async fn test_mark_read_is_idempotent() {
    let app = spawn_app().await;
    let (alice, _) = register_user(&app.server, "alice@example.com", "Alice").await;
    let (bob, _) = register_user(&app.server, "bob@example.com", "Bob").await;
    let id = send(&app.server, &alice, "bob@example.com", "Hi").await["id"]
        .as_i64()
        .unwrap();

    for _ in 0..2 {
        app.server
            .put(&format!("/api/email/{}/read", id))
            .add_header(AUTHORIZATION, bearer(&bob))
            .await
            .assert_status(StatusCode::NO_CONTENT);
    }

    for _ in 0..2 {
        app.server
            .put("/api/email/9999/read")
            .add_header(AUTHORIZATION, bearer(&bob))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn test_send_to_unknown_recipient() {
    let app = spawn_app().await;
    let (alice, _) = register_user(&app.server, "alice@example.com", "Alice").await;

    let message = json!({
        "subject": "Hello",
        "body": "Anyone there?",
        "recipientEmail": "ghost@example.com"
    });

    let response = app
        .server
        .post("/api/email/send")
        .add_header(AUTHORIZATION, bearer(&alice))
        .json(&message)
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"]["message"], "recipient not found");

    let response = app
        .server
        .post("/api/email/draft")
        .add_header(AUTHORIZATION, bearer(&alice))
        .json(&message)
        .await;
    response.assert_status_ok();
    let draft: Value = response.json();
    assert_eq!(draft["isDraft"], true);
    assert_eq!(draft["recipient"], "ghost@example.com");
    assert!(draft["recipientId"].is_null());
}

#[tokio::test]
async fn test_send_requires_fields() {
    let app = spawn_app().await;
    let (alice, _) = register_user(&app.server, "alice@example.com", "Alice").await;

    let response = app
        .server
        .post("/api/email/send")
        .add_header(AUTHORIZATION, bearer(&alice))
        .json(&json!({ "body": "no subject", "recipientEmail": "bob@example.com" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["message"], "subject is required");

    let response = app
        .server
        .post("/api/email/send")
        .add_header(AUTHORIZATION, bearer(&alice))
        .json(&json!({ "subject": "Hi", "body": "nobody" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_sender_comes_from_token() {
    let app = spawn_app().await;
    let (alice, alice_id) = register_user(&app.server, "alice@example.com", "Alice").await;
    let (_bob, bob_id) = register_user(&app.server, "bob@example.com", "Bob").await;

    let response = app
        .server
        .post("/api/email/send")
        .add_header(AUTHORIZATION, bearer(&alice))
        .json(&json!({
            "subject": "Spoof",
            "body": "Pretending",
            "recipientId": alice_id,
            "senderId": bob_id
        }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["sender"], "alice@example.com");
}

#[tokio::test]
async fn test_draft_then_send_via_update() {
    let app = spawn_app().await;
    let (alice, _) = register_user(&app.server, "alice@example.com", "Alice").await;

    let draft: Value = app
        .server
        .post("/api/email/draft")
        .add_header(AUTHORIZATION, bearer(&alice))
        .json(&json!({
            "subject": "Welcome",
            "body": "Draft body",
            "recipientEmail": "carol@example.com"
        }))
        .await
        .json();
    let id = draft["id"].as_i64().unwrap();

    let drafts: Value = app
        .server
        .get("/api/email/drafts")
        .add_header(AUTHORIZATION, bearer(&alice))
        .await
        .json();
    assert_eq!(drafts.as_array().unwrap().len(), 1);

    let update = json!({
        "id": id,
        "subject": "Welcome aboard",
        "body": "Final body",
        "recipientEmail": "carol@example.com",
        "isDraft": false
    });

    // Sending the draft fails until the recipient exists.
    app.server
        .put(&format!("/api/email/{}", id))
        .add_header(AUTHORIZATION, bearer(&alice))
        .json(&update)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let (carol, carol_id) = register_user(&app.server, "carol@example.com", "Carol").await;

    let response = app
        .server
        .put(&format!("/api/email/{}", id))
        .add_header(AUTHORIZATION, bearer(&alice))
        .json(&update)
        .await;
    response.assert_status_ok();
    let sent: Value = response.json();
    assert_eq!(sent["isDraft"], false);
    assert_eq!(sent["recipientId"], carol_id);
    assert_eq!(sent["subject"], "Welcome aboard");

    let inbox: Value = app
        .server
        .get("/api/email/inbox")
        .add_header(AUTHORIZATION, bearer(&carol))
        .await
        .json();
    assert_eq!(inbox.as_array().unwrap().len(), 1);

    let drafts: Value = app
        .server
        .get("/api/email/drafts")
        .add_header(AUTHORIZATION, bearer(&alice))
        .await
        .json();
    assert!(drafts.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_update_rejects_mismatched_id() {
    let app = spawn_app().await;
    let (alice, _) = register_user(&app.server, "alice@example.com", "Alice").await;
    register_user(&app.server, "bob@example.com", "Bob").await;
    let id = send(&app.server, &alice, "bob@example.com", "Hi").await["id"]
        .as_i64()
        .unwrap();

    app.server
        .put(&format!("/api/email/{}", id))
        .add_header(AUTHORIZATION, bearer(&alice))
        .json(&json!({
            "id": id + 1,
            "subject": "Hi",
            "body": "Edited",
            "recipientEmail": "bob@example.com"
        }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_only_sender_may_modify() {
    let app = spawn_app().await;
    let (alice, _) = register_user(&app.server, "alice@example.com", "Alice").await;
    let (bob, _) = register_user(&app.server, "bob@example.com", "Bob").await;
    let id = send(&app.server, &alice, "bob@example.com", "Hi").await["id"]
        .as_i64()
        .unwrap();

    app.server
        .put(&format!("/api/email/{}", id))
        .add_header(AUTHORIZATION, bearer(&bob))
        .json(&json!({
            "subject": "Hijacked",
            "body": "Edited by the recipient",
            "recipientEmail": "bob@example.com"
        }))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    app.server
        .delete(&format!("/api/email/{}", id))
        .add_header(AUTHORIZATION, bearer(&bob))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stranger_sees_not_found() {
    let app = spawn_app().await;
    let (alice, _) = register_user(&app.server, "alice@example.com", "Alice").await;
    register_user(&app.server, "bob@example.com", "Bob").await;
    let (mallory, _) = register_user(&app.server, "mallory@example.com", "Mallory").await;
    let id = send(&app.server, &alice, "bob@example.com", "Private").await["id"]
        .as_i64()
        .unwrap();

    let response = app
        .server
        .get(&format!("/api/email/{}", id))
        .add_header(AUTHORIZATION, bearer(&mallory))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"]["message"], "message not found");

    app.server
        .put(&format!("/api/email/{}/read", id))
        .add_header(AUTHORIZATION, bearer(&mallory))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_drafts_hidden_from_recipient() {
    let app = spawn_app().await;
    let (alice, _) = register_user(&app.server, "alice@example.com", "Alice").await;
    let (bob, _) = register_user(&app.server, "bob@example.com", "Bob").await;

    let draft: Value = app
        .server
        .post("/api/email/draft")
        .add_header(AUTHORIZATION, bearer(&alice))
        .json(&json!({
            "subject": "Not yet",
            "body": "Still writing",
            "recipientEmail": "bob@example.com"
        }))
        .await
        .json();

    app.server
        .get(&format!("/api/email/{}", draft["id"]))
        .add_header(AUTHORIZATION, bearer(&bob))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let inbox: Value = app
        .server
        .get("/api/email/inbox")
        .add_header(AUTHORIZATION, bearer(&bob))
        .await
        .json();
    assert!(inbox.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_message() {
    let app = spawn_app().await;
    let (alice, _) = register_user(&app.server, "alice@example.com", "Alice").await;
    register_user(&app.server, "bob@example.com", "Bob").await;
    let id = send(&app.server, &alice, "bob@example.com", "Bye").await["id"]
        .as_i64()
        .unwrap();

    app.server
        .delete(&format!("/api/email/{}", id))
        .add_header(AUTHORIZATION, bearer(&alice))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    app.server
        .get(&format!("/api/email/{}", id))
        .add_header(AUTHORIZATION, bearer(&alice))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    app.server
        .delete(&format!("/api/email/{}", id))
        .add_header(AUTHORIZATION, bearer(&alice))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_requires_valid_token() {
    let app = spawn_app().await;

    let response = app.server.get("/api/email/inbox").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    app.server
        .get("/api/email/inbox")
        .add_header(AUTHORIZATION, bearer("not-a-jwt"))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    app.server
        .post("/api/email/send")
        .json(&json!({ "subject": "x", "body": "y", "recipientEmail": "a@b.c" }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_counts_messages() {
    let app = spawn_app().await;
    let (alice, _) = register_user(&app.server, "alice@example.com", "Alice").await;
    register_user(&app.server, "bob@example.com", "Bob").await;
    send(&app.server, &alice, "bob@example.com", "One").await;

    let body: Value = app.server.get("/health").await.json();
    assert_eq!(body["messageCount"], 1);
}

#[tokio::test]
async fn test_update_without_recipient_stays_draft() {
    let app = spawn_app().await;
    let (alice, _) = register_user(&app.server, "alice@example.com", "Alice").await;

    let draft: Value = app
        .server
        .post("/api/email/draft")
        .add_header(AUTHORIZATION, bearer(&alice))
        .json(&json!({
            "subject": "Unaddressed",
            "body": "Who is this for?",
            "recipientEmail": "ghost@example.com"
        }))
        .await
        .json();
    let url = format!("/api/email/{}", draft["id"]);

    let response = app
        .server
        .put(&url)
        .add_header(AUTHORIZATION, bearer(&alice))
        .json(&json!({ "subject": "s", "body": "b" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["message"], "recipient email is required");

    let stored: Value = app
        .server
        .get(&url)
        .add_header(AUTHORIZATION, bearer(&alice))
        .await
        .json();
    assert_eq!(stored["isDraft"], true);
}
