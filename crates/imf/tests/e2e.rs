// SPDX-FileCopyrightText: 2026 iMessageForwarder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the complete relay pipeline.
//!
//! Each test creates an isolated TestHarness with temp SQLite stores and a
//! mock exporter. Tests are independent and order-insensitive.

use std::path::{Path, PathBuf};

use axum::http::StatusCode;
use imf_core::{ActionKind, RowId};
use imf_test_utils::{MockExporter, TestHarness};
use serde_json::{json, Value};

fn valid_body(kind: ActionKind) -> Value {
    match kind {
        ActionKind::Message => json!({"chat_id": "5", "text": "hi"}),
        ActionKind::Chat => json!({"recipient_string": "+15550001111", "text": "hello"}),
        ActionKind::Reaction => json!({
            "chat_id": "5",
            "associated_guid": "p:0/MSG-1",
            "associated_type": "2000"
        }),
        ActionKind::Rename => json!({"chat_id": "5", "group_title": "Weekend"}),
    }
}

fn rowid(body: &Value) -> i64 {
    body["ROWID"].as_i64().expect("ROWID should be an integer")
}

// ---- Test 1: Missing fields never persist ----

#[tokio::test]
async fn test_missing_required_field_persists_nothing_for_every_kind() {
    let harness = TestHarness::new().await.unwrap();

    for kind in ActionKind::ALL {
        for field in kind.required_fields() {
            let mut body = valid_body(kind);
            body.as_object_mut().unwrap().remove(*field);

            let before = harness.queue.count(kind).await.unwrap();
            let resp = harness.enqueue(kind, &body).await;
            assert_eq!(resp.status, StatusCode::BAD_REQUEST, "{kind} without {field}");
            let error = resp.json()["error"].as_str().unwrap().to_string();
            assert!(error.contains(&format!("\"{field}\"")), "{error}");
            assert_eq!(harness.queue.count(kind).await.unwrap(), before);
        }
    }
}

#[tokio::test]
async fn test_empty_body_lists_every_missing_key() {
    let harness = TestHarness::new().await.unwrap();
    let resp = harness
        .post(harness.secure_router(), "/queue/reaction", "")
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        resp.json(),
        json!({"error": "Missing \"chat_id\", \"associated_guid\", or \"associated_type\" keys in request body."})
    );
    assert_eq!(harness.queue.count(ActionKind::Reaction).await.unwrap(), 0);
}

// ---- Test 2: chat_id parsing ----

#[tokio::test]
async fn test_malformed_chat_id_is_rejected_for_every_chat_kind() {
    let harness = TestHarness::new().await.unwrap();

    for kind in [ActionKind::Message, ActionKind::Reaction, ActionKind::Rename] {
        for bad in ["12a", ""] {
            let mut body = valid_body(kind);
            body["chat_id"] = json!(bad);

            let resp = harness.enqueue(kind, &body).await;
            assert_eq!(resp.status, StatusCode::BAD_REQUEST, "{kind} chat_id={bad:?}");
            assert_eq!(
                resp.json(),
                json!({"error": "\"chat_id\" value must be an integer."})
            );
            assert_eq!(harness.queue.count(kind).await.unwrap(), 0);
        }
    }
}

#[tokio::test]
async fn test_numeric_chat_id_enqueues_unsent_row() {
    let harness = TestHarness::new().await.unwrap();

    for kind in [ActionKind::Message, ActionKind::Reaction, ActionKind::Rename] {
        let mut body = valid_body(kind);
        body["chat_id"] = json!("42");

        let resp = harness.enqueue(kind, &body).await;
        assert_eq!(resp.status, StatusCode::CREATED, "{kind}");
        let id = rowid(&resp.json());

        let status = harness
            .get(harness.plain_router(), &format!("/queue/{kind}/{id}"))
            .await;
        assert_eq!(status.status, StatusCode::OK);
        assert_eq!(status.json(), json!({"sent": false, "row": null}));
    }
}

// ---- Test 3: Row identities ----

#[tokio::test]
async fn test_row_ids_strictly_increase_per_kind() {
    let harness = TestHarness::new().await.unwrap();

    let a = rowid(&harness.enqueue(ActionKind::Message, &valid_body(ActionKind::Message)).await.json());
    let chat = rowid(&harness.enqueue(ActionKind::Chat, &valid_body(ActionKind::Chat)).await.json());
    let b = rowid(&harness.enqueue(ActionKind::Message, &valid_body(ActionKind::Message)).await.json());

    assert_eq!(b, a + 1);
    // Each kind keeps its own sequence.
    assert_eq!(chat, 1);
}

#[tokio::test]
async fn test_consumed_row_id_is_never_reissued() {
    let harness = TestHarness::new().await.unwrap();

    let first = rowid(&harness.enqueue(ActionKind::Rename, &valid_body(ActionKind::Rename)).await.json());
    assert!(harness.consume(ActionKind::Rename, RowId(first)).await.unwrap());

    let second = rowid(&harness.enqueue(ActionKind::Rename, &valid_body(ActionKind::Rename)).await.json());
    assert_eq!(second, first + 1);
}

// ---- Test 4: Status lookups ----

#[tokio::test]
async fn test_status_of_unassigned_id_reports_sent() {
    let harness = TestHarness::new().await.unwrap();
    harness.enqueue(ActionKind::Chat, &valid_body(ActionKind::Chat)).await;

    let resp = harness.get(harness.plain_router(), "/queue/chat/999").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json(), json!({"sent": true, "row": null}));
}

#[tokio::test]
async fn test_bogus_table_is_rejected_regardless_of_id() {
    let harness = TestHarness::new().await.unwrap();

    for id in ["1", "abc", "-5", "99999999999999999999"] {
        let resp = harness
            .get(harness.plain_router(), &format!("/queue/bogus/{id}"))
            .await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST, "id={id}");
        assert_eq!(
            resp.json(),
            json!({"error": "Table must be one of {message, chat, reaction, rename}."})
        );
    }
}

#[tokio::test]
async fn test_echo_rows_returns_row_content_while_pending() {
    let harness = TestHarness::builder().with_echo_rows(true).build().await.unwrap();
    harness.enqueue(ActionKind::Message, &valid_body(ActionKind::Message)).await;

    let resp = harness.get(harness.plain_router(), "/queue/message/1").await;
    assert_eq!(
        resp.json(),
        json!({"sent": false, "row": {"ROWID": 1, "chat_id": 5, "text": "hi"}})
    );
}

// ---- Test 5: Attachment resolution ----

#[test]
fn test_tilde_filename_resolves_under_home() {
    let resolved = imf_storage::expand_home("~/Documents/a.png", Path::new("/home/x"));
    assert_eq!(resolved, PathBuf::from("/home/x/Documents/a.png"));
}

#[tokio::test]
async fn test_tilde_attachment_is_served_from_home_directory() {
    let harness = TestHarness::builder()
        .with_attachment("~/Library/Messages/Attachments/ab/photo.jpg", Some(b"JPEGDATA"))
        .build()
        .await
        .unwrap();

    let resp = harness.get(harness.secure_router(), "/retrieve/file/1").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(&resp.body[..], b"JPEGDATA");
    assert!(
        harness
            .home_dir
            .join("Library/Messages/Attachments/ab/photo.jpg")
            .is_file()
    );
}

// ---- Test 6: Incremental history pull ----

#[tokio::test]
async fn test_update_defaults_last_update_time_to_zero() {
    let exporter = MockExporter::with_chunks(["{\"message\":[]}"]);
    let harness = TestHarness::builder()
        .with_exporter(exporter.clone())
        .build()
        .await
        .unwrap();

    let resp = harness.get(harness.secure_router(), "/retrieve/update").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(&resp.body[..], b"{\"message\":[]}");

    harness
        .get(harness.secure_router(), "/retrieve/update?last_update_time=1000")
        .await;
    assert_eq!(exporter.calls(), vec![0, 1000]);
}

// ---- Test 7: Full scenario ----

#[tokio::test]
async fn test_enqueue_status_consume_scenario() {
    let harness = TestHarness::new().await.unwrap();

    let resp = harness
        .post(
            harness.secure_router(),
            "/queue/message",
            json!({"chat_id": "5", "text": "hi"}).to_string(),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);
    assert!(resp.header("location").unwrap().ends_with("/message/1"));
    assert_eq!(resp.json(), json!({"ROWID": 1}));

    let pending = harness.get(harness.plain_router(), "/queue/message/1").await;
    assert_eq!(pending.json(), json!({"sent": false, "row": null}));

    assert!(harness.consume(ActionKind::Message, RowId(1)).await.unwrap());

    let sent = harness.get(harness.plain_router(), "/queue/message/1").await;
    assert_eq!(sent.json(), json!({"sent": true, "row": null}));
}

#[tokio::test]
async fn test_plain_channel_cannot_enqueue() {
    let harness = TestHarness::new().await.unwrap();
    let resp = harness
        .post(
            harness.plain_router(),
            "/queue/message",
            valid_body(ActionKind::Message).to_string(),
        )
        .await;
    assert!(resp.status.is_client_error());
    assert_eq!(harness.queue.count(ActionKind::Message).await.unwrap(), 0);
}
