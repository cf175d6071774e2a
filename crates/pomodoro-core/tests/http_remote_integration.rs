//! Integration tests for the REST remote store against a mock server.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use mockito::Matcher;
use pomodoro_core::error::RemoteError;
use pomodoro_core::storage::{Config, MemoryLocalStore, SessionRecord};
use pomodoro_core::sync::{HttpRemoteStore, RemoteStore, RemoteSync, SessionStore};
use pomodoro_core::SessionType;

fn record(hour: u32) -> SessionRecord {
    let start = Utc.with_ymd_and_hms(2026, 3, 1, hour, 0, 0).unwrap();
    SessionRecord::new(SessionType::Work, 25, 25, true, Some(start), None)
}

fn client(server: &mockito::Server, token: Option<&str>) -> HttpRemoteStore {
    HttpRemoteStore::new(
        &format!("{}/v1", server.url()),
        token.map(str::to_string),
        Duration::from_secs(5),
    )
    .unwrap()
}

#[tokio::test]
async fn test_put_sends_owner_tagged_document() {
    let mut server = mockito::Server::new_async().await;
    let rec = record(9);
    let mock = server
        .mock("PUT", format!("/v1/sessions/{}", rec.id).as_str())
        .match_header("authorization", "Bearer secret")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "id": rec.id,
            "ownerId": "u1",
            "sessionType": "WORK",
            "plannedDurationMinutes": 25,
        })))
        .with_status(200)
        .create_async()
        .await;

    client(&server, Some("secret")).put("u1", &rec).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_query_sorts_newest_first() {
    let mut server = mockito::Server::new_async().await;
    let mut older = record(8);
    let mut newer = record(10);
    older.owner_id = Some("u1".into());
    newer.owner_id = Some("u1".into());
    let body = serde_json::to_string(&vec![older.clone(), newer.clone()]).unwrap();

    let mock = server
        .mock("GET", "/v1/sessions")
        .match_query(Matcher::UrlEncoded("ownerId".into(), "u1".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await;

    let records = client(&server, None).query_by_owner("u1").await.unwrap();
    mock.assert_async().await;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, newer.id);
    assert_eq!(records[1].id, older.id);
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/v1/sessions")
        .match_query(Matcher::Any)
        .with_status(403)
        .with_body("permission denied")
        .create_async()
        .await;

    let err = client(&server, None).query_by_owner("u1").await.unwrap_err();
    match err {
        RemoteError::Status { status, body } => {
            assert_eq!(status, 403);
            assert_eq!(body, "permission denied");
        }
        other => panic!("Expected Status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body_is_a_decode_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/v1/sessions")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("{\"not\": \"a list\"}")
        .create_async()
        .await;

    let err = client(&server, None).query_by_owner("u1").await.unwrap_err();
    assert!(matches!(err, RemoteError::Decode(_)));
}

#[tokio::test]
async fn test_unreadable_document_is_skipped() {
    let mut server = mockito::Server::new_async().await;
    let mut good = record(9);
    good.owner_id = Some("u1".into());
    let body = serde_json::json!([good, { "id": "bad" }]).to_string();
    server
        .mock("GET", "/v1/sessions")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(body)
        .expect(2)
        .create_async()
        .await;

    let remote = client(&server, None);
    let records = remote.query_by_owner("u1").await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, good.id);

    let store = SessionStore::synced(Arc::new(MemoryLocalStore::new()), Arc::new(remote));
    let listed = store.list_all(Some("u1")).await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, good.id);
}

#[tokio::test]
async fn test_delete_of_missing_document_succeeds() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("DELETE", "/v1/sessions/gone")
        .with_status(404)
        .create_async()
        .await;

    client(&server, None).delete("gone").await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_batch_delete_targets_owner() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("DELETE", "/v1/sessions")
        .match_query(Matcher::UrlEncoded("ownerId".into(), "u1".into()))
        .with_status(204)
        .create_async()
        .await;

    client(&server, None).batch_delete_by_owner("u1").await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_store_from_config_degrades_when_server_fails() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("PUT", Matcher::Regex(r"^/v1/sessions/.+$".into()))
        .with_status(500)
        .create_async()
        .await;
    server
        .mock("GET", "/v1/sessions")
        .match_query(Matcher::Any)
        .with_status(500)
        .create_async()
        .await;

    let mut config = Config::default();
    config.remote.enabled = true;
    config.remote.base_url = format!("{}/v1", server.url());
    let store = SessionStore::from_config(&config, Arc::new(MemoryLocalStore::new())).unwrap();
    assert!(store.is_synced());

    let rec = record(9);
    let outcome = store.save(rec.clone(), Some("u1")).await.unwrap();
    assert!(matches!(outcome.remote, RemoteSync::Failed(_)));

    let listed = store.list_all(Some("u1")).await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, rec.id);
}

#[test]
fn test_disabled_remote_builds_local_only_store() {
    let config = Config::default();
    let store = SessionStore::from_config(&config, Arc::new(MemoryLocalStore::new())).unwrap();
    assert!(!store.is_synced());
}
