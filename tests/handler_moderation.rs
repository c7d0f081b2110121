mod common;

use axum::http::StatusCode;
use linkcore::domain::repositories::UrlRepository;
use serde_json::json;

const ADMIN_ID: &str = "root";

#[tokio::test]
async fn test_flag_and_unflag() {
    let (server, repo) = common::create_test_server();
    let record = common::create_test_url(&repo, "abc123", "https://example.com", Some("u1")).await;

    let response = server
        .post(&format!("/api/urls/{}/flag", record.id))
        .add_header("x-user-id", ADMIN_ID)
        .add_header("x-user-role", "admin")
        .json(&json!({ "reason": "  phishing  " }))
        .await;

    response.assert_status_ok();
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["flagged"], true);
    assert_eq!(json["flagReason"], "phishing");

    server
        .get("/abc123")
        .await
        .assert_status(StatusCode::UNAVAILABLE_FOR_LEGAL_REASONS);

    let response = server
        .delete(&format!("/api/urls/{}/flag", record.id))
        .add_header("x-user-id", ADMIN_ID)
        .add_header("x-user-role", "admin")
        .await;

    response.assert_status_ok();
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["flagged"], false);
    assert!(json.get("flagReason").is_none());

    server
        .get("/abc123")
        .await
        .assert_status(StatusCode::TEMPORARY_REDIRECT);
}

#[tokio::test]
async fn test_flag_without_body() {
    let (server, repo) = common::create_test_server();
    let record = common::create_test_url(&repo, "abc123", "https://example.com", None).await;

    let response = server
        .post(&format!("/api/urls/{}/flag", record.id))
        .add_header("x-user-id", ADMIN_ID)
        .add_header("x-user-role", "admin")
        .await;

    response.assert_status_ok();
    let stored = repo.find_by_id(record.id).await.unwrap().unwrap();
    assert!(stored.flagged);
    assert_eq!(stored.flag_reason, None);
}

#[tokio::test]
async fn test_owner_cannot_flag() {
    let (server, repo) = common::create_test_server();
    let record = common::create_test_url(&repo, "abc123", "https://example.com", Some("u1")).await;

    server
        .post(&format!("/api/urls/{}/flag", record.id))
        .add_header("x-user-id", "u1")
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let stored = repo.find_by_id(record.id).await.unwrap().unwrap();
    assert!(!stored.flagged);
}

#[tokio::test]
async fn test_flag_missing_record() {
    let (server, _repo) = common::create_test_server();

    server
        .post("/api/urls/4242/flag")
        .add_header("x-user-id", ADMIN_ID)
        .add_header("x-user-role", "admin")
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_release_owner_keeps_records() {
    let (server, repo) = common::create_test_server();
    let first = common::create_test_url(&repo, "gone01", "https://a.com", Some("gone")).await;
    common::create_test_url(&repo, "gone02", "https://b.com", Some("gone")).await;
    common::create_test_url(&repo, "stay01", "https://c.com", Some("stay")).await;

    let response = server
        .post("/api/users/gone/release")
        .add_header("x-user-id", ADMIN_ID)
        .add_header("x-user-role", "admin")
        .await;

    response.assert_status_ok();
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["userId"], "gone");
    assert_eq!(json["released"], 2);

    let orphan = repo.find_by_id(first.id).await.unwrap().unwrap();
    assert_eq!(orphan.owner_id, None);
    server
        .get("/gone01")
        .await
        .assert_status(StatusCode::TEMPORARY_REDIRECT);

    let stayed = repo.find_by_code("stay01").await.unwrap().unwrap();
    assert_eq!(stayed.owner_id.as_deref(), Some("stay"));
}

#[tokio::test]
async fn test_release_owner_requires_admin() {
    let (server, _repo) = common::create_test_server();

    server
        .post("/api/users/gone/release")
        .add_header("x-user-id", "gone")
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_summary() {
    let (server, repo) = common::create_test_server();
    let clicked = common::create_test_url(&repo, "abc123", "https://a.com", Some("u1")).await;
    common::create_test_url(&repo, "anon01", "https://b.com", None).await;
    common::create_flagged_url(&repo, "evil01", "https://evil.example", "spam").await;
    repo.increment_clicks(clicked.id).await.unwrap();
    repo.increment_clicks(clicked.id).await.unwrap();

    let response = server
        .get("/api/summary")
        .add_header("x-user-id", ADMIN_ID)
        .add_header("x-user-role", "admin")
        .await;

    response.assert_status_ok();
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["totalUrls"], 3);
    assert_eq!(json["totalClicks"], 2);
    assert_eq!(json["flaggedUrls"], 1);
    assert_eq!(json["anonymousUrls"], 2);

    server
        .get("/api/summary")
        .add_header("x-user-id", "u1")
        .await
        .assert_status(StatusCode::FORBIDDEN);
}
