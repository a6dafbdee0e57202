//! Tests for registration, login and session handling
//!
//! These drive the real router with tower's `oneshot`, covering the
//! register → login → authenticated-request → logout lifecycle and the
//! duplicate/invalid-credential failure paths.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use std::sync::Arc;
use tempfile::{NamedTempFile, TempDir};
use tower::ServiceExt;

use nbshare::database::{init_db, AppState};
use nbshare::route::create_app;

/// Helper to create a test application with a temporary database and
/// upload directory
fn setup_test_app() -> (axum::Router, NamedTempFile, TempDir) {
    let temp_db = NamedTempFile::new().expect("Failed to create temp file");
    let temp_uploads = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_db.path().to_str().unwrap();

    let db = init_db(db_path).expect("Failed to initialize test database");
    let state = AppState {
        db: Arc::new(db),
        upload_dir: temp_uploads.path().to_path_buf(),
    };

    (create_app(state), temp_db, temp_uploads)
}

/// Helper to read a response body as text
async fn response_text(body: Body) -> String {
    let bytes = body
        .collect()
        .await
        .expect("Failed to read response body")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("Response body is not UTF-8")
}

/// Registers an account through the form endpoint
async fn register(app: &axum::Router, username: &str, email: &str, password: &str) -> StatusCode {
    let body = format!("username={}&email={}&password={}", username, email, password);
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/register")
                .header("content-type", "application/x-www-form-urlencoded")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    response.status()
}

/// Logs in through the form endpoint and returns the session cookie on
/// success
async fn login(app: &axum::Router, username: &str, password: &str) -> Option<String> {
    let body = format!("username={}&password={}", username, password);
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/login")
                .header("content-type", "application/x-www-form-urlencoded")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    if response.status() != StatusCode::SEE_OTHER {
        return None;
    }

    let set_cookie = response.headers().get("set-cookie")?.to_str().ok()?;
    Some(set_cookie.split(';').next().unwrap().to_string())
}

#[tokio::test]
async fn test_register_then_login_establishes_session() {
    let (app, _db, _uploads) = setup_test_app();

    let status = register(&app, "alice", "alice@example.com", "secret").await;
    assert_eq!(status, StatusCode::SEE_OTHER);

    let cookie = login(&app, "alice", "secret").await.expect("login should succeed");
    assert!(cookie.starts_with("session="));

    // The session cookie unlocks the dashboard
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/dashboard")
                .header("cookie", cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_text(response.into_body()).await;
    assert!(body.contains("alice"));
}

#[tokio::test]
async fn test_register_duplicate_username() {
    let (app, _db, _uploads) = setup_test_app();

    assert_eq!(
        register(&app, "bob", "bob@example.com", "pw1").await,
        StatusCode::SEE_OTHER
    );

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/register")
                .header("content-type", "application/x-www-form-urlencoded")
                .body(Body::from("username=bob&email=other@example.com&password=pw2"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = response_text(response.into_body()).await;
    assert!(body.contains("Username already exists"));
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let (app, _db, _uploads) = setup_test_app();

    assert_eq!(
        register(&app, "carol", "carol@example.com", "pw1").await,
        StatusCode::SEE_OTHER
    );

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/register")
                .header("content-type", "application/x-www-form-urlencoded")
                .body(Body::from("username=carla&email=carol@example.com&password=pw2"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = response_text(response.into_body()).await;
    assert!(body.contains("Email already registered"));
}

#[tokio::test]
async fn test_login_wrong_password() {
    let (app, _db, _uploads) = setup_test_app();

    register(&app, "dave", "dave@example.com", "correct").await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/login")
                .header("content-type", "application/x-www-form-urlencoded")
                .body(Body::from("username=dave&password=wrong"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response_text(response.into_body()).await;
    assert!(body.contains("Invalid username or password"));
}

#[tokio::test]
async fn test_login_unknown_username() {
    let (app, _db, _uploads) = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/login")
                .header("content-type", "application/x-www-form-urlencoded")
                .body(Body::from("username=nobody&password=whatever"))
                .unwrap(),
        )
        .await
        .unwrap();

    // Identical failure to a wrong password
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_dashboard_requires_auth() {
    let (app, _db, _uploads) = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/dashboard")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get("location").unwrap(), "/login");
}

#[tokio::test]
async fn test_logout_invalidates_session() {
    let (app, _db, _uploads) = setup_test_app();

    register(&app, "erin", "erin@example.com", "secret").await;
    let cookie = login(&app, "erin", "secret").await.unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/logout")
                .header("cookie", cookie.clone())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get("location").unwrap(), "/");

    // The old token no longer resolves to a user
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/dashboard")
                .header("cookie", cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get("location").unwrap(), "/login");
}

#[tokio::test]
async fn test_login_page_redirects_when_authenticated() {
    let (app, _db, _uploads) = setup_test_app();

    register(&app, "frank", "frank@example.com", "secret").await;
    let cookie = login(&app, "frank", "secret").await.unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/login")
                .header("cookie", cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get("location").unwrap(), "/dashboard");
}
