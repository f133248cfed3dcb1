mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use axum::{Extension, Router, http::StatusCode, routing::get};
use chrono::Utc;
use codegate::auth::{AdminOnly, Auth, AuthenticatedUser};
use codegate::db::{CredentialStore, UserRole};
use codegate::denylist::{self, TokenDenylist};
use codegate::impl_has_auth_backend;
use codegate::jwt::{JwtConfig, SessionClaims};
use common::{TEST_JWT_SECRET, TestApp, body_json, empty_request};

async fn error_for(app: &TestApp, token: Option<&str>) -> (StatusCode, String) {
    let response = app
        .send(empty_request("GET", "/api/user/check", token))
        .await;
    let status = response.status();
    let body = body_json(response).await;
    (status, body["error"].as_str().unwrap_or_default().to_string())
}

fn sign(claims: SessionClaims) -> String {
    JwtConfig::new(TEST_JWT_SECRET).sign(&claims).unwrap()
}

#[tokio::test]
async fn test_valid_token_reaches_handler() {
    let app = TestApp::new().await;
    let (user, token) = app
        .seed_user("yash@gmail.com", "Yash@1", UserRole::User)
        .await;

    let response = app
        .send(empty_request("GET", "/api/user/check", Some(&token)))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Valid user");
    assert_eq!(body["user"]["_id"], user.id.as_str());
    assert_eq!(body["user"]["emailId"], "yash@gmail.com");
}

#[tokio::test]
async fn test_missing_token() {
    let app = TestApp::new().await;

    assert_eq!(
        error_for(&app, None).await,
        (
            StatusCode::UNAUTHORIZED,
            "Unauthenticated: token missing".to_string()
        )
    );
    assert_eq!(
        error_for(&app, Some("")).await.1,
        "Unauthenticated: token missing"
    );
    assert_eq!(app.store.queries(), 0);
}

#[tokio::test]
async fn test_garbage_and_forged_tokens() {
    let app = TestApp::new().await;
    let (user, _) = app
        .seed_user("yash@gmail.com", "Yash@1", UserRole::User)
        .await;
    let queries_before = app.store.queries();

    let forged = JwtConfig::new(b"attacker-key-that-is-also-32-bytes-long")
        .issue(&user)
        .unwrap()
        .token;

    for token in ["garbage", "a.b.c", forged.as_str()] {
        assert_eq!(
            error_for(&app, Some(token)).await,
            (
                StatusCode::UNAUTHORIZED,
                "Unauthenticated: invalid token".to_string()
            ),
            "{}",
            token
        );
    }
    assert_eq!(app.store.queries(), queries_before);
}

#[tokio::test]
async fn test_expired_token_rejected_regardless_of_denylist() {
    let app = TestApp::new().await;
    let (user, _) = app
        .seed_user("yash@gmail.com", "Yash@1", UserRole::User)
        .await;

    let now = Utc::now().timestamp();
    let expired = sign(SessionClaims {
        sub: Some(user.id.clone()),
        role: Some("user".to_string()),
        iat: Some(now - 7200),
        exp: Some(now - 3600),
        ..Default::default()
    });

    assert_eq!(
        error_for(&app, Some(&expired)).await.1,
        "Unauthenticated: invalid token"
    );

    // Even a denylist entry for it changes nothing
    app.denylist
        .inner
        .set(&denylist::token_key(&expired), denylist::BLOCKED_VALUE)
        .await
        .unwrap();
    assert_eq!(
        error_for(&app, Some(&expired)).await.1,
        "Unauthenticated: invalid token"
    );
}

#[tokio::test]
async fn test_token_without_exp_rejected() {
    let app = TestApp::new().await;
    let (user, _) = app
        .seed_user("yash@gmail.com", "Yash@1", UserRole::User)
        .await;

    let token = sign(SessionClaims {
        sub: Some(user.id.clone()),
        role: Some("user".to_string()),
        ..Default::default()
    });

    assert_eq!(
        error_for(&app, Some(&token)).await.1,
        "Unauthenticated: invalid token"
    );
}

#[tokio::test]
async fn test_token_without_subject_rejected() {
    let app = TestApp::new().await;
    let exp = Utc::now().timestamp() + 600;

    for sub in [None, Some(String::new())] {
        let token = sign(SessionClaims {
            sub,
            role: Some("user".to_string()),
            exp: Some(exp),
            ..Default::default()
        });
        assert_eq!(
            error_for(&app, Some(&token)).await.1,
            "Unauthenticated: invalid token"
        );
    }
    assert_eq!(app.store.queries(), 0);
}

#[tokio::test]
async fn test_deleted_user_rejected() {
    let app = TestApp::new().await;
    let (_, token) = app
        .seed_user("yash@gmail.com", "Yash@1", UserRole::User)
        .await;

    let response = app
        .send(empty_request("DELETE", "/api/user/deleteProfile", Some(&token)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Deleted successfully");

    assert_eq!(
        error_for(&app, Some(&token)).await,
        (
            StatusCode::UNAUTHORIZED,
            "Unauthenticated: user no longer exists".to_string()
        )
    );
}

#[tokio::test]
async fn test_delete_profile_store_failure() {
    let app = TestApp::new().await;
    let (user, token) = app
        .seed_user("yash@gmail.com", "Yash@1", UserRole::User)
        .await;
    app.store.fail_deletes.store(true, Ordering::SeqCst);

    let response = app
        .send(empty_request("DELETE", "/api/user/deleteProfile", Some(&token)))
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Internal Server Error");
    assert!(app.store.find_by_id(&user.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_store_failure_fails_closed() {
    let app = TestApp::new().await;
    let (_, token) = app
        .seed_user("yash@gmail.com", "Yash@1", UserRole::User)
        .await;
    app.store.fail_reads.store(true, Ordering::SeqCst);

    let (status, message) = error_for(&app, Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(message, "Unauthenticated: session could not be verified");
}

#[tokio::test]
async fn test_denylist_failure_fails_closed() {
    let app = TestApp::new().await;
    let (_, token) = app
        .seed_user("yash@gmail.com", "Yash@1", UserRole::User)
        .await;
    app.denylist.fail_reads.store(true, Ordering::SeqCst);

    let (status, message) = error_for(&app, Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(message, "Unauthenticated: session could not be verified");
}

#[tokio::test]
async fn test_blocked_token_checked_after_user_lookup() {
    let app = TestApp::new().await;
    let (user, token) = app
        .seed_user("yash@gmail.com", "Yash@1", UserRole::User)
        .await;
    denylist::block_token(
        app.denylist.as_ref(),
        &token,
        Utc::now().timestamp() + 600,
    )
    .await
    .unwrap();

    assert_eq!(
        error_for(&app, Some(&token)).await.1,
        "Unauthenticated: token blocked"
    );

    app.store.delete_by_id(&user.id).await.unwrap();
    assert_eq!(
        error_for(&app, Some(&token)).await.1,
        "Unauthenticated: user no longer exists"
    );
}

#[derive(Clone)]
struct ProbeState {
    jwt: Arc<JwtConfig>,
    users: Arc<dyn CredentialStore>,
    denylist: Arc<dyn TokenDenylist>,
}

impl_has_auth_backend!(ProbeState);

async fn whoami(_auth: Auth, Extension(user): Extension<AuthenticatedUser>) -> String {
    user.user.id
}

async fn admin_only(auth: Auth<AdminOnly>) -> String {
    auth.user.role.as_str().to_string()
}

#[tokio::test]
async fn test_gate_records_user_in_extensions() {
    use tower::ServiceExt;

    let app = TestApp::new().await;
    let (user, token) = app
        .seed_user("yash@gmail.com", "Yash@1", UserRole::User)
        .await;
    let (_, admin_token) = app
        .seed_user("root@example.com", "R00t!pass", UserRole::Admin)
        .await;

    let state = ProbeState {
        jwt: Arc::new(JwtConfig::new(TEST_JWT_SECRET)),
        users: app.store.clone(),
        denylist: app.denylist.clone(),
    };
    let router = Router::new()
        .route("/whoami", get(whoami))
        .route("/admin", get(admin_only))
        .with_state(state);

    let response = router
        .clone()
        .oneshot(empty_request("GET", "/whoami", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(body, user.id.as_bytes());

    let response = router
        .clone()
        .oneshot(empty_request("GET", "/admin", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = router
        .oneshot(empty_request("GET", "/admin", Some(&admin_token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
