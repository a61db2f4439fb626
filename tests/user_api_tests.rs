//! Accounts, tokens and the service endpoints

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{days_from_today, TestApp, PASSWORD};
use library_server::models::UserRole;

#[tokio::test]
async fn test_self_registration_and_login() {
    let app = TestApp::new();

    let registered = app
        .post(
            "/api/users",
            None,
            json!({
                "username": "newreader",
                "email": "newreader@example.com",
                "password": "long-password",
                "role": "admin"
            }),
        )
        .await;
    assert_eq!(registered.status, StatusCode::CREATED, "{}", registered.body);
    assert_eq!(registered.body["username"], "newreader");
    assert_eq!(registered.body["role"], "user");
    assert!(registered.body.get("password").is_none());
    assert!(registered.body.get("password_hash").is_none());

    let tokens = app
        .post(
            "/api/token",
            None,
            json!({ "username": "newreader", "password": "long-password" }),
        )
        .await;
    assert_eq!(tokens.status, StatusCode::OK);
    assert!(tokens.body["access"].is_string());
    assert!(tokens.body["refresh"].is_string());

    let duplicate = app
        .post(
            "/api/users",
            None,
            json!({
                "username": "newreader",
                "email": "other@example.com",
                "password": "long-password"
            }),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        duplicate.body["error"]["details"]["username"][0],
        "A user with that username already exists."
    );
}

#[tokio::test]
async fn test_admin_may_create_admins() {
    let app = TestApp::new();
    let (_, admin) = app.user_with_token("admin", UserRole::Admin).await;

    let staff = app
        .post(
            "/api/users",
            Some(&admin),
            json!({
                "username": "staff",
                "email": "staff@example.com",
                "password": "long-password",
                "role": "admin"
            }),
        )
        .await;
    assert_eq!(staff.status, StatusCode::CREATED);
    assert_eq!(staff.body["role"], "admin");
}

#[tokio::test]
async fn test_registration_validation() {
    let app = TestApp::new();

    let invalid = app
        .post(
            "/api/users",
            None,
            json!({ "username": "bad name", "email": "nope", "password": "short" }),
        )
        .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    let details = &invalid.body["error"]["details"];
    assert!(details["username"].is_array());
    assert_eq!(details["email"][0], "Enter a valid email address.");
    assert_eq!(details["password"][0], "Ensure this field has at least 8 characters.");
}

#[tokio::test]
async fn test_token_errors() {
    let app = TestApp::new();
    app.seed_user("reader", UserRole::User).await;

    let wrong = app
        .post(
            "/api/token",
            None,
            json!({ "username": "reader", "password": "wrong-password" }),
        )
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);

    let unknown = app
        .post(
            "/api/token",
            None,
            json!({ "username": "ghost", "password": PASSWORD }),
        )
        .await;
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);

    let garbage = app
        .post("/api/token/refresh", None, json!({ "refresh": "garbage" }))
        .await;
    assert_eq!(garbage.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_token_flow() {
    let app = TestApp::new();
    app.seed_user("reader", UserRole::User).await;
    let pair = app
        .post(
            "/api/token",
            None,
            json!({ "username": "reader", "password": PASSWORD }),
        )
        .await;
    let access = pair.body["access"].as_str().unwrap().to_string();
    let refresh = pair.body["refresh"].as_str().unwrap().to_string();

    let renewed = app
        .post("/api/token/refresh", None, json!({ "refresh": refresh }))
        .await;
    assert_eq!(renewed.status, StatusCode::OK);
    let new_access = renewed.body["access"].as_str().unwrap().to_string();

    let me = app.get("/api/loans", Some(&new_access)).await;
    assert_eq!(me.status, StatusCode::OK);

    // tokens are typed: an access token is not a refresh token and vice versa
    let swapped = app
        .post("/api/token/refresh", None, json!({ "refresh": access }))
        .await;
    assert_eq!(swapped.status, StatusCode::UNAUTHORIZED);
    let refresh_as_bearer = app.get("/api/loans", Some(&refresh)).await;
    assert_eq!(refresh_as_bearer.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_user_management_permissions() {
    let app = TestApp::new();
    let (_, admin) = app.user_with_token("admin", UserRole::Admin).await;
    let (reader_id, reader) = app.user_with_token("reader", UserRole::User).await;
    let uri = format!("/api/users/{}", reader_id);

    assert_eq!(app.get("/api/users", None).await.status, StatusCode::UNAUTHORIZED);
    let listed = app.get("/api/users", Some(&reader)).await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body["count"], 2);

    let fetched = app.get(&uri, Some(&reader)).await;
    assert_eq!(fetched.body["username"], "reader");

    let self_edit = app
        .patch(&uri, Some(&reader), json!({ "email": "me@example.com" }))
        .await;
    assert_eq!(self_edit.status, StatusCode::FORBIDDEN);

    let promoted = app
        .patch(&uri, Some(&admin), json!({ "role": "admin", "password": "brand-new-pass" }))
        .await;
    assert_eq!(promoted.status, StatusCode::OK);
    assert_eq!(promoted.body["role"], "admin");

    let login = app
        .post(
            "/api/token",
            None,
            json!({ "username": "reader", "password": "brand-new-pass" }),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
}

#[tokio::test]
async fn test_user_with_active_loan_cannot_be_deleted() {
    let app = TestApp::new();
    let (_, admin) = app.user_with_token("admin", UserRole::Admin).await;
    let (reader_id, reader) = app.user_with_token("reader", UserRole::User).await;
    let book = app.create_book(&admin, "Held", "9780000000033").await;
    let uri = format!("/api/users/{}", reader_id);

    let loan = app
        .post(
            "/api/loans",
            Some(&reader),
            json!({ "book": book, "due_date": days_from_today(9) }),
        )
        .await;
    assert_eq!(loan.status, StatusCode::CREATED);

    let blocked = app.delete(&uri, Some(&admin)).await;
    assert_eq!(blocked.status, StatusCode::BAD_REQUEST);

    app.request(
        axum::http::Method::POST,
        &format!("/api/loans/{}/return", loan.body["id"].as_str().unwrap()),
        Some(&admin),
        None,
    )
    .await;

    assert_eq!(app.delete(&uri, Some(&admin)).await.status, StatusCode::NO_CONTENT);
    assert_eq!(app.get(&uri, Some(&admin)).await.status, StatusCode::NOT_FOUND);

    // the deleted account's token no longer authenticates
    assert_eq!(app.get("/api/loans", Some(&reader)).await.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_service_endpoints() {
    let app = TestApp::new();

    let root = app.get("/", None).await;
    assert_eq!(root.status, StatusCode::OK);
    assert_eq!(root.body, "Library API Server");

    let health = app.get("/health", None).await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body["status"], "healthy");

    let missing = app.get("/api/nowhere", None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.body["error"]["code"], "NOT_FOUND");
}
