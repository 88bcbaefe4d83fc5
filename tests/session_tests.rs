// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session lifecycle tests (login, refresh rotation, logout).
//!
//! These run against the Firestore emulator and exercise the full
//! register → login → refresh → logout flow through the router, with
//! the mock media gateway standing in for storage uploads.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use tower::ServiceExt;

mod common;

const BOUNDARY: &str = "test-boundary-7MA4YWxkTrZu0gW";

fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4().simple())
}

/// Multipart registration body with text fields plus avatar/banner files.
fn register_body(username: &str, email: &str, password: &str, fullname: &str) -> String {
    let mut body = String::new();
    for (name, value) in [
        ("username", username),
        ("email", email),
        ("password", password),
        ("fullname", fullname),
    ] {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    for (name, filename) in [("avatar", "avatar.png"), ("banner", "banner.png")] {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: image/png\r\n\r\nfakepngbytes\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));
    body
}

async fn register(app: &Router, username: &str, email: &str, password: &str) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/user/register")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(register_body(
                    username,
                    email,
                    password,
                    "Test User",
                )))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn login(app: &Router, email: &str, password: &str) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/user/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(format!(
                    r#"{{"email": "{email}", "password": "{password}"}}"#
                )))
                .unwrap(),
        )
        .await
        .unwrap()
}

/// Pull a cookie's value out of the response's Set-Cookie headers.
fn cookie_value(response: &Response, name: &str) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&format!("{name}=")))
        .and_then(|v| v.split(';').next())
        .and_then(|pair| pair.split_once('=').map(|(_, value)| value.to_string()))
}

async fn json_body(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_login_sets_cookies_and_returns_tokens() {
    require_emulator!();
    let (app, _) = common::create_test_app_with_db(common::test_db().await);

    let username = unique("alice");
    let email = format!("{username}@example.com");
    let response = register(&app, &username, &email, "secret1").await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = login(&app, &email, "secret1").await;
    assert_eq!(response.status(), StatusCode::OK);

    let access_cookie = cookie_value(&response, "accessToken").expect("accessToken cookie");
    let refresh_cookie = cookie_value(&response, "refreshToken").expect("refreshToken cookie");
    assert!(!access_cookie.is_empty());
    assert!(!refresh_cookie.is_empty());

    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["user"]["username"], username.as_str());
    assert_eq!(body["data"]["accessToken"], access_cookie);
    assert_eq!(body["data"]["refreshToken"], refresh_cookie);
}

#[tokio::test]
async fn test_refresh_rotates_and_invalidates_prior_token() {
    require_emulator!();
    let (app, _) = common::create_test_app_with_db(common::test_db().await);

    let username = unique("bob");
    let email = format!("{username}@example.com");
    assert_eq!(
        register(&app, &username, &email, "secret1").await.status(),
        StatusCode::CREATED
    );

    let response = login(&app, &email, "secret1").await;
    let first_access = cookie_value(&response, "accessToken").unwrap();
    let first_refresh = cookie_value(&response, "refreshToken").unwrap();

    // Token claims have one-second resolution; make sure the rotated
    // pair differs from the original.
    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

    let refresh_req = |token: &str| {
        Request::builder()
            .method("POST")
            .uri("/api/v1/user/regenerate-token")
            .header(header::COOKIE, format!("refreshToken={token}"))
            .body(Body::empty())
            .unwrap()
    };

    let response = app.clone().oneshot(refresh_req(&first_refresh)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let second_access = cookie_value(&response, "accessToken").unwrap();
    assert_ne!(second_access, first_access, "Rotation must mint a new access token");

    // Replaying the original refresh token must fail: the stored value
    // now holds the rotated token.
    let response = app.clone().oneshot(refresh_req(&first_refresh)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_token_accepted_from_body() {
    require_emulator!();
    let (app, _) = common::create_test_app_with_db(common::test_db().await);

    let username = unique("carol");
    let email = format!("{username}@example.com");
    register(&app, &username, &email, "secret1").await;

    let response = login(&app, &email, "secret1").await;
    let refresh = cookie_value(&response, "refreshToken").unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/user/regenerate-token")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(format!(r#"{{"refreshToken": "{refresh}"}}"#)))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_logout_revokes_refresh_token() {
    require_emulator!();
    let (app, _) = common::create_test_app_with_db(common::test_db().await);

    let username = unique("dave");
    let email = format!("{username}@example.com");
    register(&app, &username, &email, "secret1").await;

    let response = login(&app, &email, "secret1").await;
    let access = cookie_value(&response, "accessToken").unwrap();
    let refresh = cookie_value(&response, "refreshToken").unwrap();

    let logout_req = || {
        Request::builder()
            .method("POST")
            .uri("/api/v1/user/logout")
            .header(header::COOKIE, format!("accessToken={access}"))
            .body(Body::empty())
            .unwrap()
    };

    let response = app.clone().oneshot(logout_req()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Cookies are cleared
    let cleared = cookie_value(&response, "refreshToken").unwrap();
    assert!(cleared.is_empty());

    // The still-unexpired refresh token is rejected: stored value cleared
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/user/regenerate-token")
                .header(header::COOKIE, format!("refreshToken={refresh}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Logout is idempotent
    let response = app.clone().oneshot(logout_req()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_failure_modes() {
    require_emulator!();
    let (app, _) = common::create_test_app_with_db(common::test_db().await);

    let username = unique("erin");
    let email = format!("{username}@example.com");
    register(&app, &username, &email, "secret1").await;

    // Correct identifier, wrong password
    let response = login(&app, &email, "wrong-password").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Unknown identifier
    let response = login(&app, "nobody@example.com", "secret1").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_register_duplicate_is_conflict() {
    require_emulator!();
    let (app, _) = common::create_test_app_with_db(common::test_db().await);

    let username = unique("frank");
    let email = format!("{username}@example.com");
    assert_eq!(
        register(&app, &username, &email, "secret1").await.status(),
        StatusCode::CREATED
    );

    // Same username, different email
    let response = register(&app, &username, "other@example.com", "secret1").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Same email, different username
    let response = register(&app, &unique("frank2"), &email, "secret1").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_access_token_authorizes_protected_route() {
    require_emulator!();
    let (app, _) = common::create_test_app_with_db(common::test_db().await);

    let username = unique("grace");
    let email = format!("{username}@example.com");
    register(&app, &username, &email, "secret1").await;

    let response = login(&app, &email, "secret1").await;
    let body = json_body(response).await;
    let access = body["data"]["accessToken"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/v1/user/current-user")
                .header(header::AUTHORIZATION, format!("Bearer {access}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["username"], username.as_str());
    // Credential material is never exposed
    assert!(body["data"].get("passwordHash").is_none());
    assert!(body["data"].get("refreshToken").is_none());
}

#[tokio::test]
async fn test_change_password_requires_current_password() {
    require_emulator!();
    let (app, _) = common::create_test_app_with_db(common::test_db().await);

    let username = unique("heidi");
    let email = format!("{username}@example.com");
    register(&app, &username, &email, "secret1").await;

    let response = login(&app, &email, "secret1").await;
    let access = cookie_value(&response, "accessToken").unwrap();

    let change_req = |old: &str, new: &str| {
        Request::builder()
            .method("POST")
            .uri("/api/v1/user/change-password")
            .header(header::COOKIE, format!("accessToken={access}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(format!(
                r#"{{"oldPassword": "{old}", "newPassword": "{new}"}}"#
            )))
            .unwrap()
    };

    // Wrong current password
    let response = app.clone().oneshot(change_req("wrong", "secret2")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Correct current password
    let response = app
        .clone()
        .oneshot(change_req("secret1", "secret2"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Old password no longer works, new one does
    assert_eq!(
        login(&app, &email, "secret1").await.status(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        login(&app, &email, "secret2").await.status(),
        StatusCode::OK
    );
}
