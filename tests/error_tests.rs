// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Error taxonomy and envelope tests.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use vidtube::error::{AppError, FieldError};

fn status_of(err: AppError) -> StatusCode {
    err.into_response().status()
}

#[test]
fn test_error_status_mapping() {
    assert_eq!(
        status_of(AppError::Validation(vec![])),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        status_of(AppError::BadRequest("bad".to_string())),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(status_of(AppError::Unauthenticated), StatusCode::UNAUTHORIZED);
    assert_eq!(
        status_of(AppError::InvalidCredentials),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        status_of(AppError::Forbidden("no".to_string())),
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        status_of(AppError::NotFound("missing".to_string())),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        status_of(AppError::Conflict("dup".to_string())),
        StatusCode::CONFLICT
    );
    assert_eq!(
        status_of(AppError::Database("down".to_string())),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        status_of(AppError::Internal(anyhow::anyhow!("boom"))),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[tokio::test]
async fn test_error_envelope_shape() {
    let response = AppError::NotFound("Video xyz not found".to_string()).into_response();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let envelope: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(envelope["statusCode"], 404);
    assert_eq!(envelope["success"], false);
    assert_eq!(envelope["message"], "Video xyz not found");
    assert!(envelope["data"].is_null());
    assert_eq!(envelope["errors"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_validation_envelope_carries_field_errors() {
    let response = AppError::Validation(vec![FieldError {
        field: "password".to_string(),
        message: "Password must be at least 6 characters".to_string(),
    }])
    .into_response();

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let envelope: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(envelope["statusCode"], 400);
    let errors = envelope["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["field"], "password");
}

#[tokio::test]
async fn test_internal_details_not_leaked() {
    let response = AppError::Database("connection string user:hunter2@db".to_string())
        .into_response();

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let envelope: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(envelope["message"], "Internal server error");
    assert!(!bytes.windows(7).any(|w| w == b"hunter2".as_slice()));
}
