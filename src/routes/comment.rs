// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Comment routes.

use axum::{
    extract::{Path, Query, State},
    routing::{get, patch},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::{AppError, FieldError, Result};
use crate::middleware::auth::CurrentUser;
use crate::models::Comment;
use crate::response::ApiResponse;
use crate::AppState;

const MAX_COMMENT_LENGTH: usize = 500;
const DEFAULT_PAGE_SIZE: u32 = 10;
const MAX_PAGE_SIZE: u32 = 100;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/{videoId}", get(get_video_comments).post(add_comment))
        .route(
            "/c/{commentId}",
            patch(update_comment).delete(delete_comment),
        )
}

fn validate_content(content: &str) -> Result<()> {
    if content.trim().is_empty() {
        return Err(AppError::Validation(vec![FieldError {
            field: "content".to_string(),
            message: "Content is required".to_string(),
        }]));
    }
    if content.chars().count() > MAX_COMMENT_LENGTH {
        return Err(AppError::Validation(vec![FieldError {
            field: "content".to_string(),
            message: format!("Comment exceeds {} character limit", MAX_COMMENT_LENGTH),
        }]));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct CommentPageParams {
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_limit")]
    limit: u32,
}

fn default_page() -> u32 {
    1
}
fn default_limit() -> u32 {
    DEFAULT_PAGE_SIZE
}

/// List a video's comments, newest first.
async fn get_video_comments(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
    Query(params): Query<CommentPageParams>,
) -> Result<ApiResponse<Vec<Comment>>> {
    let limit = params.limit.clamp(1, MAX_PAGE_SIZE);
    let offset = params.page.saturating_sub(1).saturating_mul(limit);

    let comments = state
        .db
        .list_comments_for_video(&video_id, limit, offset)
        .await?;

    Ok(ApiResponse::ok(comments, "Comments fetched successfully"))
}

#[derive(Debug, Deserialize)]
struct CommentInput {
    content: String,
}

/// Add a comment to a video.
async fn add_comment(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(video_id): Path<String>,
    Json(input): Json<CommentInput>,
) -> Result<ApiResponse<Comment>> {
    validate_content(&input.content)?;

    state
        .db
        .get_video(&video_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Video {} not found", video_id)))?;

    let now = chrono::Utc::now().to_rfc3339();
    let comment = Comment {
        id: uuid::Uuid::new_v4().to_string(),
        video: video_id,
        owner: caller.id,
        content: input.content,
        created_at: now.clone(),
        updated_at: now,
    };
    state.db.upsert_comment(&comment).await?;

    Ok(ApiResponse::created(comment, "Comment created successfully"))
}

/// Update a comment (owner only, checked before the write).
async fn update_comment(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(comment_id): Path<String>,
    Json(input): Json<CommentInput>,
) -> Result<ApiResponse<Comment>> {
    validate_content(&input.content)?;

    let mut comment = state
        .db
        .get_comment(&comment_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Comment {} not found", comment_id)))?;

    if comment.owner != caller.id {
        return Err(AppError::Forbidden(
            "You are not allowed to update this comment".to_string(),
        ));
    }

    comment.content = input.content;
    comment.updated_at = chrono::Utc::now().to_rfc3339();
    state.db.upsert_comment(&comment).await?;

    Ok(ApiResponse::ok(comment, "Comment updated successfully"))
}

/// Delete a comment (owner only, checked before the delete).
async fn delete_comment(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(comment_id): Path<String>,
) -> Result<ApiResponse<Comment>> {
    let comment = state
        .db
        .get_comment(&comment_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Comment {} not found", comment_id)))?;

    if comment.owner != caller.id {
        return Err(AppError::Forbidden(
            "You are not allowed to delete this comment".to_string(),
        ));
    }

    state.db.delete_comment(&comment_id).await?;

    Ok(ApiResponse::ok(comment, "Comment deleted successfully"))
}
