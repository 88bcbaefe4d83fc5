// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Like toggle routes.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Router,
};
use serde::Serialize;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::auth::CurrentUser;
use crate::models::{ChannelSummary, Like, LikeTarget, VideoWithOwner};
use crate::response::ApiResponse;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/toggle/v/{videoId}", post(toggle_video_like))
        .route("/toggle/c/{commentId}", post(toggle_comment_like))
        .route("/toggle/t/{tweetId}", post(toggle_tweet_like))
        .route("/videos", get(get_liked_videos))
}

#[derive(Debug, Serialize)]
struct ToggleResult {
    liked: bool,
}

/// Flip the caller's like on a target: create it if absent, remove it
/// if present. The target must exist.
async fn toggle_like(
    state: &AppState,
    owner: &str,
    target: LikeTarget,
    target_id: &str,
) -> Result<ApiResponse<ToggleResult>> {
    if let Some(existing) = state.db.get_like(owner, target, target_id).await? {
        state.db.delete_like(&existing.id).await?;
        return Ok(ApiResponse::ok(
            ToggleResult { liked: false },
            "Like removed",
        ));
    }

    let now = chrono::Utc::now().to_rfc3339();
    let like = Like::for_target(owner, target, target_id, &now);
    state.db.upsert_like(&like).await?;

    Ok(ApiResponse::ok(ToggleResult { liked: true }, "Like added"))
}

async fn toggle_video_like(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(video_id): Path<String>,
) -> Result<ApiResponse<ToggleResult>> {
    state
        .db
        .get_video(&video_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Video {} not found", video_id)))?;

    toggle_like(&state, &caller.id, LikeTarget::Video, &video_id).await
}

async fn toggle_comment_like(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(comment_id): Path<String>,
) -> Result<ApiResponse<ToggleResult>> {
    state
        .db
        .get_comment(&comment_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Comment {} not found", comment_id)))?;

    toggle_like(&state, &caller.id, LikeTarget::Comment, &comment_id).await
}

async fn toggle_tweet_like(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(tweet_id): Path<String>,
) -> Result<ApiResponse<ToggleResult>> {
    state
        .db
        .get_tweet(&tweet_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Tweet {} not found", tweet_id)))?;

    toggle_like(&state, &caller.id, LikeTarget::Tweet, &tweet_id).await
}

/// Videos the caller has liked, newest like first, with owner details.
///
/// Likes pointing at since-deleted videos are skipped.
async fn get_liked_videos(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
) -> Result<ApiResponse<Vec<VideoWithOwner>>> {
    let likes = state.db.list_video_likes_for_user(&caller.id).await?;

    let video_ids: Vec<String> = likes.iter().filter_map(|l| l.video.clone()).collect();
    let videos = state.db.get_videos_by_ids(&video_ids).await?;

    let owner_ids: Vec<String> = videos.values().map(|v| v.owner.clone()).collect();
    let owners = state.db.get_users_by_ids(&owner_ids).await?;

    let liked: Vec<VideoWithOwner> = video_ids
        .iter()
        .filter_map(|id| videos.get(id))
        .filter_map(|video| {
            owners.get(&video.owner).map(|owner| VideoWithOwner {
                video: video.clone(),
                owner_details: ChannelSummary::from(owner),
            })
        })
        .collect();

    Ok(ApiResponse::ok(liked, "Liked videos fetched successfully"))
}
