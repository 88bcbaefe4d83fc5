// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Channel dashboard routes (aggregate stats over several collections).

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::VideoListQuery;
use crate::error::{AppError, Result};
use crate::models::Video;
use crate::response::ApiResponse;
use crate::AppState;

const DEFAULT_PAGE_SIZE: u32 = 10;
const MAX_PAGE_SIZE: u32 = 100;
// Upper bound when loading a channel's full catalog for stats
const STATS_VIDEO_LIMIT: u32 = 1000;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/stats/{channelId}", get(get_channel_stats))
        .route("/videos/{channelId}", get(get_channel_videos))
}

/// Aggregate channel statistics.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChannelStats {
    total_videos: u64,
    total_views: u64,
    total_likes: u64,
    total_subscribers: u64,
}

/// Channel totals: videos, views, likes across the channel's videos,
/// and subscribers. Assembled from per-collection reads.
async fn get_channel_stats(
    State(state): State<Arc<AppState>>,
    Path(channel_id): Path<String>,
) -> Result<ApiResponse<ChannelStats>> {
    state
        .db
        .get_user(&channel_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Channel {} not found", channel_id)))?;

    let videos = state
        .db
        .list_videos(&VideoListQuery {
            owner: Some(channel_id.clone()),
            published_only: false,
            limit: STATS_VIDEO_LIMIT,
            ..Default::default()
        })
        .await?;

    let total_videos = videos.len() as u64;
    let total_views = videos.iter().map(|v| v.views).sum();

    let video_ids: Vec<String> = videos.iter().map(|v| v.id.clone()).collect();
    let total_likes = state.db.count_likes_for_videos(&video_ids).await?;

    let total_subscribers = state.db.count_subscribers(&channel_id).await?;

    Ok(ApiResponse::ok(
        ChannelStats {
            total_videos,
            total_views,
            total_likes,
            total_subscribers,
        },
        "Channel stats fetched successfully",
    ))
}

#[derive(Debug, Deserialize)]
struct ChannelVideosParams {
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

/// A channel's published videos, newest first, paginated.
async fn get_channel_videos(
    State(state): State<Arc<AppState>>,
    Path(channel_id): Path<String>,
    Query(params): Query<ChannelVideosParams>,
) -> Result<ApiResponse<Vec<Video>>> {
    state
        .db
        .get_user(&channel_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Channel {} not found", channel_id)))?;

    let limit = params.limit.clamp(1, MAX_PAGE_SIZE);
    let offset = params.page.saturating_sub(1).saturating_mul(limit);

    let videos = state
        .db
        .list_videos(&VideoListQuery {
            owner: Some(channel_id),
            published_only: true,
            limit,
            offset,
            ..Default::default()
        })
        .await?;

    Ok(ApiResponse::ok(
        videos,
        "Channel videos fetched successfully",
    ))
}
