// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Video publishing and catalog routes.

use axum::{
    extract::{Multipart, Path, Query, State},
    routing::{get, patch},
    Extension, Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::VideoListQuery;
use crate::error::{AppError, FieldError, Result};
use crate::middleware::auth::CurrentUser;
use crate::models::{ChannelSummary, Video, VideoWithOwner};
use crate::response::ApiResponse;
use crate::routes::upload::{read_text, read_upload, UploadedFile};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_videos).post(publish_video))
        .route(
            "/{videoId}",
            get(get_video).patch(update_video).delete(delete_video),
        )
        .route("/toggle/publish/{videoId}", patch(toggle_publish_status))
}

const DEFAULT_PER_PAGE: u32 = 20;
const MAX_PER_PAGE: u32 = 100;

// ─── Cursor Pagination ───────────────────────────────────────

/// Decode an opaque cursor (base64 of the last item's creation time).
fn parse_cursor(cursor: &str) -> Result<String> {
    let invalid_cursor = || AppError::BadRequest("Invalid 'cursor' parameter".to_string());

    let decoded = URL_SAFE_NO_PAD.decode(cursor).map_err(|_| invalid_cursor())?;
    let decoded_str = String::from_utf8(decoded).map_err(|_| invalid_cursor())?;

    chrono::DateTime::parse_from_rfc3339(&decoded_str).map_err(|_| invalid_cursor())?;

    Ok(decoded_str)
}

/// Encode the next-page cursor from the last item of a full page.
fn encode_cursor(created_at: &str) -> String {
    URL_SAFE_NO_PAD.encode(created_at.as_bytes())
}

// ─── Listing ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct VideoListParams {
    /// Title prefix search
    #[serde(default)]
    q: Option<String>,
    /// Filter by owner (channel) user ID
    #[serde(default, rename = "userId")]
    user_id: Option<String>,
    /// Opaque pagination cursor (newest-first listing only)
    #[serde(default)]
    cursor: Option<String>,
    #[serde(default = "default_per_page", rename = "perPage")]
    per_page: u32,
}

fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoListResponse {
    videos: Vec<Video>,
    next_cursor: Option<String>,
}

/// List videos, newest first (or by title when searching).
///
/// Unpublished videos are visible only when listing the caller's own
/// channel.
async fn list_videos(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Query(params): Query<VideoListParams>,
) -> Result<ApiResponse<VideoListResponse>> {
    if params.q.is_some() && params.cursor.is_some() {
        return Err(AppError::BadRequest(
            "Cursor pagination is not supported together with title search".to_string(),
        ));
    }

    let created_before = params.cursor.as_deref().map(parse_cursor).transpose()?;
    let limit = params.per_page.clamp(1, MAX_PER_PAGE);

    let published_only = params.user_id.as_deref() != Some(caller.id.as_str());

    let videos = state
        .db
        .list_videos(&VideoListQuery {
            owner: params.user_id,
            published_only,
            title_prefix: params.q,
            created_before,
            limit,
            offset: 0,
        })
        .await?;

    // A full page means there may be more
    let next_cursor = if videos.len() as u32 == limit {
        videos.last().map(|v| encode_cursor(&v.created_at))
    } else {
        None
    };

    Ok(ApiResponse::ok(
        VideoListResponse {
            videos,
            next_cursor,
        },
        "Videos fetched successfully",
    ))
}

// ─── Publishing ──────────────────────────────────────────────

#[derive(Default)]
struct PublishForm {
    title: String,
    description: String,
    video_file: Option<UploadedFile>,
    thumbnail_file: Option<UploadedFile>,
}

async fn read_publish_form(multipart: &mut Multipart) -> Result<PublishForm> {
    let mut form = PublishForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart request: {}", e)))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match name.as_str() {
            "title" => form.title = read_text(field).await?,
            "description" => form.description = read_text(field).await?,
            "videoFile" => form.video_file = Some(read_upload(field).await?),
            "thumbnailFile" => form.thumbnail_file = Some(read_upload(field).await?),
            _ => {}
        }
    }

    Ok(form)
}

/// Publish a new video: upload the clip and thumbnail, then create the
/// document. Uploaded assets are deleted if a later step fails.
async fn publish_video(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Result<ApiResponse<Video>> {
    let form = read_publish_form(&mut multipart).await?;

    let mut invalid = Vec::new();
    if form.title.trim().is_empty() {
        invalid.push(FieldError {
            field: "title".to_string(),
            message: "Title is required".to_string(),
        });
    }
    if form.description.trim().is_empty() {
        invalid.push(FieldError {
            field: "description".to_string(),
            message: "Description is required".to_string(),
        });
    }
    if form.video_file.is_none() {
        invalid.push(FieldError {
            field: "videoFile".to_string(),
            message: "Video file is required".to_string(),
        });
    }
    if form.thumbnail_file.is_none() {
        invalid.push(FieldError {
            field: "thumbnailFile".to_string(),
            message: "Thumbnail file is required".to_string(),
        });
    }
    let (video_file, thumbnail_file) = match (form.video_file, form.thumbnail_file) {
        (Some(video_file), Some(thumbnail_file)) if invalid.is_empty() => {
            (video_file, thumbnail_file)
        }
        _ => return Err(AppError::Validation(invalid)),
    };

    let video_asset = state
        .media
        .upload(
            "videos",
            &video_file.filename,
            &video_file.content_type,
            video_file.bytes,
        )
        .await?;

    let thumbnail_asset = match state
        .media
        .upload(
            "thumbnails",
            &thumbnail_file.filename,
            &thumbnail_file.content_type,
            thumbnail_file.bytes,
        )
        .await
    {
        Ok(asset) => asset,
        Err(err) => {
            delete_asset_best_effort(&state, &video_asset.asset_id).await;
            return Err(err);
        }
    };

    let now = chrono::Utc::now().to_rfc3339();
    let video = Video {
        id: uuid::Uuid::new_v4().to_string(),
        owner: caller.id,
        video_url: video_asset.url.clone(),
        video_asset_id: video_asset.asset_id.clone(),
        thumbnail_url: thumbnail_asset.url.clone(),
        thumbnail_asset_id: thumbnail_asset.asset_id.clone(),
        title: form.title,
        description: form.description,
        duration_seconds: video_asset.duration_seconds.unwrap_or(0.0),
        views: 0,
        is_published: true,
        created_at: now.clone(),
        updated_at: now,
    };

    if let Err(err) = state.db.upsert_video(&video).await {
        delete_asset_best_effort(&state, &video_asset.asset_id).await;
        delete_asset_best_effort(&state, &thumbnail_asset.asset_id).await;
        return Err(err);
    }

    tracing::info!(video_id = %video.id, owner = %video.owner, "Video published");

    Ok(ApiResponse::created(video, "Video published successfully"))
}

async fn delete_asset_best_effort(state: &AppState, asset_id: &str) {
    if let Err(e) = state.media.delete(asset_id).await {
        tracing::warn!(asset_id, error = %e, "Failed to clean up media asset");
    }
}

// ─── Single Video ────────────────────────────────────────────

/// Fetch a video with owner details.
///
/// Viewing someone else's video bumps its view counter and records it
/// in the caller's watch history.
async fn get_video(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(video_id): Path<String>,
) -> Result<ApiResponse<VideoWithOwner>> {
    let video = state
        .db
        .get_video(&video_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Video {} not found", video_id)))?;

    // Unpublished videos exist only for their owner
    if !video.is_published && video.owner != caller.id {
        return Err(AppError::NotFound(format!("Video {} not found", video_id)));
    }

    if video.owner != caller.id {
        state.db.record_view(&video_id, &caller.id).await?;
    }

    // Re-read to return the bumped counter
    let video = state
        .db
        .get_video(&video_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Video {} not found", video_id)))?;

    let owner = state
        .db
        .get_user(&video.owner)
        .await?
        .ok_or_else(|| AppError::NotFound("Video owner not found".to_string()))?;

    Ok(ApiResponse::ok(
        VideoWithOwner {
            video,
            owner_details: ChannelSummary::from(&owner),
        },
        "Video fetched successfully",
    ))
}

#[derive(Default)]
struct UpdateVideoForm {
    title: Option<String>,
    description: Option<String>,
    thumbnail_file: Option<UploadedFile>,
}

async fn read_update_form(multipart: &mut Multipart) -> Result<UpdateVideoForm> {
    let mut form = UpdateVideoForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart request: {}", e)))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match name.as_str() {
            "title" => form.title = Some(read_text(field).await?),
            "description" => form.description = Some(read_text(field).await?),
            "thumbnailFile" => form.thumbnail_file = Some(read_upload(field).await?),
            _ => {}
        }
    }

    Ok(form)
}

/// Update title, description, and/or thumbnail (owner only).
async fn update_video(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(video_id): Path<String>,
    mut multipart: Multipart,
) -> Result<ApiResponse<Video>> {
    // Ownership check before any upload or mutation
    let mut video = state
        .db
        .get_video(&video_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Video {} not found", video_id)))?;

    if video.owner != caller.id {
        return Err(AppError::Forbidden(
            "You are not allowed to update this video".to_string(),
        ));
    }

    let form = read_update_form(&mut multipart).await?;

    if form.title.is_none() && form.description.is_none() && form.thumbnail_file.is_none() {
        return Err(AppError::BadRequest("No fields to update".to_string()));
    }

    if let Some(title) = form.title {
        if title.trim().is_empty() {
            return Err(AppError::Validation(vec![FieldError {
                field: "title".to_string(),
                message: "Title must not be empty".to_string(),
            }]));
        }
        video.title = title;
    }
    if let Some(description) = form.description {
        video.description = description;
    }

    let old_thumbnail_asset_id = video.thumbnail_asset_id.clone();
    let mut replaced_thumbnail = false;
    if let Some(thumbnail) = form.thumbnail_file {
        let asset = state
            .media
            .upload(
                "thumbnails",
                &thumbnail.filename,
                &thumbnail.content_type,
                thumbnail.bytes,
            )
            .await?;
        video.thumbnail_url = asset.url;
        video.thumbnail_asset_id = asset.asset_id;
        replaced_thumbnail = true;
    }

    video.updated_at = chrono::Utc::now().to_rfc3339();
    if let Err(err) = state.db.upsert_video(&video).await {
        // The new thumbnail was uploaded but never referenced
        if replaced_thumbnail {
            delete_asset_best_effort(&state, &video.thumbnail_asset_id).await;
        }
        return Err(err);
    }

    if replaced_thumbnail {
        delete_asset_best_effort(&state, &old_thumbnail_asset_id).await;
    }

    Ok(ApiResponse::ok(video, "Video updated successfully"))
}

/// Delete a video and its stored media (owner only).
async fn delete_video(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(video_id): Path<String>,
) -> Result<ApiResponse<Video>> {
    let video = state
        .db
        .get_video(&video_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Video {} not found", video_id)))?;

    if video.owner != caller.id {
        return Err(AppError::Forbidden(
            "You are not allowed to delete this video".to_string(),
        ));
    }

    state.db.delete_video(&video_id).await?;

    delete_asset_best_effort(&state, &video.video_asset_id).await;
    delete_asset_best_effort(&state, &video.thumbnail_asset_id).await;

    tracing::info!(video_id = %video.id, "Video deleted");

    Ok(ApiResponse::ok(video, "Video deleted successfully"))
}

/// Flip a video's published flag (owner only).
async fn toggle_publish_status(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(video_id): Path<String>,
) -> Result<ApiResponse<Video>> {
    let mut video = state
        .db
        .get_video(&video_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Video {} not found", video_id)))?;

    if video.owner != caller.id {
        return Err(AppError::Forbidden(
            "You are not allowed to modify this video".to_string(),
        ));
    }

    video.is_published = !video.is_published;
    video.updated_at = chrono::Utc::now().to_rfc3339();
    state.db.upsert_video(&video).await?;

    Ok(ApiResponse::ok(video, "Publish status toggled"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_roundtrip() {
        let created_at = "2026-08-01T12:30:00+00:00";
        let cursor = encode_cursor(created_at);
        assert_eq!(parse_cursor(&cursor).unwrap(), created_at);
    }

    #[test]
    fn test_cursor_rejects_garbage() {
        assert!(parse_cursor("!!not-base64!!").is_err());
    }

    #[test]
    fn test_cursor_rejects_non_timestamp() {
        let cursor = URL_SAFE_NO_PAD.encode(b"not a timestamp");
        assert!(parse_cursor(&cursor).is_err());
    }
}
