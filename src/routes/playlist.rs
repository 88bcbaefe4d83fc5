// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Playlist routes.

use axum::{
    extract::{Path, State},
    routing::{get, patch, post},
    Extension, Json, Router,
};
use futures_util::{stream, StreamExt};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::{AppError, FieldError, Result};
use crate::middleware::auth::CurrentUser;
use crate::models::{Playlist, PlaylistWithVideos};
use crate::response::ApiResponse;
use crate::AppState;

const MAX_CONCURRENT_HYDRATIONS: usize = 10;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_playlist))
        .route("/user/{userId}", get(get_user_playlists))
        .route(
            "/{playlistId}",
            get(get_playlist)
                .patch(update_playlist)
                .delete(delete_playlist),
        )
        .route("/add/{videoId}/{playlistId}", patch(add_video_to_playlist))
        .route(
            "/remove/{videoId}/{playlistId}",
            patch(remove_video_from_playlist),
        )
}

#[derive(Debug, Deserialize)]
struct PlaylistInput {
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
}

fn validate_input(input: &PlaylistInput) -> Result<()> {
    let mut invalid = Vec::new();
    if input.name.trim().is_empty() {
        invalid.push(FieldError {
            field: "name".to_string(),
            message: "Name is required".to_string(),
        });
    }
    if input.description.trim().is_empty() {
        invalid.push(FieldError {
            field: "description".to_string(),
            message: "Description is required".to_string(),
        });
    }
    if invalid.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(invalid))
    }
}

/// Create an empty playlist.
async fn create_playlist(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Json(input): Json<PlaylistInput>,
) -> Result<ApiResponse<Playlist>> {
    validate_input(&input)?;

    let now = chrono::Utc::now().to_rfc3339();
    let playlist = Playlist {
        id: uuid::Uuid::new_v4().to_string(),
        owner: caller.id,
        name: input.name,
        description: input.description,
        videos: Vec::new(),
        created_at: now.clone(),
        updated_at: now,
    };
    state.db.upsert_playlist(&playlist).await?;

    Ok(ApiResponse::created(
        playlist,
        "Playlist created successfully",
    ))
}

/// Hydrate a playlist with its videos, in playlist order. Missing
/// videos (deleted since being added) are skipped.
async fn hydrate_playlist(state: &AppState, playlist: Playlist) -> Result<PlaylistWithVideos> {
    let videos = state.db.get_videos_by_ids(&playlist.videos).await?;
    let video_details = playlist
        .videos
        .iter()
        .filter_map(|id| videos.get(id).cloned())
        .collect();

    Ok(PlaylistWithVideos {
        playlist,
        video_details,
    })
}

/// A user's playlists with video details, newest first.
async fn get_user_playlists(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<ApiResponse<Vec<PlaylistWithVideos>>> {
    state
        .db
        .get_user(&user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

    let playlists = state.db.list_playlists_for_user(&user_id).await?;

    let mut hydrated = stream::iter(playlists)
        .map(|playlist| hydrate_playlist(&state, playlist))
        .buffer_unordered(MAX_CONCURRENT_HYDRATIONS)
        .collect::<Vec<Result<PlaylistWithVideos>>>()
        .await
        .into_iter()
        .collect::<Result<Vec<PlaylistWithVideos>>>()?;

    // buffer_unordered loses ordering; restore newest first
    hydrated.sort_by(|a, b| b.playlist.created_at.cmp(&a.playlist.created_at));

    Ok(ApiResponse::ok(hydrated, "Playlists fetched successfully"))
}

/// A single playlist with video details.
async fn get_playlist(
    State(state): State<Arc<AppState>>,
    Path(playlist_id): Path<String>,
) -> Result<ApiResponse<PlaylistWithVideos>> {
    let playlist = state
        .db
        .get_playlist(&playlist_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Playlist {} not found", playlist_id)))?;

    let hydrated = hydrate_playlist(&state, playlist).await?;

    Ok(ApiResponse::ok(hydrated, "Playlist fetched successfully"))
}

/// Load a playlist and check the caller owns it (before any mutation).
async fn owned_playlist(state: &AppState, playlist_id: &str, caller_id: &str) -> Result<Playlist> {
    let playlist = state
        .db
        .get_playlist(playlist_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Playlist {} not found", playlist_id)))?;

    if playlist.owner != caller_id {
        return Err(AppError::Forbidden(
            "You are not allowed to modify this playlist".to_string(),
        ));
    }

    Ok(playlist)
}

/// Add a video to a playlist (owner only, duplicates rejected).
async fn add_video_to_playlist(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path((video_id, playlist_id)): Path<(String, String)>,
) -> Result<ApiResponse<Playlist>> {
    let mut playlist = owned_playlist(&state, &playlist_id, &caller.id).await?;

    state
        .db
        .get_video(&video_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Video {} not found", video_id)))?;

    if playlist.videos.iter().any(|id| id == &video_id) {
        return Err(AppError::Conflict(
            "This video is already in the playlist".to_string(),
        ));
    }

    playlist.videos.push(video_id);
    playlist.updated_at = chrono::Utc::now().to_rfc3339();
    state.db.upsert_playlist(&playlist).await?;

    Ok(ApiResponse::ok(
        playlist,
        "Video added to playlist successfully",
    ))
}

/// Remove a video from a playlist (owner only).
async fn remove_video_from_playlist(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path((video_id, playlist_id)): Path<(String, String)>,
) -> Result<ApiResponse<Playlist>> {
    let mut playlist = owned_playlist(&state, &playlist_id, &caller.id).await?;

    playlist.videos.retain(|id| id != &video_id);
    playlist.updated_at = chrono::Utc::now().to_rfc3339();
    state.db.upsert_playlist(&playlist).await?;

    Ok(ApiResponse::ok(
        playlist,
        "Video removed from playlist successfully",
    ))
}

/// Rename a playlist or change its description (owner only).
async fn update_playlist(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(playlist_id): Path<String>,
    Json(input): Json<PlaylistInput>,
) -> Result<ApiResponse<Playlist>> {
    validate_input(&input)?;

    let mut playlist = owned_playlist(&state, &playlist_id, &caller.id).await?;

    playlist.name = input.name;
    playlist.description = input.description;
    playlist.updated_at = chrono::Utc::now().to_rfc3339();
    state.db.upsert_playlist(&playlist).await?;

    Ok(ApiResponse::ok(playlist, "Playlist updated successfully"))
}

/// Delete a playlist (owner only, checked before the delete).
async fn delete_playlist(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(playlist_id): Path<String>,
) -> Result<ApiResponse<Playlist>> {
    let playlist = owned_playlist(&state, &playlist_id, &caller.id).await?;

    state.db.delete_playlist(&playlist_id).await?;

    Ok(ApiResponse::ok(playlist, "Playlist deleted successfully"))
}
