//! Playlist model.

use serde::{Deserialize, Serialize};

use crate::models::Video;

/// Playlist of videos owned by a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub owner: String,
    pub name: String,
    pub description: String,
    /// Ordered video IDs
    #[serde(default)]
    pub videos: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Playlist hydrated with its videos' details.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistWithVideos {
    #[serde(flatten)]
    pub playlist: Playlist,
    pub video_details: Vec<Video>,
}
