//! Video model for storage and API.

use serde::{Deserialize, Serialize};

use crate::models::ChannelSummary;

/// Video document stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    /// Document ID (UUID v4)
    pub id: String,
    /// Owning user ID
    pub owner: String,
    /// Public URL of the video file
    pub video_url: String,
    /// Storage asset ID of the video file (for deletion)
    pub video_asset_id: String,
    /// Public URL of the thumbnail
    pub thumbnail_url: String,
    /// Storage asset ID of the thumbnail
    pub thumbnail_asset_id: String,
    pub title: String,
    pub description: String,
    /// Duration in seconds, as reported by the storage gateway
    pub duration_seconds: f64,
    #[serde(default)]
    pub views: u64,
    pub is_published: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Video hydrated with its owner's channel details.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoWithOwner {
    #[serde(flatten)]
    pub video: Video,
    pub owner_details: ChannelSummary,
}
