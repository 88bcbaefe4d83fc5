//! Comment model.

use serde::{Deserialize, Serialize};

/// Comment on a video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    /// Video the comment belongs to
    pub video: String,
    /// Authoring user ID
    pub owner: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}
