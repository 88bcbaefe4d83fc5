//! Tweet model: short text posts on a channel.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tweet {
    pub id: String,
    /// Authoring user ID
    pub owner: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}
