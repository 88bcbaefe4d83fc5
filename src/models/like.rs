//! Like model: one document per (user, target) pair.

use serde::{Deserialize, Serialize};

/// The kind of entity a like points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeTarget {
    Video,
    Comment,
    Tweet,
}

impl LikeTarget {
    /// Firestore field name holding the target ID.
    pub fn field(self) -> &'static str {
        match self {
            LikeTarget::Video => "video",
            LikeTarget::Comment => "comment",
            LikeTarget::Tweet => "tweet",
        }
    }
}

/// A like on exactly one of a video, comment, or tweet.
///
/// The document ID is the composite `{owner}_{field}_{target_id}`, so
/// toggling is an existence check on a deterministic key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Like {
    pub id: String,
    pub owner: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tweet: Option<String>,
    pub created_at: String,
}

impl Like {
    /// Deterministic document ID for a (user, target) pair.
    pub fn doc_id(owner: &str, target: LikeTarget, target_id: &str) -> String {
        format!("{}_{}_{}", owner, target.field(), target_id)
    }

    /// Build a like for the given target.
    pub fn for_target(owner: &str, target: LikeTarget, target_id: &str, now: &str) -> Self {
        let mut like = Self {
            id: Self::doc_id(owner, target, target_id),
            owner: owner.to_string(),
            video: None,
            comment: None,
            tweet: None,
            created_at: now.to_string(),
        };
        match target {
            LikeTarget::Video => like.video = Some(target_id.to_string()),
            LikeTarget::Comment => like.comment = Some(target_id.to_string()),
            LikeTarget::Tweet => like.tweet = Some(target_id.to_string()),
        }
        like
    }
}
