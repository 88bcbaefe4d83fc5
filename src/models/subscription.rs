//! Subscription model: a subscriber following a channel.

use serde::{Deserialize, Serialize};

/// Subscription edge between two users.
///
/// Document ID is `{subscriber}_{channel}` so toggling is an existence
/// check on a deterministic key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    /// User doing the subscribing
    pub subscriber: String,
    /// User (channel) being subscribed to
    pub channel: String,
    pub created_at: String,
}

impl Subscription {
    pub fn doc_id(subscriber: &str, channel: &str) -> String {
        format!("{}_{}", subscriber, channel)
    }

    pub fn new(subscriber: &str, channel: &str, now: &str) -> Self {
        Self {
            id: Self::doc_id(subscriber, channel),
            subscriber: subscriber.to_string(),
            channel: channel.to_string(),
            created_at: now.to_string(),
        }
    }
}
