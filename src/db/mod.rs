//! Database layer (Firestore).

pub mod firestore;

pub use firestore::{FirestoreDb, VideoListQuery};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const VIDEOS: &str = "videos";
    pub const COMMENTS: &str = "comments";
    pub const LIKES: &str = "likes";
    pub const SUBSCRIPTIONS: &str = "subscriptions";
    pub const TWEETS: &str = "tweets";
    pub const PLAYLISTS: &str = "playlists";
}
