// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod comment;
pub mod like;
pub mod playlist;
pub mod subscription;
pub mod tweet;
pub mod user;
pub mod video;

pub use comment::Comment;
pub use like::{Like, LikeTarget};
pub use playlist::{Playlist, PlaylistWithVideos};
pub use subscription::Subscription;
pub use tweet::Tweet;
pub use user::{ChannelSummary, PublicUser, User};
pub use video::{Video, VideoWithOwner};
