// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! VidTube: video-sharing platform backend.
//!
//! REST API over Firestore: accounts with token-based sessions,
//! video publishing, comments, likes, subscriptions, tweets, and
//! playlists.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod response;
pub mod routes;
pub mod services;

use config::Config;
use db::FirestoreDb;
use services::{MediaStorage, TokenService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub tokens: TokenService,
    pub media: MediaStorage,
}
