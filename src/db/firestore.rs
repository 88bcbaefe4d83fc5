// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for the platform collections:
//! users, videos, comments, likes, subscriptions, tweets, playlists.
//! Denormalized reads (owner details, watch history, channel stats)
//! are assembled here from per-collection queries.

use std::collections::HashMap;

use futures_util::{stream, StreamExt};

use crate::db::collections;
use crate::error::AppError;
use crate::models::{Comment, Like, LikeTarget, Playlist, Subscription, Tweet, User, Video};

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Filters for listing videos.
#[derive(Debug, Clone, Default)]
pub struct VideoListQuery {
    /// Restrict to a single owner (channel)
    pub owner: Option<String>,
    /// Only published videos
    pub published_only: bool,
    /// Title prefix search (Firestore range query on `title`)
    pub title_prefix: Option<String>,
    /// Strict upper bound on `created_at` (opaque cursor pagination)
    pub created_before: Option<String>,
    pub limit: u32,
    pub offset: u32,
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by document ID.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a user by unique username.
    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let username = username.to_string();
        let users: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.for_all([q.field("username").eq(username.clone())]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(users.into_iter().next())
    }

    /// Get a user by unique email.
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let email = email.to_string();
        let users: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.for_all([q.field("email").eq(email.clone())]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(users.into_iter().next())
    }

    /// Look up a user by username OR email (login identifier).
    pub async fn find_user_by_identifier(&self, identifier: &str) -> Result<Option<User>, AppError> {
        if let Some(user) = self.get_user_by_username(identifier).await? {
            return Ok(Some(user));
        }
        self.get_user_by_email(identifier).await
    }

    /// Check whether a username or email is already taken.
    pub async fn identifier_taken(&self, username: &str, email: &str) -> Result<bool, AppError> {
        if self.get_user_by_username(username).await?.is_some() {
            return Ok(true);
        }
        Ok(self.get_user_by_email(email).await?.is_some())
    }

    /// Create or update a user.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Replace the stored refresh-token value for a user.
    ///
    /// An empty value revokes all outstanding refresh tokens. A missing
    /// user record is a persistence error here, not an auth rejection:
    /// token issuance has already happened and the caller surfaces this
    /// as a transient failure.
    pub async fn set_refresh_token(&self, user_id: &str, value: &str) -> Result<(), AppError> {
        let mut user = self.get_user(user_id).await?.ok_or_else(|| {
            AppError::Database(format!("User {} missing during token persistence", user_id))
        })?;
        user.refresh_token = value.to_string();
        user.updated_at = chrono::Utc::now().to_rfc3339();
        self.upsert_user(&user).await
    }

    /// Record a view: bump the video counter and add the video to the
    /// viewer's watch history (idempotent on the history side).
    pub async fn record_view(&self, video_id: &str, viewer_id: &str) -> Result<(), AppError> {
        if let Some(mut video) = self.get_video(video_id).await? {
            video.views += 1;
            self.upsert_video(&video).await?;
        }

        if let Some(mut viewer) = self.get_user(viewer_id).await? {
            if !viewer.watch_history.iter().any(|id| id == video_id) {
                viewer.watch_history.push(video_id.to_string());
                viewer.updated_at = chrono::Utc::now().to_rfc3339();
                self.upsert_user(&viewer).await?;
            }
        }

        Ok(())
    }

    /// Fetch multiple users by ID, keyed by ID.
    pub async fn get_users_by_ids(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, User>, AppError> {
        let mut unique: Vec<String> = ids.to_vec();
        unique.sort();
        unique.dedup();

        let users = stream::iter(unique)
            .map(|id| async move { self.get_user(&id).await })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<Option<User>, AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<Option<User>>, AppError>>()?;

        Ok(users
            .into_iter()
            .flatten()
            .map(|u| (u.id.clone(), u))
            .collect())
    }

    // ─── Video Operations ────────────────────────────────────────

    /// Get a video by ID.
    pub async fn get_video(&self, video_id: &str) -> Result<Option<Video>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::VIDEOS)
            .obj()
            .one(video_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update a video.
    pub async fn upsert_video(&self, video: &Video) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::VIDEOS)
            .document_id(&video.id)
            .object(video)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a video document.
    pub async fn delete_video(&self, video_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::VIDEOS)
            .document_id(video_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// List videos with optional owner/published/title filters.
    ///
    /// Title search uses a Firestore range query on `title`, so results
    /// are ordered by title when a prefix is given; otherwise newest
    /// first. `created_before` is the opaque-cursor bound and only
    /// applies to the newest-first ordering.
    pub async fn list_videos(&self, query: &VideoListQuery) -> Result<Vec<Video>, AppError> {
        let owner = query.owner.clone();
        let published_only = query.published_only;
        let title_prefix = query.title_prefix.clone();
        let created_before = query.created_before.clone();
        let by_title = title_prefix.is_some();

        let select = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::VIDEOS)
            .filter(move |q| {
                let mut clauses = Vec::new();
                if let Some(owner) = &owner {
                    clauses.push(q.field("owner").eq(owner.clone()));
                }
                if published_only {
                    clauses.push(q.field("is_published").eq(true));
                }
                if let Some(prefix) = &title_prefix {
                    // Prefix range: [prefix, prefix + U+F8FF)
                    clauses.push(q.field("title").greater_than_or_equal(prefix.clone()));
                    clauses.push(q.field("title").less_than(format!("{}\u{f8ff}", prefix)));
                }
                if let Some(before) = &created_before {
                    clauses.push(q.field("created_at").less_than(before.clone()));
                }
                q.for_all(clauses)
            });

        let select = if by_title {
            select.order_by([("title", firestore::FirestoreQueryDirection::Ascending)])
        } else {
            select.order_by([("created_at", firestore::FirestoreQueryDirection::Descending)])
        };

        select
            .limit(query.limit)
            .offset(query.offset)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Fetch multiple videos by ID, keyed by ID.
    pub async fn get_videos_by_ids(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, Video>, AppError> {
        let mut unique: Vec<String> = ids.to_vec();
        unique.sort();
        unique.dedup();

        let videos = stream::iter(unique)
            .map(|id| async move { self.get_video(&id).await })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<Option<Video>, AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<Option<Video>>, AppError>>()?;

        Ok(videos
            .into_iter()
            .flatten()
            .map(|v| (v.id.clone(), v))
            .collect())
    }

    // ─── Comment Operations ──────────────────────────────────────

    /// Get a comment by ID.
    pub async fn get_comment(&self, comment_id: &str) -> Result<Option<Comment>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::COMMENTS)
            .obj()
            .one(comment_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update a comment.
    pub async fn upsert_comment(&self, comment: &Comment) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::COMMENTS)
            .document_id(&comment.id)
            .object(comment)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a comment.
    pub async fn delete_comment(&self, comment_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::COMMENTS)
            .document_id(comment_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// List a video's comments, newest first, with pagination.
    pub async fn list_comments_for_video(
        &self,
        video_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Comment>, AppError> {
        let video_id = video_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::COMMENTS)
            .filter(move |q| q.for_all([q.field("video").eq(video_id.clone())]))
            .order_by([("created_at", firestore::FirestoreQueryDirection::Descending)])
            .limit(limit)
            .offset(offset)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Like Operations ─────────────────────────────────────────

    /// Get a like by its (owner, target) pair, if present.
    pub async fn get_like(
        &self,
        owner: &str,
        target: LikeTarget,
        target_id: &str,
    ) -> Result<Option<Like>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::LIKES)
            .obj()
            .one(&Like::doc_id(owner, target, target_id))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store a like (document ID is the composite key).
    pub async fn upsert_like(&self, like: &Like) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::LIKES)
            .document_id(&like.id)
            .object(like)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a like by document ID.
    pub async fn delete_like(&self, like_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::LIKES)
            .document_id(like_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// All of a user's likes that point at videos, newest first.
    pub async fn list_video_likes_for_user(&self, owner: &str) -> Result<Vec<Like>, AppError> {
        let owner = owner.to_string();
        let likes: Vec<Like> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::LIKES)
            .filter(move |q| q.for_all([q.field("owner").eq(owner.clone())]))
            .order_by([("created_at", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(likes.into_iter().filter(|l| l.video.is_some()).collect())
    }

    /// Count likes on a single video.
    pub async fn count_likes_for_video(&self, video_id: &str) -> Result<u64, AppError> {
        let video_id = video_id.to_string();
        let likes: Vec<Like> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::LIKES)
            .filter(move |q| q.for_all([q.field("video").eq(video_id.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(likes.len() as u64)
    }

    /// Total likes across a set of videos (channel stats).
    ///
    /// Uses concurrent per-video counts with a limit to avoid
    /// overloading Firestore.
    pub async fn count_likes_for_videos(&self, video_ids: &[String]) -> Result<u64, AppError> {
        let counts = stream::iter(video_ids.to_vec())
            .map(|id| async move { self.count_likes_for_video(&id).await })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<u64, AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<u64>, AppError>>()?;
        Ok(counts.into_iter().sum())
    }

    // ─── Subscription Operations ─────────────────────────────────

    /// Get a subscription edge, if present.
    pub async fn get_subscription(
        &self,
        subscriber: &str,
        channel: &str,
    ) -> Result<Option<Subscription>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::SUBSCRIPTIONS)
            .obj()
            .one(&Subscription::doc_id(subscriber, channel))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store a subscription (document ID is the composite key).
    pub async fn upsert_subscription(&self, subscription: &Subscription) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::SUBSCRIPTIONS)
            .document_id(&subscription.id)
            .object(subscription)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a subscription by document ID.
    pub async fn delete_subscription(&self, subscription_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::SUBSCRIPTIONS)
            .document_id(subscription_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Subscriptions pointing at a channel, newest first.
    pub async fn list_channel_subscribers(
        &self,
        channel: &str,
    ) -> Result<Vec<Subscription>, AppError> {
        let channel = channel.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::SUBSCRIPTIONS)
            .filter(move |q| q.for_all([q.field("channel").eq(channel.clone())]))
            .order_by([("created_at", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Subscriptions made by a user, newest first.
    pub async fn list_subscribed_channels(
        &self,
        subscriber: &str,
    ) -> Result<Vec<Subscription>, AppError> {
        let subscriber = subscriber.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::SUBSCRIPTIONS)
            .filter(move |q| q.for_all([q.field("subscriber").eq(subscriber.clone())]))
            .order_by([("created_at", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Number of subscribers a channel has.
    pub async fn count_subscribers(&self, channel: &str) -> Result<u64, AppError> {
        Ok(self.list_channel_subscribers(channel).await?.len() as u64)
    }

    /// Number of channels a user subscribes to.
    pub async fn count_subscriptions(&self, subscriber: &str) -> Result<u64, AppError> {
        Ok(self.list_subscribed_channels(subscriber).await?.len() as u64)
    }

    // ─── Tweet Operations ────────────────────────────────────────

    /// Get a tweet by ID.
    pub async fn get_tweet(&self, tweet_id: &str) -> Result<Option<Tweet>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::TWEETS)
            .obj()
            .one(tweet_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update a tweet.
    pub async fn upsert_tweet(&self, tweet: &Tweet) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::TWEETS)
            .document_id(&tweet.id)
            .object(tweet)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a tweet.
    pub async fn delete_tweet(&self, tweet_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::TWEETS)
            .document_id(tweet_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// A user's tweets, newest first.
    pub async fn list_tweets_for_user(&self, owner: &str) -> Result<Vec<Tweet>, AppError> {
        let owner = owner.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::TWEETS)
            .filter(move |q| q.for_all([q.field("owner").eq(owner.clone())]))
            .order_by([("created_at", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Playlist Operations ─────────────────────────────────────

    /// Get a playlist by ID.
    pub async fn get_playlist(&self, playlist_id: &str) -> Result<Option<Playlist>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::PLAYLISTS)
            .obj()
            .one(playlist_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update a playlist.
    pub async fn upsert_playlist(&self, playlist: &Playlist) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::PLAYLISTS)
            .document_id(&playlist.id)
            .object(playlist)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a playlist.
    pub async fn delete_playlist(&self, playlist_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::PLAYLISTS)
            .document_id(playlist_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// A user's playlists, newest first.
    pub async fn list_playlists_for_user(&self, owner: &str) -> Result<Vec<Playlist>, AppError> {
        let owner = owner.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::PLAYLISTS)
            .filter(move |q| q.for_all([q.field("owner").eq(owner.clone())]))
            .order_by([("created_at", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
