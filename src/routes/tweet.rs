// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tweet routes (short text posts on a channel).

use axum::{
    extract::{Path, State},
    routing::{get, patch, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::{AppError, FieldError, Result};
use crate::middleware::auth::CurrentUser;
use crate::models::Tweet;
use crate::response::ApiResponse;
use crate::AppState;

const MAX_TWEET_LENGTH: usize = 280;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_tweet))
        .route("/user/{userId}", get(get_user_tweets))
        .route("/{tweetId}", patch(update_tweet).delete(delete_tweet))
}

fn validate_content(content: &str) -> Result<()> {
    if content.trim().is_empty() {
        return Err(AppError::Validation(vec![FieldError {
            field: "content".to_string(),
            message: "Content is required".to_string(),
        }]));
    }
    if content.chars().count() > MAX_TWEET_LENGTH {
        return Err(AppError::Validation(vec![FieldError {
            field: "content".to_string(),
            message: format!("Tweet exceeds {} character limit", MAX_TWEET_LENGTH),
        }]));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct TweetInput {
    content: String,
}

/// Create a tweet on the caller's channel.
async fn create_tweet(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Json(input): Json<TweetInput>,
) -> Result<ApiResponse<Tweet>> {
    validate_content(&input.content)?;

    let now = chrono::Utc::now().to_rfc3339();
    let tweet = Tweet {
        id: uuid::Uuid::new_v4().to_string(),
        owner: caller.id,
        content: input.content,
        created_at: now.clone(),
        updated_at: now,
    };
    state.db.upsert_tweet(&tweet).await?;

    Ok(ApiResponse::created(tweet, "Tweet created successfully"))
}

/// A user's tweets, newest first.
async fn get_user_tweets(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<ApiResponse<Vec<Tweet>>> {
    state
        .db
        .get_user(&user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

    let tweets = state.db.list_tweets_for_user(&user_id).await?;

    Ok(ApiResponse::ok(tweets, "Tweets fetched successfully"))
}

/// Update a tweet (owner only, checked before the write).
async fn update_tweet(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(tweet_id): Path<String>,
    Json(input): Json<TweetInput>,
) -> Result<ApiResponse<Tweet>> {
    validate_content(&input.content)?;

    let mut tweet = state
        .db
        .get_tweet(&tweet_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Tweet {} not found", tweet_id)))?;

    if tweet.owner != caller.id {
        return Err(AppError::Forbidden(
            "You are not allowed to update this tweet".to_string(),
        ));
    }

    tweet.content = input.content;
    tweet.updated_at = chrono::Utc::now().to_rfc3339();
    state.db.upsert_tweet(&tweet).await?;

    Ok(ApiResponse::ok(tweet, "Tweet updated successfully"))
}

/// Delete a tweet (owner only, checked before the delete).
async fn delete_tweet(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(tweet_id): Path<String>,
) -> Result<ApiResponse<Tweet>> {
    let tweet = state
        .db
        .get_tweet(&tweet_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Tweet {} not found", tweet_id)))?;

    if tweet.owner != caller.id {
        return Err(AppError::Forbidden(
            "You are not allowed to delete this tweet".to_string(),
        ));
    }

    state.db.delete_tweet(&tweet_id).await?;

    Ok(ApiResponse::ok(tweet, "Tweet deleted successfully"))
}
