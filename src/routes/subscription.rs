// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Subscription routes.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Router,
};
use serde::Serialize;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::auth::CurrentUser;
use crate::models::{ChannelSummary, Subscription};
use crate::response::ApiResponse;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/c/{channelId}",
            post(toggle_subscription).get(get_channel_subscribers),
        )
        .route("/u/{subscriberId}", get(get_subscribed_channels))
}

#[derive(Debug, Serialize)]
struct ToggleResult {
    subscribed: bool,
}

/// Subscribe to a channel, or unsubscribe if already subscribed.
async fn toggle_subscription(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(channel_id): Path<String>,
) -> Result<ApiResponse<ToggleResult>> {
    if channel_id == caller.id {
        return Err(AppError::BadRequest(
            "You cannot subscribe to your own channel".to_string(),
        ));
    }

    state
        .db
        .get_user(&channel_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Channel {} not found", channel_id)))?;

    if let Some(existing) = state.db.get_subscription(&caller.id, &channel_id).await? {
        state.db.delete_subscription(&existing.id).await?;
        return Ok(ApiResponse::ok(
            ToggleResult { subscribed: false },
            "Successfully unsubscribed",
        ));
    }

    let now = chrono::Utc::now().to_rfc3339();
    let subscription = Subscription::new(&caller.id, &channel_id, &now);
    state.db.upsert_subscription(&subscription).await?;

    Ok(ApiResponse::ok(
        ToggleResult { subscribed: true },
        "Successfully subscribed",
    ))
}

/// A subscription edge hydrated with the other party's details.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubscriptionEntry {
    id: String,
    created_at: String,
    user_details: ChannelSummary,
}

/// Hydrate subscription edges with user details; edges whose user
/// record is missing are skipped.
async fn hydrate_entries(
    state: &AppState,
    subscriptions: Vec<Subscription>,
    pick: fn(&Subscription) -> &String,
) -> Result<Vec<SubscriptionEntry>> {
    let user_ids: Vec<String> = subscriptions.iter().map(|s| pick(s).clone()).collect();
    let users = state.db.get_users_by_ids(&user_ids).await?;

    Ok(subscriptions
        .into_iter()
        .filter_map(|sub| {
            users.get(pick(&sub)).map(|user| SubscriptionEntry {
                id: sub.id.clone(),
                created_at: sub.created_at.clone(),
                user_details: ChannelSummary::from(user),
            })
        })
        .collect())
}

/// Subscribers of a channel, newest first.
async fn get_channel_subscribers(
    State(state): State<Arc<AppState>>,
    Path(channel_id): Path<String>,
) -> Result<ApiResponse<Vec<SubscriptionEntry>>> {
    state
        .db
        .get_user(&channel_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Channel {} not found", channel_id)))?;

    let subscriptions = state.db.list_channel_subscribers(&channel_id).await?;
    let subscribers = hydrate_entries(&state, subscriptions, |s| &s.subscriber).await?;

    Ok(ApiResponse::ok(
        subscribers,
        "Subscribers fetched successfully",
    ))
}

/// Channels a user subscribes to, newest first.
async fn get_subscribed_channels(
    State(state): State<Arc<AppState>>,
    Path(subscriber_id): Path<String>,
) -> Result<ApiResponse<Vec<SubscriptionEntry>>> {
    state
        .db
        .get_user(&subscriber_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", subscriber_id)))?;

    let subscriptions = state.db.list_subscribed_channels(&subscriber_id).await?;
    let channels = hydrate_entries(&state, subscriptions, |s| &s.channel).await?;

    Ok(ApiResponse::ok(channels, "Channels fetched successfully"))
}
