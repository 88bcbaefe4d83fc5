// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User account and session routes.
//!
//! Login issues an access/refresh token pair; the refresh token's
//! current value is mirrored on the user document so logout (or any
//! rotation) revokes outstanding refresh tokens server-side. Tokens
//! are delivered both in the response body and as HttpOnly cookies.

use axum::{
    extract::{Multipart, Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand_core::OsRng;

use crate::error::{AppError, FieldError, Result};
use crate::middleware::auth::{CurrentUser, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use crate::models::{ChannelSummary, PublicUser, User, VideoWithOwner};
use crate::response::ApiResponse;
use crate::routes::upload::{read_text, read_upload, UploadedFile};
use crate::services::{MediaAsset, TokenPair};
use crate::AppState;

pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/user/register", post(register))
        .route("/user/login", post(login))
        .route("/user/regenerate-token", post(regenerate_token))
}

pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/user/logout", post(logout))
        .route("/user/change-password", post(change_password))
        .route("/user/current-user", get(current_user))
        .route("/user/channel/{username}", get(channel_profile))
        .route("/user/watch-history", get(watch_history))
}

// ─── Password Hashing ────────────────────────────────────────

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {}", e)))
}

fn verify_password(password: &str, stored_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Stored password hash invalid: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

// ─── Token Issuance ──────────────────────────────────────────

/// Issue a fresh token pair and persist the refresh value, replacing
/// (and thereby revoking) any prior refresh token for the user.
async fn issue_tokens(state: &AppState, user: &User) -> Result<TokenPair> {
    let pair = state.tokens.issue_pair(&user.id)?;
    state
        .db
        .set_refresh_token(&user.id, &pair.refresh_token)
        .await?;
    Ok(pair)
}

// ─── Cookies ─────────────────────────────────────────────────

fn session_cookie(name: &'static str, value: String, max_age_secs: i64, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::seconds(max_age_secs))
        .build()
}

fn add_session_cookies(jar: CookieJar, pair: &TokenPair, state: &AppState) -> CookieJar {
    jar.add(session_cookie(
        ACCESS_TOKEN_COOKIE,
        pair.access_token.clone(),
        state.tokens.access_ttl_secs(),
        state.config.secure_cookies,
    ))
    .add(session_cookie(
        REFRESH_TOKEN_COOKIE,
        pair.refresh_token.clone(),
        state.tokens.refresh_ttl_secs(),
        state.config.secure_cookies,
    ))
}

fn remove_session_cookies(jar: CookieJar, state: &AppState) -> CookieJar {
    jar.add(session_cookie(
        ACCESS_TOKEN_COOKIE,
        String::new(),
        0,
        state.config.secure_cookies,
    ))
    .add(session_cookie(
        REFRESH_TOKEN_COOKIE,
        String::new(),
        0,
        state.config.secure_cookies,
    ))
}

// ─── Registration ────────────────────────────────────────────

#[derive(Debug, Validate)]
struct RegisterInput {
    #[validate(length(min = 3, message = "Username must be at least 3 characters"))]
    username: String,
    #[validate(email(message = "Invalid email address"))]
    email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    password: String,
    #[validate(length(min = 3, message = "Full name must be at least 3 characters"))]
    full_name: String,
}

#[derive(Default)]
struct RegisterForm {
    username: String,
    email: String,
    password: String,
    full_name: String,
    avatar: Option<UploadedFile>,
    banner: Option<UploadedFile>,
}

async fn read_register_form(multipart: &mut Multipart) -> Result<RegisterForm> {
    let mut form = RegisterForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart request: {}", e)))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match name.as_str() {
            "username" => form.username = read_text(field).await?,
            "email" => form.email = read_text(field).await?,
            "password" => form.password = read_text(field).await?,
            "fullname" => form.full_name = read_text(field).await?,
            "avatar" => form.avatar = Some(read_upload(field).await?),
            "banner" => form.banner = Some(read_upload(field).await?),
            _ => {}
        }
    }

    Ok(form)
}

/// Best-effort deletion of already-uploaded assets after a later step
/// failed (cleanup-then-rethrow; cleanup failures are only logged).
async fn cleanup_assets(state: &AppState, assets: &[&MediaAsset]) {
    for asset in assets {
        if let Err(e) = state.media.delete(&asset.asset_id).await {
            tracing::warn!(asset_id = %asset.asset_id, error = %e, "Failed to clean up media asset");
        }
    }
}

/// Register a new user.
///
/// Multipart form: `username`, `email`, `password`, `fullname` text
/// fields plus `avatar` and `banner` files. Input shape is validated
/// before anything is persisted or uploaded.
async fn register(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<ApiResponse<PublicUser>> {
    let form = read_register_form(&mut multipart).await?;

    let input = RegisterInput {
        username: form.username,
        email: form.email,
        password: form.password,
        full_name: form.full_name,
    };
    input.validate()?;

    let (avatar, banner) = match (form.avatar, form.banner) {
        (Some(avatar), Some(banner)) => (avatar, banner),
        (avatar, banner) => {
            let mut missing = Vec::new();
            if avatar.is_none() {
                missing.push(FieldError {
                    field: "avatar".to_string(),
                    message: "Avatar image is required".to_string(),
                });
            }
            if banner.is_none() {
                missing.push(FieldError {
                    field: "banner".to_string(),
                    message: "Banner image is required".to_string(),
                });
            }
            return Err(AppError::Validation(missing));
        }
    };

    // Uniqueness before any external upload
    if state
        .db
        .identifier_taken(&input.username, &input.email)
        .await?
    {
        return Err(AppError::Conflict("User already exists".to_string()));
    }

    let password_hash = hash_password(&input.password)?;

    let avatar_asset = state
        .media
        .upload("avatars", &avatar.filename, &avatar.content_type, avatar.bytes)
        .await?;

    let banner_asset = match state
        .media
        .upload("banners", &banner.filename, &banner.content_type, banner.bytes)
        .await
    {
        Ok(asset) => asset,
        Err(err) => {
            cleanup_assets(&state, &[&avatar_asset]).await;
            return Err(err);
        }
    };

    let now = chrono::Utc::now().to_rfc3339();
    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        username: input.username,
        email: input.email,
        password_hash,
        full_name: input.full_name,
        avatar_url: avatar_asset.url.clone(),
        banner_url: banner_asset.url.clone(),
        refresh_token: String::new(),
        watch_history: Vec::new(),
        created_at: now.clone(),
        updated_at: now,
    };

    if let Err(err) = state.db.upsert_user(&user).await {
        // Uploads succeeded but the record could not be created
        cleanup_assets(&state, &[&avatar_asset, &banner_asset]).await;
        return Err(err);
    }

    tracing::info!(user_id = %user.id, username = %user.username, "User registered");

    Ok(ApiResponse::created(
        PublicUser::from(&user),
        "User created successfully",
    ))
}

// ─── Login / Logout / Refresh ────────────────────────────────

#[derive(Debug, Deserialize)]
struct LoginInput {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    email: Option<String>,
    password: String,
}

/// Session payload returned by login and refresh.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionData {
    user: PublicUser,
    access_token: String,
    refresh_token: String,
}

/// Log in with username or email plus password.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(input): Json<LoginInput>,
) -> Result<(CookieJar, ApiResponse<SessionData>)> {
    let identifier = input
        .email
        .as_deref()
        .or(input.username.as_deref())
        .ok_or_else(|| AppError::BadRequest("Username or email is required".to_string()))?;

    let user = state
        .db
        .find_user_by_identifier(identifier)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if !verify_password(&input.password, &user.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }

    let pair = issue_tokens(&state, &user).await?;
    let jar = add_session_cookies(jar, &pair, &state);

    tracing::info!(user_id = %user.id, "User logged in");

    Ok((
        jar,
        ApiResponse::ok(
            SessionData {
                user: PublicUser::from(&user),
                access_token: pair.access_token,
                refresh_token: pair.refresh_token,
            },
            "Login successful",
        ),
    ))
}

/// Log out: clear the stored refresh token and both cookies.
///
/// Idempotent — logging out twice is not an error.
async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    jar: CookieJar,
) -> Result<(CookieJar, ApiResponse<serde_json::Value>)> {
    state.db.set_refresh_token(&user.id, "").await?;
    let jar = remove_session_cookies(jar, &state);

    tracing::info!(user_id = %user.id, "User logged out");

    Ok((jar, ApiResponse::ok(serde_json::json!({}), "User logged out")))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshInput {
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Rotate the session: a valid refresh token yields a fresh pair.
///
/// The presented token must verify cryptographically AND equal the
/// value stored on the user record. Rotation replaces the stored
/// value, so replaying an already-rotated token fails the equality
/// check even before it expires.
///
/// The body is read as raw bytes because it is optional: the token
/// usually arrives as a cookie and the body may be absent entirely.
async fn regenerate_token(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    body: axum::body::Bytes,
) -> Result<(CookieJar, ApiResponse<SessionData>)> {
    let presented = jar
        .get(REFRESH_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .or_else(|| {
            serde_json::from_slice::<RefreshInput>(&body)
                .ok()
                .and_then(|b| b.refresh_token)
        })
        .ok_or(AppError::Unauthenticated)?;

    let user_id = state.tokens.verify_refresh(&presented)?;

    let user = state
        .db
        .get_user(&user_id)
        .await?
        .ok_or(AppError::Unauthenticated)?;

    if user.refresh_token != presented {
        return Err(AppError::Unauthenticated);
    }

    let pair = issue_tokens(&state, &user).await?;
    let jar = add_session_cookies(jar, &pair, &state);

    tracing::debug!(user_id = %user.id, "Session tokens rotated");

    Ok((
        jar,
        ApiResponse::ok(
            SessionData {
                user: PublicUser::from(&user),
                access_token: pair.access_token,
                refresh_token: pair.refresh_token,
            },
            "Tokens regenerated",
        ),
    ))
}

// ─── Password Change ─────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordInput {
    old_password: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    new_password: String,
}

/// Change password; requires proof of the current one.
async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(identity)): Extension<CurrentUser>,
    Json(input): Json<ChangePasswordInput>,
) -> Result<ApiResponse<serde_json::Value>> {
    input.validate()?;

    let mut user = state
        .db
        .get_user(&identity.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if !verify_password(&input.old_password, &user.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }

    user.password_hash = hash_password(&input.new_password)?;
    user.updated_at = chrono::Utc::now().to_rfc3339();
    state.db.upsert_user(&user).await?;

    tracing::info!(user_id = %user.id, "Password changed");

    Ok(ApiResponse::ok(
        serde_json::json!({}),
        "Password changed successfully",
    ))
}

// ─── Profile Reads ───────────────────────────────────────────

/// Current authenticated user.
async fn current_user(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<ApiResponse<PublicUser>> {
    Ok(ApiResponse::ok(user, "Current user fetched successfully"))
}

/// Channel profile with subscription counts.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChannelProfile {
    #[serde(flatten)]
    user: PublicUser,
    subscriber_count: u64,
    subscribed_to_count: u64,
    is_subscribed: bool,
}

async fn channel_profile(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(username): Path<String>,
) -> Result<ApiResponse<ChannelProfile>> {
    let channel = state
        .db
        .get_user_by_username(&username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Channel {} not found", username)))?;

    let subscriber_count = state.db.count_subscribers(&channel.id).await?;
    let subscribed_to_count = state.db.count_subscriptions(&channel.id).await?;
    let is_subscribed = state
        .db
        .get_subscription(&caller.id, &channel.id)
        .await?
        .is_some();

    Ok(ApiResponse::ok(
        ChannelProfile {
            user: PublicUser::from(&channel),
            subscriber_count,
            subscribed_to_count,
            is_subscribed,
        },
        "Channel profile fetched successfully",
    ))
}

/// The caller's watch history, newest first, with owner details.
async fn watch_history(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(identity)): Extension<CurrentUser>,
) -> Result<ApiResponse<Vec<VideoWithOwner>>> {
    let user = state
        .db
        .get_user(&identity.id)
        .await?
        .ok_or(AppError::Unauthenticated)?;

    let videos = state.db.get_videos_by_ids(&user.watch_history).await?;
    let owner_ids: Vec<String> = videos.values().map(|v| v.owner.clone()).collect();
    let owners = state.db.get_users_by_ids(&owner_ids).await?;

    let history: Vec<VideoWithOwner> = user
        .watch_history
        .iter()
        .rev()
        .filter_map(|id| videos.get(id))
        .filter_map(|video| {
            owners.get(&video.owner).map(|owner| VideoWithOwner {
                video: video.clone(),
                owner_details: ChannelSummary::from(owner),
            })
        })
        .collect();

    Ok(ApiResponse::ok(
        history,
        "Watch history fetched successfully",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie(ACCESS_TOKEN_COOKIE, "token".to_string(), 3600, false);
        let rendered = cookie.to_string();

        assert!(rendered.starts_with("accessToken=token"));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("SameSite=Lax"));
        assert!(rendered.contains("Path=/"));
        assert!(rendered.contains("Max-Age=3600"));
        assert!(!rendered.contains("Secure"));
    }

    #[test]
    fn test_session_cookie_secure_in_production() {
        let cookie = session_cookie(REFRESH_TOKEN_COOKIE, "token".to_string(), 864000, true);
        let rendered = cookie.to_string();

        assert!(rendered.contains("Secure"));
        assert!(rendered.contains("HttpOnly"));
    }

    #[test]
    fn test_removal_cookie_attributes() {
        // Removal uses the same attributes with Max-Age=0
        let cookie = session_cookie(ACCESS_TOKEN_COOKIE, String::new(), 0, false);
        let rendered = cookie.to_string();

        assert!(rendered.contains("Max-Age=0"));
        assert!(rendered.contains("Path=/"));
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("secret1").unwrap();
        assert!(verify_password("secret1", &hash).unwrap());
        assert!(!verify_password("wrong_password", &hash).unwrap());
    }
}
