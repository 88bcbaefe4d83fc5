// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT authentication middleware.

use crate::error::AppError;
use crate::models::PublicUser;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

/// Cookie holding the access token.
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
/// Cookie holding the refresh token.
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Authenticated identity attached to the request after verification.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub PublicUser);

/// Middleware that requires a valid access token.
///
/// The token comes from the `accessToken` cookie or the
/// `Authorization: Bearer` header; the cookie wins when both are
/// present. The embedded user ID must still resolve to an existing
/// user. Never mutates state.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Try cookie first, then header
    let token = if let Some(cookie) = jar.get(ACCESS_TOKEN_COOKIE) {
        cookie.value().to_string()
    } else {
        let auth_header = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        match auth_header {
            Some(h) if h.starts_with("Bearer ") => h[7..].to_string(),
            _ => return Err(AppError::Unauthenticated),
        }
    };

    let user_id = state.tokens.verify_access(&token)?;

    let user = state
        .db
        .get_user(&user_id)
        .await?
        .ok_or(AppError::Unauthenticated)?;

    request
        .extensions_mut()
        .insert(CurrentUser(PublicUser::from(&user)));

    Ok(next.run(request).await)
}
