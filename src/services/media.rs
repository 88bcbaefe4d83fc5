// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Media storage gateway client.
//!
//! User media (avatars, banners, video files, thumbnails) is uploaded
//! to an external storage gateway over HTTP; the gateway returns a
//! public URL and an asset ID used for later deletion. Video uploads
//! also report the clip duration.

use serde::Deserialize;

use crate::config::Config;
use crate::error::AppError;

/// A stored media asset as reported by the gateway.
#[derive(Debug, Clone)]
pub struct MediaAsset {
    /// Public URL serving the asset
    pub url: String,
    /// Gateway-assigned ID, needed to delete the asset
    pub asset_id: String,
    /// Duration in seconds (video uploads only)
    pub duration_seconds: Option<f64>,
}

/// Gateway upload response body.
#[derive(Deserialize)]
struct UploadResponse {
    url: String,
    asset_id: String,
    #[serde(default)]
    duration_seconds: Option<f64>,
}

#[derive(Clone)]
struct Gateway {
    base_url: String,
    api_key: String,
}

/// Media storage service.
#[derive(Clone)]
pub struct MediaStorage {
    http: reqwest::Client,
    gateway: Option<Gateway>,
}

impl MediaStorage {
    /// Create a new media storage client from configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            gateway: Some(Gateway {
                base_url: config.media_base_url.clone(),
                api_key: config.media_api_key.clone(),
            }),
        }
    }

    /// Create a mock client for testing (offline mode).
    ///
    /// Uploads return deterministic fake assets; deletes are no-ops.
    /// Only available in debug/test builds.
    #[cfg(debug_assertions)]
    pub fn new_mock() -> Self {
        Self {
            http: reqwest::Client::new(),
            gateway: None,
        }
    }

    /// Upload a file, returning the stored asset.
    pub async fn upload(
        &self,
        folder: &str,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<MediaAsset, AppError> {
        // Mock mode (debug builds only)
        #[cfg(debug_assertions)]
        {
            if self.gateway.is_none() {
                let asset_id = format!("{}/{}", folder, uuid::Uuid::new_v4());
                return Ok(MediaAsset {
                    url: format!("https://media.invalid/{}", asset_id),
                    asset_id,
                    duration_seconds: Some(0.0),
                });
            }
        }

        let gateway = self
            .gateway
            .as_ref()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Media gateway not configured")))?;

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(content_type)
            .map_err(|e| AppError::MediaStorage(format!("Invalid content type: {}", e)))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let url = format!(
            "{}/upload?folder={}",
            gateway.base_url,
            urlencoding::encode(folder)
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(&gateway.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::MediaStorage(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::MediaStorage(format!(
                "Upload failed with status {}",
                response.status()
            )));
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| AppError::MediaStorage(format!("Malformed upload response: {}", e)))?;

        tracing::debug!(folder, asset_id = %uploaded.asset_id, "Media uploaded");

        Ok(MediaAsset {
            url: uploaded.url,
            asset_id: uploaded.asset_id,
            duration_seconds: uploaded.duration_seconds,
        })
    }

    /// Delete a stored asset (compensating cleanup and video removal).
    pub async fn delete(&self, asset_id: &str) -> Result<(), AppError> {
        // Mock mode (debug builds only)
        #[cfg(debug_assertions)]
        {
            if self.gateway.is_none() {
                return Ok(());
            }
        }

        let gateway = self
            .gateway
            .as_ref()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Media gateway not configured")))?;

        let url = format!(
            "{}/assets/{}",
            gateway.base_url,
            urlencoding::encode(asset_id)
        );

        let response = self
            .http
            .delete(&url)
            .bearer_auth(&gateway.api_key)
            .send()
            .await
            .map_err(|e| AppError::MediaStorage(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::MediaStorage(format!(
                "Delete failed with status {}",
                response.status()
            )));
        }

        tracing::debug!(asset_id, "Media asset deleted");
        Ok(())
    }
}
