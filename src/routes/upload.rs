// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared multipart form helpers for upload-carrying routes.

use axum::extract::multipart::Field;

use crate::error::{AppError, Result};

/// A file part pulled out of a multipart form.
pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Read a file field into memory.
pub async fn read_upload(field: Field<'_>) -> Result<UploadedFile> {
    let filename = field.file_name().unwrap_or("upload").to_string();
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let bytes = field
        .bytes()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed upload: {}", e)))?
        .to_vec();
    Ok(UploadedFile {
        filename,
        content_type,
        bytes,
    })
}

/// Read a text field.
pub async fn read_text(field: Field<'_>) -> Result<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart request: {}", e)))
}
