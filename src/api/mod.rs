//! REST API module.
//!
//! Contains all API routes and handlers. Every handler answers with the
//! `{ success, data }` envelope or an [`AppError`].

mod registration;
mod schedule;
mod submissions;
mod teams;

pub use registration::*;
pub use schedule::*;
pub use submissions::*;
pub use teams::*;

use std::collections::HashMap;

use axum::{
    extract::Multipart,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::storage::UploadedFile;

/// Success response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(ApiResponse::new(data))
}

/// Text fields and files of a multipart body, keyed by field name.
#[derive(Debug, Default)]
struct MultipartForm {
    texts: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl MultipartForm {
    async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(|e| {
            AppError::BadRequest(format!("Failed to read multipart field: {}", e))
        })? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let bytes = field.bytes().await.map_err(|e| {
                        AppError::BadRequest(format!("Failed to read file '{}': {}", file_name, e))
                    })?;
                    // Browsers send an empty part when no file was chosen.
                    if file_name.is_empty() && bytes.is_empty() {
                        continue;
                    }
                    form.files.insert(
                        name,
                        UploadedFile::new(file_name, content_type, bytes.to_vec()),
                    );
                }
                None => {
                    let text = field.text().await.map_err(|e| {
                        AppError::BadRequest(format!("Failed to read field '{}': {}", name, e))
                    })?;
                    form.texts.insert(name, text);
                }
            }
        }

        Ok(form)
    }

    fn text(&self, name: &str) -> Option<&str> {
        self.texts.get(name).map(String::as_str)
    }

    fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }
}

/// Team and submission IDs arrive as typed text; surrounding whitespace is
/// ignored.
fn parse_id(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}
