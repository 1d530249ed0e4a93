use axum::{Json, extract::FromRequest};

use crate::error::ApiError;

/// `Json` whose rejections come back as `{"error": ...}` with status 400.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
