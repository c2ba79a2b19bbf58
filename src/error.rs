use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

/// Failures raised while serving a single request.
///
/// Every variant ends up as the same kind of response: a 500 carrying the
/// error message as plain text. Handlers just return `Err(..)`.
#[derive(Error, Debug)]
pub enum FileServerError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Path is outside root directory")]
    PathTraversal,

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("No file field named \"{0}\" in upload")]
    MissingUploadField(&'static str),

    #[error("Failed to render page: {0}")]
    Render(String),
}

impl IntoResponse for FileServerError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        error!("{}", message);
        (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
    }
}

/// Turns a handler panic into the same 500 response an error would produce.
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "handler panicked".to_string()
    };

    error!("handler panicked: {}", message);
    (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
}
