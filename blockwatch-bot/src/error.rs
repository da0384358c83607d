use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde::Serialize;

/// API error response structure
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
  pub error: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub details: Option<String>,
}

impl ErrorResponse {
  pub fn new(error: impl Into<String>) -> Self {
    Self {
      error: error.into(),
      details: None,
    }
  }

  pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
    Self {
      error: error.into(),
      details: Some(details.into()),
    }
  }
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
  ServerNotTracked(String),
  InvalidServer(blockwatch_core::InvalidServerKey),
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    match self {
      AppError::ServerNotTracked(server) => {
        let error_response = ErrorResponse::with_details("Server is not tracked", server);
        (StatusCode::NOT_FOUND, Json(error_response)).into_response()
      }
      AppError::InvalidServer(err) => {
        tracing::warn!(validation_error = %err, "Validation failed");
        let error_response = ErrorResponse::new(err.to_string());
        (StatusCode::BAD_REQUEST, Json(error_response)).into_response()
      }
    }
  }
}

impl From<blockwatch_core::InvalidServerKey> for AppError {
  fn from(err: blockwatch_core::InvalidServerKey) -> Self {
    AppError::InvalidServer(err)
  }
}
