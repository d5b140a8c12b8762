//! Uniform JSON responses.
//!
//! Every dispatched route ends here: a gateway success becomes `200` with the
//! result as the whole body, and any gateway failure becomes `500` with
//! `{"error": "<message>"}`. No other status codes are produced.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::UpstreamError;

const FALLBACK_ERROR_MESSAGE: &str = "Upstream request failed";

/// How JSON bodies are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Two-space indented
    #[default]
    Pretty,
    Compact,
}

impl JsonFormat {
    /// Serialize `body` as an `application/json` response with `status`.
    pub fn render<T: Serialize + ?Sized>(self, status: StatusCode, body: &T) -> Response {
        let encoded = match self {
            JsonFormat::Pretty => serde_json::to_vec_pretty(body),
            JsonFormat::Compact => serde_json::to_vec(body),
        };

        match encoded {
            Ok(bytes) => json_response(status, bytes),
            Err(e) => {
                error!(error = %e, "Failed to serialize response body");
                let message = serde_json::Value::String(e.to_string());
                json_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("{{\"error\":{}}}", message).into_bytes(),
                )
            }
        }
    }
}

fn json_response(status: StatusCode, bytes: Vec<u8>) -> Response {
    (
        status,
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        )],
        bytes,
    )
        .into_response()
}

/// Body of every failed dispatched request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable failure description, never empty
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            Self {
                error: FALLBACK_ERROR_MESSAGE.to_string(),
            }
        } else {
            Self { error: message }
        }
    }
}

impl From<&UpstreamError> for ErrorResponse {
    fn from(err: &UpstreamError) -> Self {
        ErrorResponse::new(err.to_string())
    }
}

/// Turn a gateway outcome into the HTTP response.
pub fn normalize<T: Serialize>(outcome: Result<T, UpstreamError>, format: JsonFormat) -> Response {
    match outcome {
        Ok(value) => format.render(StatusCode::OK, &value),
        Err(err) => format.render(
            StatusCode::INTERNAL_SERVER_ERROR,
            &ErrorResponse::from(&err),
        ),
    }
}

impl IntoResponse for UpstreamError {
    fn into_response(self) -> Response {
        normalize::<()>(Err(self), JsonFormat::default())
    }
}
