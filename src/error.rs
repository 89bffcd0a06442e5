use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Failures of a translate call. Only the coarse `{code, message}` pair
/// reaches the client; the details stay in the server log.
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("no text")]
    NoText,

    #[error("invalid request body: {0}")]
    InvalidBody(String),

    #[error("invalid target language")]
    InvalidTargetLang,

    #[error("upstream responded 429 Too Many Requests")]
    TooManyRequests,

    #[error("rate limit exceeded")]
    RateLimitExceeded,

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("unexpected upstream response: {0}")]
    UpstreamInvalidResponse(String),

    #[error("failed to encode upstream payload: {0}")]
    Encode(#[from] serde_json::Error),
}

impl TranslateError {
    pub fn status(&self) -> StatusCode {
        match self {
            TranslateError::NoText => StatusCode::NOT_FOUND,
            TranslateError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            TranslateError::InvalidTargetLang => StatusCode::NOT_ACCEPTABLE,
            TranslateError::TooManyRequests | TranslateError::RateLimitExceeded => {
                StatusCode::TOO_MANY_REQUESTS
            }
            TranslateError::UpstreamUnavailable(_) | TranslateError::UpstreamInvalidResponse(_) => {
                StatusCode::BAD_GATEWAY
            }
            TranslateError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn public_message(&self) -> &'static str {
        match self {
            TranslateError::NoText => "No Translate Text Found",
            TranslateError::InvalidBody(_) => "Invalid Request Body",
            TranslateError::InvalidTargetLang => "Invalid targetLang",
            TranslateError::TooManyRequests => "Too Many Requests",
            TranslateError::RateLimitExceeded => "rate limit exceeded",
            TranslateError::UpstreamUnavailable(_) | TranslateError::UpstreamInvalidResponse(_) => {
                "Upstream Unavailable"
            }
            TranslateError::Encode(_) => "Internal Server Error",
        }
    }
}

impl IntoResponse for TranslateError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Translate request failed: {}", self);
        } else {
            warn!("Translate request rejected: {}", self);
        }

        let body = json!({
            "code": status.as_u16(),
            "message": self.public_message(),
        });
        (status, Json(body)).into_response()
    }
}
