use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("Invalid upstream URL: {0}")]
    InvalidUpstream(String),

    #[error("Failed to read request body: {0}")]
    BodyRead(String),

    #[error("Failed to contact upstream: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::BodyRead(_) => StatusCode::BAD_REQUEST,
            ProxyError::Upstream(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ProxyError::InvalidUpstream(_) | ProxyError::IoError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Convert error to Anthropic-compatible error response
    pub fn to_anthropic_response(&self) -> Response {
        let status = self.status();
        let error_type = match status {
            StatusCode::BAD_REQUEST => "invalid_request_error",
            _ => "api_error",
        };

        (
            status,
            Json(json!({
                "type": "error",
                "error": {
                    "type": error_type,
                    "message": self.to_string()
                }
            })),
        )
            .into_response()
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        self.to_anthropic_response()
    }
}
