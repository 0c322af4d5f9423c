//! Relay error responses: `{"error": "<message>"}` with a matching status.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use subsearch_client::ApiError;

pub const AUTH_FAILED: &str = "Failed to authenticate with Reddit";
pub const MISSING_PARAMS: &str = "Subreddit and keyword are required";
pub const SEARCH_FAILED: &str = "Failed to fetch search results";
pub const ABOUT_FAILED: &str = "Failed to fetch subreddit information";
pub const MISSING_SUBREDDIT: &str = "Subreddit is required";
pub const MISSING_KEYWORD: &str = "Keyword is required";
pub const INVALID_SUBREDDIT: &str = "Invalid subreddit name";

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Failed to authenticate with Reddit")]
    Auth,

    #[error("{message}")]
    Upstream { status: StatusCode, message: String },
}

impl RelayError {
    /// Map a client failure. Upstream's own message wins; `fallback` covers
    /// everything that carried none.
    pub fn from_api(err: ApiError, fallback: &str) -> Self {
        match err {
            ApiError::Auth(_) => RelayError::Auth,
            ApiError::Validation(field) => RelayError::BadRequest(missing_field_message(field)),
            ApiError::InvalidCommunity(_) => RelayError::BadRequest(INVALID_SUBREDDIT.to_string()),
            ApiError::Upstream { status, message } => RelayError::Upstream {
                status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                message: message.unwrap_or_else(|| fallback.to_string()),
            },
            ApiError::Transport(_) | ApiError::Decode(_) | ApiError::BaseUrl(_) => RelayError::Upstream {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: fallback.to_string(),
            },
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            RelayError::Auth => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::Upstream { status, .. } => *status,
        }
    }
}

fn missing_field_message(field: &str) -> String {
    match field {
        "community" => MISSING_SUBREDDIT.to_string(),
        "keyword" => MISSING_KEYWORD.to_string(),
        other => format!("{} is required", other),
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.to_string() });
        (self.status(), axum::Json(body)).into_response()
    }
}
