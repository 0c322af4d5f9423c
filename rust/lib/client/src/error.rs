/// Reason shown when nothing more specific is known.
pub const FALLBACK_REASON: &str = "Failed to fetch search results";

/// Client-side API error.
///
/// The variants follow the failure taxonomy the session surfaces to users:
/// credentials, transport, upstream, and local validation.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Token acquisition failed: credentials rejected or endpoint unreachable.
    #[error("auth: {0}")]
    Auth(String),

    /// The request never got a response.
    #[error("network: {0}")]
    Transport(#[from] reqwest::Error),

    /// Reachable, but answered with a non-success status.
    #[error("HTTP {status}: {}", message.as_deref().unwrap_or("no details"))]
    Upstream { status: u16, message: Option<String> },

    /// Reachable and successful, but the payload was not the expected shape.
    #[error("decode: {0}")]
    Decode(String),

    /// Query is missing a required field; never sent.
    #[error("{0} is required")]
    Validation(&'static str),

    /// Community name with characters outside `[A-Za-z0-9_]`; never sent.
    #[error("invalid community name '{0}'")]
    InvalidCommunity(String),

    /// Configured base URL cannot carry a path.
    #[error("invalid base url '{0}'")]
    BaseUrl(String),
}

impl ApiError {
    /// Single-line, user-facing reason, most specific first: the upstream's
    /// own message, then the transport message, then a generic fallback.
    pub fn reason(&self) -> String {
        let reason = match self {
            ApiError::Auth(msg) => format!("Failed to authenticate: {}", msg),
            ApiError::Transport(e) => e.to_string(),
            ApiError::Upstream { message: Some(msg), .. } if !msg.trim().is_empty() => msg.clone(),
            ApiError::Upstream { status, .. } => format!("{} (HTTP {})", FALLBACK_REASON, status),
            ApiError::Decode(msg) => format!("Malformed response: {}", msg),
            ApiError::Validation(field) => format!("{} is required", field),
            ApiError::InvalidCommunity(name) => format!("Invalid community name '{}'", name),
            ApiError::BaseUrl(url) => format!("Invalid base url '{}'", url),
        };
        single_line(&reason)
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Upstream { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

/// Pull a human-readable message out of an error body.
///
/// Accepts `{"message": "..."}` (upstream style) and `{"error": "..."}`
/// (relay style). Numeric `error` codes are ignored.
pub fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .filter_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty())
}

fn single_line(s: &str) -> String {
    let joined = s.split_whitespace().collect::<Vec<_>>().join(" ");
    if joined.is_empty() {
        FALLBACK_REASON.to_string()
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_message_wins() {
        let e = ApiError::Upstream { status: 403, message: Some("Forbidden".into()) };
        assert_eq!(e.reason(), "Forbidden");
        assert_eq!(e.status(), Some(403));
    }

    #[test]
    fn upstream_without_message_falls_back() {
        let e = ApiError::Upstream { status: 503, message: None };
        assert_eq!(e.reason(), "Failed to fetch search results (HTTP 503)");
        let blank = ApiError::Upstream { status: 500, message: Some("  ".into()) };
        assert_eq!(blank.reason(), "Failed to fetch search results (HTTP 500)");
    }

    #[test]
    fn reason_is_single_line() {
        let e = ApiError::Auth("token request failed (401):\n{\"message\": \"Unauthorized\"}".into());
        assert!(!e.reason().contains('\n'));
        assert!(e.reason().starts_with("Failed to authenticate"));
    }

    #[test]
    fn unauthorized_detection() {
        assert!(ApiError::Upstream { status: 401, message: None }.is_unauthorized());
        assert!(!ApiError::Upstream { status: 404, message: None }.is_unauthorized());
        assert!(!ApiError::Decode("x".into()).is_unauthorized());
    }

    #[test]
    fn invalid_community_reason_names_it() {
        let e = ApiError::InvalidCommunity("../api".into());
        assert_eq!(e.reason(), "Invalid community name '../api'");
        assert_eq!(e.status(), None);
    }

    #[test]
    fn extract_message_variants() {
        assert_eq!(extract_message(r#"{"message":"Forbidden","error":403}"#), Some("Forbidden".into()));
        assert_eq!(extract_message(r#"{"error":"Subreddit and keyword are required"}"#),
            Some("Subreddit and keyword are required".into()));
        assert_eq!(extract_message(r#"{"error":404}"#), None);
        assert_eq!(extract_message("<html>bad gateway</html>"), None);
        assert_eq!(extract_message(""), None);
    }
}
