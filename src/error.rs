/// Canonical error type used across all modules.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Missing API key: {0}")]
    MissingCredentials(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Upstream error: status={status}, message={message}")]
    Upstream { status: u16, message: String },
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Decode error: {0}")]
    Decode(String),
}

impl RelayError {
    /// HTTP status the relay reports for this error.
    ///
    /// Bad input is the caller's fault (400); an unresolved vendor key is the
    /// operator's misconfiguration (500); everything that went wrong on the
    /// far side of the outbound call is a bad gateway (502).
    #[must_use]
    pub fn status(&self) -> http::StatusCode {
        match self {
            RelayError::InvalidRequest(_) => http::StatusCode::BAD_REQUEST,
            RelayError::Config(_) | RelayError::MissingCredentials(_) => {
                http::StatusCode::INTERNAL_SERVER_ERROR
            }
            RelayError::Upstream { .. } | RelayError::Transport(_) | RelayError::Decode(_) => {
                http::StatusCode::BAD_GATEWAY
            }
        }
    }
}

/// Format an error into the wire shape, returning (`status_code`, JSON body).
///
/// Every failure leaves the relay as `{"error": "<message>"}`.
#[must_use]
pub fn format_error(err: &RelayError) -> (http::StatusCode, serde_json::Value) {
    (err.status(), serde_json::json!({ "error": err.to_string() }))
}

impl axum::response::IntoResponse for RelayError {
    fn into_response(self) -> axum::response::Response {
        use axum::response::IntoResponse;
        let (status, body) = format_error(&self);
        (status, axum::Json(body)).into_response()
    }
}

const UPSTREAM_ERROR_SNIPPET_MAX_CHARS: usize = 600;

/// Reduce an upstream error body to a bounded, printable snippet safe to embed
/// in the relay's own error message.
#[must_use]
pub fn sanitize_upstream_error(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return "(empty upstream error body)".to_string();
    }

    let mut snippet = String::with_capacity(trimmed.len().min(UPSTREAM_ERROR_SNIPPET_MAX_CHARS));
    for (taken, ch) in trimmed.chars().enumerate() {
        if taken >= UPSTREAM_ERROR_SNIPPET_MAX_CHARS {
            snippet.push_str("...");
            break;
        }
        snippet.push(if ch.is_control() { ' ' } else { ch });
    }
    snippet
}
