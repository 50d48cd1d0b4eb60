//! Upstream service errors

/// Failure of a captioning or embedding call.
///
/// Callers treat every variant as "this item or query has no semantic data"
/// and pick their own fallback.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("Circuit breaker is open: {0}")]
    CircuitOpen(&'static str),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Upstream returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Input text is empty")]
    EmptyInput,
}

impl UpstreamError {
    /// Short label used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CircuitOpen(_) => "circuit_open",
            Self::RequestFailed(_) => "request_failed",
            Self::Timeout(_) => "timeout",
            Self::Status { .. } => "status",
            Self::InvalidResponse(_) => "invalid_response",
            Self::EmptyInput => "empty_input",
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if e.is_decode() {
            Self::InvalidResponse(e.to_string())
        } else {
            Self::RequestFailed(e.to_string())
        }
    }
}
