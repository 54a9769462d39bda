//! Directions provider error types.

/// Errors from a directions provider.
///
/// Each failure mode is distinct so callers can choose between retrying,
/// falling back to a local estimate, or giving up.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DirectionsError {
    /// The provider rejected the coordinates (unroutable or out of coverage)
    #[error("invalid coordinates: {0}")]
    InvalidCoordinates(String),

    /// Request budget exhausted, locally or at the provider
    #[error("rate limited")]
    RateLimited,

    /// Timeout, connection failure or 5xx response
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The response could not be understood
    #[error("malformed response: {message}")]
    MalformedResponse {
        message: String,
        body: Option<String>,
    },

    /// Invalid API key or unauthorized
    #[error("unauthorized (invalid API key)")]
    Unauthorized,

    /// Any other client error (4xx)
    #[error("request rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },
}

impl DirectionsError {
    /// Returns true for transient server-side failures worth retrying.
    ///
    /// Client errors (bad coordinates, credentials, 4xx) and rate limiting
    /// are never retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DirectionsError::ProviderUnavailable(_))
    }

    /// Short machine-readable name, used in logs and provider reports.
    pub fn kind(&self) -> &'static str {
        match self {
            DirectionsError::InvalidCoordinates(_) => "invalid_coordinates",
            DirectionsError::RateLimited => "rate_limited",
            DirectionsError::ProviderUnavailable(_) => "provider_unavailable",
            DirectionsError::MalformedResponse { .. } => "malformed_response",
            DirectionsError::Unauthorized => "unauthorized",
            DirectionsError::Rejected { .. } => "rejected",
        }
    }
}

impl From<reqwest::Error> for DirectionsError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            DirectionsError::MalformedResponse {
                message: err.to_string(),
                body: None,
            }
        } else {
            // Timeouts, connection resets and DNS failures are all transient
            DirectionsError::ProviderUnavailable(err.to_string())
        }
    }
}
