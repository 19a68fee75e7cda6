//! Auth error types.

/// Errors that can occur during session operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Required configuration is missing or empty.
    #[error("session manager not initialized: missing {0}")]
    NotInitialized(&'static str),

    /// An authenticated call was attempted without a valid token record.
    #[error("no valid session")]
    NoValidSession,

    /// The token endpoint rejected a code exchange or refresh.
    #[error("token endpoint error ({status}): {message}")]
    ProviderExchangeFailed {
        /// HTTP status code returned by the token endpoint.
        status: u16,
        /// Response body (or error description).
        message: String,
    },

    /// The id token's claims segment could not be decoded.
    #[error("failed to decode id token claims: {0}")]
    ClaimDecodeFailed(String),

    /// Transport-level failure on an outbound call.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Token store I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
