use thiserror::Error;

/// Top-level error type for the `thingsboard-api` crate.
///
/// Everything except [`InvalidArgument`](Error::InvalidArgument) is a
/// remote-service failure: it carries the status, body, or underlying
/// network error so the caller can log and decide whether to abort or
/// degrade. Nothing here is fatal to the process.
#[derive(Debug, Error)]
pub enum Error {
    // ── Caller errors ───────────────────────────────────────────────
    /// Caller-supplied value outside its allowed domain. Raised before
    /// any I/O happens.
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    // ── Authentication ──────────────────────────────────────────────
    /// Login against `/api/auth/login` failed (wrong credentials,
    /// rejected request, or a response without a token).
    #[error("authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS configuration or client construction error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Transient failures persisted through every retry attempt.
    #[error("request failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        source: reqwest::Error,
    },

    // ── Remote API ──────────────────────────────────────────────────
    /// Well-formed error response from the platform. A 401 lands here
    /// only after the single token-refresh retry also came back 401.
    #[error("ThingsBoard API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the caller passed a value outside its domain.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }

    /// Returns `true` if this failure came back as unauthorized.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            Self::Authentication { .. } | Self::Api { status: 401, .. }
        )
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::RetriesExhausted { .. } => true,
            _ => false,
        }
    }
}
