use thiserror::Error;

/// Top-level error type for the `plusctl-api` crate.
///
/// Covers every failure mode across the client: authentication, transport,
/// model detection, token storage, and operation misuse. Callers that only
/// care about the broad category can branch on [`Error::kind`].
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login handshake failed (missing seed, rejected submission, etc.)
    #[error("authentication failed: {message}")]
    Authentication { message: String },

    /// The switch accepted the request but issued no session token.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// An authenticated call was made on a client holding no credential.
    #[error("not authenticated -- log in first")]
    NotAuthenticated,

    /// The device-side session has expired; the stored token is dead.
    #[error("session expired -- log in again")]
    SessionExpired,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Model detection ─────────────────────────────────────────────
    /// No model name or login-redirect marker in any probed page.
    #[error("could not detect switch model")]
    ModelNotDetected,

    /// A model name was found but this crate does not support it.
    #[error("unsupported switch model '{model}'")]
    UnsupportedModel { model: String },

    // ── Token store ─────────────────────────────────────────────────
    /// No stored credential for the address.
    #[error("no stored token for {address}")]
    TokenNotFound { address: String },

    /// The token file exists but is empty -- written by an older layout.
    /// A fresh login replaces it.
    #[error("token file for {address} is empty -- log in again to refresh it")]
    StaleToken { address: String },

    /// The token file contents don't parse as `model:token`.
    #[error("token file for {address} is malformed")]
    CorruptToken { address: String },

    /// Token store I/O failure other than a missing entry.
    #[error("token store: {message}")]
    Store {
        message: String,
        #[source]
        source: std::io::Error,
    },

    // ── Operations ──────────────────────────────────────────────────
    /// API misuse or a device-reported operation failure.
    #[error("operation failed: {message}")]
    Operation { message: String },
}

/// Broad error category, mirroring the remedies a caller has available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad credentials, missing seed, stale session -- re-login territory.
    Authentication,
    /// Connection, DNS, or timeout failure -- check the address/network.
    Network,
    /// Stored or received data didn't parse.
    Parsing,
    /// The device model could not be detected or isn't supported.
    Model,
    /// API misuse or a rejected device operation.
    Operation,
}

impl Error {
    /// The broad category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Authentication { .. }
            | Self::InvalidCredentials
            | Self::NotAuthenticated
            | Self::SessionExpired
            | Self::TokenNotFound { .. }
            | Self::StaleToken { .. } => ErrorKind::Authentication,
            Self::Transport(_) | Self::InvalidUrl(_) => ErrorKind::Network,
            Self::CorruptToken { .. } => ErrorKind::Parsing,
            Self::ModelNotDetected | Self::UnsupportedModel { .. } => ErrorKind::Model,
            Self::Store { .. } | Self::Operation { .. } => ErrorKind::Operation,
        }
    }

    /// Returns `true` if re-authenticating might resolve this error.
    pub fn is_auth_error(&self) -> bool {
        self.kind() == ErrorKind::Authentication
    }

    /// Returns `true` if this is a connectivity failure rather than a
    /// protocol-level rejection.
    pub fn is_network_error(&self) -> bool {
        self.kind() == ErrorKind::Network
    }

    /// Returns `true` if this is the stored-token miss (as opposed to a
    /// stale or corrupt entry).
    pub fn is_token_not_found(&self) -> bool {
        matches!(self, Self::TokenNotFound { .. })
    }

    pub(crate) fn auth(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    pub(crate) fn operation(message: impl Into<String>) -> Self {
        Self::Operation {
            message: message.into(),
        }
    }
}
