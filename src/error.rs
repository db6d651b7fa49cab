//! Error types for SuperPool wallet authentication.

use std::time::Duration;

use serde::Serialize;

/// Top-level error type for the crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Signing error: {0}")]
    Signing(#[from] SigningError),

    #[error("Recovery error: {0}")]
    Recovery(#[from] RecoveryError),

    #[error(transparent)]
    Cleanup(#[from] CleanupError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure reported by an injected wallet capability.
///
/// `code` carries the provider's numeric error code when it supplied one
/// (EIP-1193 style, e.g. `4001` for a user rejection).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct WalletError {
    pub message: String,
    pub code: Option<i64>,
}

impl WalletError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    pub fn with_code(mut self, code: i64) -> Self {
        self.code = Some(code);
        self
    }
}

/// Errors surfaced by the signing façade and strategies.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SigningError {
    #[error("Signature request missing message data")]
    MissingMessage,

    #[error("Signature request missing nonce")]
    MissingNonce,

    #[error("Signature request missing wallet address")]
    MissingWalletAddress,

    #[error("Signature request missing valid timestamp")]
    MissingTimestamp,

    #[error("Invalid wallet address format: {0}")]
    InvalidWalletAddress(String),

    #[error("Invalid signature received: {0}")]
    InvalidSignature(String),

    #[error(
        "All signature methods failed. Personal sign error: {personal_sign}. Typed data error: {typed_data}"
    )]
    AllMethodsFailed {
        personal_sign: String,
        typed_data: String,
        code: Option<i64>,
    },
}

impl SigningError {
    /// Malformed requests and malformed signatures are caller bugs, not
    /// wallet failures, and never go through recovery.
    pub fn is_input_error(&self) -> bool {
        !matches!(self, Self::AllMethodsFailed { .. })
    }

    /// Provider error code carried by a strategy failure, if any.
    pub fn wallet_code(&self) -> Option<i64> {
        match self {
            Self::AllMethodsFailed { code, .. } => *code,
            _ => None,
        }
    }
}

/// Timing primitive failures.
#[derive(Debug, thiserror::Error)]
pub enum TimingError<E>
where
    E: std::error::Error + 'static,
{
    #[error("{label} timed out after {} seconds", format_seconds(.timeout))]
    TimedOut { label: String, timeout: Duration },

    #[error(transparent)]
    Failed(E),
}

/// Returned once every attempt of `retry_with_backoff` has failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{label} failed after {attempts} attempts: {last_error}")]
pub struct RetryError {
    pub label: String,
    pub attempts: u32,
    pub last_error: String,
}

/// Recovery handler faults. The dispatcher converts these into its fallback
/// result and never lets them escape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecoveryError {
    #[error("Session error handler invoked without session context")]
    MissingSessionContext,

    #[error("Recovery handler {handler} failed: {reason}")]
    HandlerFailed { handler: &'static str, reason: String },
}

/// Identity-provider cleanup errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CleanupError {
    #[error("{provider} cleanup failed: {reason}")]
    Failed { provider: String, reason: String },
}

/// Error family assigned by the analyzer.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AuthErrorKind {
    Session,
    Timeout,
    Connector,
    Generic,
}

impl AuthErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Session => "session",
            Self::Timeout => "timeout",
            Self::Connector => "connector",
            Self::Generic => "generic",
        }
    }
}

impl std::fmt::Display for AuthErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const CODE_SESSION_EXPIRED: &str = "session_expired";
pub const CODE_SIGNATURE_TIMEOUT: &str = "signature_timeout";
pub const CODE_CONNECTOR_DISCONNECTED: &str = "connector_disconnected";
pub const CODE_USER_REJECTED: &str = "user_rejected";
pub const CODE_SIGNATURE_FAILED: &str = "signature_failed";

/// Normalized, user-presentable authentication error.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AuthError {
    pub kind: AuthErrorKind,
    pub code: &'static str,
    pub user_message: &'static str,
    pub technical_message: String,
}

impl AuthError {
    fn new(
        kind: AuthErrorKind,
        code: &'static str,
        user_message: &'static str,
        technical_message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            code,
            user_message,
            technical_message: technical_message.into(),
        }
    }

    pub fn session_expired(technical_message: impl Into<String>) -> Self {
        Self::new(
            AuthErrorKind::Session,
            CODE_SESSION_EXPIRED,
            "Your wallet session has expired. Please reconnect your wallet.",
            technical_message,
        )
    }

    pub fn signature_timeout(technical_message: impl Into<String>) -> Self {
        Self::new(
            AuthErrorKind::Timeout,
            CODE_SIGNATURE_TIMEOUT,
            "Signature request timed out. Please try connecting again.",
            technical_message,
        )
    }

    pub fn connector_disconnected(technical_message: impl Into<String>) -> Self {
        Self::new(
            AuthErrorKind::Connector,
            CODE_CONNECTOR_DISCONNECTED,
            "Wallet connection was lost. Please reconnect and try again.",
            technical_message,
        )
    }

    pub fn user_rejected(technical_message: impl Into<String>) -> Self {
        Self::new(
            AuthErrorKind::Generic,
            CODE_USER_REJECTED,
            "Signature request was cancelled.",
            technical_message,
        )
    }

    pub fn signature_failed(technical_message: impl Into<String>) -> Self {
        Self::new(
            AuthErrorKind::Generic,
            CODE_SIGNATURE_FAILED,
            "Authentication failed. Please try again.",
            technical_message,
        )
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code == CODE_USER_REJECTED
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.user_message, self.code)
    }
}

impl std::error::Error for AuthError {}

/// Render a duration as whole or fractional seconds ("15", "1.5").
pub(crate) fn format_seconds(duration: &Duration) -> String {
    let millis = duration.as_millis();
    if millis % 1000 == 0 {
        (millis / 1000).to_string()
    } else {
        let secs = millis as f64 / 1000.0;
        format!("{secs}")
    }
}

pub type Result<T> = std::result::Result<T, Error>;
