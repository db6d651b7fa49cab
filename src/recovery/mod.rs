//! Error classification and recovery decisions for failed authentication.
//!
//! A failure is normalised into a [`RawAuthError`], classified by the
//! analyzer, and routed to the handler for its class. Every handler answers
//! with the same [`RecoveryResult`] shape.

pub mod analyzer;
pub mod dispatcher;
pub mod handlers;

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::{AuthError, AuthErrorKind, SigningError, WalletError};

pub use self::analyzer::analyze;
pub use self::dispatcher::{RecoveryDispatcher, RecoveryOutcome, handle_authentication_error};

/// Provider-agnostic view of whatever a failed authentication produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawAuthError {
    pub message: String,
    pub code: Option<i64>,
}

impl RawAuthError {
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

    /// Take the display text of `error` and the first provider code found
    /// along its source chain.
    pub fn from_error(error: &(dyn std::error::Error + 'static)) -> Self {
        let mut code = None;
        let mut current = Some(error);
        while let Some(err) = current {
            if let Some(wallet) = err.downcast_ref::<WalletError>() {
                code = wallet.code;
            } else if let Some(signing) = err.downcast_ref::<SigningError>() {
                code = signing.wallet_code();
            }
            if code.is_some() {
                break;
            }
            current = err.source();
        }
        Self {
            message: error.to_string(),
            code,
        }
    }
}

impl From<&SigningError> for RawAuthError {
    fn from(err: &SigningError) -> Self {
        Self::from_error(err)
    }
}

impl From<SigningError> for RawAuthError {
    fn from(err: SigningError) -> Self {
        Self::from_error(&err)
    }
}

impl From<WalletError> for RawAuthError {
    fn from(err: WalletError) -> Self {
        Self {
            message: err.message,
            code: err.code,
        }
    }
}

impl From<&str> for RawAuthError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for RawAuthError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// Details kept for stale relay/pairing failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionContext {
    pub error_message: String,
    pub session_id: Option<String>,
    pub is_session_error: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorAnalysisResult {
    pub error_type: AuthErrorKind,
    pub normalized_error: AuthError,
    pub session_context: Option<SessionContext>,
    pub original_error: RawAuthError,
}

/// The single decision every handler produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecoveryResult {
    pub should_disconnect: bool,
    pub should_show_error: bool,
    pub error_delay_ms: u64,
    pub cleanup_performed: bool,
}

impl RecoveryResult {
    /// Used whenever a handler cannot produce a decision.
    pub const FALLBACK: Self = Self {
        should_disconnect: false,
        should_show_error: true,
        error_delay_ms: 1_500,
        cleanup_performed: false,
    };

    pub fn error_delay(&self) -> Duration {
        Duration::from_millis(self.error_delay_ms)
    }
}

/// Disconnect capability of the wallet connection layer.
///
/// Must tolerate being called when already disconnected.
#[async_trait]
pub trait WalletDisconnect: Send + Sync {
    async fn disconnect(&self) -> Result<(), WalletError>;
}

/// Clears stale relay/pairing state left behind by a dead wallet session.
#[async_trait]
pub trait SessionCleaner: Send + Sync {
    async fn clear_session(&self, session_id: Option<&str>) -> Result<(), WalletError>;
}
