//! One recovery handler per error class.

use std::panic::AssertUnwindSafe;

use async_trait::async_trait;
use futures::FutureExt;

use crate::error::RecoveryError;
use crate::recovery::analyzer::is_user_initiated;
use crate::recovery::{ErrorAnalysisResult, RecoveryResult, SessionCleaner, WalletDisconnect};

pub const SESSION_ERROR_DELAY_MS: u64 = 1_500;
pub const TIMEOUT_ERROR_DELAY_MS: u64 = 2_000;
pub const CONNECTOR_ERROR_DELAY_MS: u64 = 1_500;
pub const GENERIC_DISCONNECT_DELAY_MS: u64 = 2_000;
pub const GENERIC_USER_REJECTION_DELAY_MS: u64 = 1_500;

#[async_trait]
pub trait RecoveryHandler: Send + Sync {
    fn name(&self) -> &'static str;

    async fn handle(
        &self,
        analysis: &ErrorAnalysisResult,
    ) -> Result<RecoveryResult, RecoveryError>;
}

/// Call `disconnect`, swallowing both errors and panics.
pub(crate) async fn best_effort_disconnect(wallet: &dyn WalletDisconnect, handler: &'static str) {
    match AssertUnwindSafe(async { wallet.disconnect().await })
        .catch_unwind()
        .await
    {
        Ok(Ok(())) => tracing::debug!(handler, "wallet disconnected"),
        Ok(Err(err)) => tracing::warn!(handler, error = %err, "wallet disconnect failed"),
        Err(_) => tracing::warn!(handler, "wallet disconnect panicked"),
    }
}

/// Stale relay or pairing state: disconnect silently and clear the session.
pub struct SessionErrorHandler<'a> {
    wallet: &'a dyn WalletDisconnect,
    sessions: Option<&'a dyn SessionCleaner>,
}

impl<'a> SessionErrorHandler<'a> {
    pub fn new(
        wallet: &'a dyn WalletDisconnect,
        sessions: Option<&'a dyn SessionCleaner>,
    ) -> Self {
        Self { wallet, sessions }
    }
}

#[async_trait]
impl<'a> RecoveryHandler for SessionErrorHandler<'a> {
    fn name(&self) -> &'static str {
        "session"
    }

    async fn handle(
        &self,
        analysis: &ErrorAnalysisResult,
    ) -> Result<RecoveryResult, RecoveryError> {
        let context = analysis
            .session_context
            .as_ref()
            .ok_or(RecoveryError::MissingSessionContext)?;

        best_effort_disconnect(self.wallet, self.name()).await;

        let cleanup_performed = match self.sessions {
            Some(sessions) => {
                let session_id = context.session_id.as_deref();
                let cleared = AssertUnwindSafe(sessions.clear_session(session_id))
                    .catch_unwind()
                    .await;
                match cleared {
                    Ok(Ok(())) => true,
                    Ok(Err(err)) => {
                        tracing::warn!(
                            session_id = session_id.unwrap_or("unknown"),
                            error = %err,
                            "session cleanup failed"
                        );
                        false
                    }
                    Err(_) => {
                        tracing::warn!("session cleanup panicked");
                        false
                    }
                }
            }
            None => false,
        };

        Ok(RecoveryResult {
            should_disconnect: true,
            should_show_error: false,
            error_delay_ms: SESSION_ERROR_DELAY_MS,
            cleanup_performed,
        })
    }
}

/// Unresponsive wallet or transport: disconnect, then tell the user.
pub struct TimeoutErrorHandler<'a> {
    wallet: &'a dyn WalletDisconnect,
}

impl<'a> TimeoutErrorHandler<'a> {
    pub fn new(wallet: &'a dyn WalletDisconnect) -> Self {
        Self { wallet }
    }
}

#[async_trait]
impl<'a> RecoveryHandler for TimeoutErrorHandler<'a> {
    fn name(&self) -> &'static str {
        "timeout"
    }

    async fn handle(
        &self,
        _analysis: &ErrorAnalysisResult,
    ) -> Result<RecoveryResult, RecoveryError> {
        best_effort_disconnect(self.wallet, self.name()).await;
        Ok(RecoveryResult {
            should_disconnect: true,
            should_show_error: true,
            error_delay_ms: TIMEOUT_ERROR_DELAY_MS,
            cleanup_performed: false,
        })
    }
}

/// The connector is already gone; disconnecting again is pointless.
#[derive(Debug, Default)]
pub struct ConnectorErrorHandler;

#[async_trait]
impl RecoveryHandler for ConnectorErrorHandler {
    fn name(&self) -> &'static str {
        "connector"
    }

    async fn handle(
        &self,
        _analysis: &ErrorAnalysisResult,
    ) -> Result<RecoveryResult, RecoveryError> {
        Ok(RecoveryResult {
            should_disconnect: false,
            should_show_error: true,
            error_delay_ms: CONNECTOR_ERROR_DELAY_MS,
            cleanup_performed: false,
        })
    }
}

/// Everything else. Disconnects only a connected wallet, and never for a
/// user cancellation.
pub struct GenericErrorHandler<'a> {
    wallet: &'a dyn WalletDisconnect,
    wallet_connected: bool,
}

impl<'a> GenericErrorHandler<'a> {
    pub fn new(wallet: &'a dyn WalletDisconnect, wallet_connected: bool) -> Self {
        Self {
            wallet,
            wallet_connected,
        }
    }
}

#[async_trait]
impl<'a> RecoveryHandler for GenericErrorHandler<'a> {
    fn name(&self) -> &'static str {
        "generic"
    }

    async fn handle(
        &self,
        analysis: &ErrorAnalysisResult,
    ) -> Result<RecoveryResult, RecoveryError> {
        let user_initiated = is_user_initiated(&analysis.original_error);
        let should_disconnect = self.wallet_connected && !user_initiated;

        if should_disconnect {
            best_effort_disconnect(self.wallet, self.name()).await;
        }

        let error_delay_ms = if should_disconnect {
            GENERIC_DISCONNECT_DELAY_MS
        } else if user_initiated {
            GENERIC_USER_REJECTION_DELAY_MS
        } else {
            0
        };

        Ok(RecoveryResult {
            should_disconnect,
            should_show_error: true,
            error_delay_ms,
            cleanup_performed: false,
        })
    }
}
