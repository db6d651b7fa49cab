//! Route an analysed failure to its handler. Never fails.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde::Serialize;

use crate::error::{AuthError, AuthErrorKind, RecoveryError};
use crate::recovery::analyzer::analyze;
use crate::recovery::handlers::{
    ConnectorErrorHandler, GenericErrorHandler, RecoveryHandler, SessionErrorHandler,
    TimeoutErrorHandler,
};
use crate::recovery::{
    ErrorAnalysisResult, RawAuthError, RecoveryResult, SessionCleaner, WalletDisconnect,
};

/// Normalized error plus the decision taken for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecoveryOutcome {
    pub error: AuthError,
    pub recovery: RecoveryResult,
}

#[derive(Default, Clone)]
pub struct RecoveryDispatcher {
    session_cleaner: Option<Arc<dyn SessionCleaner>>,
}

impl RecoveryDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session_cleaner(mut self, cleaner: Arc<dyn SessionCleaner>) -> Self {
        self.session_cleaner = Some(cleaner);
        self
    }

    /// Classify `raw`, run the matching handler and return its decision.
    ///
    /// A handler that errors or panics is replaced by
    /// [`RecoveryResult::FALLBACK`].
    pub async fn handle_authentication_error(
        &self,
        raw: impl Into<RawAuthError>,
        wallet: &dyn WalletDisconnect,
        wallet_connected: bool,
    ) -> RecoveryOutcome {
        let analysis = analyze(raw);
        tracing::debug!(
            error_type = %analysis.error_type,
            code = analysis.normalized_error.code,
            wallet_connected,
            "dispatching authentication error"
        );

        let handler = self.handler_for(analysis.error_type, wallet, wallet_connected);
        let recovery = run_handler(handler.as_ref(), &analysis).await;

        RecoveryOutcome {
            error: analysis.normalized_error,
            recovery,
        }
    }

    fn handler_for<'a>(
        &'a self,
        kind: AuthErrorKind,
        wallet: &'a dyn WalletDisconnect,
        wallet_connected: bool,
    ) -> Box<dyn RecoveryHandler + 'a> {
        match kind {
            AuthErrorKind::Session => Box::new(SessionErrorHandler::new(
                wallet,
                self.session_cleaner.as_deref(),
            )),
            AuthErrorKind::Timeout => Box::new(TimeoutErrorHandler::new(wallet)),
            AuthErrorKind::Connector => Box::new(ConnectorErrorHandler),
            AuthErrorKind::Generic => Box::new(GenericErrorHandler::new(wallet, wallet_connected)),
        }
    }
}

async fn run_handler(
    handler: &dyn RecoveryHandler,
    analysis: &ErrorAnalysisResult,
) -> RecoveryResult {
    let name = handler.name();
    match AssertUnwindSafe(handler.handle(analysis))
        .catch_unwind()
        .await
    {
        Ok(Ok(recovery)) => {
            tracing::debug!(
                handler = name,
                should_disconnect = recovery.should_disconnect,
                should_show_error = recovery.should_show_error,
                error_delay_ms = recovery.error_delay_ms,
                "recovery decided"
            );
            recovery
        }
        Ok(Err(err)) => {
            tracing::warn!(handler = name, error = %err, "recovery handler failed, using fallback");
            RecoveryResult::FALLBACK
        }
        Err(payload) => {
            let err = RecoveryError::HandlerFailed {
                handler: name,
                reason: panic_reason(payload.as_ref()),
            };
            tracing::warn!(error = %err, "recovery handler panicked, using fallback");
            RecoveryResult::FALLBACK
        }
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// [`RecoveryDispatcher::handle_authentication_error`] without a session
/// cleaner.
pub async fn handle_authentication_error(
    raw: impl Into<RawAuthError>,
    wallet: &dyn WalletDisconnect,
    wallet_connected: bool,
) -> RecoveryOutcome {
    RecoveryDispatcher::new()
        .handle_authentication_error(raw, wallet, wallet_connected)
        .await
}
