//! End-to-end wallet authentication: sign, and on failure recover, tell the
//! user and drop the identity session if the wallet was disconnected.

use std::sync::Arc;

use crate::cleanup::{CleanupCoordinator, IdentityProvider};
use crate::config::AuthConfig;
use crate::error::{AuthError, SigningError};
use crate::feedback::{FeedbackScheduler, Presentation, UserNotifier};
use crate::recovery::{RecoveryDispatcher, RecoveryResult, SessionCleaner, WalletDisconnect};
use crate::signing::{
    Connector, SignatureRequest, SignatureResult, SignatureService, StrategySelector, WalletSigner,
};

#[derive(Debug)]
pub enum AuthenticationOutcome {
    Authenticated(SignatureResult),
    Recovered {
        error: AuthError,
        recovery: RecoveryResult,
        presentation: Presentation,
    },
}

impl AuthenticationOutcome {
    pub fn signature(&self) -> Option<&SignatureResult> {
        match self {
            Self::Authenticated(result) => Some(result),
            Self::Recovered { .. } => None,
        }
    }
}

pub struct AuthenticationFlow {
    signatures: SignatureService,
    recovery: RecoveryDispatcher,
    feedback: FeedbackScheduler,
    cleanup: Option<CleanupCoordinator>,
}

impl AuthenticationFlow {
    pub fn new(config: &AuthConfig, notifier: Arc<dyn UserNotifier>) -> Self {
        Self {
            signatures: SignatureService::new(&config.signing),
            recovery: RecoveryDispatcher::new(),
            feedback: FeedbackScheduler::new(notifier, config.feedback.error_visibility),
            cleanup: None,
        }
    }

    pub fn with_selector(mut self, selector: StrategySelector) -> Self {
        self.signatures = SignatureService::with_selector(selector);
        self
    }

    pub fn with_session_cleaner(mut self, cleaner: Arc<dyn SessionCleaner>) -> Self {
        self.recovery = self.recovery.with_session_cleaner(cleaner);
        self
    }

    pub fn with_identity_provider(
        mut self,
        identity: Arc<dyn IdentityProvider>,
        config: &AuthConfig,
    ) -> Self {
        self.cleanup = Some(CleanupCoordinator::new(identity, config));
        self
    }

    /// Run one authentication attempt.
    ///
    /// Malformed requests and malformed signatures come back as `Err`.
    /// Every wallet-side failure is recovered and reported as
    /// [`AuthenticationOutcome::Recovered`].
    pub async fn authenticate(
        &self,
        request: &SignatureRequest,
        signer: &dyn WalletSigner,
        connector: Option<&Connector>,
        wallet: &dyn WalletDisconnect,
        wallet_connected: bool,
    ) -> Result<AuthenticationOutcome, SigningError> {
        let err = match self
            .signatures
            .request_signature(request, signer, connector)
            .await
        {
            Ok(result) => return Ok(AuthenticationOutcome::Authenticated(result)),
            Err(err) if err.is_input_error() => return Err(err),
            Err(err) => err,
        };

        let outcome = self
            .recovery
            .handle_authentication_error(&err, wallet, wallet_connected)
            .await;
        tracing::info!(
            wallet = %request.wallet_address,
            error_type = %outcome.error.kind,
            code = outcome.error.code,
            should_disconnect = outcome.recovery.should_disconnect,
            "authentication failed, recovery applied"
        );

        let presentation = self
            .feedback
            .present_error(&outcome.error, &outcome.recovery);

        if outcome.recovery.should_disconnect && wallet_connected {
            if let Some(cleanup) = &self.cleanup {
                if let Err(err) = cleanup.sign_out().await {
                    tracing::warn!(error = %err, "identity cleanup after disconnect failed");
                }
            }
        }

        Ok(AuthenticationOutcome::Recovered {
            error: outcome.error,
            recovery: outcome.recovery,
            presentation,
        })
    }
}
