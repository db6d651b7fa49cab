//! Default strategy for EOA-style wallets.
//!
//! Tries personal-message signing first, then typed-data signing. Either
//! attempt may reveal that the wallet is a restricted (Safe-style) wallet,
//! in which case the ownership token is returned without trying further.

use async_trait::async_trait;

use crate::config::SigningConfig;
use crate::error::SigningError;
use crate::signing::attempt::{AttemptFailure, AttemptOutcome, run_attempt};
use crate::signing::typed_data::TypedDataPayload;
use crate::signing::validator::{
    RestrictionHeuristic, default_restriction_heuristic, make_ownership_token,
};
use crate::signing::{
    Connector, MessageSignRequest, SignatureRequest, SignatureResult, SignatureType,
    SigningStrategy, WalletSigner,
};

const PERSONAL_SIGN_LABEL: &str = "Personal sign request";
const TYPED_DATA_LABEL: &str = "Typed data signature request";

pub struct RegularSigningStrategy {
    config: SigningConfig,
    restriction: RestrictionHeuristic,
}

impl RegularSigningStrategy {
    pub fn new(config: SigningConfig) -> Self {
        Self::with_heuristic(config, default_restriction_heuristic())
    }

    pub fn with_heuristic(config: SigningConfig, restriction: RestrictionHeuristic) -> Self {
        Self {
            config,
            restriction,
        }
    }

    fn ownership_result(&self, request: &SignatureRequest, stage: &str) -> SignatureResult {
        tracing::warn!(
            wallet = %request.wallet_address,
            stage,
            "wallet rejected standard signing, using ownership token"
        );
        SignatureResult::new(make_ownership_token(request), SignatureType::SafeWallet)
    }
}

#[async_trait]
impl SigningStrategy for RegularSigningStrategy {
    fn name(&self) -> &'static str {
        "regular"
    }

    /// Universal fallback: accepts every connector, including none.
    fn can_handle(&self, _connector: Option<&Connector>) -> bool {
        true
    }

    async fn sign(
        &self,
        request: &SignatureRequest,
        signer: &dyn WalletSigner,
        _connector: Option<&Connector>,
    ) -> Result<SignatureResult, SigningError> {
        let personal = run_attempt(
            PERSONAL_SIGN_LABEL,
            self.config.personal_sign_timeout,
            signer.sign_message(MessageSignRequest {
                message: request.message.clone(),
                wallet_address: request.wallet_address.clone(),
                connector: None,
            }),
            &self.restriction,
        )
        .await;

        let personal_failure = match personal {
            AttemptOutcome::Signed(signature) => {
                tracing::debug!(wallet = %request.wallet_address, "personal sign succeeded");
                return Ok(SignatureResult::new(signature, SignatureType::PersonalSign));
            }
            AttemptOutcome::NeedsFallback => {
                return Ok(self.ownership_result(request, "personal_sign"));
            }
            AttemptOutcome::Failed(failure) => failure,
        };

        tracing::debug!(
            wallet = %request.wallet_address,
            error = %personal_failure.message,
            "personal sign failed, trying typed data"
        );

        let payload = TypedDataPayload::for_request(request, &self.config);
        let typed = run_attempt(
            TYPED_DATA_LABEL,
            self.config.typed_data_timeout,
            signer.sign_typed_data(payload),
            &self.restriction,
        )
        .await;

        match typed {
            AttemptOutcome::Signed(signature) => {
                tracing::debug!(wallet = %request.wallet_address, "typed data sign succeeded");
                Ok(SignatureResult::new(signature, SignatureType::TypedData))
            }
            AttemptOutcome::NeedsFallback => Ok(self.ownership_result(request, "typed_data")),
            AttemptOutcome::Failed(typed_failure) => {
                Err(exhausted(personal_failure, typed_failure))
            }
        }
    }
}

fn exhausted(personal: AttemptFailure, typed: AttemptFailure) -> SigningError {
    SigningError::AllMethodsFailed {
        code: personal.code.or(typed.code),
        personal_sign: personal.message,
        typed_data: typed.message,
    }
}
