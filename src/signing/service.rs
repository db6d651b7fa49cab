//! Signing façade: validate, pick a strategy, sign, re-check the result.

use std::time::Instant;

use uuid::Uuid;

use crate::config::SigningConfig;
use crate::error::SigningError;
use crate::signing::selector::StrategySelector;
use crate::signing::validator::{is_well_formed_signature, validate_request};
use crate::signing::{Connector, SignatureRequest, SignatureResult, WalletSigner};

pub struct SignatureService {
    selector: StrategySelector,
}

impl SignatureService {
    pub fn new(config: &SigningConfig) -> Self {
        Self::with_selector(StrategySelector::new(config))
    }

    pub fn with_selector(selector: StrategySelector) -> Self {
        Self { selector }
    }

    /// Obtain a signature for `request` from the connected wallet.
    ///
    /// Validation errors are returned before any wallet call is made.
    /// Strategy errors are returned unchanged.
    pub async fn request_signature(
        &self,
        request: &SignatureRequest,
        signer: &dyn WalletSigner,
        connector: Option<&Connector>,
    ) -> Result<SignatureResult, SigningError> {
        validate_request(request)?;

        let attempt_id = Uuid::new_v4();
        let connector_label = connector.map(Connector::label).unwrap_or("none");
        let strategy = self.selector.select(connector);
        tracing::info!(
            %attempt_id,
            wallet = %request.wallet_address,
            connector = connector_label,
            strategy = strategy.name(),
            "requesting wallet signature"
        );

        let started = Instant::now();
        let result = match strategy.sign(request, signer, connector).await {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!(
                    %attempt_id,
                    wallet = %request.wallet_address,
                    connector = connector_label,
                    strategy = strategy.name(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    error = %err,
                    "signature request failed"
                );
                return Err(err);
            }
        };

        if !is_well_formed_signature(&result.signature) {
            tracing::warn!(
                %attempt_id,
                strategy = strategy.name(),
                "strategy returned a malformed signature"
            );
            return Err(SigningError::InvalidSignature(result.signature));
        }

        tracing::info!(
            %attempt_id,
            wallet = %request.wallet_address,
            signature_type = result.signature_type.as_str(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "wallet signature obtained"
        );
        Ok(result)
    }
}
