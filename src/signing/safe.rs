//! Strategy for restricted (Safe-style multisig) wallets.
//!
//! One connector-routed signing attempt with an extended deadline. Any
//! failure degrades to the ownership token, so this strategy never fails.

use async_trait::async_trait;

use crate::config::SigningConfig;
use crate::error::SigningError;
use crate::signing::attempt::call_wallet;
use crate::signing::validator::make_ownership_token;
use crate::signing::{
    Connector, MessageSignRequest, SignatureRequest, SignatureResult, SignatureType,
    SigningStrategy, WalletSigner,
};

const SAFE_SIGN_LABEL: &str = "Safe wallet signature request";

pub struct SafeWalletSigningStrategy {
    config: SigningConfig,
}

impl SafeWalletSigningStrategy {
    pub fn new(config: SigningConfig) -> Self {
        Self { config }
    }
}

/// Exact `safe` id, or "safe" anywhere in the id or name, ignoring case.
pub fn is_safe_connector(connector: &Connector) -> bool {
    let contains_safe = |value: &Option<String>| {
        value
            .as_deref()
            .is_some_and(|v| v.to_ascii_lowercase().contains("safe"))
    };
    connector.id.as_deref() == Some("safe")
        || contains_safe(&connector.id)
        || contains_safe(&connector.name)
}

#[async_trait]
impl SigningStrategy for SafeWalletSigningStrategy {
    fn name(&self) -> &'static str {
        "safe_wallet"
    }

    fn can_handle(&self, connector: Option<&Connector>) -> bool {
        connector.is_some_and(is_safe_connector)
    }

    async fn sign(
        &self,
        request: &SignatureRequest,
        signer: &dyn WalletSigner,
        connector: Option<&Connector>,
    ) -> Result<SignatureResult, SigningError> {
        let outcome = call_wallet(
            SAFE_SIGN_LABEL,
            self.config.safe_sign_timeout,
            signer.sign_message(MessageSignRequest {
                message: request.message.clone(),
                wallet_address: request.wallet_address.clone(),
                connector: connector.cloned(),
            }),
        )
        .await;

        match outcome {
            Ok(signature) => Ok(SignatureResult::new(signature, SignatureType::PersonalSign)),
            Err(failure) => {
                tracing::warn!(
                    wallet = %request.wallet_address,
                    connector = connector.map(Connector::label).unwrap_or("none"),
                    error = %failure.message,
                    "safe wallet signing failed, using ownership token"
                );
                Ok(SignatureResult::new(
                    make_ownership_token(request),
                    SignatureType::SafeWallet,
                ))
            }
        }
    }
}
