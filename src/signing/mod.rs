//! Wallet signing: request model, capability seam, strategies and façade.

mod attempt;
pub mod challenge;
pub mod regular;
pub mod safe;
pub mod selector;
pub mod service;
pub mod typed_data;
pub mod validator;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::WalletError;

pub use self::challenge::AuthChallenge;
pub use self::regular::RegularSigningStrategy;
pub use self::safe::SafeWalletSigningStrategy;
pub use self::selector::StrategySelector;
pub use self::service::SignatureService;
pub use self::typed_data::TypedDataPayload;
pub use self::validator::{RestrictionHeuristic, looks_like_restricted_wallet};

/// One authentication attempt's worth of data to be signed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureRequest {
    pub message: String,
    pub nonce: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub wallet_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
}

impl SignatureRequest {
    pub fn new(
        message: impl Into<String>,
        nonce: impl Into<String>,
        timestamp: i64,
        wallet_address: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            nonce: nonce.into(),
            timestamp,
            wallet_address: wallet_address.into(),
            chain_id: None,
        }
    }

    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignatureType {
    TypedData,
    PersonalSign,
    SafeWallet,
}

impl SignatureType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TypedData => "typed-data",
            Self::PersonalSign => "personal-sign",
            Self::SafeWallet => "safe-wallet",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureResult {
    pub signature: String,
    pub signature_type: SignatureType,
}

impl SignatureResult {
    pub fn new(signature: impl Into<String>, signature_type: SignatureType) -> Self {
        Self {
            signature: signature.into(),
            signature_type,
        }
    }
}

/// Identity of the active wallet connector. Only used for strategy
/// selection and logging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connector {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl Connector {
    pub fn new(id: Option<&str>, name: Option<&str>) -> Self {
        Self {
            id: id.map(str::to_string),
            name: name.map(str::to_string),
        }
    }

    pub fn with_id(id: &str) -> Self {
        Self::new(Some(id), None)
    }

    /// Label for log fields.
    pub fn label(&self) -> &str {
        self.id
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or("unknown")
    }
}

/// Arguments for the wallet's personal-message signing capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSignRequest {
    pub message: String,
    pub wallet_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connector: Option<Connector>,
}

/// Signing capabilities exposed by the connected wallet.
///
/// Both calls resolve with the raw value the provider handed back. Some
/// providers resolve with an error payload instead of failing, so the value
/// is not assumed to be a signature string.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    async fn sign_message(
        &self,
        request: MessageSignRequest,
    ) -> Result<serde_json::Value, WalletError>;

    async fn sign_typed_data(
        &self,
        payload: TypedDataPayload,
    ) -> Result<serde_json::Value, WalletError>;
}

/// A way of obtaining a signature from a particular family of wallets.
#[async_trait]
pub trait SigningStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn can_handle(&self, connector: Option<&Connector>) -> bool;

    async fn sign(
        &self,
        request: &SignatureRequest,
        signer: &dyn WalletSigner,
        connector: Option<&Connector>,
    ) -> Result<SignatureResult, crate::error::SigningError>;
}
