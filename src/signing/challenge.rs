//! Challenge message construction for a single authentication attempt.

use chrono::{DateTime, SecondsFormat, Utc};
use rand::{Rng, distributions::Alphanumeric};

use crate::error::SigningError;
use crate::signing::SignatureRequest;
use crate::signing::validator::is_wallet_address;

const NONCE_LEN: usize = 32;

/// A freshly issued sign-in challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthChallenge {
    pub wallet_address: String,
    pub nonce: String,
    pub chain_id: Option<u64>,
    pub issued_at: DateTime<Utc>,
    pub message: String,
}

impl AuthChallenge {
    /// Issue a challenge for `wallet_address` with a random nonce.
    pub fn issue(
        wallet_address: &str,
        chain_id: Option<u64>,
        now: DateTime<Utc>,
    ) -> Result<Self, SigningError> {
        Self::issue_with_nonce(wallet_address, chain_id, now, random_nonce(NONCE_LEN))
    }

    pub fn issue_with_nonce(
        wallet_address: &str,
        chain_id: Option<u64>,
        now: DateTime<Utc>,
        nonce: String,
    ) -> Result<Self, SigningError> {
        let wallet = wallet_address.trim();
        if wallet.is_empty() {
            return Err(SigningError::MissingWalletAddress);
        }
        if !is_wallet_address(wallet) {
            return Err(SigningError::InvalidWalletAddress(wallet.to_string()));
        }
        if nonce.trim().is_empty() {
            return Err(SigningError::MissingNonce);
        }

        let chain_line = chain_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "default".to_string());
        let message = format!(
            "SuperPool Authentication\nWallet: {wallet}\nChain ID: {chain_line}\nNonce: {nonce}\nIssued At: {}\n\nSign this message to prove you control this wallet. This request will not trigger a blockchain transaction or cost any gas.",
            now.to_rfc3339_opts(SecondsFormat::Millis, true)
        );

        Ok(Self {
            wallet_address: wallet.to_string(),
            nonce,
            chain_id,
            issued_at: now,
            message,
        })
    }

    /// The request the signing façade consumes.
    pub fn to_request(&self) -> SignatureRequest {
        SignatureRequest {
            message: self.message.clone(),
            nonce: self.nonce.clone(),
            timestamp: self.issued_at.timestamp_millis(),
            wallet_address: self.wallet_address.clone(),
            chain_id: self.chain_id,
        }
    }
}

fn random_nonce(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::signing::testing::WALLET;
    use crate::signing::validator::validate_request;

    #[test]
    fn issued_challenge_produces_valid_request() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let challenge = AuthChallenge::issue(WALLET, Some(8453), now).expect("challenge");

        assert_eq!(challenge.nonce.len(), NONCE_LEN);
        assert!(challenge.message.contains(&format!("Wallet: {WALLET}")));
        assert!(challenge.message.contains("Chain ID: 8453"));
        assert!(challenge.message.contains("Issued At: 2023-11-14T22:13:20.000Z"));

        let request = challenge.to_request();
        assert_eq!(request.timestamp, 1_700_000_000_000);
        assert_eq!(request.chain_id, Some(8453));
        validate_request(&request).expect("request should validate");
    }

    #[test]
    fn rejects_malformed_wallet() {
        let err = AuthChallenge::issue("0xnothex", None, Utc::now()).unwrap_err();
        assert_eq!(err, SigningError::InvalidWalletAddress("0xnothex".to_string()));
    }

    #[test]
    fn nonces_differ_between_challenges() {
        let now = Utc::now();
        let a = AuthChallenge::issue(WALLET, None, now).unwrap();
        let b = AuthChallenge::issue(WALLET, None, now).unwrap();
        assert_ne!(a.nonce, b.nonce);
    }
}
