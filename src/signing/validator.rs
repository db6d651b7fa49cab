//! Request and signature shape checks, plus the restricted-wallet heuristic.

use std::sync::Arc;

use crate::error::SigningError;
use crate::signing::SignatureRequest;

pub const OWNERSHIP_TOKEN_PREFIX: &str = "safe-wallet:";

/// Minimum length of a hex signature, `0x` included.
const MIN_HEX_SIGNATURE_LEN: usize = 10;

const USER_DRIVEN_MARKERS: &[&str] = &["User rejected", "user denied"];

const RESTRICTED_WALLET_MARKERS: &[&str] = &[
    "Method disabled",
    "safe://",
    "the method eth_signTypedData_v4 does not exist",
    "Method not supported",
    "eth_signTypedData_v3 does not exist",
    "Personal sign not supported",
];

/// Predicate deciding whether a signing failure means the wallet cannot
/// sign at all and needs the ownership-token path.
pub type RestrictionHeuristic = Arc<dyn Fn(&str) -> bool + Send + Sync>;

pub fn default_restriction_heuristic() -> RestrictionHeuristic {
    Arc::new(looks_like_restricted_wallet)
}

/// True for a `safe-wallet:` ownership token or a `0x` signature of at
/// least ten characters.
pub fn is_well_formed_signature(signature: &str) -> bool {
    signature.starts_with(OWNERSHIP_TOKEN_PREFIX)
        || (signature.starts_with("0x") && signature.len() >= MIN_HEX_SIGNATURE_LEN)
}

/// Detects providers that resolve a signing call with an error payload
/// instead of failing it.
///
/// Anything that is not a string or a primitive counts, as does a string
/// mentioning "error".
pub fn looks_like_failure_object(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::String(s) => s.contains("error"),
        serde_json::Value::Object(_) | serde_json::Value::Array(_) | serde_json::Value::Null => {
            true
        }
        serde_json::Value::Bool(_) | serde_json::Value::Number(_) => false,
    }
}

/// Case-sensitive substring match against known "this wallet cannot sign"
/// provider errors. User cancellations never match.
pub fn looks_like_restricted_wallet(error_text: &str) -> bool {
    if USER_DRIVEN_MARKERS
        .iter()
        .any(|marker| error_text.contains(marker))
    {
        return false;
    }
    RESTRICTED_WALLET_MARKERS
        .iter()
        .any(|marker| error_text.contains(marker))
}

/// `safe-wallet:<walletAddress>:<nonce>:<timestamp>`.
///
/// Not a signature: the backend must check every field against the
/// challenge it issued.
pub fn make_ownership_token(request: &SignatureRequest) -> String {
    format!(
        "{OWNERSHIP_TOKEN_PREFIX}{}:{}:{}",
        request.wallet_address, request.nonce, request.timestamp
    )
}

pub fn is_wallet_address(value: &str) -> bool {
    value.len() == 42
        && value.starts_with("0x")
        && value[2..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Check the request invariants before any strategy runs.
pub fn validate_request(request: &SignatureRequest) -> Result<(), SigningError> {
    if request.message.trim().is_empty() {
        return Err(SigningError::MissingMessage);
    }
    if request.nonce.trim().is_empty() {
        return Err(SigningError::MissingNonce);
    }
    if request.wallet_address.trim().is_empty() {
        return Err(SigningError::MissingWalletAddress);
    }
    if request.timestamp <= 0 {
        return Err(SigningError::MissingTimestamp);
    }
    if !is_wallet_address(&request.wallet_address) {
        return Err(SigningError::InvalidWalletAddress(
            request.wallet_address.clone(),
        ));
    }
    Ok(())
}

/// Render a provider payload for logs and heuristics.
pub(crate) fn describe_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
