//! Classify a raw authentication failure.
//!
//! Order matters: the first matching class wins.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{AuthError, AuthErrorKind};
use crate::recovery::{ErrorAnalysisResult, RawAuthError, SessionContext};

const SESSION_MARKERS: &[&str] = &[
    "No matching key",
    "session:",
    "pairing",
    "WalletConnect",
    "relayer",
];

const TIMEOUT_MARKERS: &[&str] = &["timed out"];

const CONNECTOR_MARKERS: &[&str] = &["ConnectorNotConnectedError", "Connector not connected"];

/// Lowercased phrases providers use for an explicit user cancellation.
const USER_REJECTION_MARKERS: &[&str] = &[
    "user rejected",
    "user denied",
    "user cancelled",
    "user canceled",
    "rejected by user",
];

/// EIP-1193 `userRejectedRequest`.
pub const USER_REJECTED_CODE: i64 = 4001;

static SESSION_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)session:\s*([a-f0-9]{64})").expect("session id pattern is valid")
});

fn contains_any(haystack: &str, patterns: &[&str]) -> bool {
    patterns.iter().any(|p| haystack.contains(p))
}

/// True when the failure is the user declining, not a fault.
pub fn is_user_initiated(error: &RawAuthError) -> bool {
    if error.code == Some(USER_REJECTED_CODE) {
        return true;
    }
    let lowered = error.message.to_ascii_lowercase();
    contains_any(&lowered, USER_REJECTION_MARKERS)
}

pub fn extract_session_id(message: &str) -> Option<String> {
    SESSION_ID_PATTERN
        .captures(message)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn analyze(raw: impl Into<RawAuthError>) -> ErrorAnalysisResult {
    let raw = raw.into();
    let message = raw.message.as_str();

    if contains_any(message, SESSION_MARKERS) {
        let session_context = SessionContext {
            error_message: message.to_string(),
            session_id: extract_session_id(message),
            is_session_error: true,
        };
        return ErrorAnalysisResult {
            error_type: AuthErrorKind::Session,
            normalized_error: AuthError::session_expired(message),
            session_context: Some(session_context),
            original_error: raw,
        };
    }

    let (error_type, normalized_error) = if contains_any(message, TIMEOUT_MARKERS) {
        (AuthErrorKind::Timeout, AuthError::signature_timeout(message))
    } else if contains_any(message, CONNECTOR_MARKERS) {
        (
            AuthErrorKind::Connector,
            AuthError::connector_disconnected(message),
        )
    } else if is_user_initiated(&raw) {
        (AuthErrorKind::Generic, AuthError::user_rejected(message))
    } else {
        (AuthErrorKind::Generic, AuthError::signature_failed(message))
    };

    ErrorAnalysisResult {
        error_type,
        normalized_error,
        session_context: None,
        original_error: raw,
    }
}
