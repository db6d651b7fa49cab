//! A single deadline-bounded call into a wallet signing capability.

use std::future::Future;
use std::time::Duration;

use crate::error::{TimingError, WalletError};
use crate::signing::validator::{
    RestrictionHeuristic, describe_value, is_well_formed_signature, looks_like_failure_object,
};
use crate::timing::with_deadline;

/// Why an attempt did not yield a signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AttemptFailure {
    pub message: String,
    pub code: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AttemptOutcome {
    Signed(String),
    /// The wallet cannot sign this way at all; switch to the ownership token.
    NeedsFallback,
    Failed(AttemptFailure),
}

/// Await one wallet call under `timeout` and keep only a well-formed
/// signature string.
pub(crate) async fn call_wallet<F>(
    label: &str,
    timeout: Duration,
    call: F,
) -> Result<String, AttemptFailure>
where
    F: Future<Output = Result<serde_json::Value, WalletError>>,
{
    match with_deadline(call, timeout, label).await {
        Ok(value) if looks_like_failure_object(&value) => Err(AttemptFailure {
            message: format!("{label} returned an error payload: {}", describe_value(&value)),
            code: None,
        }),
        Ok(serde_json::Value::String(signature)) if is_well_formed_signature(&signature) => {
            Ok(signature)
        }
        Ok(value) => Err(AttemptFailure {
            message: format!(
                "{label} returned a malformed signature: {}",
                describe_value(&value)
            ),
            code: None,
        }),
        Err(err @ TimingError::TimedOut { .. }) => Err(AttemptFailure {
            message: err.to_string(),
            code: None,
        }),
        Err(TimingError::Failed(err)) => Err(AttemptFailure {
            message: err.message,
            code: err.code,
        }),
    }
}

/// [`call_wallet`], with failures matching `restriction` turned into
/// [`AttemptOutcome::NeedsFallback`].
pub(crate) async fn run_attempt<F>(
    label: &str,
    timeout: Duration,
    call: F,
    restriction: &RestrictionHeuristic,
) -> AttemptOutcome
where
    F: Future<Output = Result<serde_json::Value, WalletError>>,
{
    match call_wallet(label, timeout, call).await {
        Ok(signature) => AttemptOutcome::Signed(signature),
        Err(failure) if (**restriction)(&failure.message) => AttemptOutcome::NeedsFallback,
        Err(failure) => AttemptOutcome::Failed(failure),
    }
}
