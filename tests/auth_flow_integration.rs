//! End-to-end authentication scenarios against a scripted wallet.
//!
//! The wallet here implements both the signing and the disconnect
//! capabilities, the way a host's connection layer would.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use superpool_auth::error::{CODE_SESSION_EXPIRED, CODE_SIGNATURE_FAILED};
use superpool_auth::feedback::{Presentation, UserMessage, UserNotifier};
use superpool_auth::signing::{MessageSignRequest, TypedDataPayload};
use superpool_auth::{
    AuthConfig, AuthErrorKind, AuthenticationFlow, AuthenticationOutcome, Connector,
    RecoveryResult, SignatureRequest, SignatureService, SignatureType, WalletDisconnect,
    WalletError, WalletSigner, analyze, handle_authentication_error,
};

const WALLET: &str = "0xABCDEF0123456789abcdef0123456789ABCDEF01";
const SESSION_ID: &str = "abcdef0123456789abcdef0123456789abcdef0123456789abcdef0123456789";

enum Step {
    Resolve(Value),
    Reject(&'static str),
}

#[derive(Default)]
struct FakeWallet {
    personal: Mutex<VecDeque<Step>>,
    typed: Mutex<VecDeque<Step>>,
    typed_calls: AtomicUsize,
    disconnects: AtomicUsize,
}

impl FakeWallet {
    fn personal(self, step: Step) -> Self {
        self.personal.lock().unwrap().push_back(step);
        self
    }

    fn typed(self, step: Step) -> Self {
        self.typed.lock().unwrap().push_back(step);
        self
    }

    fn replay(step: Option<Step>) -> Result<Value, WalletError> {
        match step {
            Some(Step::Resolve(value)) => Ok(value),
            Some(Step::Reject(message)) => Err(WalletError::new(message)),
            None => Err(WalletError::new("unexpected wallet call")),
        }
    }
}

#[async_trait]
impl WalletSigner for FakeWallet {
    async fn sign_message(&self, _request: MessageSignRequest) -> Result<Value, WalletError> {
        let step = self.personal.lock().unwrap().pop_front();
        Self::replay(step)
    }

    async fn sign_typed_data(&self, _payload: TypedDataPayload) -> Result<Value, WalletError> {
        self.typed_calls.fetch_add(1, Ordering::SeqCst);
        let step = self.typed.lock().unwrap().pop_front();
        Self::replay(step)
    }
}

#[async_trait]
impl WalletDisconnect for FakeWallet {
    async fn disconnect(&self) -> Result<(), WalletError> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
struct Inbox(Mutex<Vec<UserMessage>>);

impl UserNotifier for Inbox {
    fn display(&self, message: UserMessage) {
        self.0.lock().unwrap().push(message);
    }
}

fn request() -> SignatureRequest {
    SignatureRequest::new("Sign in to SuperPool", "nonce1", 1_700_000_000_000, WALLET)
}

fn service() -> SignatureService {
    SignatureService::new(&AuthConfig::default().signing)
}

#[tokio::test]
async fn safe_connector_with_error_payload_gets_ownership_token() {
    let wallet =
        FakeWallet::default().personal(Step::Resolve(json!({ "error": "Method not found" })));
    let connector = Connector::with_id("safe");

    let result = service()
        .request_signature(&request(), &wallet, Some(&connector))
        .await
        .unwrap();
    assert_eq!(result.signature_type, SignatureType::SafeWallet);
    assert_eq!(
        result.signature,
        format!("safe-wallet:{WALLET}:nonce1:1700000000000")
    );
}

#[tokio::test]
async fn disabled_personal_sign_skips_typed_data() {
    let wallet = FakeWallet::default().personal(Step::Reject("Method disabled"));

    let result = service()
        .request_signature(&request(), &wallet, None)
        .await
        .unwrap();
    assert_eq!(result.signature_type, SignatureType::SafeWallet);
    assert_eq!(wallet.typed_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn rejected_personal_sign_falls_back_to_typed_data() {
    let wallet = FakeWallet::default()
        .personal(Step::Reject("User rejected"))
        .typed(Step::Resolve(json!("0xdeadbeef01")));

    let result = service()
        .request_signature(&request(), &wallet, None)
        .await
        .unwrap();
    assert_eq!(result.signature_type, SignatureType::TypedData);
    assert_eq!(result.signature, "0xdeadbeef01");
    assert_eq!(wallet.typed_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn relayer_failure_is_classified_as_session() {
    let analysis = analyze(format!(
        "WalletConnect relayer disconnected: session: {SESSION_ID}"
    ));
    assert_eq!(analysis.error_type, AuthErrorKind::Session);
    assert_eq!(analysis.normalized_error.code, CODE_SESSION_EXPIRED);
    assert_eq!(
        analysis.session_context.unwrap().session_id.as_deref(),
        Some(SESSION_ID)
    );
}

#[tokio::test]
async fn generic_failure_on_connected_wallet_disconnects() {
    let wallet = FakeWallet::default();

    let outcome = handle_authentication_error("Internal JSON-RPC error.", &wallet, true).await;
    assert_eq!(outcome.error.code, CODE_SIGNATURE_FAILED);
    assert_eq!(
        outcome.recovery,
        RecoveryResult {
            should_disconnect: true,
            should_show_error: true,
            error_delay_ms: 2_000,
            cleanup_performed: false,
        }
    );
    assert_eq!(wallet.disconnects.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn repeated_timeout_recovery_is_stable() {
    let wallet = FakeWallet::default();
    let raw = "Personal sign request timed out after 15 seconds";

    let first = handle_authentication_error(raw, &wallet, true).await;
    let second = handle_authentication_error(raw, &wallet, true).await;
    assert_eq!(first.recovery, second.recovery);
    assert_eq!(wallet.disconnects.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn flow_recovers_and_schedules_feedback() {
    let config = AuthConfig::default();
    let inbox = Arc::new(Inbox::default());
    let flow = AuthenticationFlow::new(&config, inbox.clone());
    let wallet = FakeWallet::default()
        .personal(Step::Reject("Internal JSON-RPC error."))
        .typed(Step::Reject("Internal JSON-RPC error."));

    let outcome = flow
        .authenticate(&request(), &wallet, None, &wallet, true)
        .await
        .unwrap();
    let AuthenticationOutcome::Recovered {
        error,
        recovery,
        presentation,
    } = outcome
    else {
        panic!("expected a recovered failure");
    };
    assert_eq!(error.code, CODE_SIGNATURE_FAILED);
    assert!(recovery.should_disconnect);
    assert_eq!(wallet.disconnects.load(Ordering::SeqCst), 1);

    let Presentation::Scheduled(handle) = presentation else {
        panic!("expected delayed feedback");
    };
    handle.await.unwrap();
    let shown = inbox.0.lock().unwrap();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].title, "Authentication Failed");
    assert_eq!(shown[0].hints.delay_ms, 2_000);
}
