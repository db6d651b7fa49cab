//! When and what to tell the user after a failed authentication.
//!
//! Rendering belongs to the host application behind [`UserNotifier`]; this
//! module only builds the message content and decides its timing.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;

use crate::error::{
    AuthError, CODE_CONNECTOR_DISCONNECTED, CODE_SESSION_EXPIRED, CODE_SIGNATURE_TIMEOUT,
    CODE_USER_REJECTED,
};
use crate::recovery::RecoveryResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayHints {
    /// Delay already applied before the message was handed over.
    pub delay_ms: u64,
    /// How long the renderer should keep the message visible.
    pub visibility_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserMessage {
    pub kind: MessageKind,
    pub title: &'static str,
    pub body: String,
    pub hints: DisplayHints,
}

impl UserMessage {
    pub fn for_error(error: &AuthError, recovery: &RecoveryResult, visibility: Duration) -> Self {
        let (kind, title) = match error.code {
            CODE_SESSION_EXPIRED => (MessageKind::Error, "Wallet Session Expired"),
            CODE_SIGNATURE_TIMEOUT => (MessageKind::Error, "Request Timed Out"),
            CODE_CONNECTOR_DISCONNECTED => (MessageKind::Error, "Wallet Disconnected"),
            CODE_USER_REJECTED => (MessageKind::Warning, "Signature Cancelled"),
            _ => (MessageKind::Error, "Authentication Failed"),
        };
        Self {
            kind,
            title,
            body: error.user_message.to_string(),
            hints: DisplayHints {
                delay_ms: recovery.error_delay_ms,
                visibility_ms: visibility.as_millis() as u64,
            },
        }
    }
}

/// Host-side renderer (toast, banner, log line...).
pub trait UserNotifier: Send + Sync {
    fn display(&self, message: UserMessage);
}

/// What [`FeedbackScheduler::present_error`] decided.
#[derive(Debug)]
pub enum Presentation {
    /// `should_show_error` was false.
    Suppressed,
    Immediate,
    /// Display runs on a spawned task once the delay elapses.
    Scheduled(JoinHandle<()>),
}

impl Presentation {
    pub fn is_suppressed(&self) -> bool {
        matches!(self, Self::Suppressed)
    }
}

#[derive(Clone)]
pub struct FeedbackScheduler {
    notifier: Arc<dyn UserNotifier>,
    visibility: Duration,
}

impl FeedbackScheduler {
    pub fn new(notifier: Arc<dyn UserNotifier>, visibility: Duration) -> Self {
        Self {
            notifier,
            visibility,
        }
    }

    /// Must be called from within a tokio runtime when the recovery asks
    /// for a delay.
    pub fn present_error(&self, error: &AuthError, recovery: &RecoveryResult) -> Presentation {
        if !recovery.should_show_error {
            tracing::debug!(code = error.code, "error display suppressed");
            return Presentation::Suppressed;
        }

        let message = UserMessage::for_error(error, recovery, self.visibility);
        if recovery.error_delay_ms == 0 {
            self.notifier.display(message);
            return Presentation::Immediate;
        }

        let delay = recovery.error_delay();
        let notifier = Arc::clone(&self.notifier);
        tracing::debug!(
            code = error.code,
            delay_ms = recovery.error_delay_ms,
            "error display scheduled"
        );
        Presentation::Scheduled(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            notifier.display(message);
        }))
    }
}
