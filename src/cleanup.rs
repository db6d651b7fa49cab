//! Identity-provider sign-out tied to wallet connection changes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::AuthConfig;
use crate::error::CleanupError;
use crate::timing::retry_with_backoff;

/// Backend identity session that must not outlive the wallet connection.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_out(&self) -> anyhow::Result<()>;
}

/// Wallet connection as seen by the host's connection layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected(String),
}

impl ConnectionState {
    pub fn address(&self) -> Option<&str> {
        match self {
            Self::Connected(address) => Some(address),
            _ => None,
        }
    }
}

pub struct CleanupCoordinator {
    identity: Arc<dyn IdentityProvider>,
    provider: String,
    max_attempts: u32,
    base_delay: Duration,
}

impl CleanupCoordinator {
    pub fn new(identity: Arc<dyn IdentityProvider>, config: &AuthConfig) -> Self {
        Self {
            identity,
            provider: config.cleanup.identity_provider.clone(),
            max_attempts: config.cleanup.max_attempts,
            base_delay: config.cleanup.base_delay,
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Sign out when the wallet went away or switched accounts while an
    /// identity session exists. Returns whether sign-out ran.
    pub async fn on_connection_change(
        &self,
        previous: &ConnectionState,
        current: &ConnectionState,
        identity_signed_in: bool,
    ) -> Result<bool, CleanupError> {
        if !identity_signed_in {
            return Ok(false);
        }

        let reason = match (previous.address(), current) {
            (Some(_), ConnectionState::Disconnected) => "wallet disconnected",
            (Some(before), ConnectionState::Connected(after))
                if !before.eq_ignore_ascii_case(after) =>
            {
                "wallet account switched"
            }
            _ => return Ok(false),
        };

        tracing::info!(provider = %self.provider, reason, "signing out identity session");
        self.sign_out().await?;
        Ok(true)
    }

    pub async fn sign_out(&self) -> Result<(), CleanupError> {
        let label = format!("{} sign-out", self.provider);
        retry_with_backoff(
            || self.identity.sign_out(),
            self.max_attempts,
            self.base_delay,
            &label,
        )
        .await
        .map_err(|err| {
            tracing::warn!(
                provider = %self.provider,
                attempts = err.attempts,
                error = %err.last_error,
                "identity sign-out failed"
            );
            CleanupError::Failed {
                provider: self.provider.clone(),
                reason: err.last_error,
            }
        })
    }
}
