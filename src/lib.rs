//! SuperPool wallet authentication core.
//!
//! Obtains a wallet signature for a backend-issued challenge, picking the
//! signing strategy from the active connector, and turns every failure into
//! a single recovery decision (disconnect, show an error, delay, cleanup).
//!
//! The wallet itself, the identity provider and message rendering are
//! injected through traits; nothing here talks to a network.

pub mod cleanup;
pub mod config;
pub mod error;
pub mod feedback;
pub mod flow;
pub mod observability;
pub mod recovery;
pub mod signing;
pub mod timing;

pub use cleanup::{CleanupCoordinator, ConnectionState, IdentityProvider};
pub use config::AuthConfig;
pub use error::{AuthError, AuthErrorKind, Error, Result, SigningError, WalletError};
pub use feedback::{FeedbackScheduler, Presentation, UserMessage, UserNotifier};
pub use flow::{AuthenticationFlow, AuthenticationOutcome};
pub use recovery::{
    RecoveryDispatcher, RecoveryOutcome, RecoveryResult, WalletDisconnect, analyze,
    handle_authentication_error,
};
pub use signing::{
    AuthChallenge, Connector, SignatureRequest, SignatureResult, SignatureService, SignatureType,
    WalletSigner,
};
