//! Biometric authentication boundary.
//!
//! Biometric prompts usually have to run on a specific execution context (the
//! UI thread) while signing is requested from elsewhere. Signing therefore
//! treats authentication as an asynchronous request: it hands an
//! [`AuthRequest`] to a [`BiometricAuthenticator`] and suspends until an
//! [`AuthOutcome`] comes back. The core enforces no timeout and never retries.
//!
//! [`ChannelAuthenticator`] is the stock implementation: requests travel over
//! a channel to whichever task owns the prompt, which answers through
//! [`PendingAuth`].

use std::fmt;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::config::BiometricPrompt;

/// Opaque proof of a successful biometric check.
///
/// Handed to the hardware backend so it can unlock the private key operation
/// (the platform's authenticated crypto object).
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(Vec<u8>);

impl AuthToken {
    /// Wrap platform token bytes.
    #[must_use]
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Borrow the token bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthToken([{} bytes])", self.0.len())
    }
}

/// A request to authenticate the user before a key is used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthRequest {
    /// Key whose use is being authorized.
    pub key_id: String,
    /// Prompt text to display.
    pub prompt: BiometricPrompt,
}

/// Result of a biometric check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// The user authenticated.
    Authenticated(AuthToken),
    /// Authentication failed, with the platform's reason.
    Failed(String),
    /// The user or the platform cancelled the prompt.
    Cancelled,
}

/// Collaborator that runs the biometric prompt.
#[async_trait]
pub trait BiometricAuthenticator: Send + Sync {
    /// Authenticate the user for `request`.
    ///
    /// Implementations decide where the prompt runs and how long it may take.
    async fn authenticate(&self, request: AuthRequest) -> AuthOutcome;
}

/// An authentication request waiting for the prompt owner to answer.
#[derive(Debug)]
pub struct PendingAuth {
    request: AuthRequest,
    responder: oneshot::Sender<AuthOutcome>,
}

impl PendingAuth {
    /// The request to present.
    #[must_use]
    pub fn request(&self) -> &AuthRequest {
        &self.request
    }

    /// Whether the requesting call has gone away (its future was dropped).
    #[must_use]
    pub fn is_abandoned(&self) -> bool {
        self.responder.is_closed()
    }

    /// Report a successful authentication.
    pub fn approve(self, token: AuthToken) {
        self.complete(AuthOutcome::Authenticated(token));
    }

    /// Report a failed authentication.
    pub fn reject(self, reason: impl Into<String>) {
        self.complete(AuthOutcome::Failed(reason.into()));
    }

    /// Report a cancelled prompt.
    pub fn cancel(self) {
        self.complete(AuthOutcome::Cancelled);
    }

    fn complete(self, outcome: AuthOutcome) {
        let key_id = self.request.key_id;
        if self.responder.send(outcome).is_err() {
            debug!(key_id = %key_id, "Authentication answered after the request was dropped");
        }
    }
}

/// [`BiometricAuthenticator`] that forwards requests over a channel.
///
/// The receiving half lives on the execution context allowed to show the
/// prompt. A closed channel fails the request; an unanswered request dropped
/// by the receiver counts as cancelled.
#[derive(Debug, Clone)]
pub struct ChannelAuthenticator {
    sender: mpsc::Sender<PendingAuth>,
}

impl ChannelAuthenticator {
    /// Create an authenticator and the receiver the prompt owner drains.
    #[must_use]
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<PendingAuth>) {
        let (sender, receiver) = mpsc::channel(buffer.max(1));
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl BiometricAuthenticator for ChannelAuthenticator {
    async fn authenticate(&self, request: AuthRequest) -> AuthOutcome {
        let key_id = request.key_id.clone();
        let (responder, answer) = oneshot::channel();

        if self
            .sender
            .send(PendingAuth { request, responder })
            .await
            .is_err()
        {
            debug!(key_id = %key_id, "Authentication context is gone");
            return AuthOutcome::Failed("authentication context is not running".into());
        }

        debug!(key_id = %key_id, "Waiting for biometric authentication");
        answer.await.unwrap_or(AuthOutcome::Cancelled)
    }
}
