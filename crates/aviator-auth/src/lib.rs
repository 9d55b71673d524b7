#![warn(missing_docs)]
//! # aviator-auth
//!
//! ## Purpose
//! Implements the PIN authorization gate for the `aviator` client.
//!
//! ## Responsibilities
//! - Track whether the current session is authorized.
//! - Decide when the credential-entry surface is shown or hidden.
//! - Submit PINs and session invalidation through an injectable transport.
//!
//! ## Data flow
//! Liveness check yields [`aviator_core::ServerInfo`] ->
//! [`AuthorizationGate::on_server_info`] shows or hides the gate -> user enters
//! a PIN -> [`AuthClient::submit`] -> gate accepts or re-prompts.
//!
//! ## Ownership and lifetimes
//! The gate owns only its state enum; credentials are owned by the caller and
//! borrowed for the duration of one submission.
//!
//! ## Error model
//! Rejections are an ordinary [`CredentialOutcome`]. Blank PINs and transport
//! failures are reported as [`AuthError`].
//!
//! ## Security and privacy notes
//! [`PinCredential`] never prints its value. This crate does not log.
//!
//! ## Example
//! ```rust
//! use aviator_auth::{AuthorizationGate, GateState};
//!
//! let gate = AuthorizationGate::new();
//! assert!(matches!(gate.state(), GateState::Unknown));
//! assert!(!gate.is_authorized());
//! ```

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use aviator_core::{
    ApiError, AuthRequest, FailureClass, RequestContext, ServerInfo, classify_api_error,
};
use thiserror::Error;

/// PIN typed into the credential-entry surface.
#[derive(Clone, PartialEq, Eq)]
pub struct PinCredential {
    pin: String,
}

impl PinCredential {
    /// Creates a validated credential.
    ///
    /// # Errors
    /// Returns [`AuthError::EmptyCredential`] for a blank PIN.
    pub fn new(pin: impl Into<String>) -> Result<Self, AuthError> {
        let pin = pin.into();
        if pin.trim().is_empty() {
            return Err(AuthError::EmptyCredential);
        }
        Ok(Self { pin })
    }

    fn to_request(&self) -> AuthRequest {
        AuthRequest {
            pin: self.pin.clone(),
        }
    }
}

impl fmt::Debug for PinCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PinCredential(<redacted>)")
    }
}

/// Authorization status of the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// No server answer has been seen yet.
    Unknown,
    /// Server does not require a PIN.
    NotRequired,
    /// Credential-entry surface is shown.
    Prompting {
        /// Last submitted PIN was rejected.
        rejected: bool,
    },
    /// PIN was accepted for this session.
    Authorized,
}

/// Visible effect of one gate transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateTransition {
    /// Surface visibility did not change.
    Unchanged,
    /// Surface became visible; main view must be suppressed.
    Shown,
    /// Surface was hidden; main view may be restored.
    Hidden,
}

/// Gate state machine with explicit legal transitions.
#[derive(Debug, Clone)]
pub struct AuthorizationGate {
    state: GateState,
}

impl AuthorizationGate {
    /// Creates a gate in `Unknown` state.
    pub fn new() -> Self {
        Self {
            state: GateState::Unknown,
        }
    }

    /// Returns current gate state.
    pub fn state(&self) -> GateState {
        self.state
    }

    /// Returns `true` when protected endpoints may be used.
    pub fn is_authorized(&self) -> bool {
        matches!(self.state, GateState::NotRequired | GateState::Authorized)
    }

    /// Returns `true` while the credential-entry surface is shown.
    pub fn surface_visible(&self) -> bool {
        matches!(self.state, GateState::Prompting { .. })
    }

    /// Applies the session status reported by a liveness check.
    pub fn on_server_info(&mut self, info: &ServerInfo) -> GateTransition {
        let next = if !info.auth_required {
            GateState::NotRequired
        } else if info.is_authorized {
            GateState::Authorized
        } else if let GateState::Prompting { rejected } = self.state {
            GateState::Prompting { rejected }
        } else {
            GateState::Prompting { rejected: false }
        };
        self.transition(next)
    }

    /// Server accepted the submitted PIN.
    pub fn on_credential_accepted(&mut self) -> GateTransition {
        self.transition(GateState::Authorized)
    }

    /// Server rejected the submitted PIN; the surface stays open.
    pub fn on_credential_rejected(&mut self) -> GateTransition {
        self.transition(GateState::Prompting { rejected: true })
    }

    /// A protected endpoint answered 401.
    pub fn on_unauthorized(&mut self) -> GateTransition {
        if self.surface_visible() {
            return GateTransition::Unchanged;
        }
        self.transition(GateState::Prompting { rejected: false })
    }

    /// Forgets everything, as on a full client reload.
    pub fn reset(&mut self) {
        self.state = GateState::Unknown;
    }

    fn transition(&mut self, next: GateState) -> GateTransition {
        let was_visible = self.surface_visible();
        self.state = next;
        match (was_visible, self.surface_visible()) {
            (false, true) => GateTransition::Shown,
            (true, false) => GateTransition::Hidden,
            _ => GateTransition::Unchanged,
        }
    }
}

impl Default for AuthorizationGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Abstract transport used by the auth client.
#[async_trait]
pub trait AuthTransport: Send + Sync {
    /// Posts a PIN; `Ok` means the server accepted it.
    async fn submit_pin(&self, request: &AuthRequest) -> Result<(), ApiError>;

    /// Asks the server to invalidate the current session.
    async fn end_session(&self) -> Result<(), ApiError>;
}

/// Result of a PIN submission that reached the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialOutcome {
    /// Session is now authorized.
    Accepted,
    /// PIN was refused; prompt again.
    Rejected,
}

/// Auth client that validates credentials and executes the PIN flow.
#[derive(Clone)]
pub struct AuthClient {
    transport: Arc<dyn AuthTransport>,
}

impl AuthClient {
    /// Creates an auth client over `transport`.
    pub fn new(transport: Arc<dyn AuthTransport>) -> Self {
        Self { transport }
    }

    /// Submits one PIN.
    ///
    /// # Errors
    /// Returns [`AuthError::Transport`] when the request never reached a
    /// verdict. Any non-2xx answer is a [`CredentialOutcome::Rejected`].
    pub async fn submit(&self, credential: &PinCredential) -> Result<CredentialOutcome, AuthError> {
        match self.transport.submit_pin(&credential.to_request()).await {
            Ok(()) => Ok(CredentialOutcome::Accepted),
            Err(error) => match classify_api_error(RequestContext::Credential, &error) {
                FailureClass::SurfaceGeneric => Err(AuthError::Transport(error.to_string())),
                _ => Ok(CredentialOutcome::Rejected),
            },
        }
    }

    /// Requests server-side session invalidation.
    ///
    /// # Errors
    /// Returns [`AuthError::Transport`] for any failure.
    pub async fn logout(&self) -> Result<(), AuthError> {
        self.transport
            .end_session()
            .await
            .map_err(|error| AuthError::Transport(error.to_string()))
    }
}

/// Errors produced by auth client logic.
#[derive(Debug, Error)]
pub enum AuthError {
    /// PIN is blank.
    #[error("pin must be non-empty")]
    EmptyCredential,
    /// Request failed before the server gave a verdict.
    #[error("auth transport failure: {0}")]
    Transport(String),
}

#[cfg(test)]
mod tests {
    //! Unit tests for gate transitions.

    use super::*;

    fn info(auth_required: bool, is_authorized: bool) -> ServerInfo {
        ServerInfo {
            hostname: "desk".to_string(),
            version: None,
            auth_required,
            is_authorized,
        }
    }

    #[test]
    fn gate_opens_for_unauthorized_session_and_hides_on_accept() {
        let mut gate = AuthorizationGate::new();
        assert_eq!(gate.on_server_info(&info(true, false)), GateTransition::Shown);
        assert!(!gate.is_authorized());

        assert_eq!(gate.on_credential_rejected(), GateTransition::Unchanged);
        assert_eq!(gate.state(), GateState::Prompting { rejected: true });

        assert_eq!(gate.on_credential_accepted(), GateTransition::Hidden);
        assert!(gate.is_authorized());
    }

    #[test]
    fn repeated_liveness_keeps_rejection_flag() {
        let mut gate = AuthorizationGate::new();
        gate.on_server_info(&info(true, false));
        gate.on_credential_rejected();
        assert_eq!(gate.on_server_info(&info(true, false)), GateTransition::Unchanged);
        assert_eq!(gate.state(), GateState::Prompting { rejected: true });
    }

    #[test]
    fn blank_pin_is_rejected_locally() {
        assert!(matches!(
            PinCredential::new("   "),
            Err(AuthError::EmptyCredential)
        ));
        let pin = PinCredential::new("1234").expect("pin is valid");
        assert!(!format!("{pin:?}").contains("1234"));
    }
}
