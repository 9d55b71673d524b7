//! Network calls issued by the controller and their completions.
//!
//! The controller never awaits the network itself. It returns [`Request`]
//! values, a [`RequestExecutor`] performs them, and each [`Completion`] is fed
//! back through [`crate::SessionController::dispatch`].

use std::sync::Arc;

use aviator_auth::{AuthClient, AuthError, CredentialOutcome, PinCredential};
use aviator_core::{ApiError, AppEntry, ProcessStatusMap, ServerInfo};
use aviator_transport::LauncherApi;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

/// Why a liveness check was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivenessPurpose {
    /// Periodic check or offline probe.
    Poll,
    /// First check of a session bootstrap.
    Bootstrap,
    /// User-requested retry.
    Retry {
        /// Reachability when the retry was issued.
        was_online: bool,
    },
}

/// Why the catalog is being fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogPurpose {
    /// Plain refresh.
    Refresh,
    /// The push channel announced a change.
    Announced,
}

/// One call to the launcher host.
#[derive(Debug, Clone)]
pub enum Call {
    /// `GET /api/info`.
    Liveness(LivenessPurpose),
    /// `GET /api/process-statuses`.
    ProcessStatuses,
    /// `GET /api/apps`.
    Catalog(CatalogPurpose),
    /// `POST /api/launch/{id}`.
    Launch {
        /// Entry id.
        id: String,
        /// Display name for notifications.
        name: String,
    },
    /// `POST /api/auth`.
    Credential(PinCredential),
    /// `POST /api/logout`.
    Logout,
}

/// A call tagged with the session generation that issued it.
#[derive(Debug, Clone)]
pub struct Request {
    generation: u64,
    call: Call,
}

impl Request {
    pub(crate) fn new(generation: u64, call: Call) -> Self {
        Self { generation, call }
    }

    /// The call to perform.
    pub fn call(&self) -> &Call {
        &self.call
    }
}

/// Result of one call.
#[derive(Debug)]
pub enum Outcome {
    /// Liveness answer.
    Liveness(LivenessPurpose, Result<ServerInfo, ApiError>),
    /// Running flags.
    ProcessStatuses(Result<ProcessStatusMap, ApiError>),
    /// Catalog entries.
    Catalog(CatalogPurpose, Result<Vec<AppEntry>, ApiError>),
    /// Launch acknowledgement.
    Launch {
        /// Entry id.
        id: String,
        /// Display name for notifications.
        name: String,
        /// Server answer.
        result: Result<(), ApiError>,
    },
    /// PIN verdict.
    Credential(Result<CredentialOutcome, AuthError>),
    /// Logout acknowledgement.
    Logout(Result<(), AuthError>),
}

impl Outcome {
    /// `true` when the call got the answer it asked for.
    pub fn succeeded(&self) -> bool {
        match self {
            Self::Liveness(_, result) => result.is_ok(),
            Self::ProcessStatuses(result) => result.is_ok(),
            Self::Catalog(_, result) => result.is_ok(),
            Self::Launch { result, .. } => result.is_ok(),
            Self::Credential(result) => matches!(result, Ok(CredentialOutcome::Accepted)),
            Self::Logout(result) => result.is_ok(),
        }
    }
}

/// Outcome of a [`Request`], still tagged with its generation.
#[derive(Debug)]
pub struct Completion {
    pub(crate) generation: u64,
    pub(crate) outcome: Outcome,
}

impl Completion {
    /// The call result.
    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }
}

/// Performs requests against the launcher host.
#[derive(Clone)]
pub struct RequestExecutor {
    api: Arc<dyn LauncherApi>,
    auth: AuthClient,
}

impl RequestExecutor {
    pub(crate) fn new(api: Arc<dyn LauncherApi>, auth: AuthClient) -> Self {
        Self { api, auth }
    }

    /// Performs one request and waits for its answer.
    pub async fn perform(&self, request: Request) -> Completion {
        let outcome = match request.call {
            Call::Liveness(purpose) => Outcome::Liveness(purpose, self.api.server_info().await),
            Call::ProcessStatuses => Outcome::ProcessStatuses(self.api.process_statuses().await),
            Call::Catalog(purpose) => Outcome::Catalog(purpose, self.api.apps().await),
            Call::Launch { id, name } => {
                let result = self.api.launch(&id).await;
                Outcome::Launch { id, name, result }
            }
            Call::Credential(credential) => {
                Outcome::Credential(self.auth.submit(&credential).await)
            }
            Call::Logout => Outcome::Logout(self.auth.logout().await),
        };
        Completion {
            generation: request.generation,
            outcome,
        }
    }

    /// Performs `request` on its own task and sends the completion to `done`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(&self, request: Request, done: UnboundedSender<Completion>) {
        let executor = self.clone();
        tokio::spawn(async move {
            let completion = executor.perform(request).await;
            if done.send(completion).is_err() {
                debug!("event loop gone; completion dropped");
            }
        });
    }
}
