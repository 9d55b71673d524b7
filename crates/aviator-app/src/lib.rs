#![warn(missing_docs)]
//! # aviator-app
//!
//! ## Purpose
//! Orchestrates connectivity, authorization, catalog, launch and push state for
//! the `aviator` remote client.
//!
//! ## Responsibilities
//! - Own the single mutable [`SessionState`] and every transition applied to it.
//! - Keep polling running exactly while the server is online and the session
//!   is authorized.
//! - Maintain the push channel with a fixed-delay reconnect.
//! - Project state changes into [`aviator_ui::ViewState`] and notify observers.
//! - Drive everything from one event loop fed by timers, push events and user
//!   commands.
//!
//! ## Data flow
//! [`runtime::serve`] multiplexes timer ticks, push lifecycle events,
//! [`UserCommand`]s and request completions -> [`SessionController::dispatch`]
//! -> state transition -> one [`SessionUpdate`] per changed view part, plus
//! [`Request`]s that run on their own tasks through the
//! [`aviator_transport::LauncherApi`] seam and come back as completions.
//!
//! ## Ownership and lifetimes
//! The controller is the only writer of session state. Each event is applied
//! to completion without awaiting, so transitions never interleave while
//! requests overlap freely. Completions from before a reload are dropped.
//!
//! ## Error model
//! Request failures are classified per call site and absorbed into state and
//! notifications. Only startup failures surface as [`AppError`].
//!
//! ## Security and privacy notes
//! - PINs are passed straight to the auth client and never logged.
//! - Session cookies stay inside the HTTP client.

pub mod command;
pub mod config;
pub mod console;
pub mod controller;
pub mod observer;
pub mod push;
pub mod request;
pub mod runtime;
pub mod session;

use aviator_core::CoreError;
use aviator_poll::PollError;
use aviator_transport::TransportError;
use thiserror::Error;

pub use command::{UserCommand, parse_command};
pub use config::ClientConfig;
pub use controller::{SessionController, SessionEvent, SessionSettings};
pub use observer::{SessionUpdate, SubscriptionId};
pub use push::PushState;
pub use request::{Completion, Request, RequestExecutor};
pub use session::{Reachability, SessionState};

/// Build-time application version loaded from root `VERSION` file.
pub const APP_VERSION: &str = env!("AVIATOR_VERSION");

/// Returns the app version sourced from root `VERSION`.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// App integration error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Origin or payload model error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    /// Invalid polling configuration.
    #[error("poll error: {0}")]
    Poll(#[from] PollError),
    /// HTTP client setup failure.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    /// Unrecognized console command.
    #[error("invalid command: {0}")]
    Command(String),
}
