#![warn(missing_docs)]
//! # aviator-transport
//!
//! ## Purpose
//! Talks to the launcher host over HTTP and the real-time push channel.
//!
//! ## Responsibilities
//! - Define the [`LauncherApi`] request surface used by the session controller.
//! - Implement it (and [`aviator_auth::AuthTransport`]) over `reqwest`.
//! - Define the [`PushConnector`] seam and a `tokio-tungstenite` implementation
//!   that reports connection lifecycle as [`PushEvent`] values.
//!
//! ## Data flow
//! Controller calls [`LauncherApi`] -> [`HttpLauncherApi`] issues the request ->
//! body is decoded by `aviator-core` -> owned model values come back.
//! Push frames never reach the controller as data: each one becomes a
//! [`PushEventKind::Message`] trigger on the event loop channel.
//!
//! ## Ownership and lifetimes
//! The HTTP client is cheaply cloneable and shared behind `Arc`. Each push
//! connection runs in its own task, owned by the returned [`PushHandle`].
//!
//! ## Error model
//! Every request failure is mapped onto [`aviator_core::ApiError`]. Building the
//! HTTP client can fail with [`TransportError`].
//!
//! ## Security and privacy notes
//! Session cookies set by `/api/auth` are kept in the client's in-memory cookie
//! store only. PIN bodies are never logged.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use aviator_auth::AuthTransport;
use aviator_core::{
    ApiError, ApiRoutes, AppEntry, AuthRequest, ProcessStatusMap, ServerInfo, decode_catalog,
    decode_process_statuses, decode_server_info,
};
use futures_util::StreamExt;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};
use url::Url;

/// Reference per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
/// Reference push reconnect delay.
pub const DEFAULT_PUSH_RECONNECT_DELAY_MS: u64 = 3_000;

/// Request surface of the launcher host.
#[async_trait]
pub trait LauncherApi: Send + Sync {
    /// `GET /api/info`.
    async fn server_info(&self) -> Result<ServerInfo, ApiError>;

    /// `GET /api/apps`.
    async fn apps(&self) -> Result<Vec<AppEntry>, ApiError>;

    /// `GET /api/process-statuses`.
    async fn process_statuses(&self) -> Result<ProcessStatusMap, ApiError>;

    /// `POST /api/launch/{id}`.
    async fn launch(&self, app_id: &str) -> Result<(), ApiError>;
}

/// `reqwest`-backed implementation of [`LauncherApi`] and [`AuthTransport`].
#[derive(Debug)]
pub struct HttpLauncherApi {
    client: reqwest::Client,
    routes: ApiRoutes,
    cache_buster: AtomicU64,
}

impl HttpLauncherApi {
    /// Builds a client with an in-memory cookie store and `request_timeout`.
    ///
    /// # Errors
    /// Returns [`TransportError::ClientBuild`] when the TLS backend cannot be
    /// initialized.
    pub fn new(routes: ApiRoutes, request_timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(request_timeout)
            .build()
            .map_err(TransportError::ClientBuild)?;

        Ok(Self {
            client,
            routes,
            cache_buster: AtomicU64::new(0),
        })
    }

    /// Endpoints this client talks to.
    pub fn routes(&self) -> &ApiRoutes {
        &self.routes
    }

    async fn get(&self, url: Url) -> Result<Vec<u8>, ApiError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(network_failure)?;
        read_success(response).await
    }

    async fn post(&self, url: Url, body: Option<&AuthRequest>) -> Result<Vec<u8>, ApiError> {
        let mut request = self.client.post(url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await.map_err(network_failure)?;
        read_success(response).await
    }
}

#[async_trait]
impl LauncherApi for HttpLauncherApi {
    async fn server_info(&self) -> Result<ServerInfo, ApiError> {
        let stamp = self.cache_buster.fetch_add(1, Ordering::Relaxed);
        let body = self.get(self.routes.info(stamp)).await?;
        Ok(decode_server_info(&body)?)
    }

    async fn apps(&self) -> Result<Vec<AppEntry>, ApiError> {
        let body = self.get(self.routes.apps()).await?;
        Ok(decode_catalog(&body)?)
    }

    async fn process_statuses(&self) -> Result<ProcessStatusMap, ApiError> {
        let body = self.get(self.routes.process_statuses()).await?;
        Ok(decode_process_statuses(&body)?)
    }

    async fn launch(&self, app_id: &str) -> Result<(), ApiError> {
        self.post(self.routes.launch(app_id), None).await.map(drop)
    }
}

#[async_trait]
impl AuthTransport for HttpLauncherApi {
    async fn submit_pin(&self, request: &AuthRequest) -> Result<(), ApiError> {
        self.post(self.routes.auth(), Some(request)).await.map(drop)
    }

    async fn end_session(&self) -> Result<(), ApiError> {
        self.post(self.routes.logout(), None).await.map(drop)
    }
}

async fn read_success(response: reqwest::Response) -> Result<Vec<u8>, ApiError> {
    let status = response.status();
    let body = response.bytes().await.map_err(network_failure)?;
    if status.is_success() {
        Ok(body.to_vec())
    } else {
        debug!(status = status.as_u16(), "request answered with failure status");
        Err(ApiError::from_status(status.as_u16(), &body))
    }
}

fn network_failure(error: reqwest::Error) -> ApiError {
    ApiError::Network(error.to_string())
}

/// Fixed-delay, unbounded reconnect policy for the push channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Delay between a close/error and the next connect attempt.
    pub delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(DEFAULT_PUSH_RECONNECT_DELAY_MS),
        }
    }
}

/// Identifies one push connection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

/// Lifecycle event of one push connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushEvent {
    /// Attempt the event belongs to.
    pub connection: ConnectionId,
    /// What happened.
    pub kind: PushEventKind,
}

/// Kinds of push lifecycle events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushEventKind {
    /// Handshake completed.
    Opened,
    /// A frame arrived; its content is irrelevant.
    Message,
    /// Peer closed or the stream ended.
    Closed,
    /// Connect or read failed.
    Error(String),
}

/// Live push connection owned by the session controller.
pub trait PushHandle: Send {
    /// Forcibly tears the connection down. Idempotent.
    fn close(&mut self);
}

/// Opens push connections.
pub trait PushConnector: Send + Sync {
    /// Starts connecting to `endpoint`; lifecycle is reported as [`PushEvent`]s
    /// tagged with `connection`.
    fn open(&self, endpoint: &Url, connection: ConnectionId) -> Box<dyn PushHandle>;
}

/// `tokio-tungstenite` push connector.
#[derive(Debug, Clone)]
pub struct WsPushConnector {
    events: UnboundedSender<PushEvent>,
}

impl WsPushConnector {
    /// Creates a connector reporting on `events`.
    ///
    /// Must be used from within a tokio runtime.
    pub fn new(events: UnboundedSender<PushEvent>) -> Self {
        Self { events }
    }
}

impl PushConnector for WsPushConnector {
    fn open(&self, endpoint: &Url, connection: ConnectionId) -> Box<dyn PushHandle> {
        let events = self.events.clone();
        let endpoint = endpoint.to_string();
        let task = tokio::spawn(async move {
            let emit = |kind: PushEventKind| {
                let _ = events.send(PushEvent { connection, kind });
            };

            let mut stream = match connect_async(endpoint.as_str()).await {
                Ok((stream, _response)) => stream,
                Err(error) => {
                    warn!(connection = connection.0, "push connect failed: {error}");
                    emit(PushEventKind::Error(error.to_string()));
                    return;
                }
            };
            emit(PushEventKind::Opened);

            while let Some(frame) = stream.next().await {
                match frame {
                    Ok(Message::Text(_) | Message::Binary(_)) => emit(PushEventKind::Message),
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(error) => {
                        emit(PushEventKind::Error(error.to_string()));
                        return;
                    }
                }
            }
            emit(PushEventKind::Closed);
        });

        Box::new(WsPushHandle { task })
    }
}

struct WsPushHandle {
    task: JoinHandle<()>,
}

impl PushHandle for WsPushHandle {
    fn close(&mut self) {
        self.task.abort();
    }
}

impl Drop for WsPushHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Transport setup error type.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP client could not be constructed.
    #[error("http client build failed: {0}")]
    ClientBuild(reqwest::Error),
}
