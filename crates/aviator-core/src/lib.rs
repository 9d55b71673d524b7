#![warn(missing_docs)]
//! # aviator-core
//!
//! ## Purpose
//! Defines the wire data model shared by every `aviator` client crate.
//!
//! ## Responsibilities
//! - Represent server identity, catalog entries and process statuses.
//! - Derive every API and push endpoint from a single serving origin.
//! - Classify API failures into the policy the session controller applies.
//!
//! ## Data flow
//! Transport fetches raw JSON -> `decode_*` helpers produce [`ServerInfo`],
//! [`AppEntry`] lists and [`ProcessStatusMap`] values -> session controller
//! replaces its in-memory copies wholesale.
//!
//! ## Ownership and lifetimes
//! All decoded values own their strings and icon buffers so responses can be
//! dropped as soon as decoding finishes.
//!
//! ## Error model
//! Decoding and routing failures return [`CoreError`]. Request failures seen by
//! the client are expressed as [`ApiError`] and mapped to a [`FailureClass`]
//! through [`classify_api_error`].
//!
//! ## Security and privacy notes
//! [`AuthRequest`] redacts the PIN from its `Debug` output.
//!
//! ## Example
//! ```rust
//! use aviator_core::{ApiRoutes, decode_catalog};
//!
//! let routes = ApiRoutes::new("http://192.168.1.20:8000").unwrap();
//! assert_eq!(routes.push().as_str(), "ws://192.168.1.20:8000/ws");
//!
//! let catalog = decode_catalog(br#"[{"id":"a","name":"Alpha"}]"#).unwrap();
//! assert_eq!(catalog[0].name, "Alpha");
//! ```

use std::collections::HashMap;
use std::collections::HashSet;
use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Liveness and identity endpoint.
pub const INFO_PATH: &str = "/api/info";
/// Catalog endpoint.
pub const APPS_PATH: &str = "/api/apps";
/// Process status endpoint.
pub const PROCESS_STATUSES_PATH: &str = "/api/process-statuses";
/// Launch endpoint prefix; the app id is appended as one path segment.
pub const LAUNCH_PATH_PREFIX: &str = "/api/launch/";
/// PIN submission endpoint.
pub const AUTH_PATH: &str = "/api/auth";
/// Session invalidation endpoint.
pub const LOGOUT_PATH: &str = "/api/logout";
/// Real-time push endpoint.
pub const PUSH_PATH: &str = "/ws";

/// Fallback message when a failed launch carries no structured detail.
pub const GENERIC_LAUNCH_ERROR: &str = "Internal error";

/// Server identity and session status returned by the liveness endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    /// Display name of the host machine.
    pub hostname: String,
    /// Server build version, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Whether the server requires PIN authorization.
    #[serde(default)]
    pub auth_required: bool,
    /// Whether the current session is authorized.
    #[serde(default)]
    pub is_authorized: bool,
}

impl ServerInfo {
    /// Returns `true` when the session may use protected endpoints.
    pub fn session_authorized(&self) -> bool {
        !self.auth_required || self.is_authorized
    }
}

/// Decoded application icon bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct AppIcon {
    bytes: Vec<u8>,
}

impl AppIcon {
    /// Wraps raw image bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Decodes a base64 icon string.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidIcon`] when the string is not valid base64.
    pub fn from_base64(encoded: &str) -> Result<Self, CoreError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|error| CoreError::InvalidIcon(error.to_string()))?;
        Ok(Self { bytes })
    }

    /// Raw image bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Re-encodes the icon as base64.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// Returns a `data:` URL suitable for an image element.
    pub fn data_url(&self) -> String {
        format!("data:image/png;base64,{}", self.to_base64())
    }
}

impl fmt::Debug for AppIcon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppIcon")
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// One launchable catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "AppEntryWire", into = "AppEntryWire")]
pub struct AppEntry {
    /// Unique, server-assigned identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Optional decoded icon.
    pub icon: Option<AppIcon>,
}

impl AppEntry {
    /// Creates an entry without an icon.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            icon: None,
        }
    }

    /// Attaches an icon.
    pub fn with_icon(mut self, icon: AppIcon) -> Self {
        self.icon = Some(icon);
        self
    }
}

#[derive(Serialize, Deserialize)]
struct AppEntryWire {
    id: String,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    icon: Option<String>,
}

impl From<AppEntryWire> for AppEntry {
    fn from(wire: AppEntryWire) -> Self {
        // Undecodable icons fall back to the generated placeholder.
        let icon = wire
            .icon
            .filter(|encoded| !encoded.trim().is_empty())
            .and_then(|encoded| AppIcon::from_base64(&encoded).ok());

        Self {
            id: wire.id,
            name: wire.name,
            icon,
        }
    }
}

impl From<AppEntry> for AppEntryWire {
    fn from(entry: AppEntry) -> Self {
        Self {
            id: entry.id,
            name: entry.name,
            icon: entry.icon.map(|icon| icon.to_base64()),
        }
    }
}

/// Mapping from app id to "is running". Missing ids are not running.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessStatusMap(HashMap<String, bool>);

impl ProcessStatusMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` only when `app_id` is present and marked running.
    pub fn is_running(&self, app_id: &str) -> bool {
        self.0.get(app_id).copied().unwrap_or(false)
    }

    /// Number of reported entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when no statuses were reported.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, bool)> for ProcessStatusMap {
    fn from_iter<I: IntoIterator<Item = (K, bool)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(id, running)| (id.into(), running)).collect())
    }
}

/// Error body returned by a failed launch.
///
/// Some server builds report `detail`, others `error`; `detail` wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureBody {
    /// Human-readable failure detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Alternate failure field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FailureBody {
    /// Returns the most specific non-blank message.
    pub fn message(&self) -> Option<String> {
        [&self.detail, &self.error]
            .into_iter()
            .flatten()
            .map(|message| message.trim())
            .find(|message| !message.is_empty())
            .map(str::to_string)
    }
}

/// PIN submission body.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct AuthRequest {
    /// PIN as typed by the user.
    pub pin: String,
}

impl fmt::Debug for AuthRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthRequest")
            .field("pin", &"<redacted>")
            .finish()
    }
}

/// Every client endpoint derived from one serving origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRoutes {
    origin: Url,
    push: Url,
}

impl ApiRoutes {
    /// Parses and validates a serving origin.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidOrigin`] for unparsable URLs or schemes other
    /// than `http`/`https`.
    pub fn new(origin: &str) -> Result<Self, CoreError> {
        let parsed = Url::parse(origin)
            .map_err(|error| CoreError::InvalidOrigin(format!("invalid origin url: {error}")))?;
        Self::from_url(parsed)
    }

    /// Validates an already-parsed origin.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidOrigin`] for schemes other than
    /// `http`/`https` or URLs without a host.
    pub fn from_url(mut origin: Url) -> Result<Self, CoreError> {
        let push_scheme = match origin.scheme() {
            "http" => "ws",
            "https" => "wss",
            other => {
                return Err(CoreError::InvalidOrigin(format!(
                    "origin scheme must be http or https, got {other}"
                )));
            }
        };

        if origin.host_str().is_none() {
            return Err(CoreError::InvalidOrigin("origin has no host".to_string()));
        }

        origin.set_path("/");
        origin.set_query(None);
        origin.set_fragment(None);

        let mut push = origin.clone();
        push.set_scheme(push_scheme).map_err(|()| {
            CoreError::InvalidOrigin(format!("cannot map origin to {push_scheme}"))
        })?;
        push.set_path(PUSH_PATH);

        Ok(Self { origin, push })
    }

    /// Serving origin.
    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Liveness endpoint with a cache-busting `t` parameter.
    pub fn info(&self, cache_buster: u64) -> Url {
        let mut url = self.at(INFO_PATH);
        url.query_pairs_mut()
            .append_pair("t", &cache_buster.to_string());
        url
    }

    /// Catalog endpoint.
    pub fn apps(&self) -> Url {
        self.at(APPS_PATH)
    }

    /// Process status endpoint.
    pub fn process_statuses(&self) -> Url {
        self.at(PROCESS_STATUSES_PATH)
    }

    /// Launch endpoint for one app; the id is percent-encoded as a segment.
    pub fn launch(&self, app_id: &str) -> Url {
        let mut url = self.at(LAUNCH_PATH_PREFIX);
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(app_id);
        }
        url
    }

    /// PIN submission endpoint.
    pub fn auth(&self) -> Url {
        self.at(AUTH_PATH)
    }

    /// Session invalidation endpoint.
    pub fn logout(&self) -> Url {
        self.at(LOGOUT_PATH)
    }

    /// Push endpoint (`ws` for `http` origins, `wss` for `https`).
    pub fn push(&self) -> &Url {
        &self.push
    }

    fn at(&self, path: &str) -> Url {
        let mut url = self.origin.clone();
        url.set_path(path);
        url
    }
}

/// Failure of one client request, following the client error taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Request could not complete (connect, timeout, reset).
    #[error("network failure: {0}")]
    Network(String),
    /// Non-2xx status other than 401.
    #[error("server error {status}: {}", .detail.as_deref().unwrap_or("no detail"))]
    Server {
        /// HTTP status code.
        status: u16,
        /// Structured failure detail, when the body carried one.
        detail: Option<String>,
    },
    /// HTTP 401.
    #[error("unauthorized")]
    Unauthorized,
    /// Response did not match the expected shape.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl ApiError {
    /// Builds an error from a non-2xx status and its raw body.
    pub fn from_status(status: u16, body: &[u8]) -> Self {
        if status == 401 {
            return Self::Unauthorized;
        }

        let detail = serde_json::from_slice::<FailureBody>(body)
            .ok()
            .and_then(|parsed| parsed.message());
        Self::Server { status, detail }
    }

    /// Returns `true` for HTTP 401.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

impl From<CoreError> for ApiError {
    fn from(error: CoreError) -> Self {
        Self::Protocol(error.to_string())
    }
}

/// Which client operation observed a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestContext {
    /// Liveness check or process status poll.
    Polling,
    /// Catalog refetch.
    Catalog,
    /// User-triggered launch.
    Launch,
    /// PIN submission.
    Credential,
}

/// What the session controller does with a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureClass {
    /// Absorbed into the offline state.
    Offline,
    /// Absorbed into the authorization gate.
    Reauthorize,
    /// Shown to the user with this specific message.
    Surface(String),
    /// Shown to the user as a generic network error.
    SurfaceGeneric,
    /// Logged only; previous state is kept.
    Ignore,
}

/// Maps a request failure to the controller's handling policy.
pub fn classify_api_error(context: RequestContext, error: &ApiError) -> FailureClass {
    match (context, error) {
        (_, ApiError::Unauthorized) => FailureClass::Reauthorize,
        (RequestContext::Polling, _) => FailureClass::Offline,
        (RequestContext::Catalog, ApiError::Network(_)) => FailureClass::Offline,
        (RequestContext::Catalog, _) => FailureClass::Ignore,
        (RequestContext::Launch, ApiError::Network(_)) => FailureClass::SurfaceGeneric,
        (RequestContext::Launch, ApiError::Server { detail, .. }) => FailureClass::Surface(
            detail
                .clone()
                .unwrap_or_else(|| GENERIC_LAUNCH_ERROR.to_string()),
        ),
        (RequestContext::Launch, ApiError::Protocol(_)) => {
            FailureClass::Surface(GENERIC_LAUNCH_ERROR.to_string())
        }
        (RequestContext::Credential, ApiError::Network(_)) => FailureClass::SurfaceGeneric,
        (RequestContext::Credential, _) => FailureClass::Reauthorize,
    }
}

/// Decodes a liveness response.
///
/// # Errors
/// Returns [`CoreError::Codec`] for malformed JSON.
pub fn decode_server_info(raw: &[u8]) -> Result<ServerInfo, CoreError> {
    serde_json::from_slice(raw).map_err(CoreError::Codec)
}

/// Decodes a catalog response, preserving server order.
///
/// # Errors
/// Returns [`CoreError::Codec`] for malformed JSON, [`CoreError::EmptyAppId`]
/// for blank ids and [`CoreError::DuplicateAppId`] when ids repeat.
pub fn decode_catalog(raw: &[u8]) -> Result<Vec<AppEntry>, CoreError> {
    let entries: Vec<AppEntry> = serde_json::from_slice(raw).map_err(CoreError::Codec)?;
    ensure_unique_ids(&entries)?;
    Ok(entries)
}

fn ensure_unique_ids(entries: &[AppEntry]) -> Result<(), CoreError> {
    // Invariant:
    // - Tiles are keyed by id, so ids must be non-empty and unique.
    let mut seen = HashSet::with_capacity(entries.len());
    for entry in entries {
        if entry.id.trim().is_empty() {
            return Err(CoreError::EmptyAppId);
        }
        if !seen.insert(entry.id.as_str()) {
            return Err(CoreError::DuplicateAppId(entry.id.clone()));
        }
    }
    Ok(())
}

/// Decodes a process status response.
///
/// # Errors
/// Returns [`CoreError::Codec`] for malformed JSON.
pub fn decode_process_statuses(raw: &[u8]) -> Result<ProcessStatusMap, CoreError> {
    serde_json::from_slice(raw).map_err(CoreError::Codec)
}

/// Error type for decoding and routing failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Origin cannot serve the client API.
    #[error("invalid origin: {0}")]
    InvalidOrigin(String),
    /// Catalog entry carries a blank id.
    #[error("catalog entry has an empty id")]
    EmptyAppId,
    /// Catalog repeats an id.
    #[error("duplicate app id in catalog: {0}")]
    DuplicateAppId(String),
    /// Icon payload is not valid base64.
    #[error("invalid icon encoding: {0}")]
    InvalidIcon(String),
    /// JSON encoding/decoding error.
    #[error("payload codec failure: {0}")]
    Codec(#[from] serde_json::Error),
}
