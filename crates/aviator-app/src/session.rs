//! Session state and its legal transitions.
//!
//! The controller is the only writer. Every field changes through one of the
//! methods below so the cross-field rules hold after each call:
//! - going offline forgets the selected entry and the catalog;
//! - replacing the catalog drops a selection that no longer exists.

use aviator_core::{AppEntry, ProcessStatusMap, ServerInfo};

/// Server reachability as last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reachability {
    /// No liveness answer yet.
    Unknown,
    /// Last liveness check succeeded.
    Online,
    /// Last liveness or status poll failed.
    Offline,
}

/// Effect of a reachability update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReachabilityChange {
    /// Same state as before.
    Unchanged,
    /// First answer since startup.
    FirstContact,
    /// Came back after an offline period.
    Recovered,
    /// Just became unreachable.
    WentOffline,
}

/// Single mutable session record.
#[derive(Debug, Clone)]
pub struct SessionState {
    reachability: Reachability,
    is_authorized: bool,
    polling_active: bool,
    hostname: Option<String>,
    server_version: Option<String>,
    catalog: Vec<AppEntry>,
    statuses: ProcessStatusMap,
    selected_app: Option<String>,
}

impl SessionState {
    /// Fresh state of a newly loaded client.
    pub fn new() -> Self {
        Self {
            reachability: Reachability::Unknown,
            is_authorized: false,
            polling_active: false,
            hostname: None,
            server_version: None,
            catalog: Vec::new(),
            statuses: ProcessStatusMap::new(),
            selected_app: None,
        }
    }

    /// Current reachability.
    pub fn reachability(&self) -> Reachability {
        self.reachability
    }

    /// `true` when the last check reached the server.
    pub fn server_online(&self) -> bool {
        self.reachability == Reachability::Online
    }

    /// `true` when protected endpoints may be used.
    pub fn is_authorized(&self) -> bool {
        self.is_authorized
    }

    /// `true` while the polling scheduler runs.
    pub fn polling_active(&self) -> bool {
        self.polling_active
    }

    /// Polling must run exactly when this holds.
    pub fn polling_wanted(&self) -> bool {
        self.server_online() && self.is_authorized
    }

    /// Hostname from the last liveness answer.
    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }

    /// Server version from the last liveness answer.
    pub fn server_version(&self) -> Option<&str> {
        self.server_version.as_deref()
    }

    /// Last fetched catalog in server order.
    pub fn catalog(&self) -> &[AppEntry] {
        &self.catalog
    }

    /// Catalog entry with `id`.
    pub fn entry(&self, id: &str) -> Option<&AppEntry> {
        self.catalog.iter().find(|entry| entry.id == id)
    }

    /// Last polled running flags.
    pub fn statuses(&self) -> &ProcessStatusMap {
        &self.statuses
    }

    /// Entry shown in the detail view.
    pub fn selected_app(&self) -> Option<&str> {
        self.selected_app.as_deref()
    }

    /// Records a successful liveness answer.
    pub fn set_online(&mut self, info: &ServerInfo) -> ReachabilityChange {
        self.hostname = Some(info.hostname.clone());
        self.server_version = info.version.clone();
        let change = match self.reachability {
            Reachability::Unknown => ReachabilityChange::FirstContact,
            Reachability::Offline => ReachabilityChange::Recovered,
            Reachability::Online => ReachabilityChange::Unchanged,
        };
        self.reachability = Reachability::Online;
        change
    }

    /// Records a failed check and forgets catalog data and selection.
    pub fn set_offline(&mut self) -> ReachabilityChange {
        if self.reachability == Reachability::Offline {
            return ReachabilityChange::Unchanged;
        }
        self.reachability = Reachability::Offline;
        self.catalog.clear();
        self.selected_app = None;
        ReachabilityChange::WentOffline
    }

    /// Records the gate's verdict.
    pub fn set_authorized(&mut self, authorized: bool) {
        self.is_authorized = authorized;
    }

    pub(crate) fn set_polling_active(&mut self, active: bool) {
        self.polling_active = active;
    }

    /// Replaces the catalog; returns `true` when the selection was dropped.
    pub fn replace_catalog(&mut self, entries: Vec<AppEntry>) -> bool {
        self.catalog = entries;
        let stale = self
            .selected_app
            .as_deref()
            .is_some_and(|id| !self.catalog.iter().any(|entry| entry.id == id));
        if stale {
            self.selected_app = None;
        }
        stale
    }

    /// Replaces the running flags.
    pub fn replace_statuses(&mut self, statuses: ProcessStatusMap) {
        self.statuses = statuses;
    }

    /// Selects a catalog entry; unknown ids are refused.
    pub fn select_app(&mut self, id: &str) -> Option<&AppEntry> {
        let entry = self.catalog.iter().find(|entry| entry.id == id)?;
        self.selected_app = Some(entry.id.clone());
        Some(entry)
    }

    /// Clears the selection; returns `true` if one existed.
    pub fn clear_selection(&mut self) -> bool {
        self.selected_app.take().is_some()
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
