//! Subscription registry for view-facing state changes.

use aviator_ui::{
    CatalogView, ConnectionBadge, DetailView, GateSurface, IndicatorChange, LayoutMode,
    Notification,
};

use crate::push::PushState;

/// One changed part of the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    /// Transient message to show.
    Notification(Notification),
    /// Header badge, offline banner and version label.
    Header {
        /// Connection badge.
        badge: ConnectionBadge,
        /// Persistent offline banner.
        offline_banner: bool,
        /// Server version label.
        version_label: Option<String>,
    },
    /// Main view (header controls and catalog) shown or suppressed.
    MainView {
        /// Visibility.
        visible: bool,
    },
    /// Credential-entry surface.
    Gate(GateSurface),
    /// Catalog area re-rendered.
    Catalog(CatalogView),
    /// Indicators flipped on existing tiles.
    Indicators(Vec<IndicatorChange>),
    /// Detail view opened, refreshed or closed.
    Detail(Option<DetailView>),
    /// Catalog presentation switched.
    Layout(LayoutMode),
    /// Polling scheduler started or stopped.
    Polling {
        /// Scheduler state.
        active: bool,
    },
    /// Push channel lifecycle.
    Push(PushState),
    /// Session was torn down and bootstrap starts over.
    Reloaded,
}

/// Token returned by [`crate::SessionController::on_state_changed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn Fn(&SessionUpdate) + Send>;

#[derive(Default)]
pub(crate) struct Observers {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
}

impl Observers {
    pub(crate) fn subscribe(&mut self, listener: Listener) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.listeners.push((id, listener));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    pub(crate) fn emit(&self, update: SessionUpdate) {
        for (_, listener) in &self.listeners {
            listener(&update);
        }
    }
}
