//! Push channel state machine with fixed-delay reconnect.
//!
//! Connection attempts are tagged with a [`ConnectionId`]; lifecycle events
//! from any attempt other than the current one are ignored.

use std::sync::Arc;

use aviator_poll::{TimerDriver, TimerHandle, TimerKind};
use aviator_transport::{
    ConnectionId, PushConnector, PushEvent, PushEventKind, PushHandle, ReconnectPolicy,
};
use tracing::{debug, info, warn};
use url::Url;

/// Push channel lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushState {
    /// No connection; a reconnect may be pending.
    Disconnected,
    /// Handshake in progress.
    Connecting,
    /// Receiving change notifications.
    Open,
    /// Torn down on shutdown; nothing pending.
    Closed,
}

/// What the controller should do after a push event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PushSignal {
    /// Event belonged to a stale attempt.
    Ignored,
    /// Lifecycle changed; state should be published.
    StateChanged,
    /// Server announced a catalog change.
    CatalogChanged,
}

pub(crate) struct PushChannel {
    connector: Arc<dyn PushConnector>,
    endpoint: Url,
    policy: ReconnectPolicy,
    state: PushState,
    current: Option<(ConnectionId, Box<dyn PushHandle>)>,
    next_connection: u64,
    reconnect: Option<TimerHandle>,
}

impl PushChannel {
    pub(crate) fn new(
        connector: Arc<dyn PushConnector>,
        endpoint: Url,
        policy: ReconnectPolicy,
    ) -> Self {
        Self {
            connector,
            endpoint,
            policy,
            state: PushState::Disconnected,
            current: None,
            next_connection: 0,
            reconnect: None,
        }
    }

    pub(crate) fn state(&self) -> PushState {
        self.state
    }

    /// Opens a connection unless one is connecting or open.
    pub(crate) fn connect(&mut self, timers: &mut dyn TimerDriver) -> bool {
        if matches!(self.state, PushState::Connecting | PushState::Open) {
            return false;
        }
        if let Some(pending) = self.reconnect.take() {
            timers.cancel(pending);
        }

        self.next_connection += 1;
        let connection = ConnectionId(self.next_connection);
        debug!(connection = connection.0, endpoint = %self.endpoint, "opening push channel");
        let handle = self.connector.open(&self.endpoint, connection);
        self.current = Some((connection, handle));
        self.state = PushState::Connecting;
        true
    }

    pub(crate) fn on_event(
        &mut self,
        event: &PushEvent,
        timers: &mut dyn TimerDriver,
    ) -> PushSignal {
        let is_current = self
            .current
            .as_ref()
            .is_some_and(|(connection, _)| *connection == event.connection);
        if !is_current {
            debug!(connection = event.connection.0, "ignoring stale push event");
            return PushSignal::Ignored;
        }

        match &event.kind {
            PushEventKind::Opened => {
                info!(connection = event.connection.0, "push channel open");
                self.state = PushState::Open;
                PushSignal::StateChanged
            }
            PushEventKind::Message => PushSignal::CatalogChanged,
            PushEventKind::Closed => {
                info!(connection = event.connection.0, "push channel closed by peer");
                self.drop_connection(timers);
                PushSignal::StateChanged
            }
            PushEventKind::Error(reason) => {
                warn!(connection = event.connection.0, "push channel error: {reason}");
                self.drop_connection(timers);
                PushSignal::StateChanged
            }
        }
    }

    /// Runs a due reconnect; `false` when `handle` is not ours.
    pub(crate) fn on_reconnect_timer(
        &mut self,
        handle: TimerHandle,
        timers: &mut dyn TimerDriver,
    ) -> bool {
        if self.reconnect != Some(handle) {
            return false;
        }
        self.reconnect = None;
        self.connect(timers);
        true
    }

    pub(crate) fn shutdown(&mut self, timers: &mut dyn TimerDriver) {
        if let Some(pending) = self.reconnect.take() {
            timers.cancel(pending);
        }
        if let Some((_, mut handle)) = self.current.take() {
            handle.close();
        }
        self.state = PushState::Closed;
    }

    fn drop_connection(&mut self, timers: &mut dyn TimerDriver) {
        if let Some((_, mut handle)) = self.current.take() {
            handle.close();
        }
        self.state = PushState::Disconnected;
        if let Some(pending) = self.reconnect.take() {
            timers.cancel(pending);
        }
        self.reconnect = Some(timers.arm_once(TimerKind::PushReconnect, self.policy.delay));
    }
}
