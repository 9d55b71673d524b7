//! Session controller: the single owner of session state.
//!
//! Transitions run to completion on `&mut self`. Network calls are never
//! awaited inside a transition: they are returned as [`Request`]s and their
//! answers come back as [`SessionEvent::Completed`], so several calls may be
//! in flight while state changes stay serialized. Late answers overwrite
//! earlier ones; answers from before a reload or shutdown are dropped.
//!
//! Invariants maintained after each transition:
//! - polling is active iff the server is online and the session is authorized;
//! - the offline probe is armed iff the server is offline;
//! - a 401 from the liveness endpoint counts as an answer from a server that
//!   requires a PIN;
//! - while offline no detail view is open and the catalog is cleared;
//! - the main view is visible iff online and the gate surface is hidden.

use std::collections::VecDeque;
use std::sync::Arc;

use aviator_auth::{
    AuthClient, AuthError, AuthTransport, AuthorizationGate, CredentialOutcome, GateState,
    GateTransition, PinCredential,
};
use aviator_core::{
    ApiError, AppEntry, FailureClass, ProcessStatusMap, RequestContext, ServerInfo,
    classify_api_error,
};
use aviator_poll::{
    PollIntervals, PollTask, PollingScheduler, TimerDriver, TimerFired, TimerHandle, TimerKind,
};
use aviator_transport::{LauncherApi, PushConnector, PushEvent, ReconnectPolicy};
use aviator_ui::{
    CatalogView, ConnectionBadge, DetailView, GateSurface, LayoutMode, Notification,
    NotificationLevel, ViewState,
};
use tracing::{debug, info, warn};
use url::Url;

use crate::command::UserCommand;
use crate::observer::{Observers, SessionUpdate, SubscriptionId};
use crate::push::{PushChannel, PushSignal, PushState};
use crate::request::{
    Call, CatalogPurpose, Completion, LivenessPurpose, Outcome, Request, RequestExecutor,
};
use crate::session::{Reachability, ReachabilityChange, SessionState};

const OFFLINE_MESSAGE: &str = "Server is offline. Please start the server on the host PC.";

/// Timing and endpoint settings for a controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    /// Poll periods.
    pub intervals: PollIntervals,
    /// Push reconnect delay.
    pub reconnect: ReconnectPolicy,
    /// Push endpoint URL.
    pub push_endpoint: Url,
}

/// Input consumed by [`SessionController::dispatch`].
#[derive(Debug)]
pub enum SessionEvent {
    /// A timer armed by this controller fired.
    Timer(TimerFired),
    /// Push connection lifecycle event.
    Push(PushEvent),
    /// User action.
    Command(UserCommand),
    /// A request issued by this controller finished.
    Completed(Completion),
}

/// Owns session state and applies every transition.
pub struct SessionController {
    executor: RequestExecutor,
    generation: u64,
    timers: Box<dyn TimerDriver>,
    scheduler: PollingScheduler,
    offline_probe: Option<TimerHandle>,
    push: PushChannel,
    gate: AuthorizationGate,
    state: SessionState,
    view: ViewState,
    observers: Observers,
    endpoint_host: String,
}

impl SessionController {
    /// Wires a controller; nothing runs until [`SessionController::bootstrap`].
    pub fn new(
        api: Arc<dyn LauncherApi>,
        auth: Arc<dyn AuthTransport>,
        connector: Arc<dyn PushConnector>,
        timers: Box<dyn TimerDriver>,
        settings: SessionSettings,
    ) -> Self {
        let endpoint_host = settings.push_endpoint.host_str().unwrap_or_default().to_string();
        Self {
            executor: RequestExecutor::new(api, AuthClient::new(auth)),
            generation: 0,
            timers,
            scheduler: PollingScheduler::new(settings.intervals),
            offline_probe: None,
            push: PushChannel::new(connector, settings.push_endpoint, settings.reconnect),
            gate: AuthorizationGate::new(),
            state: SessionState::new(),
            view: ViewState::new(),
            observers: Observers::default(),
            endpoint_host,
        }
    }

    /// Registers a listener for view updates.
    pub fn on_state_changed(
        &mut self,
        listener: impl Fn(&SessionUpdate) + Send + 'static,
    ) -> SubscriptionId {
        self.observers.subscribe(Box::new(listener))
    }

    /// Removes a listener; `false` when it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Executor able to perform the requests this controller issues.
    pub fn executor(&self) -> RequestExecutor {
        self.executor.clone()
    }

    /// Session state snapshot.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Current view projection.
    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// Authorization gate state.
    pub fn gate_state(&self) -> GateState {
        self.gate.state()
    }

    /// Push channel lifecycle.
    pub fn push_state(&self) -> PushState {
        self.push.state()
    }

    /// `true` while the polling scheduler runs.
    pub fn polling_active(&self) -> bool {
        self.scheduler.is_active()
    }

    /// `true` while the offline probe is armed.
    pub fn offline_probe_armed(&self) -> bool {
        self.offline_probe.is_some()
    }

    /// Starts a session: shows the connecting state and asks for a liveness
    /// check. Catalog, polling and push follow from its answer.
    pub fn bootstrap(&mut self) -> Vec<Request> {
        info!("bootstrapping session");
        self.set_catalog_view(CatalogView::Connecting);
        self.publish_header();
        vec![self.request(Call::Liveness(LivenessPurpose::Bootstrap))]
    }

    /// Applies one event and returns the requests it issued.
    pub fn dispatch(&mut self, event: SessionEvent) -> Vec<Request> {
        match event {
            SessionEvent::Timer(fired) => self.on_timer(fired),
            SessionEvent::Push(event) => self.on_push(event),
            SessionEvent::Command(command) => self.execute(command),
            SessionEvent::Completed(completion) => self.complete(completion),
        }
    }

    /// Applies one event and performs every request it leads to, in order.
    pub async fn handle(&mut self, event: SessionEvent) {
        let requests = self.dispatch(event);
        self.drive(requests).await;
    }

    /// [`SessionController::bootstrap`] with its requests performed in order.
    pub async fn init(&mut self) {
        let requests = self.bootstrap();
        self.drive(requests).await;
    }

    /// Probes `/api/info` and applies the answer.
    ///
    /// Returns `true` when the server is online and the session authorized.
    pub async fn check_liveness(&mut self) -> bool {
        let request = self.request(Call::Liveness(LivenessPurpose::Poll));
        self.drive(vec![request]).await;
        self.state.server_online() && self.state.is_authorized()
    }

    /// Polls running flags and re-applies indicators.
    pub async fn refresh_process_statuses(&mut self) {
        let requests = self.status_request().into_iter().collect();
        self.drive(requests).await;
    }

    /// Replaces the running flags and flips indicators on existing tiles.
    pub fn update_indicators(&mut self, statuses: ProcessStatusMap) {
        self.state.replace_statuses(statuses);
        let changes = self.view.catalog.update_indicators(self.state.statuses());
        if !changes.is_empty() {
            self.observers.emit(SessionUpdate::Indicators(changes));
        }

        if let Some(detail) = self.view.detail.as_mut() {
            let running = self.state.statuses().is_running(&detail.app_id);
            if detail.running != running {
                detail.running = running;
                let snapshot = Some(detail.clone());
                self.observers.emit(SessionUpdate::Detail(snapshot));
            }
        }
    }

    /// Re-fetches the catalog and re-renders it.
    ///
    /// Returns `true` when a new catalog was fetched.
    pub async fn refetch_catalog(&mut self) -> bool {
        match self.catalog_request(CatalogPurpose::Refresh) {
            Some(request) => self.perform_one(request).await,
            None => false,
        }
    }

    /// Submits a PIN to the gate.
    ///
    /// Returns `true` when the server accepted it.
    pub async fn submit_credential(&mut self, pin: &str) -> bool {
        match self.credential_request(pin) {
            Some(request) => self.perform_one(request).await,
            None => false,
        }
    }

    /// Ends the session server-side and restarts bootstrap from scratch.
    ///
    /// Returns `true` when the server acknowledged the logout.
    pub async fn logout(&mut self) -> bool {
        let request = self.request(Call::Logout);
        self.perform_one(request).await
    }

    /// Launches entry `id`, reporting progress as notifications.
    pub async fn launch(&mut self, id: &str, name: &str) {
        let request = self.launch_request(id, name);
        self.perform_one(request).await;
    }

    /// Launches the entry shown in the detail view.
    pub async fn launch_selected(&mut self) -> bool {
        let Some(request) = self.selected_launch_request() else {
            return false;
        };
        self.perform_one(request).await;
        true
    }

    /// Opens the detail view for a catalog entry.
    pub fn open_details(&mut self, id: &str) -> bool {
        if !self.state.server_online() || self.gate.surface_visible() {
            return false;
        }
        if self.state.select_app(id).is_none() {
            debug!(app_id = id, "cannot open details for unknown entry");
            return false;
        }
        self.refresh_detail(id);
        true
    }

    /// Closes the detail view.
    pub fn close_details(&mut self) {
        self.state.clear_selection();
        self.set_detail(None);
    }

    /// Manual retry: one liveness check with progress notifications.
    ///
    /// Returns `true` when the server answered.
    pub async fn retry_connection(&mut self) -> bool {
        let request = self.retry_request();
        self.drive(vec![request]).await;
        self.state.server_online()
    }

    /// Switches catalog presentation.
    pub fn set_layout(&mut self, mode: LayoutMode) {
        if self.view.layout != mode {
            self.view.layout = mode;
            self.observers.emit(SessionUpdate::Layout(mode));
        }
    }

    /// Opens the push channel unless one is connecting or open.
    pub fn connect_push(&mut self) {
        if self.push.connect(self.timers.as_mut()) {
            self.observers.emit(SessionUpdate::Push(self.push.state()));
        }
    }

    /// Cancels all timers and closes the push channel without reconnect.
    ///
    /// Answers to requests issued before this call are dropped.
    pub fn shutdown(&mut self) {
        self.generation += 1;
        self.stop_polling();
        self.disarm_offline_probe();
        self.push.shutdown(self.timers.as_mut());
        self.observers.emit(SessionUpdate::Push(PushState::Closed));
    }

    async fn drive(&mut self, requests: Vec<Request>) {
        let mut queue = VecDeque::from(requests);
        while let Some(request) = queue.pop_front() {
            let completion = self.executor.perform(request).await;
            queue.extend(self.complete(completion));
        }
    }

    async fn perform_one(&mut self, request: Request) -> bool {
        let completion = self.executor.perform(request).await;
        let succeeded = completion.outcome().succeeded();
        let follow_ups = self.complete(completion);
        self.drive(follow_ups).await;
        succeeded
    }

    fn request(&self, call: Call) -> Request {
        Request::new(self.generation, call)
    }

    fn status_request(&self) -> Option<Request> {
        if !self.state.polling_wanted() {
            debug!("skipping status poll outside an authorized online session");
            return None;
        }
        Some(self.request(Call::ProcessStatuses))
    }

    fn catalog_request(&self, purpose: CatalogPurpose) -> Option<Request> {
        if !self.state.polling_wanted() {
            debug!("skipping catalog fetch outside an authorized online session");
            return None;
        }
        Some(self.request(Call::Catalog(purpose)))
    }

    fn credential_request(&mut self, pin: &str) -> Option<Request> {
        match PinCredential::new(pin) {
            Ok(credential) => Some(self.request(Call::Credential(credential))),
            Err(error) => {
                debug!("credential refused locally: {error}");
                let transition = self.gate.on_credential_rejected();
                self.apply_gate_transition(transition);
                None
            }
        }
    }

    fn launch_request(&mut self, id: &str, name: &str) -> Request {
        info!(app_id = id, "launch requested");
        self.notify(NotificationLevel::Info, format!("Launching {name}..."), 2_000);
        self.request(Call::Launch {
            id: id.to_string(),
            name: name.to_string(),
        })
    }

    fn selected_launch_request(&mut self) -> Option<Request> {
        let (id, name) = self
            .view
            .detail
            .as_ref()
            .map(|detail| (detail.app_id.clone(), detail.name.clone()))?;
        Some(self.launch_request(&id, &name))
    }

    fn retry_request(&mut self) -> Request {
        self.notify(NotificationLevel::Info, "Connecting to server...", 2_000);
        let was_online = self.state.server_online();
        self.request(Call::Liveness(LivenessPurpose::Retry { was_online }))
    }

    fn on_timer(&mut self, fired: TimerFired) -> Vec<Request> {
        if let Some(task) = self.scheduler.task_for(fired.handle) {
            return match task {
                PollTask::ProcessStatus => self.status_request().into_iter().collect(),
                PollTask::Liveness => vec![self.request(Call::Liveness(LivenessPurpose::Poll))],
            };
        }
        if self.offline_probe == Some(fired.handle) {
            debug!("offline probe");
            return vec![self.request(Call::Liveness(LivenessPurpose::Poll))];
        }
        if self.push.on_reconnect_timer(fired.handle, self.timers.as_mut()) {
            self.observers.emit(SessionUpdate::Push(self.push.state()));
        } else {
            debug!(handle = fired.handle.id(), kind = ?fired.kind, "stale timer tick");
        }
        Vec::new()
    }

    fn on_push(&mut self, event: PushEvent) -> Vec<Request> {
        match self.push.on_event(&event, self.timers.as_mut()) {
            PushSignal::Ignored => Vec::new(),
            PushSignal::StateChanged => {
                self.observers.emit(SessionUpdate::Push(self.push.state()));
                Vec::new()
            }
            PushSignal::CatalogChanged => {
                debug!("catalog change announced");
                self.catalog_request(CatalogPurpose::Announced)
                    .into_iter()
                    .collect()
            }
        }
    }

    fn execute(&mut self, command: UserCommand) -> Vec<Request> {
        debug!(?command, "user command");
        match command {
            UserCommand::SubmitPin(pin) => self.credential_request(&pin).into_iter().collect(),
            UserCommand::Launch(id) => {
                let name = self
                    .state
                    .entry(&id)
                    .map(|entry| entry.name.clone())
                    .unwrap_or_else(|| id.clone());
                vec![self.launch_request(&id, &name)]
            }
            UserCommand::LaunchSelected => {
                let request = self.selected_launch_request();
                if request.is_none() {
                    debug!("no entry selected to launch");
                }
                request.into_iter().collect()
            }
            UserCommand::OpenDetails(id) => {
                self.open_details(&id);
                Vec::new()
            }
            UserCommand::CloseDetails => {
                self.close_details();
                Vec::new()
            }
            UserCommand::Retry => vec![self.retry_request()],
            UserCommand::Logout => vec![self.request(Call::Logout)],
            UserCommand::SetLayout(mode) => {
                self.set_layout(mode);
                Vec::new()
            }
            UserCommand::Quit => {
                self.shutdown();
                Vec::new()
            }
        }
    }

    fn complete(&mut self, completion: Completion) -> Vec<Request> {
        if completion.generation != self.generation {
            debug!(
                issued = completion.generation,
                current = self.generation,
                "dropping answer from an earlier session"
            );
            return Vec::new();
        }
        match completion.outcome {
            Outcome::Liveness(purpose, result) => self.on_liveness(purpose, result),
            Outcome::ProcessStatuses(result) => {
                self.on_statuses(result);
                Vec::new()
            }
            Outcome::Catalog(purpose, result) => {
                self.on_catalog(purpose, result);
                Vec::new()
            }
            Outcome::Launch { id, name, result } => {
                self.on_launch(&id, &name, result);
                Vec::new()
            }
            Outcome::Credential(result) => self.on_credential(result),
            Outcome::Logout(result) => self.on_logout(result),
        }
    }

    fn on_liveness(
        &mut self,
        purpose: LivenessPurpose,
        result: Result<ServerInfo, ApiError>,
    ) -> Vec<Request> {
        let mut follow_ups = match result {
            Ok(info) => self.apply_server_info(&info),
            Err(error) => match classify_api_error(RequestContext::Polling, &error) {
                FailureClass::Reauthorize => {
                    let info = self.locked_server_info();
                    self.apply_server_info(&info)
                }
                _ => {
                    debug!("liveness check failed: {error}");
                    self.go_offline();
                    Vec::new()
                }
            },
        };

        match purpose {
            LivenessPurpose::Poll => {}
            LivenessPurpose::Bootstrap => {
                if self.state.server_online() {
                    follow_ups.extend(self.catalog_request(CatalogPurpose::Refresh));
                    self.reconcile_polling();
                    self.connect_push();
                }
            }
            LivenessPurpose::Retry { was_online } => {
                if !self.state.server_online() {
                    self.notify(NotificationLevel::Error, "Server still unreachable", 3_000);
                } else {
                    if was_online && self.state.is_authorized() {
                        follow_ups.extend(self.catalog_request(CatalogPurpose::Refresh));
                        follow_ups.extend(self.status_request());
                    }
                    self.notify(NotificationLevel::Success, "Connected successfully!", 3_000);
                }
            }
        }
        follow_ups
    }

    fn on_statuses(&mut self, result: Result<ProcessStatusMap, ApiError>) {
        match result {
            Ok(statuses) if self.state.polling_wanted() => self.update_indicators(statuses),
            Ok(_) => debug!("dropping status answer outside an authorized online session"),
            Err(error) => self.absorb_failure(RequestContext::Polling, &error),
        }
    }

    fn on_catalog(&mut self, purpose: CatalogPurpose, result: Result<Vec<AppEntry>, ApiError>) {
        match result {
            Ok(entries) if self.state.polling_wanted() => {
                info!(count = entries.len(), "catalog fetched");
                if self.state.replace_catalog(entries) {
                    self.set_detail(None);
                } else if let Some(selected) = self.state.selected_app() {
                    let selected = selected.to_string();
                    self.refresh_detail(&selected);
                }
                let rendered = CatalogView::render(self.state.catalog(), self.state.statuses());
                self.set_catalog_view(rendered);
                if purpose == CatalogPurpose::Announced {
                    self.notify(NotificationLevel::Info, "App list updated", 2_000);
                }
            }
            Ok(_) => debug!("dropping catalog outside an authorized online session"),
            Err(error) => self.absorb_failure(RequestContext::Catalog, &error),
        }
    }

    fn on_launch(&mut self, id: &str, name: &str, result: Result<(), ApiError>) {
        let error = match result {
            Ok(()) => {
                self.notify(
                    NotificationLevel::Success,
                    format!("{name} launched successfully!"),
                    3_000,
                );
                return;
            }
            Err(error) => error,
        };
        match classify_api_error(RequestContext::Launch, &error) {
            FailureClass::Surface(detail) => {
                warn!(app_id = id, "launch refused: {detail}");
                self.notify(NotificationLevel::Error, format!("Error: {detail}"), 4_000);
            }
            FailureClass::SurfaceGeneric => {
                warn!(app_id = id, "launch request failed: {error}");
                self.notify(NotificationLevel::Error, "Network Error", 3_000);
            }
            FailureClass::Reauthorize => {
                debug!(app_id = id, "launch unauthorized; awaiting next liveness check");
            }
            FailureClass::Offline | FailureClass::Ignore => {
                debug!(app_id = id, "launch failure ignored: {error}");
            }
        }
    }

    fn on_credential(&mut self, result: Result<CredentialOutcome, AuthError>) -> Vec<Request> {
        match result {
            Ok(CredentialOutcome::Accepted) => {
                info!("credential accepted");
                let transition = self.gate.on_credential_accepted();
                self.state.set_authorized(true);
                self.apply_gate_transition(transition);
                self.reconcile_polling();
                self.notify(NotificationLevel::Success, "Authorization successful!", 2_000);
                self.catalog_request(CatalogPurpose::Refresh)
                    .into_iter()
                    .collect()
            }
            Ok(CredentialOutcome::Rejected) => {
                info!("credential rejected");
                let transition = self.gate.on_credential_rejected();
                self.apply_gate_transition(transition);
                Vec::new()
            }
            Err(error) => {
                warn!("credential submission failed: {error}");
                self.notify(NotificationLevel::Error, "Auth server error", 3_000);
                Vec::new()
            }
        }
    }

    fn on_logout(&mut self, result: Result<(), AuthError>) -> Vec<Request> {
        match result {
            Ok(()) => {
                info!("session ended; reloading");
                self.notify(NotificationLevel::Info, "Logged out", 2_000);
                self.reload()
            }
            Err(error) => {
                warn!("logout failed: {error}");
                self.notify(NotificationLevel::Error, "Logout error", 3_000);
                Vec::new()
            }
        }
    }

    fn apply_server_info(&mut self, info: &ServerInfo) -> Vec<Request> {
        let change = self.state.set_online(info);
        let transition = self.gate.on_server_info(info);
        self.state.set_authorized(self.gate.is_authorized());
        self.publish_header();
        self.apply_gate_transition(transition);

        let mut follow_ups = Vec::new();
        match change {
            ReachabilityChange::Recovered => {
                info!(hostname = %info.hostname, "server reachable again");
                self.disarm_offline_probe();
                self.reconcile_polling();
                if self.gate.surface_visible() {
                    self.set_catalog_view(CatalogView::AuthorizationRequired);
                } else {
                    follow_ups.extend(self.catalog_request(CatalogPurpose::Refresh));
                }
                self.connect_push();
                self.notify(NotificationLevel::Success, "Server reconnected!", 3_000);
            }
            ReachabilityChange::FirstContact => {
                info!(hostname = %info.hostname, "server reachable");
                self.disarm_offline_probe();
                self.reconcile_polling();
            }
            ReachabilityChange::Unchanged | ReachabilityChange::WentOffline => {
                self.reconcile_polling();
                if transition == GateTransition::Hidden {
                    follow_ups.extend(self.catalog_request(CatalogPurpose::Refresh));
                }
            }
        }
        follow_ups
    }

    fn locked_server_info(&self) -> ServerInfo {
        ServerInfo {
            hostname: self
                .state
                .hostname()
                .map(str::to_string)
                .unwrap_or_else(|| self.endpoint_host.clone()),
            version: self.state.server_version().map(str::to_string),
            auth_required: true,
            is_authorized: false,
        }
    }

    fn go_offline(&mut self) {
        if self.state.set_offline() != ReachabilityChange::WentOffline {
            return;
        }
        warn!("server unreachable");
        self.set_detail(None);
        self.set_catalog_view(CatalogView::Cleared);
        self.reconcile_polling();
        self.publish_header();
        self.sync_main_view();
        self.arm_offline_probe();
        self.notify(NotificationLevel::Warning, OFFLINE_MESSAGE, 5_000);
    }

    fn require_authorization(&mut self) {
        let transition = self.gate.on_unauthorized();
        self.state.set_authorized(false);
        self.apply_gate_transition(transition);
        self.reconcile_polling();
    }

    fn absorb_failure(&mut self, context: RequestContext, error: &ApiError) {
        match classify_api_error(context, error) {
            FailureClass::Reauthorize => {
                info!(?context, "session no longer authorized");
                self.require_authorization();
            }
            FailureClass::Offline => self.go_offline(),
            FailureClass::Surface(_) | FailureClass::SurfaceGeneric | FailureClass::Ignore => {
                warn!(?context, "request failed: {error}");
            }
        }
    }

    fn apply_gate_transition(&mut self, transition: GateTransition) {
        let surface = GateSurface {
            visible: self.gate.surface_visible(),
            rejected: matches!(self.gate.state(), GateState::Prompting { rejected: true }),
        };
        if self.view.gate != surface {
            self.view.gate = surface;
            self.observers.emit(SessionUpdate::Gate(surface));
        }
        if transition == GateTransition::Shown {
            self.state.clear_selection();
            self.set_detail(None);
            self.set_catalog_view(CatalogView::AuthorizationRequired);
        }
        self.sync_main_view();
    }

    fn reconcile_polling(&mut self) {
        let wanted = self.state.polling_wanted();
        if wanted && !self.scheduler.is_active() {
            info!("polling started");
            self.scheduler.start(self.timers.as_mut());
            self.state.set_polling_active(true);
            self.observers.emit(SessionUpdate::Polling { active: true });
        } else if !wanted && self.scheduler.is_active() {
            self.stop_polling();
        }
    }

    fn stop_polling(&mut self) {
        if !self.scheduler.is_active() {
            return;
        }
        info!("polling stopped");
        self.scheduler.stop(self.timers.as_mut());
        self.state.set_polling_active(false);
        self.observers.emit(SessionUpdate::Polling { active: false });
    }

    fn arm_offline_probe(&mut self) {
        if self.offline_probe.is_none() {
            let period = self.scheduler.intervals().liveness;
            self.offline_probe = Some(self.timers.arm_repeating(TimerKind::OfflineProbe, period));
        }
    }

    fn disarm_offline_probe(&mut self) {
        if let Some(handle) = self.offline_probe.take() {
            self.timers.cancel(handle);
        }
    }

    fn refresh_detail(&mut self, id: &str) {
        let Some(entry) = self.state.entry(id) else {
            return;
        };
        let detail = DetailView::for_entry(entry, self.state.statuses().is_running(id));
        self.set_detail(Some(detail));
    }

    fn set_detail(&mut self, detail: Option<DetailView>) {
        if self.view.detail != detail {
            self.view.detail = detail.clone();
            self.observers.emit(SessionUpdate::Detail(detail));
        }
    }

    fn set_catalog_view(&mut self, catalog: CatalogView) {
        self.view.catalog = catalog.clone();
        self.observers.emit(SessionUpdate::Catalog(catalog));
    }

    fn publish_header(&mut self) {
        let badge = match (self.state.reachability(), self.state.hostname()) {
            (Reachability::Online, Some(hostname)) => ConnectionBadge::Connected {
                hostname: hostname.to_string(),
            },
            (Reachability::Offline, _) => ConnectionBadge::Offline,
            _ => ConnectionBadge::Connecting,
        };
        let offline_banner = badge == ConnectionBadge::Offline;
        let version_label = self.state.server_version().map(str::to_string);

        if self.view.badge != badge
            || self.view.offline_banner != offline_banner
            || self.view.version_label != version_label
        {
            self.view.badge = badge.clone();
            self.view.offline_banner = offline_banner;
            self.view.version_label = version_label.clone();
            self.observers.emit(SessionUpdate::Header {
                badge,
                offline_banner,
                version_label,
            });
        }
    }

    fn sync_main_view(&mut self) {
        let visible = self.state.server_online() && !self.gate.surface_visible();
        if self.view.main_view_visible != visible {
            self.view.main_view_visible = visible;
            self.observers.emit(SessionUpdate::MainView { visible });
        }
    }

    fn notify(&self, level: NotificationLevel, message: impl Into<String>, dismiss_after_ms: u64) {
        self.observers
            .emit(SessionUpdate::Notification(Notification::new(level, message, dismiss_after_ms)));
    }

    fn reload(&mut self) -> Vec<Request> {
        self.shutdown();
        self.gate.reset();
        self.state = SessionState::new();
        let layout = self.view.layout;
        self.view = ViewState::new();
        self.view.layout = layout;
        self.observers.emit(SessionUpdate::Reloaded);
        self.bootstrap()
    }
}
