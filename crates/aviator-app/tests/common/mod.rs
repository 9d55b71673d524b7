//! Shared fakes and harness for session controller scenario tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use aviator_app::{SessionController, SessionEvent, SessionSettings, SessionUpdate};
use aviator_auth::AuthTransport;
use aviator_core::{ApiError, AppEntry, AuthRequest, ProcessStatusMap, ServerInfo};
use aviator_poll::{ManualTimerDriver, PollIntervals, TimerKind};
use aviator_transport::{
    ConnectionId, LauncherApi, PushConnector, PushEvent, PushEventKind, PushHandle,
    ReconnectPolicy,
};
use aviator_ui::{Notification, NotificationLevel};
use url::Url;

pub fn online(auth_required: bool, is_authorized: bool) -> ServerInfo {
    ServerInfo {
        hostname: "desk".to_string(),
        version: Some("2.1.0".to_string()),
        auth_required,
        is_authorized,
    }
}

pub fn network_down() -> ApiError {
    ApiError::Network("connection refused".to_string())
}

struct Script {
    info_queue: VecDeque<Result<ServerInfo, ApiError>>,
    info: Result<ServerInfo, ApiError>,
    apps: Result<Vec<AppEntry>, ApiError>,
    statuses: Result<ProcessStatusMap, ApiError>,
    launch: Result<(), ApiError>,
    accepted_pin: String,
    auth_failure: Option<ApiError>,
    logout: Result<(), ApiError>,
    calls: Vec<String>,
}

/// Scripted launcher host.
pub struct FakeApi {
    script: Mutex<Script>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(Script {
                info_queue: VecDeque::new(),
                info: Ok(online(false, false)),
                apps: Ok(Vec::new()),
                statuses: Ok(ProcessStatusMap::new()),
                launch: Ok(()),
                accepted_pin: "2468".to_string(),
                auth_failure: None,
                logout: Ok(()),
                calls: Vec::new(),
            }),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut Script) -> R) -> R {
        let mut guard = self.script.lock().expect("script lock should not be poisoned");
        f(&mut guard)
    }

    /// Answer for every liveness check not covered by the queue.
    pub fn set_info(&self, info: Result<ServerInfo, ApiError>) {
        self.with(|script| script.info = info);
    }

    /// One-off liveness answers, consumed in order.
    pub fn queue_info(&self, info: Result<ServerInfo, ApiError>) {
        self.with(|script| script.info_queue.push_back(info));
    }

    pub fn set_apps(&self, apps: Result<Vec<AppEntry>, ApiError>) {
        self.with(|script| script.apps = apps);
    }

    pub fn set_statuses(&self, statuses: Result<ProcessStatusMap, ApiError>) {
        self.with(|script| script.statuses = statuses);
    }

    pub fn set_launch(&self, launch: Result<(), ApiError>) {
        self.with(|script| script.launch = launch);
    }

    pub fn set_auth_failure(&self, failure: Option<ApiError>) {
        self.with(|script| script.auth_failure = failure);
    }

    pub fn set_logout(&self, logout: Result<(), ApiError>) {
        self.with(|script| script.logout = logout);
    }

    pub fn count(&self, call: &str) -> usize {
        self.with(|script| script.calls.iter().filter(|seen| seen.as_str() == call).count())
    }

    pub fn calls(&self) -> Vec<String> {
        self.with(|script| script.calls.clone())
    }

    pub fn clear_calls(&self) {
        self.with(|script| script.calls.clear());
    }

    fn record(&self, call: impl Into<String>) {
        let call = call.into();
        self.with(|script| script.calls.push(call));
    }
}

#[async_trait]
impl LauncherApi for FakeApi {
    async fn server_info(&self) -> Result<ServerInfo, ApiError> {
        self.record("info");
        self.with(|script| script.info_queue.pop_front().unwrap_or_else(|| script.info.clone()))
    }

    async fn apps(&self) -> Result<Vec<AppEntry>, ApiError> {
        self.record("apps");
        self.with(|script| script.apps.clone())
    }

    async fn process_statuses(&self) -> Result<ProcessStatusMap, ApiError> {
        self.record("statuses");
        self.with(|script| script.statuses.clone())
    }

    async fn launch(&self, app_id: &str) -> Result<(), ApiError> {
        self.record(format!("launch:{app_id}"));
        self.with(|script| script.launch.clone())
    }
}

#[async_trait]
impl AuthTransport for FakeApi {
    async fn submit_pin(&self, request: &AuthRequest) -> Result<(), ApiError> {
        self.record("auth");
        self.with(|script| {
            if let Some(failure) = script.auth_failure.clone() {
                return Err(failure);
            }
            if request.pin == script.accepted_pin {
                script.info = Ok(online(true, true));
                Ok(())
            } else {
                Err(ApiError::Server {
                    status: 403,
                    detail: Some("Invalid PIN".to_string()),
                })
            }
        })
    }

    async fn end_session(&self) -> Result<(), ApiError> {
        self.record("logout");
        self.with(|script| {
            if script.logout.is_ok() && matches!(script.info, Ok(ref info) if info.auth_required) {
                script.info = Ok(online(true, false));
            }
            script.logout.clone()
        })
    }
}

#[derive(Default)]
struct PushLog {
    opened: Vec<ConnectionId>,
    closed: Vec<ConnectionId>,
}

/// Records push connection attempts instead of connecting.
#[derive(Default, Clone)]
pub struct FakePushConnector {
    log: Arc<Mutex<PushLog>>,
}

impl FakePushConnector {
    pub fn opened(&self) -> Vec<ConnectionId> {
        self.log.lock().expect("push log lock").opened.clone()
    }

    pub fn closed(&self) -> Vec<ConnectionId> {
        self.log.lock().expect("push log lock").closed.clone()
    }

    pub fn last(&self) -> ConnectionId {
        *self.opened().last().expect("a push connection should have been opened")
    }
}

struct FakePushHandle {
    connection: ConnectionId,
    log: Arc<Mutex<PushLog>>,
    closed: bool,
}

impl PushHandle for FakePushHandle {
    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.log.lock().expect("push log lock").closed.push(self.connection);
        }
    }
}

impl PushConnector for FakePushConnector {
    fn open(&self, _endpoint: &Url, connection: ConnectionId) -> Box<dyn PushHandle> {
        self.log.lock().expect("push log lock").opened.push(connection);
        Box::new(FakePushHandle {
            connection,
            log: Arc::clone(&self.log),
            closed: false,
        })
    }
}

/// Controller wired to fakes and a virtual clock.
pub struct Harness {
    pub controller: SessionController,
    pub api: Arc<FakeApi>,
    pub push: FakePushConnector,
    pub timers: ManualTimerDriver,
    updates: Arc<Mutex<Vec<SessionUpdate>>>,
}

impl Harness {
    pub fn new(api: FakeApi) -> Self {
        let api = Arc::new(api);
        let push = FakePushConnector::default();
        let timers = ManualTimerDriver::new();
        let settings = SessionSettings {
            intervals: PollIntervals::default(),
            reconnect: ReconnectPolicy::default(),
            push_endpoint: Url::parse("ws://desk.local:8000/ws").expect("push url should parse"),
        };
        let mut controller = SessionController::new(
            api.clone(),
            api.clone(),
            Arc::new(push.clone()),
            Box::new(timers.clone()),
            settings,
        );

        let updates = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&updates);
        controller.on_state_changed(move |update| {
            sink.lock().expect("update log lock").push(update.clone());
        });

        Self {
            controller,
            api,
            push,
            timers,
            updates,
        }
    }

    /// Bootstraps and forgets the bootstrap updates.
    pub async fn started(api: FakeApi) -> Self {
        let mut harness = Self::new(api);
        harness.controller.init().await;
        harness.take_updates();
        harness.api.clear_calls();
        harness
    }

    /// Fires every timer due within `ms` of virtual time, in order.
    pub async fn run_for(&mut self, ms: u64) {
        let deadline = self.timers.now_ms() + ms;
        while let Some(fired) = self.timers.fire_next(deadline) {
            self.controller.handle(SessionEvent::Timer(fired)).await;
        }
    }

    /// Fires the next due timer of `kind`, skipping others.
    pub async fn fire_next_of(&mut self, kind: TimerKind) {
        let due = self
            .timers
            .armed()
            .into_iter()
            .filter(|timer| timer.kind == kind)
            .map(|timer| timer.due_ms)
            .min()
            .expect("a timer of this kind should be armed");
        self.run_for(due - self.timers.now_ms()).await;
    }

    pub async fn push_event(&mut self, connection: ConnectionId, kind: PushEventKind) {
        self.controller
            .handle(SessionEvent::Push(PushEvent { connection, kind }))
            .await;
    }

    pub fn take_updates(&self) -> Vec<SessionUpdate> {
        std::mem::take(&mut *self.updates.lock().expect("update log lock"))
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.updates
            .lock()
            .expect("update log lock")
            .iter()
            .filter_map(|update| match update {
                SessionUpdate::Notification(notification) => Some(notification.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.notifications()
            .into_iter()
            .map(|notification| notification.message)
            .collect()
    }

    pub fn messages_at(&self, level: NotificationLevel) -> Vec<String> {
        self.notifications()
            .into_iter()
            .filter(|notification| notification.level == level)
            .map(|notification| notification.message)
            .collect()
    }
}
