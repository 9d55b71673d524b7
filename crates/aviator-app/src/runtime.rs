//! Event loop wiring the controller to real timers, push and user input.

use std::sync::Arc;

use aviator_poll::{TimerFired, TokioTimerDriver};
use aviator_transport::{HttpLauncherApi, PushEvent, WsPushConnector};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::info;

use crate::AppError;
use crate::command::UserCommand;
use crate::config::ClientConfig;
use crate::controller::{SessionController, SessionEvent};
use crate::observer::SessionUpdate;
use crate::request::{Completion, Request, RequestExecutor};

/// Builds the HTTP/WS-backed controller for `config`.
///
/// Timer and push events land on the returned receivers; [`serve`] drains
/// both.
///
/// Must be called from within a tokio runtime.
///
/// # Errors
/// Returns [`AppError`] for an invalid origin, poll interval or TLS setup.
pub fn build_controller(
    config: &ClientConfig,
) -> Result<(SessionController, EventSources), AppError> {
    let settings = config.session_settings()?;
    let api = Arc::new(HttpLauncherApi::new(config.routes()?, config.request_timeout())?);
    let (timer_tx, timer_rx) = mpsc::unbounded_channel();
    let (push_tx, push_rx) = mpsc::unbounded_channel();

    let controller = SessionController::new(
        api.clone(),
        api,
        Arc::new(WsPushConnector::new(push_tx)),
        Box::new(TokioTimerDriver::new(timer_tx)),
        settings,
    );
    Ok((controller, EventSources::new(timer_rx, push_rx)))
}

/// Receivers feeding the event loop.
pub struct EventSources {
    timer_rx: UnboundedReceiver<TimerFired>,
    push_rx: UnboundedReceiver<PushEvent>,
}

impl EventSources {
    /// Bundles the receivers paired with a controller's timer driver and
    /// push connector.
    pub fn new(
        timer_rx: UnboundedReceiver<TimerFired>,
        push_rx: UnboundedReceiver<PushEvent>,
    ) -> Self {
        Self { timer_rx, push_rx }
    }
}

/// Runs the client until `Quit` arrives or the command stream ends.
///
/// # Errors
/// Returns [`AppError`] when the controller cannot be built.
pub async fn run(
    config: &ClientConfig,
    commands: UnboundedReceiver<UserCommand>,
    view: impl Fn(&SessionUpdate) + Send + 'static,
) -> Result<(), AppError> {
    let (mut controller, sources) = build_controller(config)?;
    controller.on_state_changed(view);
    info!(origin = %config.origin, "client starting");
    serve(controller, sources, commands).await;
    Ok(())
}

/// Drives `controller` until `Quit` arrives or the command stream ends, then
/// shuts it down and hands it back.
///
/// Requests run on their own tasks and report back as
/// [`SessionEvent::Completed`], so ticks, push events and commands keep
/// flowing while a request is pending.
pub async fn serve(
    mut controller: SessionController,
    mut sources: EventSources,
    mut commands: UnboundedReceiver<UserCommand>,
) -> SessionController {
    let executor = controller.executor();
    let (done_tx, mut done_rx) = mpsc::unbounded_channel();
    let issue = |requests: Vec<Request>| spawn_all(&executor, &done_tx, requests);

    issue(controller.bootstrap());
    loop {
        tokio::select! {
            Some(fired) = sources.timer_rx.recv() => {
                issue(controller.dispatch(SessionEvent::Timer(fired)));
            }
            Some(event) = sources.push_rx.recv() => {
                issue(controller.dispatch(SessionEvent::Push(event)));
            }
            Some(completion) = done_rx.recv() => {
                issue(controller.dispatch(SessionEvent::Completed(completion)));
            }
            command = commands.recv() => match command {
                None | Some(UserCommand::Quit) => break,
                Some(command) => issue(controller.dispatch(SessionEvent::Command(command))),
            },
        }
    }

    info!("client stopping");
    controller.shutdown();
    controller
}

fn spawn_all(
    executor: &RequestExecutor,
    done: &UnboundedSender<Completion>,
    requests: Vec<Request>,
) {
    for request in requests {
        executor.spawn(request, done.clone());
    }
}
