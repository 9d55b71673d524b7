//! Scenario tests for launching, the detail view and indicator refresh.

mod common;

use std::time::Duration;

use aviator_app::{SessionEvent, SessionUpdate, UserCommand};
use aviator_core::{ApiError, AppEntry, ProcessStatusMap};
use aviator_ui::{IndicatorChange, LayoutMode, NotificationLevel};
use common::{FakeApi, Harness, network_down};

fn catalog_api() -> FakeApi {
    let api = FakeApi::new();
    api.set_apps(Ok(vec![AppEntry::new("a", "Alpha"), AppEntry::new("b", "Beta")]));
    api.set_statuses(Ok([("a", true)].into_iter().collect()));
    api
}

#[tokio::test]
async fn launch_and_detail_tests_successful_launch_reports_progress_then_success() {
    let mut harness = Harness::started(catalog_api()).await;

    harness.controller.launch("a", "Alpha").await;

    assert_eq!(harness.api.calls(), vec!["launch:a"]);
    assert_eq!(
        harness.messages(),
        vec!["Launching Alpha...", "Alpha launched successfully!"]
    );
}

#[tokio::test]
async fn launch_and_detail_tests_structured_launch_failure_surfaces_server_detail() {
    let api = catalog_api();
    api.set_launch(Err(ApiError::Server {
        status: 500,
        detail: Some("Executable not found".to_string()),
    }));
    let mut harness = Harness::started(api).await;

    harness.controller.launch("a", "Alpha").await;

    let errors: Vec<_> = harness
        .notifications()
        .into_iter()
        .filter(|notification| notification.level == NotificationLevel::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "Error: Executable not found");
    assert_eq!(errors[0].dismiss_after, Duration::from_millis(4_000));
}

#[tokio::test]
async fn launch_and_detail_tests_failure_without_detail_uses_generic_message() {
    let api = catalog_api();
    api.set_launch(Err(ApiError::Server {
        status: 500,
        detail: None,
    }));
    let mut harness = Harness::started(api).await;

    harness.controller.launch("b", "Beta").await;

    assert_eq!(harness.messages_at(NotificationLevel::Error), vec!["Error: Internal error"]);
}

#[tokio::test]
async fn launch_and_detail_tests_network_failure_during_launch_shows_network_error() {
    let api = catalog_api();
    api.set_launch(Err(network_down()));
    let mut harness = Harness::started(api).await;

    harness.controller.launch("a", "Alpha").await;

    assert_eq!(harness.messages_at(NotificationLevel::Error), vec!["Network Error"]);
}

#[tokio::test]
async fn launch_and_detail_tests_unauthorized_launch_shows_no_error_notification() {
    let api = catalog_api();
    api.set_launch(Err(ApiError::Unauthorized));
    let mut harness = Harness::started(api).await;

    harness.controller.launch("a", "Alpha").await;

    assert_eq!(harness.messages(), vec!["Launching Alpha..."]);
}

#[tokio::test]
async fn launch_and_detail_tests_detail_view_follows_status_polls() {
    let mut harness = Harness::started(catalog_api()).await;
    assert!(!harness.controller.open_details("missing"));
    assert!(harness.controller.open_details("a"));
    harness.run_for(2_000).await;
    assert!(harness.controller.view().detail.as_ref().is_some_and(|detail| detail.running));
    harness.take_updates();

    let stopped: ProcessStatusMap = [("a", false)].into_iter().collect();
    harness.api.set_statuses(Ok(stopped));
    harness.run_for(2_000).await;

    let detail = harness.controller.view().detail.clone().expect("detail should stay open");
    assert!(!detail.running);
    assert_eq!(detail.status_text(), "Stopped");
    let updates = harness.take_updates();
    assert!(updates.contains(&SessionUpdate::Indicators(vec![IndicatorChange {
        id: "a".to_string(),
        running: false,
    }])));
    assert!(updates.contains(&SessionUpdate::Detail(Some(detail))));
}

#[tokio::test]
async fn launch_and_detail_tests_unchanged_statuses_do_not_touch_tiles() {
    let mut harness = Harness::started(catalog_api()).await;
    harness.run_for(2_000).await;
    harness.take_updates();

    harness.run_for(2_000).await;

    assert!(
        !harness
            .take_updates()
            .iter()
            .any(|update| matches!(update, SessionUpdate::Indicators(_)))
    );
}

#[tokio::test]
async fn launch_and_detail_tests_refetch_drops_selection_missing_from_new_catalog() {
    let mut harness = Harness::started(catalog_api()).await;
    assert!(harness.controller.open_details("a"));

    harness.api.set_apps(Ok(vec![AppEntry::new("b", "Beta")]));
    assert!(harness.controller.refetch_catalog().await);

    assert!(harness.controller.state().selected_app().is_none());
    assert!(harness.controller.view().detail.is_none());
    assert_eq!(harness.controller.view().catalog.tile_ids(), vec!["b"]);
}

#[tokio::test]
async fn launch_and_detail_tests_launch_selected_command_uses_detail_entry() {
    let mut harness = Harness::started(catalog_api()).await;
    harness
        .controller
        .handle(SessionEvent::Command(UserCommand::OpenDetails("b".to_string())))
        .await;

    harness.controller.handle(SessionEvent::Command(UserCommand::LaunchSelected)).await;
    harness.controller.handle(SessionEvent::Command(UserCommand::CloseDetails)).await;
    harness.controller.handle(SessionEvent::Command(UserCommand::LaunchSelected)).await;

    assert_eq!(harness.api.calls(), vec!["launch:b"]);
    assert!(harness.messages().contains(&"Beta launched successfully!".to_string()));
    assert!(harness.controller.view().detail.is_none());
}

#[tokio::test]
async fn launch_and_detail_tests_layout_switch_is_published_once() {
    let mut harness = Harness::started(catalog_api()).await;

    harness.controller.set_layout(LayoutMode::List);
    harness.controller.set_layout(LayoutMode::List);

    assert_eq!(harness.take_updates(), vec![SessionUpdate::Layout(LayoutMode::List)]);
    assert_eq!(harness.controller.view().layout, LayoutMode::List);
}
