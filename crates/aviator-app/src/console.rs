//! Plain-text rendering of session updates for the console front-end.

use aviator_ui::{CatalogView, LayoutMode, NotificationLevel, TileIcon, status_label};

use crate::observer::SessionUpdate;
use crate::push::PushState;

/// Renders one update as console lines; silent updates yield nothing.
pub fn describe(update: &SessionUpdate) -> Vec<String> {
    match update {
        SessionUpdate::Notification(notification) => {
            let tag = match notification.level {
                NotificationLevel::Info => "info",
                NotificationLevel::Success => "ok",
                NotificationLevel::Warning => "warn",
                NotificationLevel::Error => "error",
            };
            vec![format!("[{tag}] {}", notification.message)]
        }
        SessionUpdate::Header {
            badge,
            offline_banner,
            version_label,
        } => {
            let mut line = badge.text();
            if let Some(version) = version_label {
                line.push_str(&format!(" (v{version})"));
            }
            let mut lines = vec![line];
            if *offline_banner {
                lines.push(
                    "Server is not available. Start it on the host PC, then type `retry`."
                        .to_string(),
                );
            }
            lines
        }
        SessionUpdate::Gate(surface) if surface.visible && surface.rejected => {
            vec!["Invalid PIN. Enter `pin <PIN>` to try again.".to_string()]
        }
        SessionUpdate::Gate(surface) if surface.visible => {
            vec!["PIN required. Enter `pin <PIN>`.".to_string()]
        }
        SessionUpdate::Catalog(catalog) => describe_catalog(catalog),
        SessionUpdate::Indicators(changes) => changes
            .iter()
            .map(|change| format!("  {} is now {}", change.id, status_label(change.running)))
            .collect(),
        SessionUpdate::Detail(Some(detail)) => vec![format!(
            "> {} [{}] ({}) - `launch` to start, `close` to go back",
            detail.name,
            detail.app_id,
            detail.status_text()
        )],
        SessionUpdate::Layout(mode) => vec![format!(
            "layout: {}",
            match mode {
                LayoutMode::Grid => "grid",
                LayoutMode::List => "list",
            }
        )],
        SessionUpdate::Push(PushState::Open) => vec!["live updates connected".to_string()],
        SessionUpdate::Reloaded => vec!["session reset".to_string()],
        SessionUpdate::Gate(_)
        | SessionUpdate::MainView { .. }
        | SessionUpdate::Detail(None)
        | SessionUpdate::Polling { .. }
        | SessionUpdate::Push(_) => Vec::new(),
    }
}

fn describe_catalog(catalog: &CatalogView) -> Vec<String> {
    if let Some(text) = catalog.placeholder_text() {
        return vec![text.to_string()];
    }
    let CatalogView::Tiles(tiles) = catalog else {
        return Vec::new();
    };
    tiles
        .iter()
        .map(|tile| {
            let badge = match &tile.icon {
                TileIcon::Image(_) => "img".to_string(),
                TileIcon::Placeholder { label, .. } => label.clone(),
            };
            format!(
                "  [{badge:>3}] {:<24} {:<12} {}",
                tile.name,
                tile.id,
                status_label(tile.running)
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    //! Unit tests for console rendering.

    use aviator_core::{AppEntry, ProcessStatusMap};
    use aviator_ui::Notification;

    use super::*;

    #[test]
    fn tiles_render_one_line_each() {
        let statuses: ProcessStatusMap = [("steam", true)].into_iter().collect();
        let catalog = CatalogView::render(
            &[AppEntry::new("steam", "Steam"), AppEntry::new("vlc", "VLC")],
            &statuses,
        );
        let lines = describe(&SessionUpdate::Catalog(catalog));
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("Running"));
        assert!(lines[1].contains("Stopped"));
    }

    #[test]
    fn notifications_carry_level_tag() {
        let lines = describe(&SessionUpdate::Notification(Notification::info("App list updated")));
        assert_eq!(lines, vec!["[info] App list updated".to_string()]);
        assert!(describe(&SessionUpdate::Polling { active: true }).is_empty());
    }
}
