//! Integration tests for catalog rendering and indicator updates.

use aviator_core::{AppEntry, AppIcon, ProcessStatusMap};
use aviator_ui::{CatalogView, TileIcon};

fn alpha_beta() -> Vec<AppEntry> {
    vec![AppEntry::new("a", "Alpha"), AppEntry::new("b", "Beta")]
}

#[test]
fn catalog_render_tests_indicators_follow_status_map() {
    let statuses: ProcessStatusMap = [("a", true)].into_iter().collect();
    let view = CatalogView::render(&alpha_beta(), &statuses);

    assert_eq!(view.tile_ids(), vec!["a", "b"]);
    assert!(view.tile("a").expect("tile a is rendered").running);
    assert!(!view.tile("b").expect("tile b is rendered").running);
}

#[test]
fn catalog_render_tests_empty_catalog_renders_placeholder() {
    let view = CatalogView::render(&[], &ProcessStatusMap::new());

    assert_eq!(view, CatalogView::Empty);
    assert!(view.tile_ids().is_empty());
    assert!(
        view.placeholder_text()
            .expect("empty state has text")
            .starts_with("No apps configured")
    );
}

#[test]
fn catalog_render_tests_update_indicators_keeps_tiles() {
    let mut view = CatalogView::render(&alpha_beta(), &ProcessStatusMap::new());
    let before: Vec<String> = view.tile_ids().into_iter().map(str::to_string).collect();

    let statuses: ProcessStatusMap = [("b", true)].into_iter().collect();
    let changes = view.update_indicators(&statuses);

    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].id, "b");
    assert!(changes[0].running);
    assert_eq!(view.tile_ids(), before);
    assert!(view.update_indicators(&statuses).is_empty());
}

#[test]
fn catalog_render_tests_icon_or_placeholder() {
    let entries = vec![
        AppEntry::new("a", "Alpha").with_icon(AppIcon::from_bytes(vec![1, 2, 3])),
        AppEntry::new("b", "Beta"),
    ];
    let view = CatalogView::render(&entries, &ProcessStatusMap::new());

    assert!(matches!(
        view.tile("a").expect("tile a is rendered").icon,
        TileIcon::Image(_)
    ));
    match &view.tile("b").expect("tile b is rendered").icon {
        TileIcon::Placeholder {
            hue,
            accent_hue,
            label,
        } => {
            assert_eq!(*hue, 300);
            assert_eq!(*accent_hue, 340);
            assert_eq!(label, "BE");
        }
        other => panic!("expected placeholder, got {other:?}"),
    }
}
