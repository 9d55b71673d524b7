#![warn(missing_docs)]
//! # aviator-ui
//!
//! ## Purpose
//! Defines the view-facing state model for the `aviator` client.
//!
//! ## Responsibilities
//! - Render the catalog into id-keyed tiles or an explicit placeholder.
//! - Re-apply running/stopped indicators without re-rendering tiles.
//! - Model the detail view, connection badge, gate surface and notifications.
//!
//! ## Data flow
//! Session controller events mutate [`ViewState`], and observers receive the
//! changed parts to draw them in whatever front-end hosts the client.
//!
//! ## Ownership and lifetimes
//! `ViewState` owns every string and icon it shows so observers can clone
//! snapshots freely.
//!
//! ## Error model
//! This crate favors explicit state over recoverable errors.

use std::time::Duration;

use aviator_core::{AppEntry, AppIcon, ProcessStatusMap};

/// Default notification lifetime.
pub const DEFAULT_NOTIFICATION_MS: u64 = 2_000;

/// Severity of a transient notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    /// Neutral progress message.
    Info,
    /// Operation succeeded.
    Success,
    /// Degraded state the user should know about.
    Warning,
    /// Operation failed.
    Error,
}

/// Non-blocking message auto-dismissed after `dismiss_after`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Text shown to the user.
    pub message: String,
    /// Severity.
    pub level: NotificationLevel,
    /// Auto-dismiss delay.
    pub dismiss_after: Duration,
}

impl Notification {
    /// Creates a notification with an explicit lifetime in milliseconds.
    pub fn new(
        level: NotificationLevel,
        message: impl Into<String>,
        dismiss_after_ms: u64,
    ) -> Self {
        Self {
            message: message.into(),
            level,
            dismiss_after: Duration::from_millis(dismiss_after_ms),
        }
    }

    /// Info notification with the default lifetime.
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, message, DEFAULT_NOTIFICATION_MS)
    }
}

/// Icon shown on a tile or in the detail view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileIcon {
    /// Server-provided image.
    Image(AppIcon),
    /// Generated gradient placeholder.
    Placeholder {
        /// Primary gradient hue in degrees.
        hue: u16,
        /// Secondary gradient hue in degrees.
        accent_hue: u16,
        /// Up to two upper-cased leading characters of the name.
        label: String,
    },
}

impl TileIcon {
    /// Uses the entry's icon, or derives a placeholder from its name.
    pub fn for_entry(entry: &AppEntry) -> Self {
        match &entry.icon {
            Some(icon) => Self::Image(icon.clone()),
            None => {
                let hue = placeholder_hue(&entry.name);
                Self::Placeholder {
                    hue,
                    accent_hue: hue + 40,
                    label: placeholder_label(&entry.name),
                }
            }
        }
    }
}

/// Hue derived from the first UTF-16 unit of `name`: `code * 10 mod 360`.
pub fn placeholder_hue(name: &str) -> u16 {
    name.encode_utf16()
        .next()
        .map(|unit| ((u32::from(unit) * 10) % 360) as u16)
        .unwrap_or(0)
}

/// First two characters of `name`, upper-cased.
pub fn placeholder_label(name: &str) -> String {
    name.chars().take(2).collect::<String>().to_uppercase()
}

/// Status text for a running indicator.
pub fn status_label(running: bool) -> &'static str {
    if running { "Running" } else { "Stopped" }
}

/// One rendered catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    /// Key: the entry id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Icon or placeholder.
    pub icon: TileIcon,
    /// Running indicator.
    pub running: bool,
}

/// Indicator flip produced by [`CatalogView::update_indicators`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorChange {
    /// Tile key.
    pub id: String,
    /// New indicator value.
    pub running: bool,
}

/// Rendered catalog area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogView {
    /// Nothing rendered (offline or before bootstrap).
    Cleared,
    /// Bootstrap in progress.
    Connecting,
    /// The gate hides the catalog.
    AuthorizationRequired,
    /// Server has no entries configured.
    Empty,
    /// Tiles in server order.
    Tiles(Vec<Tile>),
}

impl CatalogView {
    /// Renders `entries` with indicators from `statuses`.
    ///
    /// An empty list renders [`CatalogView::Empty`], never zero tiles.
    pub fn render(entries: &[AppEntry], statuses: &ProcessStatusMap) -> Self {
        if entries.is_empty() {
            return Self::Empty;
        }

        Self::Tiles(
            entries
                .iter()
                .map(|entry| Tile {
                    id: entry.id.clone(),
                    name: entry.name.clone(),
                    icon: TileIcon::for_entry(entry),
                    running: statuses.is_running(&entry.id),
                })
                .collect(),
        )
    }

    /// Re-applies indicators to existing tiles and reports the flips.
    pub fn update_indicators(&mut self, statuses: &ProcessStatusMap) -> Vec<IndicatorChange> {
        let Self::Tiles(tiles) = self else {
            return Vec::new();
        };

        let mut changes = Vec::new();
        for tile in tiles.iter_mut() {
            let running = statuses.is_running(&tile.id);
            if tile.running != running {
                tile.running = running;
                changes.push(IndicatorChange {
                    id: tile.id.clone(),
                    running,
                });
            }
        }
        changes
    }

    /// Tile with key `id`, if rendered.
    pub fn tile(&self, id: &str) -> Option<&Tile> {
        match self {
            Self::Tiles(tiles) => tiles.iter().find(|tile| tile.id == id),
            _ => None,
        }
    }

    /// Rendered tile keys in order.
    pub fn tile_ids(&self) -> Vec<&str> {
        match self {
            Self::Tiles(tiles) => tiles.iter().map(|tile| tile.id.as_str()).collect(),
            _ => Vec::new(),
        }
    }

    /// Placeholder text for non-tile states.
    pub fn placeholder_text(&self) -> Option<&'static str> {
        match self {
            Self::Cleared | Self::Tiles(_) => None,
            Self::Connecting => Some("Connecting..."),
            Self::AuthorizationRequired => Some("Authorization required. Please enter PIN."),
            Self::Empty => Some("No apps configured. Go to the Host PC and add some apps!"),
        }
    }
}

/// Detail view of one selected entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailView {
    /// Selected entry id.
    pub app_id: String,
    /// Display name.
    pub name: String,
    /// Icon or placeholder.
    pub icon: TileIcon,
    /// Running indicator.
    pub running: bool,
}

impl DetailView {
    /// Builds the detail view for `entry`.
    pub fn for_entry(entry: &AppEntry, running: bool) -> Self {
        Self {
            app_id: entry.id.clone(),
            name: entry.name.clone(),
            icon: TileIcon::for_entry(entry),
            running,
        }
    }

    /// "Running" or "Stopped".
    pub fn status_text(&self) -> &'static str {
        status_label(self.running)
    }
}

/// Header connection badge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionBadge {
    /// No answer yet.
    Connecting,
    /// Server reachable.
    Connected {
        /// Last known hostname.
        hostname: String,
    },
    /// Server unreachable.
    Offline,
}

impl ConnectionBadge {
    /// Badge text.
    pub fn text(&self) -> String {
        match self {
            Self::Connecting => "Connecting...".to_string(),
            Self::Connected { hostname } => format!("Connected to {hostname}"),
            Self::Offline => "Server Not Available".to_string(),
        }
    }
}

/// Credential-entry surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GateSurface {
    /// Surface is shown.
    pub visible: bool,
    /// Last PIN was rejected; input has been cleared.
    pub rejected: bool,
}

/// Catalog presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutMode {
    /// Tile grid.
    #[default]
    Grid,
    /// Compact list.
    List,
}

/// Aggregate view state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    /// Header badge.
    pub badge: ConnectionBadge,
    /// Server version label, when reported.
    pub version_label: Option<String>,
    /// Persistent offline banner.
    pub offline_banner: bool,
    /// Header controls and catalog section are shown.
    pub main_view_visible: bool,
    /// Credential-entry surface.
    pub gate: GateSurface,
    /// Catalog area.
    pub catalog: CatalogView,
    /// Open detail view.
    pub detail: Option<DetailView>,
    /// Catalog presentation.
    pub layout: LayoutMode,
}

impl ViewState {
    /// Initial view before bootstrap.
    pub fn new() -> Self {
        Self {
            badge: ConnectionBadge::Connecting,
            version_label: None,
            offline_banner: false,
            main_view_visible: false,
            gate: GateSurface::default(),
            catalog: CatalogView::Cleared,
            detail: None,
            layout: LayoutMode::Grid,
        }
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new()
    }
}
