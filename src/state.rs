//! Core state types for the settings screen.
//!
//! Defines the request vocabulary flowing from the UI (and the picker
//! actor) into the dispatch loop, the menu of actions the screen
//! offers, modal dialogs, and the central [`AppState`] mutated by the
//! event and UI layers.

use std::time::{Duration, Instant};

use ratatui::widgets::ListState;

use crate::import::ImportKind;
use crate::locator::ContentLocator;
use crate::session::OverrideSession;

/// A user-driven request consumed exactly once by the dispatch loop.
///
/// Picker callbacks re-enter as [`Request::GeoFilePicked`] on the same
/// channel the UI sends into, preserving single-consumer ordering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Request {
    /// Open the picker for a GeoIP database.
    ImportGeoIp,
    /// Open the picker for a GeoSite database.
    ImportGeoSite,
    /// Open the picker for a Country database.
    ImportCountry,
    /// Ask for confirmation, then clear the persisted override.
    ResetOverride,
    /// Picker round trip finished; `locator` is `None` when the user
    /// cancelled the dialog.
    GeoFilePicked {
        /// Category the picker was opened for.
        kind: ImportKind,
        /// Picked content, if any.
        locator: Option<ContentLocator>,
    },
}

impl Request {
    /// The import category a plain import request targets, if any.
    #[must_use]
    pub const fn import_kind(&self) -> Option<ImportKind> {
        match self {
            Self::ImportGeoIp => Some(ImportKind::GeoIp),
            Self::ImportGeoSite => Some(ImportKind::GeoSite),
            Self::ImportCountry => Some(ImportKind::Country),
            Self::ResetOverride | Self::GeoFilePicked { .. } => None,
        }
    }
}

/// One row in the settings menu.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuAction {
    /// Toggle unified delay measurement on the in-memory override.
    ToggleUnifiedDelay,
    /// Toggle concurrent TCP dialing on the in-memory override.
    ToggleTcpConcurrent,
    /// Toggle geodata mode on the in-memory override.
    ToggleGeodataMode,
    /// Import a GeoIP database file.
    ImportGeoIp,
    /// Import a GeoSite database file.
    ImportGeoSite,
    /// Import a Country database file.
    ImportCountry,
    /// Reset the persisted override (destructive, confirmed).
    ResetOverride,
}

impl MenuAction {
    /// Menu rows in display order.
    pub const ALL: [Self; 7] = [
        Self::ToggleUnifiedDelay,
        Self::ToggleTcpConcurrent,
        Self::ToggleGeodataMode,
        Self::ImportGeoIp,
        Self::ImportGeoSite,
        Self::ImportCountry,
        Self::ResetOverride,
    ];

    /// Row label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ToggleUnifiedDelay => "Unified delay",
            Self::ToggleTcpConcurrent => "TCP concurrent",
            Self::ToggleGeodataMode => "Geodata mode",
            Self::ImportGeoIp => "Import GeoIP database",
            Self::ImportGeoSite => "Import GeoSite database",
            Self::ImportCountry => "Import Country database",
            Self::ResetOverride => "Reset override…",
        }
    }

    /// The request this row emits into the dispatch loop, if it emits
    /// one (toggles mutate the session directly instead).
    #[must_use]
    pub fn request(self) -> Option<Request> {
        match self {
            Self::ImportGeoIp => Some(Request::ImportGeoIp),
            Self::ImportGeoSite => Some(Request::ImportGeoSite),
            Self::ImportCountry => Some(Request::ImportCountry),
            Self::ResetOverride => Some(Request::ResetOverride),
            Self::ToggleUnifiedDelay | Self::ToggleTcpConcurrent | Self::ToggleGeodataMode => None,
        }
    }
}

/// Modal dialog state for the screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Modal {
    /// No modal; the loop is idle/listening.
    #[default]
    None,
    /// Blocking yes/no prompt before the destructive reset.
    ConfirmReset,
    /// Informational alert with a non-interactive message.
    Alert {
        /// Message body.
        message: String,
    },
}

/// Central mutable state of the settings screen.
#[derive(Debug)]
pub struct AppState {
    /// The override session; `None` only after teardown has consumed it.
    pub session: Option<OverrideSession>,
    /// Index of the highlighted menu row.
    pub selected: usize,
    /// List selection state for the menu.
    pub list_state: ListState,
    /// Active modal dialog, if any.
    pub modal: Modal,
    /// If `true`, the override store is the in-memory one.
    pub dry_run: bool,
    /// Transient notice shown at the bottom of the screen.
    pub toast_message: Option<String>,
    /// Deadline after which the toast disappears.
    pub toast_expires_at: Option<Instant>,
    /// Number of imports currently copying in the background.
    pub imports_in_flight: usize,
}

impl Default for AppState {
    fn default() -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));
        Self {
            session: None,
            selected: 0,
            list_state,
            modal: Modal::None,
            dry_run: false,
            toast_message: None,
            toast_expires_at: None,
            imports_in_flight: 0,
        }
    }
}

impl AppState {
    /// Whether a modal is open. While one is, the dispatch loop leaves
    /// new requests queued on the channel.
    #[must_use]
    pub fn modal_active(&self) -> bool {
        self.modal != Modal::None
    }

    /// Show a transient notice for `ttl`.
    pub fn show_toast(&mut self, message: impl Into<String>, ttl: Duration) {
        self.toast_message = Some(message.into());
        self.toast_expires_at = Some(Instant::now() + ttl);
    }

    /// Drop the toast once its deadline has passed.
    pub fn expire_toast(&mut self) {
        if let Some(deadline) = self.toast_expires_at
            && Instant::now() >= deadline
        {
            self.toast_message = None;
            self.toast_expires_at = None;
        }
    }
}
