//! Override sessions: open a persisted configuration override, edit it
//! in memory, and write it back (or clear it) exactly once on teardown.
//!
//! The session is the only holder of the mutable override copy for the
//! lifetime of the screen. The persisted slot is touched twice at most:
//! once at [`OverrideSession::open`] and once at
//! [`OverrideSession::close`], and `close` performs exactly one of
//! patch or clear — clear always wins when it was requested.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::store::OverrideStore;

/// Named persistence location for a layered configuration override.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OverrideSlot {
    /// Durable across engine restarts. The settings screen edits this one.
    Persist,
    /// Valid for the current engine session only.
    Session,
}

impl OverrideSlot {
    /// Stable identifier used in file names and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Persist => "persist",
            Self::Session => "session",
        }
    }
}

/// User-specific overrides of engine behavior.
///
/// The fields below are the meta features the settings screen can
/// toggle; everything else the engine stores in the slot round-trips
/// untouched through `extra`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConfigurationOverride {
    /// Average the two RTT samples of a delay test.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unified_delay: Option<bool>,
    /// Dial all resolved addresses concurrently and keep the fastest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tcp_concurrent: Option<bool>,
    /// Use geodata files (GeoSite) instead of mmdb-only matching.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geodata_mode: Option<bool>,
    /// Process matching mode ("strict", "always", "off").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub find_process_mode: Option<String>,
    /// Unknown engine keys, preserved verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ConfigurationOverride {
    /// Flip a tri-state feature flag: unset counts as `false`.
    fn toggle(flag: &mut Option<bool>) {
        *flag = Some(!flag.unwrap_or(false));
    }

    /// Toggle unified delay measurement.
    pub fn toggle_unified_delay(&mut self) {
        Self::toggle(&mut self.unified_delay);
    }

    /// Toggle concurrent TCP dialing.
    pub fn toggle_tcp_concurrent(&mut self) {
        Self::toggle(&mut self.tcp_concurrent);
    }

    /// Toggle geodata mode.
    pub fn toggle_geodata_mode(&mut self) {
        Self::toggle(&mut self.geodata_mode);
    }
}

/// Which deferred action [`OverrideSession::close`] performed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloseAction {
    /// The in-memory override was written back to the slot.
    Patched,
    /// The slot was cleared to its default state.
    Cleared,
}

/// Exclusive editing session over one override slot.
///
/// Constructed before the UI is attached, consumed by `close` after the
/// dispatch loop ends. Dropping an unclosed session is a bug in the
/// runtime's teardown path and is logged, never silently written.
#[derive(Debug)]
pub struct OverrideSession {
    slot: OverrideSlot,
    configuration: ConfigurationOverride,
    clear_requested: bool,
    closed: bool,
}

impl OverrideSession {
    /// Read the slot's current override and start a session over it.
    ///
    /// # Errors
    ///
    /// `ResourceUnavailable` when the store cannot be reached. An empty
    /// or absent slot yields a default override, not an error.
    pub fn open(store: &dyn OverrideStore, slot: OverrideSlot) -> Result<Self> {
        let configuration = store.query(slot)?;
        tracing::debug!(slot = slot.as_str(), "override session opened");
        Ok(Self {
            slot,
            configuration,
            clear_requested: false,
            closed: false,
        })
    }

    /// Slot this session owns.
    #[must_use]
    pub const fn slot(&self) -> OverrideSlot {
        self.slot
    }

    /// Immutable view of the in-memory override copy.
    #[must_use]
    pub const fn configuration(&self) -> &ConfigurationOverride {
        &self.configuration
    }

    /// Mutable access for in-process UI edits.
    pub const fn configuration_mut(&mut self) -> &mut ConfigurationOverride {
        &mut self.configuration
    }

    /// Mark the session for clear-on-close. Once requested, `close`
    /// will never re-apply the in-memory copy.
    pub fn request_clear(&mut self) {
        self.clear_requested = true;
        tracing::info!(slot = self.slot.as_str(), "override reset requested");
    }

    /// Whether clear-on-close has been requested.
    #[must_use]
    pub const fn clear_requested(&self) -> bool {
        self.clear_requested
    }

    /// Perform the deferred slot action: clear if requested, otherwise
    /// write the in-memory copy back. Consumes the session so it can
    /// run at most once.
    ///
    /// # Errors
    ///
    /// `ResourceUnavailable` when the store cannot be reached; the
    /// session still counts as closed in that case.
    pub fn close(mut self, store: &dyn OverrideStore) -> Result<CloseAction> {
        self.closed = true;
        if self.clear_requested {
            store.clear(self.slot)?;
            tracing::info!(slot = self.slot.as_str(), "override slot cleared");
            Ok(CloseAction::Cleared)
        } else {
            store.patch(self.slot, &self.configuration)?;
            tracing::debug!(slot = self.slot.as_str(), "override written back");
            Ok(CloseAction::Patched)
        }
    }
}

impl Drop for OverrideSession {
    fn drop(&mut self) {
        if !self.closed {
            tracing::warn!(
                slot = self.slot.as_str(),
                "override session dropped without close; slot left as opened"
            );
        }
    }
}
