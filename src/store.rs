//! Persistent override store backends.
//!
//! The dispatch loop only talks to the [`OverrideStore`] trait; the
//! binary wires in the JSON-file store (or the in-memory store for
//! `--dry-run`), and tests drive the in-memory store directly.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::{Error, Result};
use crate::session::{ConfigurationOverride, OverrideSlot};

/// Engine-side persistence for configuration override slots.
pub trait OverrideStore: Send + Sync {
    /// Read the slot's current override; absent content yields the
    /// default document.
    ///
    /// # Errors
    ///
    /// `ResourceUnavailable` when the backing storage cannot be reached.
    fn query(&self, slot: OverrideSlot) -> Result<ConfigurationOverride>;

    /// Replace the slot's content with `configuration`. Idempotent.
    ///
    /// # Errors
    ///
    /// `ResourceUnavailable` when the backing storage cannot be written.
    fn patch(&self, slot: OverrideSlot, configuration: &ConfigurationOverride) -> Result<()>;

    /// Reset the slot to its default (absent) state. Clearing an
    /// already-empty slot succeeds.
    ///
    /// # Errors
    ///
    /// `ResourceUnavailable` when the backing storage cannot be written.
    fn clear(&self, slot: OverrideSlot) -> Result<()>;
}

/// JSON-file store under the application data directory, one file per
/// slot (`override_persist.json`, `override_session.json`).
#[derive(Clone, Debug)]
pub struct FileOverrideStore {
    root: PathBuf,
}

impl FileOverrideStore {
    /// Store rooted at `root` (usually the app data directory).
    #[must_use]
    pub const fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn slot_path(&self, slot: OverrideSlot) -> PathBuf {
        self.root.join(format!("override_{}.json", slot.as_str()))
    }
}

impl OverrideStore for FileOverrideStore {
    fn query(&self, slot: OverrideSlot) -> Result<ConfigurationOverride> {
        let path = self.slot_path(slot);
        let content = match std::fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ConfigurationOverride::default());
            }
            Err(e) => return Err(Error::ResourceUnavailable(e.to_string())),
        };
        match serde_json::from_str(&content) {
            Ok(cfg) => Ok(cfg),
            Err(e) => {
                // Unreadable content is treated like an empty slot so the
                // screen stays usable; the next commit rewrites the file.
                tracing::warn!(path = %path.display(), error = %e, "override slot unparsable; using default");
                Ok(ConfigurationOverride::default())
            }
        }
    }

    fn patch(&self, slot: OverrideSlot, configuration: &ConfigurationOverride) -> Result<()> {
        std::fs::create_dir_all(&self.root)
            .map_err(|e| Error::ResourceUnavailable(e.to_string()))?;
        let s = serde_json::to_string_pretty(configuration)
            .map_err(|e| Error::ResourceUnavailable(e.to_string()))?;
        std::fs::write(self.slot_path(slot), s)
            .map_err(|e| Error::ResourceUnavailable(e.to_string()))
    }

    fn clear(&self, slot: OverrideSlot) -> Result<()> {
        match std::fs::remove_file(self.slot_path(slot)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::ResourceUnavailable(e.to_string())),
        }
    }
}

/// In-memory store used by `--dry-run` and tests.
#[derive(Debug, Default)]
pub struct MemoryOverrideStore {
    slots: Mutex<HashMap<OverrideSlot, ConfigurationOverride>>,
}

impl MemoryOverrideStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<OverrideSlot, ConfigurationOverride>>> {
        self.slots
            .lock()
            .map_err(|_| Error::ResourceUnavailable("override store mutex poisoned".to_string()))
    }

    /// Raw slot content, for test assertions; `None` means cleared/absent.
    ///
    /// # Errors
    ///
    /// `ResourceUnavailable` when the store mutex is poisoned.
    pub fn stored(&self, slot: OverrideSlot) -> Result<Option<ConfigurationOverride>> {
        Ok(self.lock()?.get(&slot).cloned())
    }
}

impl OverrideStore for MemoryOverrideStore {
    fn query(&self, slot: OverrideSlot) -> Result<ConfigurationOverride> {
        Ok(self.lock()?.get(&slot).cloned().unwrap_or_default())
    }

    fn patch(&self, slot: OverrideSlot, configuration: &ConfigurationOverride) -> Result<()> {
        self.lock()?.insert(slot, configuration.clone());
        Ok(())
    }

    fn clear(&self, slot: OverrideSlot) -> Result<()> {
        self.lock()?.remove(&slot);
        Ok(())
    }
}
