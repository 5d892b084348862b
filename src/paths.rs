//! Directory resolution for metatune's configuration, logs, and the
//! engine's private storage.
//!
//! The engine's geo databases live under a `clash` subdirectory of the
//! data directory, matching the layout the proxy engine itself reads
//! from. Configuration and logs follow the XDG conventions.

use std::env;
use std::path::{Path, PathBuf};

/// Resolve an XDG base directory from environment or default to `$HOME` + segments.
///
/// Inputs:
/// - `var`: Environment variable to check (e.g., `XDG_DATA_HOME`).
/// - `home_default`: Fallback path segments relative to `$HOME` if `var` is unset/empty.
///
/// Output: Resolved base directory path.
fn xdg_base_dir(var: &str, home_default: &[&str]) -> PathBuf {
    if let Ok(p) = env::var(var)
        && !p.trim().is_empty()
    {
        return PathBuf::from(p);
    }
    let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
    let mut base = PathBuf::from(home);
    for seg in home_default {
        base = base.join(seg);
    }
    base
}

/// Config directory: `$XDG_CONFIG_HOME/metatune` or `~/.config/metatune` (ensured to exist).
pub fn config_dir() -> PathBuf {
    let base = xdg_base_dir("XDG_CONFIG_HOME", &[".config"]);
    let dir = base.join("metatune");
    let _ = std::fs::create_dir_all(&dir);
    dir
}

/// Logs directory under config: `.../metatune/logs` (ensured to exist).
pub fn logs_dir() -> PathBuf {
    let dir = config_dir().join("logs");
    let _ = std::fs::create_dir_all(&dir);
    dir
}

/// Data directory holding the persisted override slots and the engine's
/// private storage: `$XDG_DATA_HOME/metatune` or `~/.local/share/metatune`
/// (ensured to exist).
pub fn data_dir() -> PathBuf {
    let base = xdg_base_dir("XDG_DATA_HOME", &[".local", "share"]);
    let dir = base.join("metatune");
    let _ = std::fs::create_dir_all(&dir);
    dir
}

/// Engine geo database directory: the `clash` subdirectory of `data`
/// (ensured to exist). Imported GeoIP/GeoSite/Country files land here.
pub fn clash_dir(data: &Path) -> PathBuf {
    let dir = data.join("clash");
    let _ = std::fs::create_dir_all(&dir);
    dir
}
