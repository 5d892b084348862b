//! User settings loaded at startup from `settings.conf`.
//!
//! A tiny `key = value` format with `#`/`//` comments, resolved from
//! the metatune config directory. Everything has a default; a missing
//! or partially invalid file never prevents startup.

use std::path::PathBuf;

/// Resolved user settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Override for the application data directory (and thus the
    /// engine's `clash` subdirectory).
    pub data_dir: Option<PathBuf>,
    /// Explicit picker program (`zenity` or `kdialog`); `None` means
    /// try both in order.
    pub picker_command: Option<String>,
    /// Start in dry-run mode (in-memory override store) by default.
    pub app_dry_run_default: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: None,
            picker_command: None,
            app_dry_run_default: false,
        }
    }
}

/// Load settings from `settings.conf` in the config directory, falling
/// back to defaults when the file is missing or unreadable.
#[must_use]
pub fn settings() -> Settings {
    let path = crate::paths::config_dir().join("settings.conf");
    match std::fs::read_to_string(&path) {
        Ok(content) => parse_settings(&content),
        Err(_) => Settings::default(),
    }
}

/// Strip a trailing `#` or `//` comment from a value.
fn strip_inline_comment(val: &str) -> &str {
    let cut = val
        .find('#')
        .into_iter()
        .chain(val.find("//"))
        .min()
        .unwrap_or(val.len());
    val[..cut].trim()
}

/// Parse settings file content. Unknown keys are ignored.
fn parse_settings(content: &str) -> Settings {
    let mut out = Settings::default();
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("//") {
            continue;
        }
        let Some((raw_key, raw_val)) = trimmed.split_once('=') else {
            continue;
        };
        let key = raw_key.trim().to_lowercase().replace(['.', '-', ' '], "_");
        let val = strip_inline_comment(raw_val.trim());
        match key.as_str() {
            "data_dir" => {
                if !val.is_empty() {
                    out.data_dir = Some(PathBuf::from(val));
                }
            }
            "picker_command" | "picker" => {
                let lv = val.to_ascii_lowercase();
                if lv == "zenity" || lv == "kdialog" {
                    out.picker_command = Some(lv);
                }
            }
            "app_dry_run_default" | "dry_run_default" => {
                let lv = val.to_ascii_lowercase();
                out.app_dry_run_default = lv == "true" || lv == "1" || lv == "yes" || lv == "on";
            }
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{Settings, parse_settings};
    use std::path::PathBuf;

    /// What: All known keys parse, with comments and casing tolerated.
    #[test]
    fn parses_known_keys() {
        let content = "\
# metatune settings
data-dir = /srv/metatune   # engine storage
picker = KDialog
dry_run_default = yes
";
        let s = parse_settings(content);
        assert_eq!(s.data_dir, Some(PathBuf::from("/srv/metatune")));
        assert_eq!(s.picker_command.as_deref(), Some("kdialog"));
        assert!(s.app_dry_run_default);
    }

    /// What: Unknown keys, comments, and malformed lines are ignored.
    #[test]
    fn ignores_noise() {
        let content = "\
// comment
no_equals_here
unknown_key = whatever
picker = nautilus
";
        assert_eq!(parse_settings(content), Settings::default());
    }

    /// What: Empty content yields pure defaults.
    #[test]
    fn empty_is_default() {
        let s = parse_settings("");
        assert_eq!(s, Settings::default());
        assert!(!s.app_dry_run_default);
    }
}
