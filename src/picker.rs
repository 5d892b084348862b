//! External file-picker actor.
//!
//! The picker runs outside the dispatch loop on its own thread and
//! reports back by pushing a [`Request::GeoFilePicked`] onto the same
//! request channel the UI sends into, so a returned file is just
//! another ordinary request event. An empty result (dialog dismissed)
//! is reported as `locator: None`.

use tokio::sync::mpsc;

use crate::import::ImportKind;
use crate::locator::ContentLocator;
use crate::state::Request;

/// Launch the picker dialog for `kind` off the dispatch loop.
///
/// During tests and headless runs no dialog is opened; a cancelled
/// pick is reported instead so the loop's handling stays observable.
pub fn spawn_geo_file_picker(kind: ImportKind, request_tx: mpsc::UnboundedSender<Request>) {
    if cfg!(test) || std::env::var_os("METATUNE_TEST_HEADLESS").is_some() {
        let _ = request_tx.send(Request::GeoFilePicked {
            kind,
            locator: None,
        });
        return;
    }
    tracing::info!(kind = kind.label(), "opening file picker");
    std::thread::spawn(move || {
        let locator = pick_via_dialog(kind);
        if locator.is_none() {
            tracing::info!(kind = kind.label(), "picker cancelled");
        }
        // The loop may already be gone when the dialog closes late.
        let _ = request_tx.send(Request::GeoFilePicked { kind, locator });
    });
}

/// Run zenity (or kdialog) and return the selected file, if any.
fn pick_via_dialog(kind: ImportKind) -> Option<ContentLocator> {
    let title = format!("Import {} database", kind.label());
    let try_cmd = |prog: &str, args: &[&str]| -> Option<String> {
        tracing::debug!(prog = %prog, "trying file picker");
        let res = std::process::Command::new(prog)
            .args(args)
            .stdin(std::process::Stdio::null())
            .output()
            .ok()?;
        let s = String::from_utf8_lossy(&res.stdout).trim().to_string();
        if s.is_empty() { None } else { Some(s) }
    };

    let zenity = || try_cmd("zenity", &["--file-selection", &format!("--title={title}")]);
    let kdialog = || try_cmd("kdialog", &["--getopenfilename", ".", "*"]);

    let picked = match crate::settings::settings().picker_command.as_deref() {
        Some("zenity") => zenity(),
        Some("kdialog") => kdialog(),
        _ => zenity().or_else(kdialog),
    };
    picked.map(ContentLocator::new)
}

#[cfg(test)]
mod tests {
    use super::spawn_geo_file_picker;
    use crate::import::ImportKind;
    use crate::state::Request;

    /// What: Under test the picker actor reports a cancelled pick on
    /// the request channel instead of opening a dialog.
    ///
    /// - Input: spawn for GeoSite
    /// - Output: one `GeoFilePicked { locator: None }` request
    #[tokio::test]
    async fn test_picker_reports_cancel() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        spawn_geo_file_picker(ImportKind::GeoSite, tx);
        let req = rx.recv().await.expect("picker must report back");
        assert_eq!(
            req,
            Request::GeoFilePicked {
                kind: ImportKind::GeoSite,
                locator: None
            }
        );
    }
}
