//! Application runtime: terminal lifecycle, channels, and the request
//! dispatch loop.
//!
//! One logical sequential flow per screen instance: the loop waits on
//! either a terminal event or a queued request and handles exactly one
//! at a time. While a modal is open the request branch is disabled, so
//! concurrently arriving requests stay queued on the channel instead of
//! interleaving with the one being confirmed. The override session is
//! opened before the UI attaches and closed exactly once after the loop
//! ends, whatever the exit path was.

use std::io::Stdout;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    event::{self, Event as CEvent},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::{Backend, CrosstermBackend, TestBackend},
};
use tokio::{select, sync::mpsc, time};

use crate::args::Args;
use crate::error::Result;
use crate::events::handle_event;
use crate::import::{self, ImportOutcome};
use crate::locator::{ContentSource, FsContentSource};
use crate::session::{OverrideSession, OverrideSlot};
use crate::state::{AppState, Modal, Request};
use crate::store::{FileOverrideStore, MemoryOverrideStore, OverrideStore};
use crate::ui::ui;

/// How long transient notices stay on screen.
const TOAST_TTL: Duration = Duration::from_secs(6);

/// Whether terminal setup is bypassed (tests, CI).
fn headless() -> bool {
    std::env::var_os("METATUNE_TEST_HEADLESS").is_some()
}

fn setup_terminal() -> Result<()> {
    enable_raw_mode()?;
    execute!(std::io::stdout(), EnterAlternateScreen)?;
    Ok(())
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    execute!(std::io::stdout(), LeaveAlternateScreen)?;
    Ok(())
}

/// Start the settings screen runtime and run the dispatch loop.
///
/// - Resolves directories and the override store (in-memory under
///   `--dry-run`)
/// - Opens the override session for the Persist slot before the UI is
///   shown
/// - Spawns the input reader thread and the tick task, then drives the
///   loop
/// - Closes the session (commit or clear, exactly once) after the loop,
///   on every exit path
///
/// # Errors
///
/// Returns an error when the override store is unreachable at open or
/// the terminal cannot be initialized.
pub async fn run(args: &Args) -> Result<()> {
    let user_settings = crate::settings::settings();
    let dry_run = args.dry_run || user_settings.app_dry_run_default;
    let data_dir = args
        .data_dir
        .clone()
        .or(user_settings.data_dir)
        .unwrap_or_else(crate::paths::data_dir);
    let clash_dir = crate::paths::clash_dir(&data_dir);
    tracing::info!(data_dir = %data_dir.display(), dry_run, "starting settings screen");

    let store: Arc<dyn OverrideStore> = if dry_run {
        Arc::new(MemoryOverrideStore::new())
    } else {
        Arc::new(FileOverrideStore::new(data_dir))
    };

    // Acquired before the UI is shown; written back or cleared after
    // the loop, never in between.
    let session = OverrideSession::open(store.as_ref(), OverrideSlot::Persist)?;

    let mut app = AppState {
        session: Some(session),
        dry_run,
        ..AppState::default()
    };

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<CEvent>();
    let (request_tx, mut request_rx) = mpsc::unbounded_channel::<Request>();
    let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel::<ImportOutcome>();
    let (tick_tx, mut tick_rx) = mpsc::unbounded_channel::<()>();

    if !headless() {
        let tx = event_tx.clone();
        std::thread::spawn(move || {
            loop {
                if let Ok(true) = event::poll(Duration::from_millis(50))
                    && let Ok(ev) = event::read()
                    && tx.send(ev).is_err()
                {
                    break;
                }
            }
        });
    }

    let tick_tx_bg = tick_tx.clone();
    tokio::spawn(async move {
        let mut interval = time::interval(Duration::from_millis(200));
        loop {
            interval.tick().await;
            if tick_tx_bg.send(()).is_err() {
                break;
            }
        }
    });

    let source: Arc<dyn ContentSource> = Arc::new(FsContentSource);

    let loop_result = if headless() {
        // TestBackend cannot fail to construct; map the uninhabited error away.
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap_or_else(|e| match e {});
        run_loop(
            &mut terminal,
            &mut app,
            &clash_dir,
            &source,
            &mut event_rx,
            &request_tx,
            &mut request_rx,
            &outcome_tx,
            &mut outcome_rx,
            &mut tick_rx,
        )
        .await
    } else {
        setup_terminal()?;
        let mut terminal: Terminal<CrosstermBackend<Stdout>> =
            Terminal::new(CrosstermBackend::new(std::io::stdout()))?;
        run_loop(
            &mut terminal,
            &mut app,
            &clash_dir,
            &source,
            &mut event_rx,
            &request_tx,
            &mut request_rx,
            &outcome_tx,
            &mut outcome_rx,
            &mut tick_rx,
        )
        .await
    };

    // The deferred slot action. Runs whether the loop ended by quit,
    // confirmed reset, or error; clear wins when it was requested.
    if let Some(session) = app.session.take() {
        match session.close(store.as_ref()) {
            Ok(action) => tracing::info!(action = ?action, "override session closed"),
            Err(e) => tracing::warn!(error = %e, "override session close failed"),
        }
    }

    if !headless() {
        restore_terminal()?;
    }
    tracing::info!("settings screen exited");
    loop_result
}

/// The dispatch loop: one request at a time, fair wait across sources.
#[allow(clippy::too_many_arguments)]
async fn run_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut AppState,
    clash_dir: &Path,
    source: &Arc<dyn ContentSource>,
    event_rx: &mut mpsc::UnboundedReceiver<CEvent>,
    request_tx: &mpsc::UnboundedSender<Request>,
    request_rx: &mut mpsc::UnboundedReceiver<Request>,
    outcome_tx: &mpsc::UnboundedSender<ImportOutcome>,
    outcome_rx: &mut mpsc::UnboundedReceiver<ImportOutcome>,
    tick_rx: &mut mpsc::UnboundedReceiver<()>,
) -> Result<()> {
    loop {
        let _ = terminal.draw(|f| ui(f, app));

        select! {
            Some(ev) = event_rx.recv() => {
                if handle_event(ev, app, request_tx) { break; }
            }
            // Requests and import outcomes stay queued while a modal
            // suspends the loop, so a pending confirmation is always
            // answered before anything else reaches the screen.
            Some(req) = request_rx.recv(), if !app.modal_active() => {
                handle_request(req, app, request_tx, outcome_tx, source, clash_dir);
            }
            Some(outcome) = outcome_rx.recv(), if !app.modal_active() => {
                apply_outcome(&outcome, app);
            }
            Some(()) = tick_rx.recv() => {
                app.expire_toast();
            }
            else => break,
        }
    }
    Ok(())
}

/// Sequence one request.
///
/// Reset opens the blocking confirmation; imports hand off to the
/// picker actor; a finished picker round trip starts the byte copy in
/// the background and reports through the outcome channel.
pub(crate) fn handle_request(
    req: Request,
    app: &mut AppState,
    request_tx: &mpsc::UnboundedSender<Request>,
    outcome_tx: &mpsc::UnboundedSender<ImportOutcome>,
    source: &Arc<dyn ContentSource>,
    clash_dir: &Path,
) {
    match req {
        Request::ResetOverride => {
            app.modal = Modal::ConfirmReset;
        }
        Request::GeoFilePicked { kind, locator } => {
            app.imports_in_flight += 1;
            let tx = outcome_tx.clone();
            let src = Arc::clone(source);
            let dir = clash_dir.to_path_buf();
            tokio::spawn(async move {
                let outcome = import::import_geo_file(src, locator, kind, dir).await;
                let _ = tx.send(outcome);
            });
        }
        other => {
            if let Some(kind) = other.import_kind() {
                crate::picker::spawn_geo_file_picker(kind, request_tx.clone());
            }
        }
    }
}

/// Turn an import outcome into user feedback.
pub(crate) fn apply_outcome(outcome: &ImportOutcome, app: &mut AppState) {
    app.imports_in_flight = app.imports_in_flight.saturating_sub(1);
    match outcome {
        ImportOutcome::Succeeded { display_name } => {
            app.show_toast(format!("import succeeded: {display_name}"), TOAST_TTL);
        }
        ImportOutcome::Failed => {
            app.show_toast("import failed", TOAST_TTL);
        }
        ImportOutcome::Rejected { hint } => {
            app.modal = Modal::Alert {
                message: format!("unsupported format, expected one of: {hint}"),
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{apply_outcome, handle_request, run_loop};
    use crate::import::{ImportKind, ImportOutcome};
    use crate::locator::{ContentLocator, ContentSource, FsContentSource};
    use crate::session::{OverrideSession, OverrideSlot};
    use crate::state::{AppState, Modal, Request};
    use crate::store::MemoryOverrideStore;
    use crossterm::event::{Event as CEvent, KeyCode, KeyEvent};
    use ratatui::{Terminal, backend::TestBackend};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn channels() -> (
        tokio::sync::mpsc::UnboundedSender<Request>,
        tokio::sync::mpsc::UnboundedReceiver<Request>,
        tokio::sync::mpsc::UnboundedSender<ImportOutcome>,
        tokio::sync::mpsc::UnboundedReceiver<ImportOutcome>,
    ) {
        let (rtx, rrx) = tokio::sync::mpsc::unbounded_channel();
        let (otx, orx) = tokio::sync::mpsc::unbounded_channel();
        (rtx, rrx, otx, orx)
    }

    /// What: A reset request suspends the loop behind the confirmation
    /// modal instead of mutating anything.
    #[tokio::test]
    async fn reset_request_opens_confirmation() {
        let mut app = AppState::default();
        let (rtx, _rrx, otx, _orx) = channels();
        let source: Arc<dyn ContentSource> = Arc::new(FsContentSource);
        let dir = tempfile::tempdir().unwrap();

        handle_request(Request::ResetOverride, &mut app, &rtx, &otx, &source, dir.path());
        assert_eq!(app.modal, Modal::ConfirmReset);
        assert!(app.modal_active());
    }

    /// What: An import request goes through the picker actor, which
    /// (under test) reports a cancelled pick back on the same channel.
    #[tokio::test]
    async fn import_request_routes_through_picker() {
        let mut app = AppState::default();
        let (rtx, mut rrx, otx, _orx) = channels();
        let source: Arc<dyn ContentSource> = Arc::new(FsContentSource);
        let dir = tempfile::tempdir().unwrap();

        handle_request(Request::ImportCountry, &mut app, &rtx, &otx, &source, dir.path());
        let echoed = rrx.recv().await.expect("picker reports back");
        assert_eq!(
            echoed,
            Request::GeoFilePicked {
                kind: ImportKind::Country,
                locator: None
            }
        );
    }

    /// What: A finished pick runs the pipeline off the loop and the
    /// outcome arrives on the outcome channel (cancel → Failed).
    #[tokio::test]
    async fn cancelled_pick_reports_failed_outcome() {
        let mut app = AppState::default();
        let (rtx, _rrx, otx, mut orx) = channels();
        let source: Arc<dyn ContentSource> = Arc::new(FsContentSource);
        let dir = tempfile::tempdir().unwrap();

        handle_request(
            Request::GeoFilePicked {
                kind: ImportKind::GeoIp,
                locator: None,
            },
            &mut app,
            &rtx,
            &otx,
            &source,
            dir.path(),
        );
        assert_eq!(app.imports_in_flight, 1);
        let outcome = orx.recv().await.expect("pipeline reports an outcome");
        assert_eq!(outcome, ImportOutcome::Failed);
        apply_outcome(&outcome, &mut app);
        assert_eq!(app.imports_in_flight, 0);
        assert_eq!(app.toast_message.as_deref(), Some("import failed"));
    }

    /// What: A successful pick copies the database and the outcome
    /// carries the display name for the toast.
    #[tokio::test]
    async fn picked_file_is_imported() {
        let mut app = AppState::default();
        let (rtx, _rrx, otx, mut orx) = channels();
        let source: Arc<dyn ContentSource> = Arc::new(FsContentSource);
        let dir = tempfile::tempdir().unwrap();
        let candidate = dir.path().join("GeoLite2-Country.mmdb");
        std::fs::write(&candidate, b"payload").unwrap();
        let clash = dir.path().join("clash");

        handle_request(
            Request::GeoFilePicked {
                kind: ImportKind::GeoIp,
                locator: Some(ContentLocator::from(candidate.as_path())),
            },
            &mut app,
            &rtx,
            &otx,
            &source,
            &clash,
        );
        let outcome = orx.recv().await.expect("pipeline reports an outcome");
        assert_eq!(
            outcome,
            ImportOutcome::Succeeded {
                display_name: "GeoLite2-Country.mmdb".to_string()
            }
        );
        assert_eq!(std::fs::read(clash.join("geoip.mmdb")).unwrap(), b"payload");

        apply_outcome(&outcome, &mut app);
        assert_eq!(
            app.toast_message.as_deref(),
            Some("import succeeded: GeoLite2-Country.mmdb")
        );
    }

    /// What: The headless backend constructs and renders a frame
    /// without a TTY attached.
    #[test]
    fn headless_terminal_draws() {
        let mut terminal =
            Terminal::new(TestBackend::new(80, 24)).unwrap_or_else(|e| match e {});
        let mut app = AppState::default();
        let _ = terminal.draw(|f| crate::ui::ui(f, &mut app));
    }

    /// What: An import outcome arriving while the reset confirmation is
    /// open stays queued; the pending confirmation is answered first and
    /// is never replaced by the format alert.
    ///
    /// - Input: loop started with ConfirmReset open and a Rejected
    ///   outcome already queued, then the user confirms
    /// - Output: the loop terminates with clear requested on the session
    #[tokio::test(flavor = "multi_thread")]
    async fn pending_confirmation_outlives_late_outcome() {
        let store = MemoryOverrideStore::new();
        let mut app = AppState::default();
        app.session = Some(OverrideSession::open(&store, OverrideSlot::Persist).unwrap());
        app.modal = Modal::ConfirmReset;

        let mut terminal =
            Terminal::new(TestBackend::new(80, 24)).unwrap_or_else(|e| match e {});
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let (request_tx, mut request_rx) = mpsc::unbounded_channel();
        let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel();
        let (_tick_tx, mut tick_rx) = mpsc::unbounded_channel();
        let source: Arc<dyn ContentSource> = Arc::new(FsContentSource);
        let dir = tempfile::tempdir().unwrap();

        outcome_tx
            .send(ImportOutcome::Rejected {
                hint: ".metadb/.db/.dat/.mmdb".to_string(),
            })
            .unwrap();

        // Give the loop a window where only the queued outcome is ready,
        // then answer the confirmation. `y` must reach the confirmation;
        // the Enter/q tail only runs if the alert wrongly took over.
        let keys = tokio::spawn({
            let event_tx = event_tx.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                for code in [KeyCode::Char('y'), KeyCode::Enter, KeyCode::Char('q')] {
                    let _ = event_tx.send(CEvent::Key(KeyEvent::from(code)));
                }
            }
        });

        run_loop(
            &mut terminal,
            &mut app,
            dir.path(),
            &source,
            &mut event_rx,
            &request_tx,
            &mut request_rx,
            &outcome_tx,
            &mut outcome_rx,
            &mut tick_rx,
        )
        .await
        .unwrap();
        keys.await.unwrap();

        let session = app.session.take().unwrap();
        assert!(
            session.clear_requested(),
            "the pending confirmation must be answered, not replaced by the alert"
        );
        let _ = session.close(&store);
    }

    /// What: Rejection escalates to a format alert, not a toast.
    #[test]
    fn rejection_opens_alert() {
        let mut app = AppState::default();
        app.imports_in_flight = 1;
        apply_outcome(
            &ImportOutcome::Rejected {
                hint: ".metadb/.db/.dat/.mmdb".to_string(),
            },
            &mut app,
        );
        assert_eq!(
            app.modal,
            Modal::Alert {
                message: "unsupported format, expected one of: .metadb/.db/.dat/.mmdb".to_string()
            }
        );
        assert!(app.toast_message.is_none());
        assert_eq!(app.imports_in_flight, 0);
    }
}
