//! Terminal event handling for the settings screen.
//!
//! Modal dialogs take priority over menu navigation: while the reset
//! confirmation (or an alert) is open, every key is interpreted inside
//! the modal and the menu is untouched. The dispatch loop additionally
//! stops consuming queued requests while a modal is active.

use crossterm::event::{Event as CEvent, KeyCode, KeyEvent, KeyEventKind};
use tokio::sync::mpsc;

use crate::state::{AppState, MenuAction, Modal, Request};

/// Dispatch a single terminal event and mutate the [`AppState`].
///
/// Returns `true` to signal the screen should terminate; otherwise
/// `false`. Termination via the confirmed reset has already marked the
/// session for clear-on-close when this returns `true`.
pub fn handle_event(
    ev: CEvent,
    app: &mut AppState,
    request_tx: &mpsc::UnboundedSender<Request>,
) -> bool {
    let CEvent::Key(ke) = ev else {
        return false;
    };
    if ke.kind != KeyEventKind::Press {
        return false;
    }

    match &app.modal {
        Modal::ConfirmReset => return handle_confirm_reset(ke, app),
        Modal::Alert { .. } => {
            if matches!(ke.code, KeyCode::Enter | KeyCode::Esc) {
                app.modal = Modal::None;
            }
            return false;
        }
        Modal::None => {}
    }

    match ke.code {
        KeyCode::Char('q') | KeyCode::Esc => return true,
        KeyCode::Up | KeyCode::Char('k') => select_previous(app),
        KeyCode::Down | KeyCode::Char('j') => select_next(app),
        KeyCode::Enter | KeyCode::Char(' ') => activate_selected(app, request_tx),
        _ => {}
    }
    false
}

/// Answer the blocking reset confirmation.
///
/// Enter/`y` confirms: the session is marked for clear-on-close and the
/// screen terminates. Esc/`n` declines: no store mutation, back to idle.
fn handle_confirm_reset(ke: KeyEvent, app: &mut AppState) -> bool {
    match ke.code {
        KeyCode::Enter | KeyCode::Char('y') => {
            app.modal = Modal::None;
            if let Some(session) = app.session.as_mut() {
                session.request_clear();
            }
            true
        }
        KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('q') => {
            tracing::debug!("override reset declined");
            app.modal = Modal::None;
            false
        }
        _ => false,
    }
}

fn select_previous(app: &mut AppState) {
    app.selected = app.selected.saturating_sub(1);
    app.list_state.select(Some(app.selected));
}

fn select_next(app: &mut AppState) {
    app.selected = (app.selected + 1).min(MenuAction::ALL.len() - 1);
    app.list_state.select(Some(app.selected));
}

/// Run the highlighted menu row: toggles mutate the in-memory override
/// directly, imports and reset are sent to the dispatch loop as
/// requests.
fn activate_selected(app: &mut AppState, request_tx: &mpsc::UnboundedSender<Request>) {
    let action = MenuAction::ALL[app.selected.min(MenuAction::ALL.len() - 1)];
    if let Some(request) = action.request() {
        let _ = request_tx.send(request);
        return;
    }
    let Some(session) = app.session.as_mut() else {
        return;
    };
    let cfg = session.configuration_mut();
    match action {
        MenuAction::ToggleUnifiedDelay => cfg.toggle_unified_delay(),
        MenuAction::ToggleTcpConcurrent => cfg.toggle_tcp_concurrent(),
        MenuAction::ToggleGeodataMode => cfg.toggle_geodata_mode(),
        _ => {}
    }
}
