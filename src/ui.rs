//! Rendering for the settings screen.
//!
//! Deliberately thin: a header, the action menu with the current
//! override values, a footer with key hints and the toast line, and
//! centered modals for the reset confirmation and format alerts.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, List, ListItem, Paragraph, Wrap},
};

use crate::session::ConfigurationOverride;
use crate::state::{AppState, MenuAction, Modal};
use crate::theme::theme;

/// Render one frame of the settings screen.
pub fn ui(f: &mut Frame, app: &mut AppState) {
    let th = theme();
    let area = f.area();

    let bg = Block::default().style(Style::default().bg(th.base));
    f.render_widget(bg, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(3),
        ])
        .split(area);

    render_header(f, chunks[0], app);
    render_menu(f, chunks[1], app);
    render_footer(f, chunks[2], app);

    match &app.modal {
        Modal::ConfirmReset => render_confirm_reset(f, area),
        Modal::Alert { message } => render_alert(f, area, message),
        Modal::None => {}
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &AppState) {
    let th = theme();
    let mut title = vec![Span::styled(
        " Meta Features ",
        Style::default().fg(th.accent).add_modifier(Modifier::BOLD),
    )];
    if app.dry_run {
        title.push(Span::styled(
            " [dry-run] ",
            Style::default().fg(th.yellow),
        ));
    }
    if app.imports_in_flight > 0 {
        title.push(Span::styled(
            format!(" importing ({})… ", app.imports_in_flight),
            Style::default().fg(th.subtext),
        ));
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(th.overlay));
    f.render_widget(Paragraph::new(Line::from(title)).block(block), area);
}

/// Value column for a toggle row: `on`, `off`, or the engine default.
fn flag_text(flag: Option<bool>) -> &'static str {
    match flag {
        Some(true) => "on",
        Some(false) => "off",
        None => "engine default",
    }
}

fn row_value(action: MenuAction, cfg: &ConfigurationOverride) -> Option<&'static str> {
    match action {
        MenuAction::ToggleUnifiedDelay => Some(flag_text(cfg.unified_delay)),
        MenuAction::ToggleTcpConcurrent => Some(flag_text(cfg.tcp_concurrent)),
        MenuAction::ToggleGeodataMode => Some(flag_text(cfg.geodata_mode)),
        _ => None,
    }
}

fn render_menu(f: &mut Frame, area: Rect, app: &mut AppState) {
    let th = theme();
    let items: Vec<ListItem> = MenuAction::ALL
        .iter()
        .map(|action| {
            let mut spans = vec![Span::styled(
                format!("{:<28}", action.label()),
                Style::default().fg(th.text),
            )];
            if let Some(cfg) = app.session.as_ref().map(|s| s.configuration()) {
                if let Some(value) = row_value(*action, cfg) {
                    let color = match value {
                        "on" => th.green,
                        "off" => th.red,
                        _ => th.subtext,
                    };
                    spans.push(Span::styled(value, Style::default().fg(color)));
                }
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(th.overlay))
                .title(Span::styled(" Settings ", Style::default().fg(th.subtext))),
        )
        .highlight_style(
            Style::default()
                .bg(th.mantle)
                .fg(th.accent)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");
    f.render_stateful_widget(list, area, &mut app.list_state);
}

fn render_footer(f: &mut Frame, area: Rect, app: &AppState) {
    let th = theme();
    let line = app.toast_message.as_ref().map_or_else(
        || {
            Line::from(Span::styled(
                " ↑/↓ select   Enter activate   q quit ",
                Style::default().fg(th.subtext),
            ))
        },
        |msg| Line::from(Span::styled(format!(" {msg} "), Style::default().fg(th.yellow))),
    );
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(th.overlay));
    f.render_widget(Paragraph::new(line).block(block), area);
}

/// Center a `w` x `h` rectangle inside `area`, clamped to fit.
fn centered_rect(area: Rect, w: u16, h: u16) -> Rect {
    let w = w.min(area.width.saturating_sub(2));
    let h = h.min(area.height.saturating_sub(2));
    Rect {
        x: area.x + (area.width.saturating_sub(w)) / 2,
        y: area.y + (area.height.saturating_sub(h)) / 2,
        width: w,
        height: h,
    }
}

fn render_confirm_reset(f: &mut Frame, area: Rect) {
    let th = theme();
    let rect = centered_rect(area, 54, 8);
    f.render_widget(Clear, rect);
    let lines = vec![
        Line::from(Span::styled(
            "Reset override?",
            Style::default().fg(th.red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "All persisted override settings will be cleared.",
            Style::default().fg(th.text),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Enter/y confirm   Esc/n cancel",
            Style::default().fg(th.subtext),
        )),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(th.red))
        .style(Style::default().bg(th.mantle));
    f.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: true }).block(block),
        rect,
    );
}

fn render_alert(f: &mut Frame, area: Rect, message: &str) {
    let th = theme();
    let rect = centered_rect(area, 58, 7);
    f.render_widget(Clear, rect);
    let lines = vec![
        Line::from(Span::styled(
            "Unknown database format",
            Style::default().fg(th.yellow).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            message.to_string(),
            Style::default().fg(th.text),
        )),
        Line::from(""),
        Line::from(Span::styled("Enter/Esc close", Style::default().fg(th.subtext))),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(th.yellow))
        .style(Style::default().bg(th.mantle));
    f.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: true }).block(block),
        rect,
    );
}
