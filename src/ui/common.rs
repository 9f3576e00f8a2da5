//! Common UI components shared across views.
//!
//! This module contains the header bar, tab bar, status bar, and help overlay.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs},
    Frame,
};

use crate::app::{App, View};

/// Application name shown in the header.
pub const NAME: &str = "HAWATCH";

/// Render the header bar with global totals.
///
/// Displays: fleet indicator, version, global sessions and session rate,
/// advisory and degraded-feed counts.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let title = Span::styled(
        format!(" {} {} ", NAME, env!("CARGO_PKG_VERSION")),
        Style::default().add_modifier(Modifier::BOLD),
    );

    let Some(ref data) = app.data else {
        let line = Line::from(vec![title, Span::raw("| Loading...")]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    };

    let stats = &data.stats;
    let advisories = stats.advisory_count();
    let degraded = stats.degraded_count();

    let indicator_color = if degraded > 0 {
        app.theme.critical
    } else if advisories > 0 {
        app.theme.warning
    } else {
        app.theme.healthy
    };

    let line = Line::from(vec![
        Span::styled(" ● ", Style::default().fg(indicator_color)),
        title,
        Span::raw("│ Global Sessions: "),
        Span::styled(
            stats.total_sessions.to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("  Global SessionRate: "),
        Span::styled(
            stats.total_session_rate.to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" │ "),
        count_span(advisories, app.theme.warning),
        Span::raw(" advisories "),
        count_span(degraded, app.theme.critical),
        Span::raw(" degraded feeds"),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

fn count_span(count: usize, color: ratatui::style::Color) -> Span<'static> {
    if count > 0 {
        Span::styled(count.to_string(), Style::default().fg(color))
    } else {
        Span::styled("0", Style::default().add_modifier(Modifier::DIM))
    }
}

/// Render the tab bar showing available views.
pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = vec![Line::from(" 1:Clusters "), Line::from(" 2:Advisories ")];

    let selected = match app.current_view {
        View::Clusters => 0,
        View::Advisories => 1,
    };

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(app.theme.tab_inactive)
        .highlight_style(app.theme.tab_active)
        .divider("|");

    frame.render_widget(tabs, area);
}

/// Render the status bar at the bottom.
///
/// Shows: time since last update, the last cycle error, available controls.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let controls = if app.filter_active {
        "Type to search | Enter:apply Esc:cancel"
    } else {
        match app.current_view {
            View::Clusters => "↑↓:scroll Tab:switch ?:help q:quit",
            View::Advisories => "/:search s:sort S:reverse Tab:switch ?:help q:quit",
        }
    };

    let mut spans = Vec::new();
    match app.data {
        Some(ref data) => spans.push(Span::raw(format!(
            " {} | Updated {:.1}s ago | ",
            app.source_description(),
            data.last_updated.elapsed().as_secs_f64()
        ))),
        None => spans.push(Span::raw(format!(" {} | Loading... | ", app.source_description()))),
    }
    if let Some(ref err) = app.load_error {
        spans.push(Span::styled(
            format!("Error: {} | ", err),
            Style::default().fg(app.theme.critical),
        ));
    }
    spans.push(Span::raw(controls));

    let paragraph =
        Paragraph::new(Line::from(spans)).style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the current view.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let section = |title: &'static str| {
        Line::from(vec![Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        )])
    };

    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        section(" Navigation"),
        Line::from("  Tab 1/2     Switch views"),
        Line::from("  ↑/↓ j/k     Scroll / select"),
        Line::from("  PgUp/PgDn   Jump 10 lines"),
        Line::from("  Home/End    Jump to top/bottom"),
        Line::from(""),
        section(" Advisories"),
        Line::from("  /         Start filter/search"),
        Line::from("  c         Clear filter"),
        Line::from("  s         Cycle sort column"),
        Line::from("  S         Toggle sort direction"),
        Line::from(""),
        section(" General"),
        Line::from("  r         Reload data"),
        Line::from("  e         Export to JSON"),
        Line::from("  q/Esc     Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    let help_width = 42u16.min(area.width.saturating_sub(4));
    let help_height = 23u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}
