use std::cmp::Ordering;

use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use hawatch_types::AdvisoryKind;

use crate::app::App;
use crate::data::{AdvisoryRow, FleetData};

/// Column to sort advisories by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortColumn {
    #[default]
    Cluster,
    Group,
    Server,
    Kind,
}

impl SortColumn {
    pub fn next(self) -> Self {
        match self {
            Self::Cluster => Self::Group,
            Self::Group => Self::Server,
            Self::Server => Self::Kind,
            Self::Kind => Self::Cluster,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Cluster => "cluster",
            Self::Group => "group",
            Self::Server => "server",
            Self::Kind => "kind",
        }
    }
}

/// Advisory rows left after the filter, in display order.
pub fn visible_rows<'a>(app: &App, data: &'a FleetData) -> Vec<AdvisoryRow<'a>> {
    let mut rows: Vec<_> = data
        .advisory_rows()
        .into_iter()
        .filter(|row| row.matches(&app.filter_text))
        .collect();
    sort_rows(&mut rows, app.sort_column, app.sort_ascending);
    rows
}

/// Render every advisory of the fleet as a table.
pub fn render(frame: &mut Frame, app: &mut App, area: Rect) {
    let Some(ref data) = app.data else {
        return;
    };

    if data.stats.advisory_count() == 0 {
        render_quiet_message(frame, app, area);
        return;
    }

    let rows = visible_rows(app, data);
    let critical_count = rows
        .iter()
        .filter(|r| r.advisory.kind == AdvisoryKind::Status)
        .count();

    let header = Row::new(vec![
        Cell::from(format_header("Kind", SortColumn::Kind, app)),
        Cell::from(format_header("Cluster", SortColumn::Cluster, app)),
        Cell::from(format_header("Group", SortColumn::Group, app)),
        Cell::from(format_header("Server", SortColumn::Server, app)),
        Cell::from("Message"),
    ])
    .height(1)
    .style(app.theme.header);

    let table_rows: Vec<Row> = rows
        .iter()
        .map(|row| {
            let style = app.theme.advisory_style(row.advisory.kind);
            Row::new(vec![
                Cell::from(row.advisory.kind.symbol()).style(style),
                Cell::from(row.cluster.display_name.clone())
                    .style(Style::default().add_modifier(Modifier::BOLD)),
                Cell::from(row.advisory.group.clone()),
                Cell::from(row.advisory.server.clone()),
                Cell::from(row.advisory.message.clone()).style(style),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(6),
        Constraint::Fill(2),
        Constraint::Fill(2),
        Constraint::Fill(2),
        Constraint::Fill(4),
    ];

    let sort_dir = if app.sort_ascending { "↑" } else { "↓" };

    let filter_info = if app.filter_active {
        format!(" /{}_", app.filter_text)
    } else if !app.filter_text.is_empty() {
        format!(" /{}/ [c:clear]", app.filter_text)
    } else {
        String::new()
    };

    let selected = app.selected_index.min(rows.len().saturating_sub(1));
    let position_info = if !rows.is_empty() {
        format!(" [{}/{}]", selected + 1, rows.len())
    } else {
        String::new()
    };

    let title = format!(
        " Advisories ({}/{}) [s:sort {}{}]{}{} ",
        rows.len(),
        data.stats.advisory_count(),
        app.sort_column.label(),
        sort_dir,
        filter_info,
        position_info
    );

    let border_color = if critical_count > 0 {
        app.theme.critical
    } else {
        app.theme.warning
    };

    let table = Table::new(table_rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(border_color)),
        )
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    state.select(Some(selected));

    frame.render_stateful_widget(table, area, &mut state);
}

fn render_quiet_message(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Advisories ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.healthy));

    let lines = vec![
        Line::from(""),
        Line::from(""),
        Line::from(vec![
            Span::styled("    ✓ ", Style::default().fg(app.theme.healthy)),
            Span::styled(
                "No advisories",
                Style::default().fg(app.theme.healthy).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(""),
        Line::from(vec![Span::styled(
            "      Every server is up and below the session threshold.",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn format_header(name: &str, col: SortColumn, app: &App) -> Span<'static> {
    if app.sort_column == col {
        let arrow = if app.sort_ascending { "↑" } else { "↓" };
        Span::raw(format!("{}{}", name, arrow))
    } else {
        Span::raw(name.to_string())
    }
}

fn sort_rows(rows: &mut [AdvisoryRow<'_>], column: SortColumn, ascending: bool) {
    rows.sort_by(|a, b| {
        let primary = match column {
            SortColumn::Cluster => a.cluster.display_name.cmp(&b.cluster.display_name),
            SortColumn::Group => a.advisory.group.cmp(&b.advisory.group),
            SortColumn::Server => a.advisory.server.cmp(&b.advisory.server),
            // Most severe first when ascending
            SortColumn::Kind => b.advisory.kind.cmp(&a.advisory.kind),
        };

        let primary = if ascending {
            primary
        } else {
            primary.reverse()
        };

        primary.then_with(|| stable_order(a, b))
    });
}

fn stable_order(a: &AdvisoryRow<'_>, b: &AdvisoryRow<'_>) -> Ordering {
    a.cluster
        .name
        .cmp(&b.cluster.name)
        .then_with(|| a.advisory.group.cmp(&b.advisory.group))
        .then_with(|| a.advisory.server.cmp(&b.advisory.server))
}
