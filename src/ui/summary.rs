//! Clusters view rendering.
//!
//! One block of lines per cluster: its totals, any degraded feeds, then a
//! tree of advisories ordered by group and server.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use hawatch_types::{ClusterStatistics, Statistics};

use crate::app::App;
use crate::ui::Theme;

const BRANCH: &str = "├──";
const LAST_BRANCH: &str = "└──";

const NAME_WIDTH: usize = 10;
const COUNT_WIDTH: usize = 5;
const GROUP_WIDTH: usize = 20;
const SERVER_WIDTH: usize = 10;

/// Render the Clusters view.
///
/// Scrolling is clamped here since only the renderer knows the content and
/// viewport heights.
pub fn render(frame: &mut Frame, app: &mut App, area: Rect) {
    let Some(ref data) = app.data else {
        let paragraph = Paragraph::new("Waiting for the first poll cycle...")
            .style(Style::default().add_modifier(Modifier::DIM))
            .block(block(app, " Clusters "));
        frame.render_widget(paragraph, area);
        return;
    };

    let lines = cluster_lines(&app.theme, &data.stats);
    let viewport = area.height.saturating_sub(2) as usize;
    let max_scroll = lines.len().saturating_sub(viewport);
    app.scroll = app.scroll.min(max_scroll);

    let title = if max_scroll > 0 {
        format!(
            " Clusters ({}) [{}/{}] ",
            data.stats.clusters.len(),
            app.scroll + 1,
            max_scroll + 1
        )
    } else {
        format!(" Clusters ({}) ", data.stats.clusters.len())
    };

    let scroll = u16::try_from(app.scroll).unwrap_or(u16::MAX);
    let paragraph = Paragraph::new(lines)
        .block(block(app, &title))
        .scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

fn block<'a>(app: &App, title: &'a str) -> Block<'a> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border))
}

/// Lines of the Clusters view, clusters separated by a blank line.
pub fn cluster_lines(theme: &Theme, stats: &Statistics) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for (i, cluster) in stats.clusters.iter().enumerate() {
        if i > 0 {
            lines.push(Line::from(""));
        }
        push_cluster(&mut lines, theme, cluster);
    }
    lines
}

fn push_cluster(lines: &mut Vec<Line<'static>>, theme: &Theme, cluster: &ClusterStatistics) {
    lines.push(Line::from(vec![
        Span::styled(
            format!("{:<NAME_WIDTH$} ", cluster.display_name),
            Style::default()
                .fg(theme.cluster_color(cluster))
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            "Sessions: {:<COUNT_WIDTH$} SessionRate: {}",
            cluster.total_sessions, cluster.total_session_rate
        )),
    ]));

    for feed in &cluster.degraded {
        lines.push(Line::from(Span::styled(
            format!("  ✗ {} ({})", feed.url, feed.reason),
            Style::default().fg(theme.critical),
        )));
    }

    let last = cluster.advisories.len().saturating_sub(1);
    for (i, advisory) in cluster.advisories.iter().enumerate() {
        let graph = if i == last { LAST_BRANCH } else { BRANCH };
        lines.push(Line::from(vec![
            Span::styled(graph, Style::default().fg(theme.border)),
            Span::raw(format!(
                " {:<GROUP_WIDTH$} {:<SERVER_WIDTH$} ",
                advisory.group, advisory.server
            )),
            Span::styled(advisory.message.clone(), theme.advisory_style(advisory.kind)),
        ]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hawatch_types::{Advisory, AdvisoryKind, DegradedFeed};

    fn text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    fn advisory(group: &str, server: &str, message: &str) -> Advisory {
        Advisory {
            group: group.to_string(),
            server: server.to_string(),
            kind: AdvisoryKind::Status,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_cluster_block_layout() {
        let mut edge = ClusterStatistics::new("edge", "Edge");
        edge.total_sessions = 42;
        edge.total_session_rate = 5;
        edge.advisories = vec![
            advisory("api", "app1", "Server has no check defined!"),
            advisory("www", "web1", "DOWN for 1m5s"),
        ];
        let stats = Statistics::from_clusters(vec![edge]);

        let lines: Vec<String> = cluster_lines(&Theme::dark(), &stats)
            .iter()
            .map(text)
            .collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Edge       Sessions: 42    SessionRate: 5");
        assert!(lines[1].starts_with("├── api"));
        assert!(lines[1].ends_with("Server has no check defined!"));
        assert!(lines[2].starts_with("└── www"));
        assert!(lines[2].contains("web1"));
        assert!(lines[2].ends_with("DOWN for 1m5s"));
    }

    #[test]
    fn test_clusters_are_separated_and_show_degraded_feeds() {
        let mut core = ClusterStatistics::new("core", "Core");
        core.degraded
            .push(DegradedFeed::new("http://lb2/stats", "HTTP status 503"));
        let edge = ClusterStatistics::new("edge", "Edge");
        let stats = Statistics::from_clusters(vec![edge, core]);

        let lines: Vec<String> = cluster_lines(&Theme::dark(), &stats)
            .iter()
            .map(text)
            .collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Core"));
        assert_eq!(lines[1], "  ✗ http://lb2/stats (HTTP status 503)");
        assert_eq!(lines[2], "");
        assert!(lines[3].starts_with("Edge"));
    }
}
