use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    Terminal,
};
use tracing::info;

use hawatch::{data, events, ui};
use hawatch::{App, DataSource, FileSource, LogLevel, LogTarget, Poller, Settings, View};

#[derive(Parser, Debug)]
#[command(name = "hawatch")]
#[command(version)]
#[command(about = "Terminal monitor for fleets of HAProxy load balancers")]
struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "config.yml")]
    config: PathBuf,

    /// Log level
    #[arg(short, long, value_enum, default_value_t = LogLevel::Error)]
    log_level: LogLevel,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Override the poll interval from the configuration, in seconds
    #[arg(short, long)]
    interval: Option<u64>,

    /// Run a single poll cycle, write the statistics as JSON and exit
    #[arg(short, long, conflicts_with = "replay")]
    export: Option<PathBuf>,

    /// Browse statistics previously written with --export
    #[arg(long)]
    replay: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_target = match (&args.log_file, args.export.is_some()) {
        (Some(path), _) => LogTarget::File(path.clone()),
        (None, true) => LogTarget::Stderr,
        // The TUI owns the terminal
        (None, false) => LogTarget::Discard,
    };
    hawatch::logging::init(args.log_level, log_target)?;

    if let Some(ref path) = args.replay {
        return run_with_file(path);
    }

    let mut settings = Settings::load(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    if let Some(interval) = args.interval {
        settings.interval = interval;
        settings.validate()?;
    }

    if let Some(ref export_path) = args.export {
        return export_to_file(&settings, export_path);
    }

    run_with_poller(&settings)
}

/// Run with statistics replayed from an exported file
fn run_with_file(path: &Path) -> Result<()> {
    let source = Box::new(FileSource::new(path));
    run_tui(source, Duration::from_secs(1))
}

/// Run with live polling of the configured clusters
fn run_with_poller(settings: &Settings) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    let poller = Poller::from_settings(settings)?;

    info!(clusters = poller.sources().len(), "starting poller");
    let (source, handle) = {
        let _guard = rt.enter();
        poller.spawn()
    };

    // The runtime keeps polling on its worker threads while the TUI runs here
    let result = run_tui(Box::new(source), Duration::from_millis(100));

    handle.abort();
    result
}

/// Run the TUI with the given data source
fn run_tui(source: Box<dyn DataSource>, refresh_interval: Duration) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Restore the terminal before printing a panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic);
    }));

    let mut app = App::new(source);
    let _ = app.reload_data();

    let result = run_app(&mut terminal, &mut app, refresh_interval);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    refresh_interval: Duration,
) -> Result<()> {
    let mut last_refresh = Instant::now();

    // Minimum terminal size for usable display
    const MIN_WIDTH: u16 = 60;
    const MIN_HEIGHT: u16 = 12;

    while app.running {
        terminal.draw(|frame| {
            let area = frame.area();

            if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
                let msg = format!(
                    "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
                    area.width, area.height, MIN_WIDTH, MIN_HEIGHT
                );
                let paragraph = ratatui::widgets::Paragraph::new(msg)
                    .alignment(ratatui::layout::Alignment::Center)
                    .style(ratatui::style::Style::default().fg(ratatui::style::Color::Yellow));
                let centered = ratatui::layout::Rect::new(
                    0,
                    (area.height / 2).saturating_sub(2),
                    area.width,
                    5u16.min(area.height),
                );
                frame.render_widget(paragraph, centered);
                return;
            }

            let chunks = Layout::vertical([
                Constraint::Length(1), // Header bar
                Constraint::Length(1), // Tabs
                Constraint::Min(8),    // Content
                Constraint::Length(1), // Status bar
            ])
            .split(area);

            ui::common::render_header(frame, app, chunks[0]);
            ui::common::render_tabs(frame, app, chunks[1]);

            match app.current_view {
                View::Clusters => ui::summary::render(frame, app, chunks[2]),
                View::Advisories => ui::advisories::render(frame, app, chunks[2]),
            }

            ui::common::render_status_bar(frame, app, chunks[3]);

            if app.show_help {
                ui::common::render_help(frame, app, area);
            }
        })?;

        if let Some(event) = events::poll_event(Duration::from_millis(100))? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                // Content starts after header (1) + tabs (1)
                Event::Mouse(mouse) => events::handle_mouse_event(app, mouse, 2),
                _ => {}
            }
        }

        if last_refresh.elapsed() >= refresh_interval {
            let _ = app.reload_data();
            last_refresh = Instant::now();
        }
    }

    Ok(())
}

/// Run one cycle and write its statistics to a JSON file
fn export_to_file(settings: &Settings, export_path: &Path) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    let poller = Poller::from_settings(settings)?;

    let stats = rt.block_on(poller.run_cycle())?;
    data::write_json(&stats, export_path)?;

    println!(
        "Exported {} clusters ({} advisories) to: {}",
        stats.clusters.len(),
        stats.advisory_count(),
        export_path.display()
    );
    Ok(())
}
