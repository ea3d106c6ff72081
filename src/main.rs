use std::sync::Arc;
use std::time::Duration;

use calgrid::app::App;
use calgrid::calendar::FileFeed;
use calgrid::components::{self, DetailPopup, MonthView, NavBar, StatusBar, WeekView, YearChooser};
use calgrid::config::Config;
use calgrid::engine::FetchOutcome;
use calgrid::layout::ViewMode;
use calgrid::{event, logging, theme, tui};
use chrono::{Datelike, Local};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::Rect;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let log_path = logging::init()?;

    let config = Config::load()?;
    info!(
        feeds = config.feeds.len(),
        dir = %config.feeds_dir.display(),
        log = ?log_path,
        "starting calgrid"
    );

    let source = Arc::new(FileFeed::new(config.feeds_dir.clone()));
    let (fetch_tx, mut fetch_rx) = mpsc::unbounded_channel();
    let mut app = App::new(&config, source, fetch_tx, Local::now().date_naive());

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = tui::restore();
        original_hook(panic_info);
    }));

    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app, &mut fetch_rx).await;
    tui::restore()?;
    info!("calgrid stopped");
    result
}

fn spawn_key_poll() -> JoinHandle<Result<Option<KeyEvent>>> {
    tokio::task::spawn_blocking(|| event::next_key_event(Duration::from_millis(100)))
}

fn terminal_area(terminal: &tui::Tui) -> Result<Rect> {
    let size = terminal.size()?;
    Ok(Rect::new(0, 0, size.width, size.height))
}

async fn run(
    terminal: &mut tui::Tui,
    app: &mut App,
    fetch_rx: &mut UnboundedReceiver<FetchOutcome>,
) -> Result<()> {
    // A resize that changes the cell size already rebuilt and fetched.
    if !app.resize(terminal_area(terminal)?) {
        app.start();
    }

    let mut key_task = spawn_key_poll();
    while app.running {
        app.resize(terminal_area(terminal)?);
        terminal.draw(|frame| render(frame, app))?;

        tokio::select! {
            Some(outcome) = fetch_rx.recv() => {
                app.apply_fetch(outcome);
            }
            joined = &mut key_task => {
                key_task = spawn_key_poll();
                if let Some(key) = joined?? {
                    handle_key(app, key);
                }
            }
        }
    }

    Ok(())
}

fn render(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let [nav, body, status] = components::split_screen(area);
    let view = app.calendar.view_mode();

    NavBar::render(frame, nav, view, &app.calendar.nav_label());
    match view {
        ViewMode::Month => {
            MonthView::render(frame, body, app.calendar.grid(), &app.feeds, &app.selection())
        }
        ViewMode::Week => {
            WeekView::render(frame, body, app.calendar.grid(), &app.feeds, &app.selection())
        }
    }

    if let Some(index) = app.year_chooser {
        let years = app.calendar.year_options();
        YearChooser::render(frame, area, &years, index, app.calendar.pivot().year());
    }

    if let Some((ref ev, feed)) = app.detail {
        DetailPopup::render(frame, area, ev, app.feed_color(feed));
    }

    if app.show_help {
        render_help(frame, area);
    }

    StatusBar::render(frame, status, view, app.status_text());
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Clear status message on any key
    app.status_message = None;

    // Help overlay takes priority
    if app.show_help {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
            app.show_help = false;
        }
        return;
    }

    // Detail popup takes priority
    if app.detail.is_some() {
        if matches!(key.code, KeyCode::Esc | KeyCode::Enter) {
            app.close_detail();
        }
        return;
    }

    if app.year_chooser.is_some() {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => app.move_year_chooser(-1),
            KeyCode::Down | KeyCode::Char('j') => app.move_year_chooser(1),
            KeyCode::PageUp => app.move_year_chooser(-5),
            KeyCode::PageDown => app.move_year_chooser(5),
            KeyCode::Enter => app.confirm_year(),
            KeyCode::Esc | KeyCode::Char('y') => app.year_chooser = None,
            _ => {}
        }
        return;
    }

    match (key.code, key.modifiers) {
        (KeyCode::Char('q'), _) | (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
            app.running = false;
        }
        (KeyCode::Char('m'), _) => app.switch_view(ViewMode::Month),
        (KeyCode::Char('w'), _) => app.switch_view(ViewMode::Week),
        (KeyCode::Char('t'), _) => app.go_to_today(Local::now().date_naive()),
        (KeyCode::Char('['), _) => app.prev(),
        (KeyCode::Char(']'), _) => app.next(),
        (KeyCode::Char('y'), _) => app.open_year_chooser(),
        (KeyCode::Left | KeyCode::Char('h'), _) => app.move_selection(-1),
        (KeyCode::Right | KeyCode::Char('l'), _) => app.move_selection(1),
        (KeyCode::Up | KeyCode::Char('k'), _) => app.move_selection(-7),
        (KeyCode::Down | KeyCode::Char('j'), _) => app.move_selection(7),
        (KeyCode::Tab, _) => app.cycle_item(true),
        (KeyCode::BackTab, _) => app.cycle_item(false),
        (KeyCode::Enter, _) => app.click_selected(),
        (KeyCode::Esc, _) => app.selected_item = None,
        (KeyCode::Char('?'), _) => app.show_help = true,
        _ => {}
    }
}

fn render_help(frame: &mut ratatui::Frame, area: Rect) {
    use ratatui::style::{Color, Modifier, Style};
    use ratatui::text::{Line, Span};
    use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

    let popup_area = components::popup_area(area, 50, 20);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(" Keybindings ")
        .title_style(Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let key_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let section_style = Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
    let dim = theme::current().dim;

    let row = |keys: &'static str, desc: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:<10}", keys), key_style),
            Span::raw(desc),
        ])
    };

    let lines = vec![
        Line::from(Span::styled("Navigation", section_style)),
        row("h/l", "Previous/next day"),
        row("j/k", "Previous/next week"),
        row("[/]", "Previous/next month or week"),
        row("t", "Jump to today"),
        row("y", "Choose year (month view)"),
        Line::from(""),
        Line::from(Span::styled("Views", section_style)),
        row("m / w", "Month / Week view"),
        Line::from(""),
        Line::from(Span::styled("Events", section_style)),
        row("Tab", "Next item in the day"),
        row("S-Tab", "Previous item in the day"),
        row("Enter", "Open event or \"more\""),
        row("Esc", "Close popup"),
        Line::from(""),
        Line::from(Span::styled("  ? to close, q to quit", dim)),
    ];

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}
