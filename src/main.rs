mod error;
mod services;
mod ui;
mod utils;

use std::env;
use std::io::{self, stdout, Stdout};
use std::path::PathBuf;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use services::config::Config;
use services::external;
use ui::app::{valid_start_path, App, ExternalJob};
use ui::input::{self, AppAction};
use ui::theme::Theme;

type Tui = Terminal<CrosstermBackend<Stdout>>;

fn main() -> io::Result<()> {
    let (left, right) = startup_paths();
    let config = Config::load();
    let mut app = App::new(left, right, config);

    terminal::enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run(&mut terminal, &mut app);

    terminal::disable_raw_mode()?;
    execute!(stdout(), LeaveAlternateScreen)?;
    result
}

/// Zero, one, or two startup paths: left panel, then right. Missing
/// arguments default to `/` and the home directory; unreadable paths degrade
/// to the nearest readable ancestor instead of aborting.
fn startup_paths() -> (PathBuf, PathBuf) {
    let args: Vec<PathBuf> = env::args().skip(1).take(2).map(PathBuf::from).collect();
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("/"));

    let left_arg = args.first().cloned().unwrap_or_else(|| PathBuf::from("/"));
    let right_arg = args.get(1).cloned().unwrap_or_else(|| home.clone());

    (
        valid_start_path(&absolute(left_arg), &home),
        valid_start_path(&absolute(right_arg), &home),
    )
}

fn absolute(path: PathBuf) -> PathBuf {
    path.canonicalize().unwrap_or(path)
}

fn run(terminal: &mut Tui, app: &mut App) -> io::Result<()> {
    let theme = Theme::default();
    loop {
        app.poll_events();
        app.tick_message();

        let size = terminal.size()?;
        app.set_viewport_height(ui::viewport_height(size.height));
        app.ensure_visible();
        terminal.draw(|frame| ui::draw(frame, app, &theme))?;

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    match input::handle_key(app, key) {
                        AppAction::Continue => {}
                        AppAction::Quit => return Ok(()),
                        AppAction::RunExternal(job) => run_external(terminal, app, job)?,
                    }
                }
                _ => {}
            }
        }
    }
}

/// Hand the terminal to an external viewer/editor/shell command, then
/// restore the TUI and report the outcome back into the session.
fn run_external(terminal: &mut Tui, app: &mut App, job: ExternalJob) -> io::Result<()> {
    terminal::disable_raw_mode()?;
    execute!(stdout(), LeaveAlternateScreen)?;

    let result = external::run_in_dir(&job.command, &job.cwd, &job.shell);

    terminal::enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen)?;
    terminal.clear()?;

    app.finish_external(result);
    Ok(())
}
