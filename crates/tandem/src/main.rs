//! tandem CLI - two-pane line-aligned diff viewer

mod app;
mod client;
mod config;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tandem_core::{ingest, EditOp, OpMap, PatchSet};

#[derive(Parser, Debug)]
#[command(name = "tandem")]
#[command(author, version, about = "A two-pane line-aligned diff viewer")]
struct Args {
    /// Old file
    old: PathBuf,

    /// New file
    new: PathBuf,

    /// Read the edit-operation list from a JSON file instead of the
    /// diff service
    #[arg(long)]
    ops: Option<PathBuf>,

    /// Diff service base URL (overrides the config file)
    #[arg(long)]
    server: Option<String>,

    /// Start in compact mode (no padding, connectors from raw line numbers)
    #[arg(long)]
    compact: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let mut config = config::Config::load();
    if args.compact {
        config.ui.align = false;
    }

    let old_name = display_name(&args.old);
    let new_name = display_name(&args.new);

    let old_content = std::fs::read_to_string(&args.old)
        .context(format!("Failed to read: {}", args.old.display()))?;
    let new_content = std::fs::read_to_string(&args.new)
        .context(format!("Failed to read: {}", args.new.display()))?;

    // Any fetch failure surfaces here, before a view exists to disturb.
    let ops = load_ops(&args, &config, &old_name, &old_content, &new_name, &new_content).await?;

    let mut app = App::new(
        &config,
        old_name,
        old_content,
        new_name,
        new_content,
        ops,
    );

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        return Err(err);
    }

    Ok(())
}

fn display_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Obtain the operation map: from a local JSON file, or from the diff
/// service named on the command line or in the config.
async fn load_ops(
    args: &Args,
    config: &config::Config,
    old_name: &str,
    old_content: &str,
    new_name: &str,
    new_content: &str,
) -> Result<OpMap> {
    if let Some(path) = &args.ops {
        let json = std::fs::read_to_string(path)
            .context(format!("Failed to read operations: {}", path.display()))?;
        let ops: Vec<EditOp> =
            serde_json::from_str(&json).context("Operations file is not valid JSON")?;
        return Ok(ingest(ops));
    }

    let base_url = args
        .server
        .as_deref()
        .or(config.server.base_url.as_deref())
        .context(
            "No operation source.\n\
             \n\
             Usage: tandem <old> <new> --ops <file.json>\n\
             \n\
             Or point at a diff service with --server <url> (or set\n\
             server.base_url in ~/.config/tandem/config.toml).",
        )?;

    let client = client::DiffClient::new(base_url)?;
    let mut patches = PatchSet::new();
    let ops = client::diff_get(
        &client,
        old_name,
        old_content,
        new_name,
        new_content,
        &config.diff,
        &mut patches,
    )
    .await
    .context("Failed to get diff from the service")?;

    Ok(ops)
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()>
where
    <B as Backend>::Error: std::error::Error + Send + Sync + 'static,
{
    let tick_rate = Duration::from_millis(50);

    loop {
        terminal.draw(|frame| ui::draw(frame, app))?;

        if app.should_quit {
            return Ok(());
        }

        if !event::poll(tick_rate)? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            let visible_height = terminal.size()?.height.saturating_sub(1) as usize;
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
                KeyCode::Char('a') => app.toggle_align(),
                KeyCode::Char('c') => app.clear(),
                KeyCode::Down | KeyCode::Char('j') => app.scroll_down(1, visible_height),
                KeyCode::Up | KeyCode::Char('k') => app.scroll_up(1),
                KeyCode::PageDown => app.scroll_down(visible_height, visible_height),
                KeyCode::PageUp => app.scroll_up(visible_height),
                KeyCode::Char('g') => app.scroll_offset = 0,
                KeyCode::Char('G') => {
                    app.scroll_offset = app.row_count().saturating_sub(visible_height.max(1))
                }
                KeyCode::Char('n') => app.next_op(),
                KeyCode::Char('p') => app.prev_op(),
                _ => {}
            }
        }
    }
}
