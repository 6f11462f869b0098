mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use lockbuster::{
    app::{App, Control},
    app_dirs::AppDirs,
    clock::{Clock, MonotonicClock},
    config::{Config, ConfigStore, FileConfigStore},
    record_store::{MemoryRecordStore, RecordStore, SqliteRecordStore},
    runtime::{CrosstermInputSource, FixedTicker, InputSource, Runner, Ticker},
    session::{GameSession, SessionConfig, TierDisplay},
};
use rand::Rng;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    fs::{File, OpenOptions},
    io::{self, stdin},
    path::{Path, PathBuf},
    sync::Mutex,
};
use tracing::{info, warn, Level};

use crate::ui::GameView;

/// gesture reflex game: clear locks against the clock
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Clear locks by performing the gesture each one asks for. Speedrun times how long 100 locks take; Countdown counts how many fall in a minute. Touch gestures are played on the keyboard."
)]
pub struct Cli {
    /// number of locks to clear in speedrun mode
    #[clap(short = 't', long)]
    target: Option<u32>,

    /// seconds on the clock in countdown mode
    #[clap(short = 's', long, value_parser = parse_countdown_secs)]
    countdown_secs: Option<f64>,

    /// pause in milliseconds between a cleared lock and the next one
    #[clap(long)]
    animation_ms: Option<u64>,

    /// which lock group the break animation is drawn from
    #[clap(long, value_enum)]
    tier_display: Option<TierDisplay>,

    /// path of the best-record database
    #[clap(long)]
    records: Option<PathBuf>,

    /// write logs here instead of the state directory
    #[clap(long)]
    log_file: Option<PathBuf>,

    /// log at debug level
    #[clap(short = 'v', long)]
    verbose: bool,

    /// persist the given options as the new defaults
    #[clap(long)]
    save_config: bool,

    /// forget all best records before starting
    #[clap(long)]
    reset_records: bool,
}

impl Cli {
    /// Layer command-line overrides on top of the stored config
    fn apply_to(&self, mut cfg: Config) -> Config {
        if let Some(target) = self.target {
            cfg.speedrun_target = target;
        }
        if let Some(secs) = self.countdown_secs {
            cfg.countdown_secs = secs;
        }
        if let Some(ms) = self.animation_ms {
            cfg.animation_ms = ms;
        }
        if let Some(display) = self.tier_display {
            cfg.tier_display = display;
        }
        cfg
    }
}

fn parse_countdown_secs(s: &str) -> Result<f64, String> {
    let secs: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if secs.is_finite() && secs > 0.0 {
        Ok(secs)
    } else {
        Err(format!("`{s}` is not a positive number of seconds"))
    }
}

fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    OpenOptions::new().create(true).append(true).open(path)
}

fn init_logging(cli: &Cli) {
    let Some(path) = cli.log_file.clone().or_else(AppDirs::log_path) else {
        return;
    };
    // the TUI owns the terminal afterwards, so say it now
    let file = match open_log_file(&path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("lockbuster: logging disabled, cannot open {}: {e}", path.display());
            return;
        }
    };

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let _ = tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(level)
        .try_init();
}

fn open_records(cli: &Cli) -> Box<dyn RecordStore> {
    let path = cli
        .records
        .clone()
        .or_else(AppDirs::records_path)
        .unwrap_or_else(|| PathBuf::from("lockbuster_records.db"));

    match SqliteRecordStore::open(&path) {
        Ok(store) => {
            if cli.reset_records {
                if let Err(e) = store.clear() {
                    warn!(error = %e, "could not reset records");
                }
            }
            Box::new(store)
        }
        Err(e) => {
            warn!(error = %e, path = %path.display(), "records unavailable, playing without them");
            Box::new(MemoryRecordStore::new())
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    init_logging(&cli);

    let config_store = FileConfigStore::new();
    let config = cli.apply_to(config_store.load());
    if cli.save_config {
        config_store.save(&config)?;
        info!(path = %config_store.path().display(), "saved config");
    }

    let session = GameSession::new(
        SessionConfig::from(&config),
        open_records(&cli),
        rand::thread_rng(),
    );
    let mut app = App::new(session);
    let runner = Runner::new(
        CrosstermInputSource::new(),
        FixedTicker::from_millis(config.tick_ms),
        MonotonicClock::new(),
    );

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run<B, S, R, E, T, C>(
    terminal: &mut Terminal<B>,
    app: &mut App<S, R>,
    runner: &Runner<E, T, C>,
) -> Result<(), Box<dyn Error>>
where
    B: Backend,
    S: RecordStore,
    R: Rng,
    E: InputSource,
    T: Ticker,
    C: Clock,
{
    app.now = runner.now();
    terminal.draw(|f| draw(app, f))?;

    loop {
        match app.on_input(runner.step()) {
            Control::Quit => break,
            Control::Redraw => {
                terminal.draw(|f| draw(app, f))?;
            }
            Control::Continue => {}
        }
    }

    Ok(())
}

fn draw<S: RecordStore, R: Rng>(app: &App<S, R>, f: &mut Frame) {
    f.render_widget(GameView { app }, f.area());
}
