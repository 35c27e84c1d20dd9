use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::Parser;
use tracing::{error, info, warn};
use weft_wm::actor::reactor::{self, Reactor};
use weft_wm::actor;
use weft_wm::common::config::{Config, config_file};
use weft_wm::common::log;
use weft_wm::sys::geometry::Rect;
use weft_wm::sys::headless::HeadlessDisplay;
use weft_wm::sys::spawn::{ProcessSpawner, Spawner};

/// Runs the window manager core against an in-memory display, driven by JSON
/// line events, and prints the final state.
#[derive(Parser)]
struct Cli {
    /// Configuration file to use instead of the default location.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Check the configuration and exit.
    #[arg(long)]
    validate: bool,

    /// Replay events from the specified file. Without it, events are read
    /// from standard input until it closes.
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Record reactor events to the specified file path. Overwrites the file if
    /// exists.
    #[arg(long)]
    record: Option<PathBuf>,

    /// Size of the headless root window.
    #[arg(long, default_value = "1920x1080", value_parser = parse_size)]
    root: Rect,

    /// Pretty-print the final state.
    #[arg(long)]
    pretty: bool,

    /// Launch startup and scratchpad commands as real processes instead of
    /// only logging them on the headless display.
    #[arg(long)]
    spawn: bool,
}

fn parse_size(s: &str) -> Result<Rect, String> {
    let (w, h) = s.split_once('x').ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
    let width = w.trim().parse().map_err(|e| format!("bad width {w:?}: {e}"))?;
    let height = h.trim().parse().map_err(|e| format!("bad height {h:?}: {e}"))?;
    Ok(Rect::new(0, 0, width, height))
}

fn main() -> anyhow::Result<()> {
    let opt: Cli = Parser::parse();
    log::init_logging();

    let path = opt.config.clone().unwrap_or_else(config_file);
    let mut config = if path.exists() {
        Config::read(&path).with_context(|| format!("reading {}", path.display()))?
    } else {
        info!(path = %path.display(), "no config file, using defaults");
        Config::default()
    };

    let issues = config.validate();
    if opt.validate {
        if issues.is_empty() {
            println!("{}: ok", path.display());
            return Ok(());
        }
        for issue in &issues {
            println!("{issue}");
        }
        bail!("{} configuration issue(s)", issues.len());
    }
    if !issues.is_empty() {
        for issue in &issues {
            warn!("config: {issue}");
        }
        let fixes = config.auto_fix_values();
        info!(fixes, "applied configuration fixes");
    }

    let display = HeadlessDisplay::new(opt.root);
    let spawner: Box<dyn Spawner> = if opt.spawn {
        Box::new(ProcessSpawner)
    } else {
        Box::new(display.clone())
    };
    let reactor = Reactor::new(
        &config,
        Box::new(display.clone()),
        spawner,
        reactor::Record::new(opt.record.as_deref()),
    );
    reactor.run_startup_commands();

    let reactor = match &opt.replay {
        Some(path) => replay_file(reactor, &display, path)?,
        None => run_stdin(reactor, display)?,
    };

    let snapshot = reactor.snapshot();
    let json = if opt.pretty {
        serde_json::to_string_pretty(&snapshot)?
    } else {
        serde_json::to_string(&snapshot)?
    };
    println!("{json}");
    Ok(())
}

/// Replays a file synchronously, so each event sees the display exactly as
/// the lines before it left it.
fn replay_file(mut reactor: Reactor, display: &HeadlessDisplay, path: &Path) -> anyhow::Result<Reactor> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    for event in reactor::read_events(BufReader::new(file)) {
        let Some(event) = event?.apply(display) else {
            continue;
        };
        if let Err(e) = reactor.handle_event(event) {
            warn!(%e, "request rejected");
        }
    }
    Ok(reactor)
}

fn run_stdin(reactor: Reactor, display: HeadlessDisplay) -> anyhow::Result<Reactor> {
    let (events_tx, events_rx) = actor::channel();
    std::thread::spawn(move || {
        for event in reactor::read_events(std::io::stdin().lock()) {
            match event {
                Ok(event) => {
                    if let Some(event) = event.apply(&display) {
                        events_tx.send(event);
                    }
                }
                Err(e) => error!("{e:#}"),
            }
        }
    });

    let runtime = tokio::runtime::Builder::new_current_thread().build()?;
    Ok(runtime.block_on(reactor.run(events_rx)))
}
