use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use color_eyre::eyre::{self, Context};
use config::Config;
use debugger::{DebugBackend, DelveBackend, Location};
use server::{DelveServer, LaunchOptions};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tui::{App, cache::ContentCache, highlight::SyntectHighlighter, theme::Theme};

const LOG_FILE: &str = "drill.log";

/// Debug a Go program in the terminal
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// Go package or file to build and debug
    #[clap(default_value = ".")]
    target: PathBuf,

    /// Breakpoint to set before starting, as file:line
    #[clap(short = 'b', long = "bp")]
    breakpoint: Option<String>,

    /// Run until the first breakpoint before showing the debugger
    #[clap(short = 'c', long = "continue")]
    run_to_breakpoint: bool,

    /// Configuration file to use instead of the default location
    #[clap(long)]
    config: Option<PathBuf>,

    #[clap(long)]
    log_file: Option<PathBuf>,
}

/// Log to a file; the returned guard flushes it when dropped
fn init_logging(path: Option<PathBuf>) -> eyre::Result<WorkerGuard> {
    let path = match path {
        Some(path) => path,
        None => Config::cache_dir()
            .ok_or_else(|| eyre::eyre!("could not determine a cache directory for the log file"))?
            .join(LOG_FILE),
    };
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating log directory {}", dir.display()))?;
    }
    let log_file = std::fs::File::create(&path)
        .with_context(|| format!("creating log file {}", path.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(log_file);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_writer(writer)
        .init();
    Ok(guard)
}

fn parse_breakpoint(arg: &str) -> eyre::Result<Location> {
    let location: Location = arg.parse().map_err(|e: String| eyre::eyre!(e))?;
    let filename = std::path::absolute(&location.filename)
        .with_context(|| format!("resolving {}", location.filename.display()))?;
    Ok(Location::new(filename, location.line))
}

fn run(args: Args) -> eyre::Result<()> {
    let config = Config::load(args.config.as_deref()).context("loading configuration")?;
    let _log_guard = init_logging(args.log_file.clone().or_else(|| config.log_file.clone()))?;
    tracing::info!(program = %args.target.display(), "starting drill");

    let breakpoint = args
        .breakpoint
        .as_deref()
        .map(parse_breakpoint)
        .transpose()?;
    let highlighter = SyntectHighlighter::new(&config.highlight_theme)?;

    let options = LaunchOptions {
        dlv: config.dlv_path.clone(),
        output_queue_depth: config.output_queue_depth,
    };
    let server = DelveServer::launch(&args.target, &options).context("launching delve")?;
    let mut backend = DelveBackend::connect(server.addr()).context("connecting to delve")?;

    if let Some(location) = breakpoint {
        let bp = backend
            .create_breakpoint(&location.filename, location.line)
            .with_context(|| format!("creating breakpoint at {location}"))?;
        tracing::info!(id = %bp.id, %location, "created initial breakpoint");
    }
    if args.run_to_breakpoint {
        match backend.continue_() {
            Err(e) if e.is_process_exit() => {
                tracing::info!(error = %e, "program finished before reaching a breakpoint");
            }
            other => other.context("continuing to the first breakpoint")?,
        }
    }

    let cache = ContentCache::new(config.cache_capacity, Box::new(highlighter));
    let root = std::env::current_dir().ok();
    let app = App::new(backend, cache, Theme::default(), config.layout.clone(), root);
    let output = server.output().clone();

    let mut terminal = ratatui::init();
    let result = app.run(&mut terminal, output);
    ratatui::restore();

    drop(server);
    tracing::info!("exiting");
    result
}

fn main() -> ExitCode {
    if let Err(e) = color_eyre::install() {
        eprintln!("{e:?}");
    }
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::FAILURE
        }
    }
}
