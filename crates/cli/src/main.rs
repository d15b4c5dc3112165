use std::io::stdout;
use std::process::ExitCode;
use std::sync::mpsc;

use clap::Parser;
use crossterm::terminal;
use log::{debug, info};
use watchout_cli::cli_args::Args;
use watchout_cli::keymap::KeyboardSource;
use watchout_cli::status::StatusBar;
use watchout_cli::terminal::{CookedModeExecutor, RawModeGuard, TerminalPresenter};
use watchout_core::config::{self, RunConfig};
use watchout_core::error::Result;
use watchout_core::execution::PtyExecutor;
use watchout_core::file_handling;
use watchout_core::orchestrator::Orchestrator;
use watchout_core::request::{ChannelSource, RequestSource};
use watchout_core::watch::spawn_file_watcher;

/// Terminal size assumed when it cannot be read, as (columns, rows).
const FALLBACK_SIZE: (u16, u16) = (80, 24);

/// Loads the settings file and merges the command line into it
fn initialize_config(args: &Args) -> Result<RunConfig> {
    let config_path = config::get_config_path(&args.config_path);
    debug!("Config path: `{}`", config_path);

    let settings = file_handling::get_settings(&config_path)?;
    args.to_run_config(&settings)
}

fn execute() -> Result<()> {
    let args = Args::parse();
    let config = initialize_config(&args)?;
    info!(
        "Running `{}` with `{}`",
        config.target().display(),
        config.interpreter
    );

    let (columns, rows) = terminal::size().unwrap_or(FALLBACK_SIZE);
    let executor = CookedModeExecutor::new(PtyExecutor::new().with_size(rows, columns));
    let presenter = TerminalPresenter::new(stdout(), StatusBar::new(config.name(), config.verbose));

    let target = config.target().to_path_buf();
    let watch = config.watch;
    let mut orchestrator = Orchestrator::new(config, executor, presenter);

    let (sender, receiver) = mpsc::channel();
    let _raw_mode_guard = RawModeGuard::new()?; // Raw mode is disabled when this goes out of scope

    orchestrator.start()?;
    if watch {
        orchestrator.attach_watch(spawn_file_watcher(&target, sender)?);
    }

    let mut keyboard = KeyboardSource;
    let mut changes = ChannelSource::new(receiver);
    let mut sources: [&mut dyn RequestSource; 2] = [&mut keyboard, &mut changes];
    let outcome = orchestrator.run_until_quit(&mut sources);
    orchestrator.quit();
    outcome
}

fn main() -> ExitCode {
    env_logger::init();

    match execute() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
