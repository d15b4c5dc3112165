//! End-to-end tests of a session: settings file, command line, real runs in a
//! pseudo-terminal and what ends up on screen.

use std::fs;
use std::io;

use clap::Parser;
use tempfile::TempDir;
use watchout_cli::cli_args::Args;
use watchout_cli::status::StatusBar;
use watchout_cli::terminal::TerminalPresenter;
use watchout_core::config::RunConfig;
use watchout_core::execution::PtyExecutor;
use watchout_core::file_handling::get_settings;
use watchout_core::orchestrator::Orchestrator;
use watchout_core::request::Request;

type Session = Orchestrator<PtyExecutor, TerminalPresenter<Vec<u8>>>;

fn session(config: RunConfig) -> Session {
    let presenter =
        TerminalPresenter::new(Vec::new(), StatusBar::new(config.name(), config.verbose))
            .with_width(60);
    let executor = PtyExecutor::new().without_input().with_mirror(io::sink());
    Orchestrator::new(config, executor, presenter)
}

fn screen(session: &Session) -> String {
    String::from_utf8_lossy(session.presenter().get_ref()).into_owned()
}

fn setup(settings: &str, script: &str) -> (TempDir, String, String) {
    let directory = TempDir::new().unwrap();
    let settings_path = directory.path().join("config.yml");
    let script_path = directory.path().join("greet.sh");
    fs::write(&settings_path, settings).unwrap();
    fs::write(&script_path, script).unwrap();

    let settings_path = settings_path.to_str().unwrap().to_string();
    let script_path = script_path.to_str().unwrap().to_string();
    (directory, settings_path, script_path)
}

#[test]
fn test_settings_file_and_flags_combine() {
    let (_directory, settings_path, script_path) =
        setup("interpreter: /bin/sh\nlazy: true\n", "echo hi\n");

    let args = Args::parse_from(["watchout", &script_path, "-c", &settings_path, "--verbose"]);
    let settings = get_settings(&settings_path).unwrap();
    let config = args.to_run_config(&settings).unwrap();

    assert_eq!(config.interpreter, "/bin/sh");
    assert!(config.lazy);
    assert!(config.verbose);
    assert!(config.watch);
    assert_eq!(config.name(), "greet");
}

#[test]
fn test_repeated_runs_show_output_and_repeat_count() {
    let (_directory, settings_path, script_path) = setup("interpreter: /bin/sh\n", "echo hi\n");

    let args = Args::parse_from(["watchout", &script_path, "-c", &settings_path]);
    let config = args
        .to_run_config(&get_settings(&settings_path).unwrap())
        .unwrap();
    let mut session = session(config);

    session.handle(Request::Run).unwrap();
    session.handle(Request::Run).unwrap();

    let screen = screen(&session);
    assert!(screen.contains("hi\r\n"));
    assert!(screen.contains("greet"));
    assert!(screen.contains("2x"));
    assert_eq!(session.history().len(), 1);
}

#[test]
fn test_start_without_watching_only_shows_hint() {
    let (_directory, settings_path, script_path) = setup("interpreter: /bin/sh\n", "echo hi\n");

    let args = Args::parse_from(["watchout", &script_path, "-c", &settings_path, "--no-watch"]);
    let config = args
        .to_run_config(&get_settings(&settings_path).unwrap())
        .unwrap();
    let mut session = session(config);

    session.start().unwrap();

    let screen = screen(&session);
    assert!(screen.contains("Press Enter to run"));
    assert!(!screen.contains("hi\r\n"));
    assert!(session.history().is_empty());
}

#[test]
fn test_browsing_back_shows_older_output() {
    let (directory, settings_path, script_path) = setup("interpreter: /bin/sh\n", "echo one\n");

    let args = Args::parse_from(["watchout", &script_path, "-c", &settings_path]);
    let config = args
        .to_run_config(&get_settings(&settings_path).unwrap())
        .unwrap();
    let mut session = session(config);

    session.handle(Request::Run).unwrap();
    fs::write(directory.path().join("greet.sh"), "echo two\n").unwrap();
    session.handle(Request::Run).unwrap();
    session.handle(Request::NavigateUp).unwrap();

    let screen = screen(&session);
    assert!(screen.contains(" / 2"));
    assert!(screen.ends_with("one\r\n"));
    assert_eq!(session.history().cursor(), Some(0));
}
